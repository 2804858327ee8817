//! Hard limits and domain constants. Values a venue may tune live in
//! [`crate::config::VenueConfig`]; everything here is fixed.

/// Largest number of tables ever pushed together for one party.
/// With 2- and 4-seat tables and parties of at most 8 this is never exceeded.
pub const MAX_COMBINED_TABLES: usize = 4;

/// Smallest combination tried once no single table fits.
pub const MIN_COMBINED_TABLES: usize = 2;

pub const DEFAULT_TABLE_SIZES: [u32; 2] = [2, 4];

pub const DEFAULT_MAX_PARTY_SIZE: u32 = 8;

pub const DEFAULT_BOOKING_DURATION_MINUTES: i32 = 120;

pub const DEFAULT_SLOT_INTERVAL_MINUTES: i32 = 15;

/// Last bookable slot must start before `closing - LAST_SLOT_LEAD_MINUTES`.
pub const LAST_SLOT_LEAD_MINUTES: i32 = 59;

pub const MAX_TABLES: usize = 64;

pub const MAX_BOOKINGS_PER_DAY: usize = 2_048;

pub const MAX_NAME_LEN: usize = 50;

pub const MAX_EMAIL_LEN: usize = 254;

pub const MAX_PHONE_LEN: usize = 20;

pub const MAX_REQUIREMENTS_LEN: usize = 1_000;

pub const MAX_TABLE_NUMBERS_LEN: usize = 50;

pub const MAX_CUSTOMER_ID_LEN: usize = 150;
