//! Table allocation for restaurant bookings.
//!
//! [`engine::find_tables`] is the pure search: given tables, existing
//! reservations and a request, pick the tightest single table or the
//! tightest combination of up to four. [`engine::Engine`] wraps it with an
//! in-memory venue that checks and assigns tables atomically.

pub mod config;
pub mod engine;
pub mod limits;
pub mod model;
pub mod notify;
pub mod observability;
pub mod slots;
