use std::fmt;

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Minutes past midnight of the booking date. The only time type inside the core.
/// Values past 1440 are legal: a 23:00 booking ends at minute 1500.
pub type Minute = i32;

pub const MINUTES_PER_DAY: Minute = 24 * 60;

pub fn minute_of(time: NaiveTime) -> Minute {
    (time.num_seconds_from_midnight() / 60) as Minute
}

/// Wall-clock time for a minute offset, wrapping past midnight.
pub fn time_of(minute: Minute) -> NaiveTime {
    let secs = minute.rem_euclid(MINUTES_PER_DAY) as u32 * 60;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, 0).unwrap_or_default()
}

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: Minute,
    pub end: Minute,
}

impl Span {
    pub fn new(start: Minute, end: Minute) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    /// Span of a booking starting at `time` and lasting `duration` minutes.
    pub fn starting_at(time: NaiveTime, duration: Minute) -> Self {
        let start = minute_of(time);
        Self::new(start, start + duration)
    }

    pub fn duration(&self) -> Minute {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Strictly inside: `start < t < end`.
    pub fn strictly_contains(&self, t: Minute) -> bool {
        self.start < t && t < self.end
    }

    /// Returns true if `self` fully covers `other`.
    pub fn covers(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Table {
    pub id: Ulid,
    /// Seats at this table; one of the venue's allowed sizes.
    pub capacity: u32,
}

impl Table {
    pub fn new(id: Ulid, capacity: u32) -> Self {
        Self { id, capacity }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A table of {} people size", self.capacity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub special_requirements: Option<String>,
}

/// A booking as stored in a [`DayState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Ulid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    /// Derived from `time` and the venue's booking duration; never set directly.
    pub span: Span,
    pub party_size: u32,
    /// Assigned tables, in allocation order.
    pub tables: Vec<Ulid>,
    pub contact: Contact,
    /// Account id of the logged-in customer who made the booking.
    pub customer: Option<String>,
    /// Floor labels written by the owner. Cleared whenever `tables` changes.
    pub table_numbers: Option<String>,
    /// Tells the owner the booking changed since they last looked.
    pub updated: bool,
}

impl Reservation {
    pub fn holds_table(&self, table_id: &Ulid) -> bool {
        self.tables.contains(table_id)
    }

    pub fn end_time(&self) -> NaiveTime {
        time_of(self.span.end)
    }
}

/// All bookings of one service date, sorted by `span.start`.
#[derive(Debug, Clone)]
pub struct DayState {
    pub date: NaiveDate,
    pub bookings: Vec<Reservation>,
}

impl DayState {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            bookings: Vec::new(),
        }
    }

    /// Insert booking maintaining sort order by (span.start, id).
    pub fn insert_booking(&mut self, booking: Reservation) {
        let pos = self
            .bookings
            .binary_search_by_key(&(booking.span.start, booking.id), |b| (b.span.start, b.id))
            .unwrap_or_else(|e| e);
        self.bookings.insert(pos, booking);
    }

    pub fn remove_booking(&mut self, id: Ulid) -> Option<Reservation> {
        let pos = self.bookings.iter().position(|b| b.id == id)?;
        Some(self.bookings.remove(pos))
    }

    pub fn get(&self, id: &Ulid) -> Option<&Reservation> {
        self.bookings.iter().find(|b| b.id == *id)
    }

    pub fn get_mut(&mut self, id: &Ulid) -> Option<&mut Reservation> {
        self.bookings.iter_mut().find(|b| b.id == *id)
    }

    pub fn uses_table(&self, table_id: &Ulid) -> bool {
        self.bookings.iter().any(|b| b.holds_table(table_id))
    }
}

/// What the resolver is asked to seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationRequest {
    pub date: NaiveDate,
    pub span: Span,
    pub party_size: u32,
    /// Booking whose own occupancy must not count against it (re-allocation on update).
    pub excluding: Option<Ulid>,
}

/// The resolver's answer: one table, or 2–4 tables pushed together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Allocation {
    Single(Table),
    Combined(Vec<Table>),
}

impl Allocation {
    pub fn tables(&self) -> &[Table] {
        match self {
            Allocation::Single(table) => std::slice::from_ref(table),
            Allocation::Combined(tables) => tables,
        }
    }

    pub fn table_ids(&self) -> Vec<Ulid> {
        self.tables().iter().map(|t| t.id).collect()
    }

    pub fn total_capacity(&self) -> u32 {
        self.tables().iter().map(|t| t.capacity).sum()
    }

    pub fn leftover(&self, party_size: u32) -> u32 {
        self.total_capacity().saturating_sub(party_size)
    }
}

/// Who changed a booking. Customer edits raise the `updated` flag for the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Actor {
    Customer,
    Owner,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub party_size: u32,
    pub contact: Contact,
    pub customer: Option<String>,
}

/// Partial update of a booking; `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingChanges {
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub party_size: Option<u32>,
    pub contact: Option<Contact>,
}

/// The event types published on the notify hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    TableCreated {
        id: Ulid,
        capacity: u32,
    },
    TableRemoved {
        id: Ulid,
    },
    BookingConfirmed {
        id: Ulid,
        date: NaiveDate,
        span: Span,
        party_size: u32,
        tables: Vec<Ulid>,
    },
    BookingRescheduled {
        id: Ulid,
        date: NaiveDate,
        span: Span,
        party_size: u32,
        tables: Vec<Ulid>,
        previous_tables: Vec<Ulid>,
    },
    BookingDetailsChanged {
        id: Ulid,
    },
    BookingCancelled {
        id: Ulid,
        date: NaiveDate,
        tables: Vec<Ulid>,
    },
    TableNumbersAssigned {
        id: Ulid,
        table_numbers: Option<String>,
    },
    UpdatedFlagToggled {
        id: Ulid,
        updated: bool,
    },
}

// ── Query result types ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingInfo {
    pub id: Ulid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub end_time: NaiveTime,
    pub party_size: u32,
    pub tables: Vec<Ulid>,
    pub contact: Contact,
    pub customer: Option<String>,
    pub table_numbers: Option<String>,
    pub updated: bool,
}

impl From<&Reservation> for BookingInfo {
    fn from(r: &Reservation) -> Self {
        Self {
            id: r.id,
            date: r.date,
            time: r.time,
            end_time: r.end_time(),
            party_size: r.party_size,
            tables: r.tables.clone(),
            contact: r.contact.clone(),
            customer: r.customer.clone(),
            table_numbers: r.table_numbers.clone(),
            updated: r.updated,
        }
    }
}

impl fmt::Display for BookingInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "A table of {} on {}",
            self.party_size,
            self.date.format("%d-%m-%Y")
        )
    }
}

/// Owner-side booking search. Empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingFilter {
    /// Case-insensitive substring of the contact name.
    pub name: Option<String>,
    pub date: Option<NaiveDate>,
    pub party_size: Option<u32>,
    pub updated: Option<bool>,
}

impl BookingFilter {
    pub fn matches(&self, r: &Reservation) -> bool {
        if let Some(ref needle) = self.name
            && !r.contact.name.to_lowercase().contains(&needle.to_lowercase())
        {
            return false;
        }
        self.date.is_none_or(|d| r.date == d)
            && self.party_size.is_none_or(|p| r.party_size == p)
            && self.updated.is_none_or(|u| r.updated == u)
    }
}

/// Tables at the venue plus one date's reservations: everything the resolver reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySnapshot {
    pub date: NaiveDate,
    pub tables: Vec<Table>,
    pub reservations: Vec<Reservation>,
}
