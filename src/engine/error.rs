use chrono::{NaiveDate, NaiveTime};
use ulid::Ulid;

#[derive(Debug)]
pub enum EngineError {
    NotFound(Ulid),
    AlreadyExists(Ulid),
    /// No table or combination of tables seats the party. A normal outcome,
    /// reported to the customer as "no tables available".
    NoAvailability {
        date: NaiveDate,
        time: NaiveTime,
        party_size: u32,
    },
    InvalidPartySize(u32),
    InvalidTableSize(u32),
    OutsideOpeningHours(NaiveTime),
    InvalidContact(&'static str),
    TableInUse(Ulid),
    LimitExceeded(&'static str),
}

impl EngineError {
    /// Caller-side input problems, as opposed to state conflicts.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidPartySize(_)
                | EngineError::InvalidTableSize(_)
                | EngineError::OutsideOpeningHours(_)
                | EngineError::InvalidContact(_)
                | EngineError::LimitExceeded(_)
        )
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NotFound(id) => write!(f, "not found: {id}"),
            EngineError::AlreadyExists(id) => write!(f, "already exists: {id}"),
            EngineError::NoAvailability {
                date,
                time,
                party_size,
            } => write!(
                f,
                "no tables available for {party_size} on {date} at {}",
                time.format("%H:%M")
            ),
            EngineError::InvalidPartySize(n) => write!(f, "invalid party size: {n}"),
            EngineError::InvalidTableSize(n) => write!(f, "invalid table size: {n}"),
            EngineError::OutsideOpeningHours(t) => {
                write!(f, "{} is not a bookable time", t.format("%H:%M"))
            }
            EngineError::InvalidContact(msg) => write!(f, "invalid contact details: {msg}"),
            EngineError::TableInUse(id) => {
                write!(f, "cannot remove table {id}: bookings still hold it")
            }
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}
