use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};
use ulid::Ulid;

use crate::model::*;

use super::SharedDayState;

/// In-memory venue state: the table list plus one lockable shard per service date.
///
/// Lock order is always: `tables`, then day shards in ascending date order.
pub struct VenueStore {
    /// Creation order; this is the resolver's iteration order.
    pub(super) tables: RwLock<Vec<Table>>,
    days: DashMap<NaiveDate, SharedDayState>,
    /// Reverse lookup: booking id → the date shard holding it.
    booking_dates: DashMap<Ulid, NaiveDate>,
}

impl Default for VenueStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VenueStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Vec::new()),
            days: DashMap::new(),
            booking_dates: DashMap::new(),
        }
    }

    // ── Day shards ───────────────────────────────────────────

    /// Get or lazily create the shard for `date`.
    pub fn day(&self, date: NaiveDate) -> SharedDayState {
        self.days
            .entry(date)
            .or_insert_with(|| Arc::new(RwLock::new(DayState::new(date))))
            .value()
            .clone()
    }

    pub fn existing_day(&self, date: &NaiveDate) -> Option<SharedDayState> {
        self.days.get(date).map(|e| e.value().clone())
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.days.iter().map(|e| *e.key()).collect();
        dates.sort();
        dates
    }

    /// Write-lock several shards in ascending date order (deduplicated).
    pub async fn lock_days(
        &self,
        dates: &[NaiveDate],
    ) -> Vec<(NaiveDate, OwnedRwLockWriteGuard<DayState>)> {
        let mut sorted = dates.to_vec();
        sorted.sort();
        sorted.dedup();
        let mut guards = Vec::with_capacity(sorted.len());
        for date in sorted {
            let guard = self.day(date).write_owned().await;
            guards.push((date, guard));
        }
        guards
    }

    // ── Booking index ────────────────────────────────────────

    pub fn date_of(&self, booking_id: &Ulid) -> Option<NaiveDate> {
        self.booking_dates.get(booking_id).map(|e| *e.value())
    }

    pub fn contains_booking(&self, booking_id: &Ulid) -> bool {
        self.booking_dates.contains_key(booking_id)
    }

    /// Register a new booking id. False if the id is already taken.
    pub fn claim_booking(&self, booking_id: Ulid, date: NaiveDate) -> bool {
        match self.booking_dates.entry(booking_id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(date);
                true
            }
        }
    }

    pub fn move_booking(&self, booking_id: Ulid, date: NaiveDate) {
        self.booking_dates.insert(booking_id, date);
    }

    pub fn release_booking(&self, booking_id: &Ulid) {
        self.booking_dates.remove(booking_id);
    }

    pub fn booking_count(&self) -> usize {
        self.booking_dates.len()
    }
}

/// Find a locked shard by date.
pub(super) fn shard<'a>(
    guards: &'a mut [(NaiveDate, OwnedRwLockWriteGuard<DayState>)],
    date: NaiveDate,
) -> Option<&'a mut DayState> {
    guards
        .iter_mut()
        .find(|(d, _)| *d == date)
        .map(|(_, guard)| &mut **guard)
}
