use chrono::{NaiveDate, NaiveTime};
use ulid::Ulid;

use crate::model::*;

use super::conflict::{validate_party_size, validate_start};
use super::{Engine, EngineError};

impl Engine {
    /// Tables in creation order.
    pub async fn list_tables(&self) -> Vec<Table> {
        self.store.tables.read().await.clone()
    }

    pub fn booking_slots(&self) -> Vec<NaiveTime> {
        self.config().booking_slots()
    }

    pub fn booking_count(&self) -> usize {
        self.store.booking_count()
    }

    pub async fn get_booking(&self, id: Ulid) -> Option<BookingInfo> {
        let date = self.store.date_of(&id)?;
        let day = self.store.existing_day(&date)?;
        let guard = day.read().await;
        guard.get(&id).map(BookingInfo::from)
    }

    /// All bookings on `date`, earliest first.
    pub async fn bookings_on(&self, date: NaiveDate) -> Vec<BookingInfo> {
        let Some(day) = self.store.existing_day(&date) else {
            return Vec::new();
        };
        let guard = day.read().await;
        guard.bookings.iter().map(BookingInfo::from).collect()
    }

    /// Today's and future bookings, by date then time.
    pub async fn upcoming_bookings(&self, today: NaiveDate) -> Vec<BookingInfo> {
        self.collect_bookings(|r| r.date >= today).await
    }

    /// A customer's own bookings from `today` on.
    pub async fn customer_bookings(&self, customer: &str, today: NaiveDate) -> Vec<BookingInfo> {
        self.collect_bookings(|r| r.date >= today && r.customer.as_deref() == Some(customer))
            .await
    }

    /// Owner search: newest date and time first, ties by descending id.
    pub async fn search_bookings(&self, filter: &BookingFilter) -> Vec<BookingInfo> {
        let mut found = self.collect_bookings(|r| filter.matches(r)).await;
        found.reverse();
        found
    }

    async fn collect_bookings(&self, keep: impl Fn(&Reservation) -> bool) -> Vec<BookingInfo> {
        let mut out = Vec::new();
        for date in self.store.dates() {
            let Some(day) = self.store.existing_day(&date) else {
                continue;
            };
            let guard = day.read().await;
            out.extend(guard.bookings.iter().filter(|r| keep(r)).map(BookingInfo::from));
        }
        out
    }

    /// Tables at the venue plus `date`'s reservations, as one consistent snapshot.
    pub async fn day_snapshot(&self, date: NaiveDate) -> DaySnapshot {
        let tables = self.store.tables.read().await;
        let reservations = match self.store.existing_day(&date) {
            Some(day) => day.read().await.bookings.clone(),
            None => Vec::new(),
        };
        DaySnapshot {
            date,
            tables: tables.clone(),
            reservations,
        }
    }

    /// What a booking request would be given right now, without assigning anything.
    /// `Ok(None)` means no availability.
    pub async fn check_availability(
        &self,
        date: NaiveDate,
        time: NaiveTime,
        party_size: u32,
        excluding: Option<Ulid>,
    ) -> Result<Option<Allocation>, EngineError> {
        validate_party_size(self.config(), party_size)?;
        validate_start(self.config(), time)?;

        let snapshot = self.day_snapshot(date).await;
        let request = AllocationRequest {
            date,
            span: self.span_for(time),
            party_size,
            excluding,
        };
        Ok(self.resolve(&snapshot.tables, &snapshot.reservations, &request))
    }
}
