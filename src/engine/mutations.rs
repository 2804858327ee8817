use tracing::info;
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;
use crate::observability::{
    outcome_label, ALLOCATION_TABLES, BOOKINGS_CANCELLED_TOTAL, BOOKINGS_TOTAL, TABLES_ACTIVE,
};

use super::conflict::{
    validate_contact, validate_customer, validate_party_size, validate_start, validate_table_size,
};
use super::store::shard;
use super::{Engine, EngineError, LOCK_RETRIES};

impl Engine {
    // ── Tables ───────────────────────────────────────────────

    pub async fn create_table(&self, id: Ulid, capacity: u32) -> Result<(), EngineError> {
        validate_table_size(self.config(), capacity)?;
        let mut tables = self.store.tables.write().await;
        if tables.len() >= MAX_TABLES {
            return Err(EngineError::LimitExceeded("too many tables"));
        }
        if tables.iter().any(|t| t.id == id) {
            return Err(EngineError::AlreadyExists(id));
        }
        tables.push(Table::new(id, capacity));
        metrics::gauge!(TABLES_ACTIVE).set(tables.len() as f64);
        info!("table {id} added ({capacity} seats)");
        self.notify.send(&[id], &Event::TableCreated { id, capacity });
        Ok(())
    }

    /// Remove a table. Refused while any booking, past or future, still holds it.
    pub async fn remove_table(&self, id: Ulid) -> Result<(), EngineError> {
        let mut tables = self.store.tables.write().await;
        let pos = tables
            .iter()
            .position(|t| t.id == id)
            .ok_or(EngineError::NotFound(id))?;

        for date in self.store.dates() {
            if let Some(day) = self.store.existing_day(&date)
                && day.read().await.uses_table(&id)
            {
                return Err(EngineError::TableInUse(id));
            }
        }

        tables.remove(pos);
        metrics::gauge!(TABLES_ACTIVE).set(tables.len() as f64);
        info!("table {id} removed");
        self.notify.send(&[id], &Event::TableRemoved { id });
        self.notify.remove(&id);
        Ok(())
    }

    // ── Bookings ─────────────────────────────────────────────

    /// Validate, allocate and store a new booking in one atomic step.
    pub async fn make_booking(
        &self,
        id: Ulid,
        request: BookingRequest,
    ) -> Result<BookingInfo, EngineError> {
        let result = self.insert_booking(id, request).await;
        metrics::counter!(BOOKINGS_TOTAL, "operation" => "make", "outcome" => outcome_label(&result))
            .increment(1);
        result
    }

    async fn insert_booking(
        &self,
        id: Ulid,
        request: BookingRequest,
    ) -> Result<BookingInfo, EngineError> {
        validate_party_size(self.config(), request.party_size)?;
        validate_start(self.config(), request.time)?;
        validate_contact(&request.contact)?;
        validate_customer(request.customer.as_deref())?;
        if self.store.contains_booking(&id) {
            return Err(EngineError::AlreadyExists(id));
        }

        let span = self.span_for(request.time);
        let tables = self.store.tables.read().await;
        let mut day = self.store.day(request.date).write_owned().await;
        if day.bookings.len() >= MAX_BOOKINGS_PER_DAY {
            return Err(EngineError::LimitExceeded("too many bookings on date"));
        }

        let allocation = self
            .resolve(
                &tables,
                &day.bookings,
                &AllocationRequest {
                    date: request.date,
                    span,
                    party_size: request.party_size,
                    excluding: None,
                },
            )
            .ok_or(EngineError::NoAvailability {
                date: request.date,
                time: request.time,
                party_size: request.party_size,
            })?;

        if !self.store.claim_booking(id, request.date) {
            return Err(EngineError::AlreadyExists(id));
        }

        let reservation = Reservation {
            id,
            date: request.date,
            time: request.time,
            span,
            party_size: request.party_size,
            tables: allocation.table_ids(),
            contact: request.contact,
            customer: request.customer,
            table_numbers: None,
            updated: true,
        };
        let info = BookingInfo::from(&reservation);
        let event = Event::BookingConfirmed {
            id,
            date: reservation.date,
            span,
            party_size: reservation.party_size,
            tables: reservation.tables.clone(),
        };
        day.insert_booking(reservation);

        metrics::histogram!(ALLOCATION_TABLES).record(info.tables.len() as f64);
        info!(
            "booking {id} confirmed: {} on {} at {} ({} table(s))",
            info.party_size,
            info.date,
            info.time.format("%H:%M"),
            info.tables.len()
        );
        self.notify.send(&info.tables, &event);
        Ok(info)
    }

    /// Apply changes to a booking.
    ///
    /// A change of date, time or party size re-runs the allocation search
    /// (the booking's own tables count as free) and replaces the assignment,
    /// clearing owner table numbers. Contact-only changes keep the tables.
    /// Customer edits raise the `updated` flag. On `NoAvailability` nothing changes.
    pub async fn update_booking(
        &self,
        id: Ulid,
        changes: BookingChanges,
        actor: Actor,
    ) -> Result<BookingInfo, EngineError> {
        let result = self.apply_changes(id, changes, actor).await;
        metrics::counter!(BOOKINGS_TOTAL, "operation" => "update", "outcome" => outcome_label(&result))
            .increment(1);
        result
    }

    async fn apply_changes(
        &self,
        id: Ulid,
        changes: BookingChanges,
        actor: Actor,
    ) -> Result<BookingInfo, EngineError> {
        if let Some(party_size) = changes.party_size {
            validate_party_size(self.config(), party_size)?;
        }
        if let Some(time) = changes.time {
            validate_start(self.config(), time)?;
        }
        if let Some(ref contact) = changes.contact {
            validate_contact(contact)?;
        }

        let tables = self.store.tables.read().await;

        for _ in 0..LOCK_RETRIES {
            let current_date = self
                .store
                .date_of(&id)
                .ok_or(EngineError::NotFound(id))?;
            let target_date = changes.date.unwrap_or(current_date);
            let mut guards = self.store.lock_days(&[current_date, target_date]).await;

            // Moved or cancelled while we waited for the locks.
            let Some(current) =
                shard(&mut guards, current_date).and_then(|day| day.get(&id).cloned())
            else {
                continue;
            };

            let mut next = current.clone();
            next.date = target_date;
            next.time = changes.time.unwrap_or(current.time);
            next.party_size = changes.party_size.unwrap_or(current.party_size);
            if let Some(ref contact) = changes.contact {
                next.contact = contact.clone();
            }
            if actor == Actor::Customer {
                next.updated = true;
            }

            let reallocate = next.date != current.date
                || next.time != current.time
                || next.party_size != current.party_size;

            if !reallocate {
                if let Some(stored) = shard(&mut guards, current_date).and_then(|d| d.get_mut(&id)) {
                    *stored = next.clone();
                }
                info!("booking {id} details changed");
                self.notify
                    .send(&next.tables, &Event::BookingDetailsChanged { id });
                return Ok(BookingInfo::from(&next));
            }

            next.span = self.span_for(next.time);
            let target = shard(&mut guards, target_date)
                .ok_or(EngineError::NotFound(id))?;
            if target.date != current.date && target.bookings.len() >= MAX_BOOKINGS_PER_DAY {
                return Err(EngineError::LimitExceeded("too many bookings on date"));
            }
            let allocation = self
                .resolve(
                    &tables,
                    &target.bookings,
                    &AllocationRequest {
                        date: next.date,
                        span: next.span,
                        party_size: next.party_size,
                        excluding: Some(id),
                    },
                )
                .ok_or(EngineError::NoAvailability {
                    date: next.date,
                    time: next.time,
                    party_size: next.party_size,
                })?;

            next.tables = allocation.table_ids();
            next.table_numbers = None;

            if let Some(day) = shard(&mut guards, current_date) {
                day.remove_booking(id);
            }
            if let Some(day) = shard(&mut guards, target_date) {
                day.insert_booking(next.clone());
            }
            if target_date != current_date {
                self.store.move_booking(id, target_date);
            }

            let mut touched = current.tables.clone();
            touched.extend(next.tables.iter().filter(|t| !current.tables.contains(t)));
            let event = Event::BookingRescheduled {
                id,
                date: next.date,
                span: next.span,
                party_size: next.party_size,
                tables: next.tables.clone(),
                previous_tables: current.tables,
            };
            info!(
                "booking {id} rescheduled: {} on {} at {} ({} table(s))",
                next.party_size,
                next.date,
                next.time.format("%H:%M"),
                next.tables.len()
            );
            metrics::histogram!(ALLOCATION_TABLES).record(next.tables.len() as f64);
            self.notify.send(&touched, &event);
            return Ok(BookingInfo::from(&next));
        }

        Err(EngineError::NotFound(id))
    }

    pub async fn cancel_booking(&self, id: Ulid) -> Result<BookingInfo, EngineError> {
        let mut day = self.resolve_booking_write(&id).await?;
        let removed = day.remove_booking(id).ok_or(EngineError::NotFound(id))?;
        self.store.release_booking(&id);
        drop(day);

        metrics::counter!(BOOKINGS_CANCELLED_TOTAL).increment(1);
        info!("booking {id} cancelled");
        self.notify.send(
            &removed.tables,
            &Event::BookingCancelled {
                id,
                date: removed.date,
                tables: removed.tables.clone(),
            },
        );
        Ok(BookingInfo::from(&removed))
    }

    /// Owner floor labels for a booking; `None` clears them.
    pub async fn assign_table_numbers(
        &self,
        id: Ulid,
        table_numbers: Option<String>,
    ) -> Result<BookingInfo, EngineError> {
        if let Some(ref labels) = table_numbers
            && labels.chars().count() > MAX_TABLE_NUMBERS_LEN
        {
            return Err(EngineError::LimitExceeded("table numbers too long"));
        }
        let mut day = self.resolve_booking_write(&id).await?;
        let booking = day.get_mut(&id).ok_or(EngineError::NotFound(id))?;
        booking.table_numbers = table_numbers.clone();
        let info = BookingInfo::from(&*booking);
        drop(day);

        self.notify.send(
            &info.tables,
            &Event::TableNumbersAssigned { id, table_numbers },
        );
        Ok(info)
    }

    /// Flip the `updated` flag; returns its new value.
    pub async fn toggle_updated(&self, id: Ulid) -> Result<bool, EngineError> {
        let mut day = self.resolve_booking_write(&id).await?;
        let booking = day.get_mut(&id).ok_or(EngineError::NotFound(id))?;
        booking.updated = !booking.updated;
        let updated = booking.updated;
        let tables = booking.tables.clone();
        drop(day);

        self.notify
            .send(&tables, &Event::UpdatedFlagToggled { id, updated });
        Ok(updated)
    }
}
