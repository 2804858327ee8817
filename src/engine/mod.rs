mod allocation;
mod conflict;
mod error;
mod mutations;
mod queries;
mod store;

pub use allocation::{available_tables, combine_tables, find_tables, select_single_table};
pub use conflict::blocks;
pub use error::EngineError;
pub use store::VenueStore;

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{OwnedRwLockWriteGuard, RwLock};
use ulid::Ulid;

use crate::config::{ConfigError, VenueConfig};
use crate::model::*;
use crate::notify::NotifyHub;

pub type SharedDayState = Arc<RwLock<DayState>>;

/// How often a mutation re-resolves a booking that moved date under it.
const LOCK_RETRIES: usize = 3;

/// The venue: tables, bookings by date, and the rules for changing them.
///
/// Every operation that assigns tables runs the allocation search and writes
/// the result under the same day write lock, so two concurrent requests can
/// never both claim a table for overlapping spans.
pub struct Engine {
    config: VenueConfig,
    store: VenueStore,
    pub notify: Arc<NotifyHub>,
}

impl Engine {
    /// Build an engine for a venue. The config is validated here because its
    /// fields are public and may not have come through `from_env`/`from_json`.
    pub fn new(config: VenueConfig, notify: Arc<NotifyHub>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            store: VenueStore::new(),
            notify,
        })
    }

    pub fn config(&self) -> &VenueConfig {
        &self.config
    }

    /// Span of a booking starting at `time`: always the venue's fixed duration.
    pub(super) fn span_for(&self, time: chrono::NaiveTime) -> Span {
        Span::starting_at(time, self.config.booking_duration_minutes)
    }

    /// Run the allocation search and record how long it took.
    pub(super) fn resolve(
        &self,
        tables: &[Table],
        reservations: &[Reservation],
        request: &AllocationRequest,
    ) -> Option<Allocation> {
        let started = Instant::now();
        let allocation = find_tables(tables, reservations, request);
        metrics::histogram!(crate::observability::RESOLVE_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        if let Some(ref a) = allocation {
            tracing::debug!(
                date = %request.date,
                party_size = request.party_size,
                tables = a.tables().len(),
                leftover = a.leftover(request.party_size),
                "allocation found"
            );
        }
        allocation
    }

    /// Lookup booking → date, acquire that day's write lock, confirm the booking is still there.
    pub(super) async fn resolve_booking_write(
        &self,
        booking_id: &Ulid,
    ) -> Result<OwnedRwLockWriteGuard<DayState>, EngineError> {
        for _ in 0..LOCK_RETRIES {
            let date = self
                .store
                .date_of(booking_id)
                .ok_or(EngineError::NotFound(*booking_id))?;
            let guard = self.store.day(date).write_owned().await;
            if guard.get(booking_id).is_some() {
                return Ok(guard);
            }
        }
        Err(EngineError::NotFound(*booking_id))
    }
}
