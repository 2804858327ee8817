use std::net::SocketAddr;

use crate::engine::EngineError;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: booking attempts. Labels: operation, outcome.
pub const BOOKINGS_TOTAL: &str = "tavola_bookings_total";

/// Counter: cancelled bookings.
pub const BOOKINGS_CANCELLED_TOTAL: &str = "tavola_bookings_cancelled_total";

/// Histogram: tables assigned per successful allocation.
pub const ALLOCATION_TABLES: &str = "tavola_allocation_tables";

/// Histogram: allocation search latency in seconds.
pub const RESOLVE_DURATION_SECONDS: &str = "tavola_resolve_duration_seconds";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: tables at the venue.
pub const TABLES_ACTIVE: &str = "tavola_tables_active";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), metrics_exporter_prometheus::BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

/// Install the fmt subscriber. Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().try_init();
}

/// Map a booking result to a short outcome label for metrics.
pub fn outcome_label<T>(result: &Result<T, EngineError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(EngineError::NoAvailability { .. }) => "no_availability",
        Err(EngineError::NotFound(_)) => "not_found",
        Err(e) if e.is_invalid_input() => "invalid",
        Err(_) => "error",
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::*;

    #[test]
    fn init_without_port_is_noop() {
        assert!(init(None).is_ok());
        init_tracing();
        init_tracing();
    }

    #[test]
    fn outcome_labels() {
        let ok: Result<(), EngineError> = Ok(());
        assert_eq!(outcome_label(&ok), "ok");

        let none: Result<(), EngineError> = Err(EngineError::NoAvailability {
            date: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
            time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            party_size: 4,
        });
        assert_eq!(outcome_label(&none), "no_availability");

        let bad: Result<(), EngineError> = Err(EngineError::InvalidPartySize(0));
        assert_eq!(outcome_label(&bad), "invalid");
    }
}
