use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use futures::future::join_all;
use tokio::sync::broadcast::error::TryRecvError;
use ulid::Ulid;

use tavola::config::VenueConfig;
use tavola::engine::{Engine, EngineError};
use tavola::model::{
    Actor, BookingChanges, BookingFilter, BookingRequest, Contact, Event, Span,
};
use tavola::notify::NotifyHub;

// ── Test infrastructure ──────────────────────────────────────

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
}

fn at(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn guest(name: &str, time: NaiveTime, party_size: u32) -> BookingRequest {
    BookingRequest {
        date: date(),
        time,
        party_size,
        contact: Contact {
            name: name.into(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: "07700900123".into(),
            special_requirements: None,
        },
        customer: Some(name.to_lowercase()),
    }
}

async fn start_venue(config: VenueConfig, sizes: &[u32]) -> (Arc<Engine>, Vec<Ulid>) {
    let engine = Arc::new(Engine::new(config, Arc::new(NotifyHub::new())).unwrap());
    let mut ids = Vec::new();
    for &capacity in sizes {
        let id = Ulid::new();
        engine.create_table(id, capacity).await.unwrap();
        ids.push(id);
    }
    (engine, ids)
}

// ── Configured venue ─────────────────────────────────────────

#[tokio::test]
async fn venue_from_environment_style_config() {
    let vars: HashMap<&str, &str> = [
        ("TAVOLA_OPENING_TIME", "17:00"),
        ("TAVOLA_CLOSING_TIME", "22:00"),
        ("TAVOLA_SLOT_INTERVAL_MINUTES", "30"),
        ("TAVOLA_BOOKING_DURATION_MINUTES", "90"),
        ("TAVOLA_MAX_PARTY_SIZE", "6"),
        ("TAVOLA_TABLE_SIZES", "2,6"),
    ]
    .into_iter()
    .collect();
    let config =
        VenueConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
    let (engine, tables) = start_venue(config, &[6, 2]).await;

    let slots = engine.booking_slots();
    assert_eq!(slots.first(), Some(&at(17, 0)));
    assert_eq!(slots.last(), Some(&at(21, 0)));

    let info = engine
        .make_booking(Ulid::new(), guest("Ada", at(19, 30), 2))
        .await
        .unwrap();
    assert_eq!(info.tables, vec![tables[1]]);
    assert_eq!(info.end_time, at(21, 0));

    // a 4-seater size does not exist here
    assert!(matches!(
        engine.create_table(Ulid::new(), 4).await,
        Err(EngineError::InvalidTableSize(4))
    ));
    // off the 30-minute grid
    assert!(matches!(
        engine
            .make_booking(Ulid::new(), guest("Bob", at(19, 15), 2))
            .await,
        Err(EngineError::OutsideOpeningHours(_))
    ));
    assert!(matches!(
        engine
            .make_booking(Ulid::new(), guest("Bob", at(19, 0), 7))
            .await,
        Err(EngineError::InvalidPartySize(7))
    ));
}

// ── Full lifecycle ───────────────────────────────────────────

#[tokio::test]
async fn booking_lifecycle_with_events() {
    let (engine, tables) = start_venue(VenueConfig::default(), &[4, 4, 2, 2]).await;
    let mut feed = engine.notify.subscribe_all();

    let id = Ulid::new();
    let made = engine
        .make_booking(id, guest("Grace", at(19, 0), 6))
        .await
        .unwrap();
    assert_eq!(made.tables, vec![tables[0], tables[2]]);
    assert_eq!(made.to_string(), "A table of 6 on 14-03-2025");

    engine
        .assign_table_numbers(id, Some("1+5".into()))
        .await
        .unwrap();
    assert!(!engine.toggle_updated(id).await.unwrap());

    let moved = engine
        .update_booking(
            id,
            BookingChanges {
                time: Some(at(20, 0)),
                party_size: Some(8),
                ..Default::default()
            },
            Actor::Customer,
        )
        .await
        .unwrap();
    assert_eq!(moved.tables, vec![tables[0], tables[1]]);
    assert_eq!(moved.table_numbers, None);
    assert!(moved.updated);

    let unflagged = engine
        .search_bookings(&BookingFilter {
            updated: Some(false),
            ..Default::default()
        })
        .await;
    assert!(unflagged.is_empty());

    engine.cancel_booking(id).await.unwrap();
    assert_eq!(engine.booking_count(), 0);

    let mut kinds = Vec::new();
    loop {
        match feed.try_recv() {
            Ok(event) => kinds.push(event),
            Err(TryRecvError::Empty) => break,
            Err(e) => panic!("feed error: {e}"),
        }
    }
    assert!(matches!(kinds[0], Event::BookingConfirmed { .. }));
    assert!(matches!(kinds[1], Event::TableNumbersAssigned { .. }));
    assert!(matches!(
        kinds[2],
        Event::UpdatedFlagToggled { updated: false, .. }
    ));
    match &kinds[3] {
        Event::BookingRescheduled {
            tables: now,
            previous_tables,
            ..
        } => {
            assert_eq!(now, &vec![tables[0], tables[1]]);
            assert_eq!(previous_tables, &vec![tables[0], tables[2]]);
        }
        other => panic!("expected reschedule, got {other:?}"),
    }
    assert!(matches!(kinds[4], Event::BookingCancelled { .. }));
    assert_eq!(kinds.len(), 5);
}

// ── Concurrency ──────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_fill_the_floor_exactly_once() {
    let (engine, tables) = start_venue(VenueConfig::default(), &[4, 4, 4, 4]).await;

    // 4-seat parties at one slot: exactly one per table.
    let requests = (0..12).map(|i| {
        let engine = engine.clone();
        async move {
            engine
                .make_booking(Ulid::new(), guest(&format!("Guest{i}"), at(18, 0), 4))
                .await
        }
    });
    let results = join_all(requests).await;

    let confirmed: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    let refused = results
        .iter()
        .filter(|r| matches!(r, Err(EngineError::NoAvailability { .. })))
        .count();
    assert_eq!(confirmed.len(), 4);
    assert_eq!(refused, 8);

    let mut used: Vec<Ulid> = confirmed.iter().flat_map(|b| b.tables.clone()).collect();
    used.sort();
    let mut all = tables.clone();
    all.sort();
    assert_eq!(used, all);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reschedules_never_share_tables() {
    let (engine, _) = start_venue(VenueConfig::default(), &[2, 2, 2, 2, 4, 4]).await;

    let mut ids = Vec::new();
    for (i, time) in [at(12, 0), at(13, 0), at(14, 0), at(15, 0)].into_iter().enumerate() {
        let id = Ulid::new();
        engine
            .make_booking(id, guest(&format!("Early{i}"), time, 2))
            .await
            .unwrap();
        ids.push(id);
    }

    // everyone tries to move into the same evening slot at once
    let handles: Vec<_> = ids
        .iter()
        .map(|&id| {
            let engine = engine.clone();
            tokio::spawn(async move {
                engine
                    .update_booking(
                        id,
                        BookingChanges {
                            time: Some(at(19, 0)),
                            party_size: Some(4),
                            ..Default::default()
                        },
                        Actor::Owner,
                    )
                    .await
            })
        })
        .collect();
    for h in handles {
        let _ = h.await.unwrap();
    }

    let bookings = engine.bookings_on(date()).await;
    assert_eq!(bookings.len(), 4);
    for (i, a) in bookings.iter().enumerate() {
        for b in &bookings[i + 1..] {
            let sa = Span::starting_at(a.time, 120);
            let sb = Span::starting_at(b.time, 120);
            if sa.overlaps(&sb) {
                assert!(a.tables.iter().all(|t| !b.tables.contains(t)));
            }
        }
    }
}

// ── Blocking callers ─────────────────────────────────────────

#[test]
fn engine_usable_from_blocking_code() {
    tokio_test::block_on(async {
        let (engine, tables) = start_venue(VenueConfig::default(), &[2, 4]).await;

        let options = engine
            .check_availability(date(), at(12, 0), 3, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(options.table_ids(), vec![tables[1]]);
        assert_eq!(options.leftover(3), 1);

        // reading twice changes nothing
        let again = engine
            .check_availability(date(), at(12, 0), 3, None)
            .await
            .unwrap();
        assert_eq!(again, Some(options));
        assert_eq!(engine.booking_count(), 0);
    });
}
