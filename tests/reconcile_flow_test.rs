//! End-to-end reconciliation over the SQLite store.

mod common;

use common::{day, resilient_store};
use courtcheck_lib::database::models::{natural_key, BookingRecord, CheckInRecord};
use courtcheck_lib::services::matching::SuggestionOrigin;
use courtcheck_lib::services::reconcile::MatchDecision;
use courtcheck_lib::{ReconcileSettings, Reconciler};

#[tokio::test]
async fn test_error_resolve_reopen_cycle() {
    let reconciler = Reconciler::new(resilient_store().await, ReconcileSettings::default());
    let date = day(2024, 5, 1);

    let report = reconciler
        .run(&[BookingRecord::new("Max Mustermann", date, 5.0)], &[])
        .await
        .unwrap();
    assert_eq!(report.errors, 1);

    let batch = reconciler.error_batch(date).await.unwrap();
    let key = natural_key("max mustermann", date, 5.0);
    assert_eq!(batch[0].key, key);
    assert!(reconciler.is_open(&key).await.unwrap());

    reconciler.resolve(&key, date).await.unwrap();
    assert!(!reconciler.is_open(&key).await.unwrap());

    reconciler.reopen(&key).await.unwrap();
    assert!(reconciler.is_open(&key).await.unwrap());
}

#[tokio::test]
async fn test_boundary_amounts() {
    let reconciler = Reconciler::new(resilient_store().await, ReconcileSettings::default());
    let date = day(2024, 5, 1);
    let bookings: Vec<BookingRecord> = [0.0, 5.99, 6.0, 6.01, -1.0]
        .iter()
        .enumerate()
        .map(|(i, amount)| BookingRecord::new(&format!("Player {i}"), date, *amount))
        .collect();

    let day_result = reconciler.reconcile(date, &bookings, &[]).await.unwrap();
    let relevant: Vec<bool> = day_result.bookings.iter().map(|b| b.is_relevant).collect();
    assert_eq!(relevant, vec![true, true, false, false, false]);
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let reconciler = Reconciler::new(resilient_store().await, ReconcileSettings::default());
    let date = day(2024, 5, 1);
    let bookings = vec![
        BookingRecord::new("Anna Koch", date, 0.0),
        BookingRecord::new("Ben Ott", date, 5.0),
    ];
    let checkins = vec![CheckInRecord::new("Anna Koch", date)];

    let first = reconciler.run(&bookings, &checkins).await.unwrap();
    let second = reconciler.run(&bookings, &checkins).await.unwrap();

    assert_eq!(first.bookings_inserted, 2);
    assert_eq!(second.bookings_inserted, 0);
    assert_eq!(second.checkins_inserted, 0);
    assert_eq!(reconciler.snapshot(date).await.unwrap().bookings.len(), 2);
}

#[tokio::test]
async fn test_learned_mapping_applies_on_next_run() {
    let reconciler = Reconciler::new(resilient_store().await, ReconcileSettings::default());
    let first_day = day(2024, 5, 1);
    let next_day = day(2024, 5, 8);

    reconciler
        .run(
            &[BookingRecord::new("Hans Müller", first_day, 5.0)],
            &[CheckInRecord::new("Hans M", first_day)],
        )
        .await
        .unwrap();

    let suggestions = reconciler.suggestions(first_day, "hans mueller").await.unwrap();
    assert_eq!(suggestions[0].candidate, "hans m");
    let booking = reconciler.error_batch(first_day).await.unwrap()[0].booking.clone();
    reconciler
        .confirm_mapping(
            &booking,
            "hans m",
            MatchDecision::Suggested {
                score: suggestions[0].score,
            },
        )
        .await
        .unwrap();

    let report = reconciler
        .run(
            &[BookingRecord::new("Hans Müller", next_day, 5.0)],
            &[CheckInRecord::new("Hans M", next_day)],
        )
        .await
        .unwrap();
    assert_eq!(report.errors, 0);

    let learned = reconciler.suggestions(first_day, "hans mueller").await.unwrap();
    assert_eq!(learned.len(), 1);
    assert_eq!(learned[0].origin, SuggestionOrigin::Learned);
}

#[tokio::test]
async fn test_batch_exclusion_of_claimed_checkin() {
    let reconciler = Reconciler::new(resilient_store().await, ReconcileSettings::default());
    let date = day(2024, 5, 1);
    reconciler
        .run(
            &[
                BookingRecord::new("Erika M", date, 5.0),
                BookingRecord::new("Erika Mustermann", date, 5.0),
            ],
            &[CheckInRecord::new("Erika Musterfrau", date)],
        )
        .await
        .unwrap();

    let before = reconciler.suggestions(date, "erika mustermann").await.unwrap();
    assert!(before.iter().any(|s| s.candidate == "erika musterfrau"));

    let batch = reconciler.error_batch(date).await.unwrap();
    let erika_m = batch
        .iter()
        .find(|item| item.booking.name_norm == "erika m")
        .unwrap();
    reconciler
        .confirm_mapping(&erika_m.booking, "erika musterfrau", MatchDecision::Manual)
        .await
        .unwrap();

    let after = reconciler.suggestions(date, "erika mustermann").await.unwrap();
    assert!(after.iter().all(|s| s.candidate != "erika musterfrau"));
}
