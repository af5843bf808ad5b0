use super::*;

fn may(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
}

fn sale(date: &str, total: &str, sport: Option<&str>, sku: Option<&str>) -> RawBookingRow {
    RawBookingRow {
        service_date: Some(date.into()),
        total: Some(total.into()),
        sport: sport.map(Into::into),
        product_sku: sku.map(Into::into),
        ..Default::default()
    }
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_product_category() {
    assert_eq!(product_category("User booking registration"), ProductCategory::CourtBooking);
    assert_eq!(product_category("Open match registration"), ProductCategory::CourtBooking);
    assert_eq!(product_category("PADEL BALLS x3"), ProductCategory::Balls);
    assert_eq!(product_category("RACKET rental"), ProductCategory::Racket);
    assert_eq!(product_category("Drinks"), ProductCategory::Other);
}

#[test]
fn test_summary_splits_sport_and_product() {
    let rows = vec![
        sale("01/05/2024 18:00", "24,00 €", Some("PADEL"), Some("User booking registration")),
        sale("01/05/2024 19:00", "30,00", Some("tennis"), Some("Open match registration")),
        sale("01/05/2024 19:00", "4,50", Some("PADEL"), Some("BALLS")),
        sale("01/05/2024 20:00", "5,00", None, Some("RACKET")),
        sale("01/05/2024 20:00", "2,00", None, None),
    ];

    let summary = summarize_revenue(&rows, &(may(1)..=may(1)));

    assert_eq!(summary.rows, 5);
    assert!(approx(summary.total, 65.5));
    assert!(approx(summary.padel, 28.5));
    assert!(approx(summary.tennis, 30.0));
    assert!(approx(summary.court_booking, 54.0));
    assert!(approx(summary.balls, 4.5));
    assert!(approx(summary.racket, 5.0));
    assert!(approx(summary.other, 0.0));
}

#[test]
fn test_summary_respects_inclusive_range_and_skips_bad_dates() {
    let rows = vec![
        sale("30/04/2024", "10,00", None, Some("Drinks")),
        sale("01/05/2024", "1.234,50", None, Some("Drinks")),
        sale("03/05/2024", "2,00", None, Some("Drinks")),
        sale("04/05/2024", "8,00", None, Some("Drinks")),
        sale("-", "99,00", None, Some("Drinks")),
    ];

    let summary = summarize_revenue(&rows, &(may(1)..=may(3)));

    assert_eq!(summary.rows, 2);
    assert!(approx(summary.total, 1236.5));
    assert!(approx(summary.other, 1236.5));
}

#[test]
fn test_empty_archive_is_zero() {
    assert_eq!(
        summarize_revenue(&[], &(may(1)..=may(31))),
        RevenueSummary::default()
    );
}
