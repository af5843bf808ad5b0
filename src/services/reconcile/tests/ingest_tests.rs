use super::*;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn booking_row(name: &str, total: &str, date: &str, payment_id: &str) -> RawBookingRow {
    RawBookingRow {
        user_name: Some(name.into()),
        total: Some(total.into()),
        service_date: Some(date.into()),
        product_sku: Some("User booking registration".into()),
        refund_id: Some("-".into()),
        payment_status: Some("Paid".into()),
        payment_id: Some(payment_id.into()),
        club_payment_id: Some(format!("C{payment_id}")),
        ..Default::default()
    }
}

#[test]
fn test_parse_amount_formats() {
    assert_eq!(parse_amount("1.234,50 €"), 1234.5);
    assert_eq!(parse_amount("5,00"), 5.0);
    assert_eq!(parse_amount("5.99"), 5.99);
    assert_eq!(parse_amount("1.234"), 1234.0);
    assert_eq!(parse_amount("€ 0,00"), 0.0);
    assert_eq!(parse_amount("-1,00"), -1.0);
    assert_eq!(parse_amount("abc"), 0.0);
    assert_eq!(parse_amount("NaN"), 0.0);
    assert_eq!(parse_amount(""), 0.0);
}

#[test]
fn test_parse_date_formats() {
    assert_eq!(parse_date("01/05/2024 18:30"), Some(day(2024, 5, 1)));
    assert_eq!(parse_date("01/05/2024"), Some(day(2024, 5, 1)));
    assert_eq!(parse_date("2024-05-01 18:30:00"), Some(day(2024, 5, 1)));
    assert_eq!(parse_date("2024-05-01"), Some(day(2024, 5, 1)));
    assert_eq!(parse_date("01.05.2024 09:00"), Some(day(2024, 5, 1)));
    assert_eq!(parse_date("01.05.2024"), Some(day(2024, 5, 1)));
    assert_eq!(parse_date("20240501"), Some(day(2024, 5, 1)));
    assert_eq!(parse_date("-"), None);
    assert_eq!(parse_date("  "), None);
    assert_eq!(parse_date("yesterday"), None);
}

#[test]
fn test_resolve_time_prefers_explicit_field() {
    assert_eq!(resolve_time(Some("09:15"), Some("01/05/2024 18:30")), Some(hm(9, 15)));
    assert_eq!(resolve_time(None, Some("01/05/2024 18:30")), Some(hm(18, 30)));
    assert_eq!(resolve_time(Some(""), Some("01/05/2024")), None);
    assert_eq!(extract_time("99:99"), None);
}

#[test]
fn test_raw_archive_key() {
    let row = booking_row("Anna", "5,00", "2024-05-01", "P1");
    assert_eq!(raw_archive_key(&row), "P1|CP1");

    let club_only = RawBookingRow {
        club_payment_id: Some("C9".into()),
        ..Default::default()
    };
    assert_eq!(raw_archive_key(&club_only), "CLUB-C9");
}

#[test]
fn test_prepare_bookings_filters() {
    let mut other_product = booking_row("Ben", "5,00", "2024-05-01", "P2");
    other_product.product_sku = Some("BALLS".into());
    let mut refunded = booking_row("Cleo", "5,00", "2024-05-01", "P3");
    refunded.refund_id = Some("R-77".into());
    let mut refund_status = booking_row("Dana", "5,00", "2024-05-01", "P4");
    refund_status.payment_status = Some("Refund".into());
    let negative = booking_row("Emil", "-3,00", "2024-05-01", "P5");
    let duplicate = booking_row("Anna Again", "5,00", "2024-05-01", "P1");
    let undated = booking_row("Finn", "5,00", "someday", "P6");

    let rows = vec![
        booking_row("Anna Koch", "5,00", "01/05/2024 18:30", "P1"),
        other_product,
        refunded,
        refund_status,
        negative,
        duplicate,
        undated,
    ];
    let (records, report) = prepare_bookings(&rows, &ReconcileSettings::default());

    assert_eq!(records.len(), 1);
    let anna = &records[0];
    assert_eq!(anna.name_norm, "anna koch");
    assert_eq!(anna.date, day(2024, 5, 1));
    assert_eq!(anna.time, Some(hm(18, 30)));
    assert_eq!(anna.amount, 5.0);
    assert_eq!(anna.payment_id.as_deref(), Some("P1"));

    assert_eq!(report.kept, 1);
    assert_eq!(report.skipped_product, 1);
    assert_eq!(report.skipped_refund, 2);
    assert_eq!(report.skipped_negative, 1);
    assert_eq!(report.skipped_duplicate, 1);
    assert_eq!(report.skipped_unparseable, 1);
    assert_eq!(report.skipped(), 6);
}

#[test]
fn test_prepare_bookings_missing_fields_are_absent() {
    let row = RawBookingRow {
        user_name: Some("Max Mustermann".into()),
        service_date: Some("2024-05-01".into()),
        product_sku: Some("Open match registration".into()),
        ..Default::default()
    };
    let (records, report) = prepare_bookings(&[row], &ReconcileSettings::default());

    assert_eq!(report.kept, 1);
    assert_eq!(records[0].amount, 0.0);
    assert!(records[0].time.is_none());
    assert!(records[0].payment_method.is_none());
}

#[test]
fn test_prepare_checkins() {
    let rows = vec![
        RawCheckInRow {
            name: Some("Anna Koch".into()),
            date: Some("2024-05-01".into()),
            time: Some("17:55".into()),
        },
        RawCheckInRow {
            name: None,
            date: Some("2024-05-01".into()),
            time: None,
        },
        RawCheckInRow {
            name: Some("Ben Ott".into()),
            date: Some("01.05.2024 08:10".into()),
            time: None,
        },
    ];
    let (records, report) = prepare_checkins(&rows);

    assert_eq!(report.kept, 2);
    assert_eq!(report.skipped_unparseable, 1);
    assert_eq!(records[0].time, Some(hm(17, 55)));
    assert_eq!(records[1].time, Some(hm(8, 10)));
}

#[test]
fn test_raw_rows_use_feed_column_names() {
    let row: RawBookingRow = serde_json::from_value(serde_json::json!({
        "User name": "Anna Koch",
        "Total": "5,00",
        "Payment id": "P1"
    }))
    .unwrap();
    assert_eq!(row.user_name.as_deref(), Some("Anna Koch"));
    assert!(row.sport.is_none());

    let checkin: RawCheckInRow = serde_json::from_value(serde_json::json!({
        "Vor- & Nachname": "Ben Ott",
        "Datum": "2024-05-01"
    }))
    .unwrap();
    assert_eq!(checkin.name.as_deref(), Some("Ben Ott"));
}
