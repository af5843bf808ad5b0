use super::*;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_mapping_origin_from_str_valid() {
    assert_eq!("user".parse::<MappingOrigin>().unwrap(), MappingOrigin::User);
    assert_eq!("Manual".parse::<MappingOrigin>().unwrap(), MappingOrigin::Manual);
    assert_eq!(" LEGACY ".parse::<MappingOrigin>().unwrap(), MappingOrigin::Legacy);
}

#[test]
fn test_mapping_origin_from_str_invalid() {
    assert!("learned".parse::<MappingOrigin>().is_err());
    assert!("".parse::<MappingOrigin>().is_err());
}

#[test]
fn test_mapping_origin_serde_lowercase() {
    let json = serde_json::to_string(&MappingOrigin::Auto).unwrap();
    assert_eq!(json, "\"auto\"");
    assert_eq!(MappingOrigin::Manual.to_string(), "manual");
}

#[test]
fn test_booking_record_normalizes_name() {
    let booking = BookingRecord::new("Jürgen Groß-Müller", day(2024, 5, 1), 5.0);
    assert_eq!(booking.name_norm, "juergen gross mueller");
    assert_eq!(booking.natural_key(), "juergen gross mueller_2024-05-01_5.00");
}

#[test]
fn test_time_key_formats_hours_and_minutes() {
    let t = NaiveTime::from_hms_opt(9, 5, 0).unwrap();
    assert_eq!(time_key(Some(t)), "09:05");
    assert_eq!(time_key(None), "");
}

#[test]
fn test_amount_key_two_decimals() {
    assert_eq!(amount_key(0.0), "0.00");
    assert_eq!(amount_key(5.5), "5.50");
}

#[test]
fn test_booking_result_keys() {
    let result = BookingResult {
        analysis_date: day(2024, 5, 1),
        name: "Max Mustermann".into(),
        name_norm: "max mustermann".into(),
        amount: 5.0,
        service_time: NaiveTime::from_hms_opt(18, 30, 0),
        checkin_time: None,
        product: None,
        sport: None,
        payment_method: None,
        payment_id: None,
        club_payment_id: None,
        is_relevant: true,
        has_checkin: false,
        is_employee: false,
        is_error: true,
    };
    assert_eq!(result.dedup_key(), "2024-05-01|max mustermann|18:30");
    assert_eq!(result.natural_key(), "max mustermann_2024-05-01_5.00");
}

#[test]
fn test_checkin_result_dedup_key_without_time() {
    let result = CheckInResult {
        analysis_date: day(2024, 5, 1),
        name: "Anna Koch".into(),
        name_norm: "anna koch".into(),
        checkin_time: None,
        played: false,
        exempt: false,
    };
    assert_eq!(result.dedup_key(), "2024-05-01|anna koch|");
}

#[test]
fn test_booking_result_from_record_clears_flags() {
    let record = BookingRecord::new("Anna Koch", day(2024, 5, 2), 0.0)
        .with_sport("PADEL")
        .with_time(NaiveTime::from_hms_opt(10, 0, 0).unwrap());
    let result = BookingResult::from_record(&record);

    assert_eq!(result.analysis_date, day(2024, 5, 2));
    assert_eq!(result.sport.as_deref(), Some("PADEL"));
    assert_eq!(result.dedup_key(), "2024-05-02|anna koch|10:00");
    assert!(!result.is_relevant && !result.has_checkin && !result.is_error);
}
