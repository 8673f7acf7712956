use chrono::NaiveDate;
use famtree_core::calendar::astronomical::{MAX_SUPPORTED_YEAR, MIN_SUPPORTED_YEAR};
use famtree_core::{
    next_lunar_occurrence, AstronomicalConverter, ConvertError, LeapMonthPolicy, LunarDate,
    LunarSolarConverter, RecurrenceError,
};

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

#[test]
fn vietnamese_new_year_dates() {
    let converter = AstronomicalConverter::vietnam();
    let expected = [
        (2023, ymd(2023, 1, 22)),
        (2024, ymd(2024, 2, 10)),
        (2025, ymd(2025, 1, 29)),
        (2026, ymd(2026, 2, 17)),
    ];
    for (year, new_year) in expected {
        assert_eq!(
            converter.lunar_to_solar(&LunarDate::new(1, 1, year)).unwrap(),
            new_year,
            "lunar new year {year}"
        );
    }
}

#[test]
fn mid_autumn_festival_dates() {
    let converter = AstronomicalConverter::vietnam();
    assert_eq!(
        converter.lunar_to_solar(&LunarDate::new(15, 8, 2023)).unwrap(),
        ymd(2023, 9, 29)
    );
    assert_eq!(
        converter.lunar_to_solar(&LunarDate::new(15, 8, 2024)).unwrap(),
        ymd(2024, 9, 17)
    );
}

#[test]
fn time_zone_changes_month_boundaries() {
    let vietnam = AstronomicalConverter::vietnam();
    let china = AstronomicalConverter::new(8.0);
    let new_year_1985 = LunarDate::new(1, 1, 1985);

    assert_eq!(vietnam.lunar_to_solar(&new_year_1985).unwrap(), ymd(1985, 1, 21));
    assert_eq!(china.lunar_to_solar(&new_year_1985).unwrap(), ymd(1985, 2, 20));
    assert_eq!(china.time_zone_hours(), 8.0);
}

#[test]
fn conversions_agree_both_ways_across_supported_window() {
    let converter = AstronomicalConverter::vietnam();
    let mut day = ymd(MIN_SUPPORTED_YEAR, 3, 1);
    while day <= ymd(MAX_SUPPORTED_YEAR, 12, 31) {
        let lunar = converter.solar_to_lunar(day).unwrap();
        assert!((1..=30).contains(&lunar.day), "solar {day} -> {lunar:?}");
        assert_eq!(converter.lunar_to_solar(&lunar).unwrap(), day, "solar {day}");
        day = day.succ_opt().unwrap();
    }
}

#[test]
fn month_starts_just_after_mean_new_moon_estimate() {
    let converter = AstronomicalConverter::vietnam();
    for day in [
        ymd(1877, 4, 13),
        ymd(1885, 3, 16),
        ymd(2054, 5, 7),
        ymd(2062, 4, 9),
    ] {
        let lunar = converter.solar_to_lunar(day).unwrap();
        assert!(lunar.day >= 28, "solar {day} -> {lunar:?}");
        assert_eq!(converter.lunar_to_solar(&lunar).unwrap(), day);
    }
}

#[test]
fn supported_window_edges() {
    let converter = AstronomicalConverter::default();
    assert!(converter
        .lunar_to_solar(&LunarDate::new(1, 6, MIN_SUPPORTED_YEAR))
        .is_ok());
    assert!(converter
        .lunar_to_solar(&LunarDate::new(1, 6, MAX_SUPPORTED_YEAR))
        .is_ok());
    assert_eq!(
        converter
            .lunar_to_solar(&LunarDate::new(1, 6, MAX_SUPPORTED_YEAR + 1))
            .unwrap_err(),
        ConvertError::YearOutOfRange {
            year: MAX_SUPPORTED_YEAR + 1,
            min: MIN_SUPPORTED_YEAR,
            max: MAX_SUPPORTED_YEAR,
        }
    );
}

#[test]
fn day_thirty_in_short_month_reports_month_length() {
    let converter = AstronomicalConverter::vietnam();
    let short_month = (1..=12)
        .map(|month| LunarDate::new(30, month, 2024))
        .find_map(|date| match converter.lunar_to_solar(&date) {
            Err(ConvertError::DayOutOfMonth { days_in_month, .. }) => Some(days_in_month),
            _ => None,
        });
    assert_eq!(short_month, Some(29));
}

#[test]
fn next_lunar_occurrence_ignores_source_year() {
    let converter = AstronomicalConverter::vietnam();
    let reference = ymd(2024, 3, 1).and_hms_opt(8, 0, 0).unwrap();

    let from_old_record = next_lunar_occurrence(
        &LunarDate::new(10, 3, 1901),
        reference,
        &converter,
        LeapMonthPolicy::Strict,
    )
    .unwrap();
    assert_eq!(from_old_record, ymd(2024, 4, 18));
}

#[test]
fn next_lunar_occurrence_reports_out_of_range_reference() {
    let converter = AstronomicalConverter::vietnam();
    let reference = ymd(2300, 1, 1).and_hms_opt(0, 0, 0).unwrap();

    let err = next_lunar_occurrence(
        &LunarDate::new(1, 1, 2000),
        reference,
        &converter,
        LeapMonthPolicy::Strict,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        RecurrenceError::Convert(ConvertError::YearOutOfRange { year: 2300, .. })
    ));
}
