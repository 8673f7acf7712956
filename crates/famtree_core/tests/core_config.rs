use famtree_core::{
    compute_events, ConfigError, CoreConfig, LeapDayPolicy, LeapMonthPolicy, LifeDate, Member,
    Relationship, SolarDate,
};
use std::io::Write;
use uuid::Uuid;

#[test]
fn load_reads_policies_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "recurrence": {{
                "leapDayPolicy": "skip_to_next_leap_year",
                "leapMonthPolicy": "fall_back_to_regular_month"
            }},
            "converter": {{ "timeZoneOffsetHours": 8 }}
        }}"#
    )
    .unwrap();

    let config = CoreConfig::load(file.path()).unwrap();
    assert_eq!(
        config.recurrence.leap_day_policy,
        LeapDayPolicy::SkipToNextLeapYear
    );
    assert_eq!(
        config.recurrence.leap_month_policy,
        LeapMonthPolicy::FallBackToRegularMonth
    );
    assert_eq!(config.converter.build().time_zone_hours(), 8.0);
}

#[test]
fn partial_document_keeps_other_defaults() {
    let config =
        CoreConfig::from_json_str(r#"{"recurrence":{"leapDayPolicy":"skip_to_next_leap_year"}}"#)
            .unwrap();
    assert_eq!(config.recurrence.leap_month_policy, LeapMonthPolicy::Strict);
    assert_eq!(config.converter.time_zone_offset_hours, 7.0);
}

#[test]
fn missing_file_reports_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = CoreConfig::load(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
    assert!(err.to_string().contains("cannot read configuration"));
}

#[test]
fn unknown_policy_name_is_rejected() {
    let err = CoreConfig::from_json_str(r#"{"recurrence":{"leapDayPolicy":"ignore"}}"#)
        .unwrap_err();
    assert!(matches!(err, ConfigError::Json(_)));
}

#[test]
fn loaded_policies_drive_recurrence() {
    let config = CoreConfig::from_json_str(
        r#"{"recurrence":{"leapDayPolicy":"skip_to_next_leap_year"}}"#,
    )
    .unwrap();
    let mut member = Member::new(Uuid::from_u128(1), "leap baby", Relationship::Root);
    member.birth = LifeDate::solar(SolarDate::new(29, 2, 2000));
    let reference = chrono::NaiveDate::from_ymd_opt(2025, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();

    let schedule = compute_events(
        &[member],
        reference,
        &config.converter.build(),
        &config.recurrence,
    );
    assert_eq!(
        schedule.events[0].date,
        chrono::NaiveDate::from_ymd_opt(2028, 2, 29).unwrap()
    );
}
