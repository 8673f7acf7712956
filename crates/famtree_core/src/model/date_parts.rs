//! Boundary normalization for loosely-typed lunar date fields.
//!
//! # Responsibility
//! - Turn a [`LunarField`] (structured, encoded string, or junk) into a strict
//!   [`LunarDate`].
//! - Report failures as values so callers can skip one field and keep going.
//!
//! # Invariants
//! - Parsing never panics.
//! - Returned dates satisfy `1 <= day <= 30`, `1 <= month <= 12`, `year >= 1`.
//!
//! # Accepted encodings
//! - JSON object text: `{"day":10,"month":3,"year":2023,"isLeapMonth":false}`
//! - `D/M/YYYY` with `/`, `-` or `.` separators, optionally followed by a
//!   leap marker: `leap`, `l` or `nhuận`, with or without parentheses.

use crate::model::member::{LunarDate, LunarField};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

const MAX_LUNAR_DAY: u32 = 30;
const MAX_INPUT_CHARS: usize = 256;

static DMY_LUNAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\d{1,2})\s*[/.\-]\s*(\d{1,2})\s*[/.\-]\s*(\d{1,4})(?:\s*\(?\s*(leap|l|nhuận)\s*\)?)?$")
        .expect("valid lunar date regex")
});

/// Reasons a lunar field could not be normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LunarParseError {
    /// Encoded string is blank after trim.
    Empty,
    /// Encoded string matches no accepted encoding.
    Unrecognized(String),
    /// Field is neither an object nor a string.
    UnsupportedShape,
    /// Day is outside `1..=30`.
    DayOutOfRange(u32),
    /// Month is outside `1..=12`.
    MonthOutOfRange(u32),
    /// Year is zero or negative.
    YearOutOfRange(i32),
}

impl Display for LunarParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "lunar date string is empty"),
            Self::Unrecognized(value) => write!(f, "lunar date string is not recognized: `{value}`"),
            Self::UnsupportedShape => write!(f, "lunar date field has an unsupported shape"),
            Self::DayOutOfRange(day) => write!(f, "lunar day out of range: {day}"),
            Self::MonthOutOfRange(month) => write!(f, "lunar month out of range: {month}"),
            Self::YearOutOfRange(year) => write!(f, "lunar year out of range: {year}"),
        }
    }
}

impl Error for LunarParseError {}

/// Normalizes one lunar field into strict date parts.
///
/// # Errors
/// - Returns [`LunarParseError`] when the field cannot be read or holds
///   out-of-range parts.
pub fn parse_lunar_field(field: &LunarField) -> Result<LunarDate, LunarParseError> {
    match field {
        LunarField::Parts(parts) => validate_lunar(*parts),
        LunarField::Encoded(raw) => parse_lunar_str(raw),
        LunarField::Malformed(_) => Err(LunarParseError::UnsupportedShape),
    }
}

/// Parses one encoded lunar date string.
///
/// # Errors
/// - Returns [`LunarParseError::Empty`] for blank input.
/// - Returns [`LunarParseError::Unrecognized`] when no encoding matches.
pub fn parse_lunar_str(raw: &str) -> Result<LunarDate, LunarParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LunarParseError::Empty);
    }

    if trimmed.starts_with('{') {
        return serde_json::from_str::<LunarDate>(trimmed)
            .map_err(|_| unrecognized(trimmed))
            .and_then(validate_lunar);
    }

    let captures = DMY_LUNAR_RE
        .captures(trimmed)
        .ok_or_else(|| unrecognized(trimmed))?;
    let day = parse_number::<u32>(&captures[1], trimmed)?;
    let month = parse_number::<u32>(&captures[2], trimmed)?;
    let year = parse_number::<i32>(&captures[3], trimmed)?;

    validate_lunar(LunarDate {
        day,
        month,
        year,
        is_leap_month: captures.get(4).is_some(),
    })
}

fn validate_lunar(date: LunarDate) -> Result<LunarDate, LunarParseError> {
    if date.day == 0 || date.day > MAX_LUNAR_DAY {
        return Err(LunarParseError::DayOutOfRange(date.day));
    }
    if date.month == 0 || date.month > 12 {
        return Err(LunarParseError::MonthOutOfRange(date.month));
    }
    if date.year < 1 {
        return Err(LunarParseError::YearOutOfRange(date.year));
    }
    Ok(date)
}

fn parse_number<T: std::str::FromStr>(digits: &str, input: &str) -> Result<T, LunarParseError> {
    digits.parse::<T>().map_err(|_| unrecognized(input))
}

fn unrecognized(input: &str) -> LunarParseError {
    // Input comes from user-entered rows; keep error payloads bounded.
    LunarParseError::Unrecognized(input.chars().take(MAX_INPUT_CHARS).collect())
}

#[cfg(test)]
mod tests {
    use super::{parse_lunar_field, parse_lunar_str, LunarParseError};
    use crate::model::member::{LunarDate, LunarField};

    #[test]
    fn parses_slash_separated_date() {
        assert_eq!(
            parse_lunar_str("10/3/2023").unwrap(),
            LunarDate::new(10, 3, 2023)
        );
    }

    #[test]
    fn parses_dash_and_dot_separators_with_padding() {
        assert_eq!(
            parse_lunar_str(" 05-03-1945 ").unwrap(),
            LunarDate::new(5, 3, 1945)
        );
        assert_eq!(
            parse_lunar_str("1.12.1900").unwrap(),
            LunarDate::new(1, 12, 1900)
        );
    }

    #[test]
    fn parses_leap_markers() {
        assert_eq!(
            parse_lunar_str("15/2/2023 (leap)").unwrap(),
            LunarDate::leap(15, 2, 2023)
        );
        assert_eq!(
            parse_lunar_str("15/2/2023 L").unwrap(),
            LunarDate::leap(15, 2, 2023)
        );
        assert_eq!(
            parse_lunar_str("15/2/2023 nhuận").unwrap(),
            LunarDate::leap(15, 2, 2023)
        );
    }

    #[test]
    fn parses_json_encoded_object() {
        let parsed =
            parse_lunar_str(r#"{"day":10,"month":3,"year":2023,"isLeapMonth":true}"#).unwrap();
        assert_eq!(parsed, LunarDate::leap(10, 3, 2023));
    }

    #[test]
    fn json_without_leap_flag_defaults_to_regular_month() {
        let parsed = parse_lunar_str(r#"{"day":1,"month":1,"year":2000}"#).unwrap();
        assert!(!parsed.is_leap_month);
    }

    #[test]
    fn rejects_blank_and_garbage() {
        assert_eq!(parse_lunar_str("   ").unwrap_err(), LunarParseError::Empty);
        assert!(matches!(
            parse_lunar_str("sometime in spring").unwrap_err(),
            LunarParseError::Unrecognized(_)
        ));
        assert!(matches!(
            parse_lunar_str("{not json").unwrap_err(),
            LunarParseError::Unrecognized(_)
        ));
    }

    #[test]
    fn rejects_out_of_range_parts() {
        assert_eq!(
            parse_lunar_str("31/1/2000").unwrap_err(),
            LunarParseError::DayOutOfRange(31)
        );
        assert_eq!(
            parse_lunar_str("1/13/2000").unwrap_err(),
            LunarParseError::MonthOutOfRange(13)
        );
        assert_eq!(
            parse_lunar_str("1/1/0").unwrap_err(),
            LunarParseError::YearOutOfRange(0)
        );
    }

    #[test]
    fn structured_parts_are_validated_too() {
        let field = LunarField::Parts(LunarDate::new(0, 3, 2023));
        assert_eq!(
            parse_lunar_field(&field).unwrap_err(),
            LunarParseError::DayOutOfRange(0)
        );
    }

    #[test]
    fn malformed_shape_is_reported() {
        let field = LunarField::Malformed(serde_json::json!([10, 3, 2023]));
        assert_eq!(
            parse_lunar_field(&field).unwrap_err(),
            LunarParseError::UnsupportedShape
        );
    }

    #[test]
    fn unrecognized_payload_is_truncated() {
        let long = "x".repeat(1_000);
        match parse_lunar_str(&long).unwrap_err() {
            LunarParseError::Unrecognized(value) => assert_eq!(value.chars().count(), 256),
            other => panic!("unexpected error: {other}"),
        }
    }
}
