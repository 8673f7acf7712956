//! Lunar-solar conversion contract.

use crate::model::member::LunarDate;
use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by calendar conversions.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Errors from lunar-solar conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// Year lies outside the converter's supported window.
    YearOutOfRange { year: i32, min: i32, max: i32 },
    /// Requested leap month does not exist in that lunar year.
    LeapMonthMismatch { year: i32, month: u32 },
    /// Lunar month has fewer days than requested.
    DayOutOfMonth { day: u32, month: u32, year: i32, days_in_month: u32 },
    /// Lunar date parts are structurally invalid.
    InvalidLunarDate(LunarDate),
}

impl Display for ConvertError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::YearOutOfRange { year, min, max } => {
                write!(f, "year {year} outside supported range {min}..={max}")
            }
            Self::LeapMonthMismatch { year, month } => {
                write!(f, "lunar year {year} has no leap month {month}")
            }
            Self::DayOutOfMonth {
                day,
                month,
                year,
                days_in_month,
            } => write!(
                f,
                "lunar month {month}/{year} has {days_in_month} days, requested day {day}"
            ),
            Self::InvalidLunarDate(date) => write!(
                f,
                "invalid lunar date {}/{}/{}",
                date.day, date.month, date.year
            ),
        }
    }
}

impl Error for ConvertError {}

/// Pure bidirectional date-system conversion capability.
///
/// Implementations must be deterministic and free of shared mutable state so
/// one converter can serve concurrent calls for different trees.
pub trait LunarSolarConverter: Send + Sync {
    /// Converts one Gregorian day into lunar date parts.
    fn solar_to_lunar(&self, date: NaiveDate) -> ConvertResult<LunarDate>;
    /// Converts lunar date parts (including the leap flag) into a Gregorian day.
    fn lunar_to_solar(&self, date: &LunarDate) -> ConvertResult<NaiveDate>;
}

impl<C: LunarSolarConverter + ?Sized> LunarSolarConverter for &C {
    fn solar_to_lunar(&self, date: NaiveDate) -> ConvertResult<LunarDate> {
        (**self).solar_to_lunar(date)
    }

    fn lunar_to_solar(&self, date: &LunarDate) -> ConvertResult<NaiveDate> {
        (**self).lunar_to_solar(date)
    }
}
