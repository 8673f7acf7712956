//! Astronomical lunar-solar converter.
//!
//! Lunar months start on the local day of the new moon; month 11 is the month
//! containing the winter solstice; a 13-month year marks as leap the first
//! month that contains no major solar term.
//!
//! # Invariants
//! - Supported lunar years are `1800..=2100`.
//! - Results depend only on the inputs and the configured time zone.

use crate::calendar::converter::{ConvertError, ConvertResult, LunarSolarConverter};
use crate::model::member::LunarDate;
use chrono::{Datelike, NaiveDate};
use std::f64::consts::PI;

/// Earliest supported lunar year.
pub const MIN_SUPPORTED_YEAR: i32 = 1800;
/// Latest supported lunar year.
pub const MAX_SUPPORTED_YEAR: i32 = 2100;
/// Vietnam standard time offset.
pub const VIETNAM_TIME_ZONE_HOURS: f64 = 7.0;

const SYNODIC_MONTH: f64 = 29.530588853;
// Julian day of the 1900-01-01 new moon.
const EPOCH_NEW_MOON_JD: f64 = 2415021.076998695;
// Julian day number of 0000-12-31 in the proleptic Gregorian calendar.
const JDN_CE_OFFSET: i64 = 1_721_425;

/// Lunar calendar converter using mean new-moon and solar longitude series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AstronomicalConverter {
    time_zone_hours: f64,
}

impl AstronomicalConverter {
    /// Creates a converter for the given UTC offset in hours.
    pub fn new(time_zone_hours: f64) -> Self {
        Self { time_zone_hours }
    }

    /// Converter for the Vietnamese calendar (UTC+7).
    pub fn vietnam() -> Self {
        Self::new(VIETNAM_TIME_ZONE_HOURS)
    }

    pub fn time_zone_hours(&self) -> f64 {
        self.time_zone_hours
    }

    fn new_moon_day(&self, k: i64) -> i64 {
        (new_moon(k) + 0.5 + self.time_zone_hours / 24.0).floor() as i64
    }

    fn sun_longitude_sector(&self, day_number: i64) -> i64 {
        let jd = day_number as f64 - 0.5 - self.time_zone_hours / 24.0;
        (sun_longitude(jd) / PI * 6.0).floor() as i64
    }

    /// Day number of the new moon that starts lunar month 11 of `year`.
    fn lunar_month_11(&self, year: i32) -> i64 {
        let off = jdn_from_ymd(year, 12, 31) - 2_415_021;
        let k = (off as f64 / SYNODIC_MONTH).floor() as i64;
        let nm = self.new_moon_day(k);
        if self.sun_longitude_sector(nm) >= 9 {
            self.new_moon_day(k - 1)
        } else {
            nm
        }
    }

    /// Offset (in months after month 11) of the leap month in a 13-month year.
    fn leap_month_offset(&self, a11: i64) -> i64 {
        let k = ((a11 as f64 - EPOCH_NEW_MOON_JD) / SYNODIC_MONTH + 0.5).floor() as i64;
        let mut i = 1;
        let mut arc = self.sun_longitude_sector(self.new_moon_day(k + i));
        loop {
            let last = arc;
            i += 1;
            arc = self.sun_longitude_sector(self.new_moon_day(k + i));
            if arc == last || i >= 14 {
                break;
            }
        }
        i - 1
    }
}

impl Default for AstronomicalConverter {
    fn default() -> Self {
        Self::vietnam()
    }
}

impl LunarSolarConverter for AstronomicalConverter {
    fn solar_to_lunar(&self, date: NaiveDate) -> ConvertResult<LunarDate> {
        let solar_year = date.year();
        // Early solar months still belong to the previous lunar year.
        if !(MIN_SUPPORTED_YEAR..=MAX_SUPPORTED_YEAR + 1).contains(&solar_year) {
            return Err(year_out_of_range(solar_year));
        }

        let day_number = jdn_from_date(date);
        let mut k = ((day_number as f64 - EPOCH_NEW_MOON_JD) / SYNODIC_MONTH).floor() as i64;
        // The mean-month estimate can overshoot the true new moon by a day.
        while self.new_moon_day(k) > day_number {
            k -= 1;
        }
        let mut month_start = self.new_moon_day(k + 1);
        if month_start > day_number {
            month_start = self.new_moon_day(k);
        }

        let mut a11 = self.lunar_month_11(solar_year);
        let mut b11 = a11;
        let mut lunar_year;
        if a11 >= month_start {
            lunar_year = solar_year;
            a11 = self.lunar_month_11(solar_year - 1);
        } else {
            lunar_year = solar_year + 1;
            b11 = self.lunar_month_11(solar_year + 1);
        }

        let lunar_day = (day_number - month_start + 1) as u32;
        let diff = (month_start - a11) / 29;
        let mut is_leap_month = false;
        let mut lunar_month = diff + 11;
        if b11 - a11 > 365 {
            let leap_diff = self.leap_month_offset(a11);
            if diff >= leap_diff {
                lunar_month = diff + 10;
                is_leap_month = diff == leap_diff;
            }
        }
        if lunar_month > 12 {
            lunar_month -= 12;
        }
        if lunar_month >= 11 && diff < 4 {
            lunar_year -= 1;
        }

        ensure_year_in_range(lunar_year)?;
        Ok(LunarDate {
            day: lunar_day,
            month: lunar_month as u32,
            year: lunar_year,
            is_leap_month,
        })
    }

    fn lunar_to_solar(&self, date: &LunarDate) -> ConvertResult<NaiveDate> {
        if date.day == 0 || date.day > 30 || date.month == 0 || date.month > 12 {
            return Err(ConvertError::InvalidLunarDate(*date));
        }
        ensure_year_in_range(date.year)?;

        let (a11, b11) = if date.month < 11 {
            (
                self.lunar_month_11(date.year - 1),
                self.lunar_month_11(date.year),
            )
        } else {
            (
                self.lunar_month_11(date.year),
                self.lunar_month_11(date.year + 1),
            )
        };

        let k = (0.5 + (a11 as f64 - EPOCH_NEW_MOON_JD) / SYNODIC_MONTH).floor() as i64;
        let mut off = date.month as i64 - 11;
        if off < 0 {
            off += 12;
        }

        let has_leap_month = b11 - a11 > 365;
        if has_leap_month {
            let leap_off = self.leap_month_offset(a11);
            let mut leap_month = leap_off - 2;
            if leap_month < 0 {
                leap_month += 12;
            }
            if date.is_leap_month && date.month as i64 != leap_month {
                return Err(ConvertError::LeapMonthMismatch {
                    year: date.year,
                    month: date.month,
                });
            }
            if date.is_leap_month || off >= leap_off {
                off += 1;
            }
        } else if date.is_leap_month {
            return Err(ConvertError::LeapMonthMismatch {
                year: date.year,
                month: date.month,
            });
        }

        let month_start = self.new_moon_day(k + off);
        let days_in_month = (self.new_moon_day(k + off + 1) - month_start) as u32;
        if date.day > days_in_month {
            return Err(ConvertError::DayOutOfMonth {
                day: date.day,
                month: date.month,
                year: date.year,
                days_in_month,
            });
        }

        date_from_jdn(month_start + date.day as i64 - 1)
            .ok_or_else(|| year_out_of_range(date.year))
    }
}

fn ensure_year_in_range(year: i32) -> ConvertResult<()> {
    if (MIN_SUPPORTED_YEAR..=MAX_SUPPORTED_YEAR).contains(&year) {
        Ok(())
    } else {
        Err(year_out_of_range(year))
    }
}

fn year_out_of_range(year: i32) -> ConvertError {
    ConvertError::YearOutOfRange {
        year,
        min: MIN_SUPPORTED_YEAR,
        max: MAX_SUPPORTED_YEAR,
    }
}

fn jdn_from_date(date: NaiveDate) -> i64 {
    date.num_days_from_ce() as i64 + JDN_CE_OFFSET
}

fn jdn_from_ymd(year: i32, month: u32, day: u32) -> i64 {
    NaiveDate::from_ymd_opt(year, month, day)
        .map(jdn_from_date)
        // Only reached for years chrono cannot represent; range checks run first.
        .unwrap_or_default()
}

fn date_from_jdn(jdn: i64) -> Option<NaiveDate> {
    let days = i32::try_from(jdn - JDN_CE_OFFSET).ok()?;
    NaiveDate::from_num_days_from_ce_opt(days)
}

/// Julian day (UT) of the `k`-th new moon after 1900-01-01.
fn new_moon(k: i64) -> f64 {
    let k = k as f64;
    let t = k / 1236.85;
    let t2 = t * t;
    let t3 = t2 * t;
    let dr = PI / 180.0;

    let mut jd1 = 2415020.75933 + 29.53058868 * k + 0.0001178 * t2 - 0.000000155 * t3;
    jd1 += 0.00033 * ((166.56 + 132.87 * t - 0.009173 * t2) * dr).sin();
    let m = 359.2242 + 29.10535608 * k - 0.0000333 * t2 - 0.00000347 * t3;
    let mpr = 306.0253 + 385.81691806 * k + 0.0107306 * t2 + 0.00001236 * t3;
    let f = 21.2964 + 390.67050646 * k - 0.0016528 * t2 - 0.00000239 * t3;

    let mut c1 = (0.1734 - 0.000393 * t) * (m * dr).sin() + 0.0021 * (2.0 * dr * m).sin();
    c1 = c1 - 0.4068 * (mpr * dr).sin() + 0.0161 * (dr * 2.0 * mpr).sin();
    c1 -= 0.0004 * (dr * 3.0 * mpr).sin();
    c1 = c1 + 0.0104 * (dr * 2.0 * f).sin() - 0.0051 * (dr * (m + mpr)).sin();
    c1 = c1 - 0.0074 * (dr * (m - mpr)).sin() + 0.0004 * (dr * (2.0 * f + m)).sin();
    c1 = c1 - 0.0004 * (dr * (2.0 * f - m)).sin() - 0.0006 * (dr * (2.0 * f + mpr)).sin();
    c1 = c1 + 0.0010 * (dr * (2.0 * f - mpr)).sin() + 0.0005 * (dr * (2.0 * mpr + m)).sin();

    let delta_t = if t < -11.0 {
        0.001 + 0.000839 * t + 0.0002261 * t2 - 0.00000845 * t3 - 0.000000081 * t * t3
    } else {
        -0.000278 + 0.000265 * t + 0.000262 * t2
    };
    jd1 + c1 - delta_t
}

/// Apparent solar longitude in radians, normalized to `[0, 2π)`.
fn sun_longitude(jd: f64) -> f64 {
    let t = (jd - 2451545.0) / 36525.0;
    let t2 = t * t;
    let dr = PI / 180.0;

    let m = 357.52910 + 35999.05030 * t - 0.0001559 * t2 - 0.00000048 * t * t2;
    let l0 = 280.46645 + 36000.76983 * t + 0.0003032 * t2;
    let mut dl = (1.914600 - 0.004817 * t - 0.000014 * t2) * (dr * m).sin();
    dl += (0.019993 - 0.000101 * t) * (dr * 2.0 * m).sin() + 0.000290 * (dr * 3.0 * m).sin();

    let l = (l0 + dl) * dr;
    l - 2.0 * PI * (l / (2.0 * PI)).floor()
}

#[cfg(test)]
mod tests {
    use super::{date_from_jdn, jdn_from_date, AstronomicalConverter};
    use crate::calendar::converter::{ConvertError, LunarSolarConverter};
    use crate::model::member::LunarDate;
    use chrono::NaiveDate;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn julian_day_number_matches_reference_epoch() {
        assert_eq!(jdn_from_date(ymd(2000, 1, 1)), 2_451_545);
        assert_eq!(date_from_jdn(2_451_545), Some(ymd(2000, 1, 1)));
    }

    #[test]
    fn lunar_new_year_dates_match_published_calendar() {
        let converter = AstronomicalConverter::vietnam();
        assert_eq!(
            converter.lunar_to_solar(&LunarDate::new(1, 1, 2023)).unwrap(),
            ymd(2023, 1, 22)
        );
        assert_eq!(
            converter.lunar_to_solar(&LunarDate::new(1, 1, 2024)).unwrap(),
            ymd(2024, 2, 10)
        );
        assert_eq!(
            converter.lunar_to_solar(&LunarDate::new(1, 1, 2025)).unwrap(),
            ymd(2025, 1, 29)
        );
    }

    #[test]
    fn solar_to_lunar_reads_new_year() {
        let converter = AstronomicalConverter::vietnam();
        assert_eq!(
            converter.solar_to_lunar(ymd(2024, 2, 10)).unwrap(),
            LunarDate::new(1, 1, 2024)
        );
        assert_eq!(
            converter.solar_to_lunar(ymd(2024, 2, 11)).unwrap(),
            LunarDate::new(2, 1, 2024)
        );
        assert_eq!(
            converter.solar_to_lunar(ymd(2024, 4, 18)).unwrap(),
            LunarDate::new(10, 3, 2024)
        );
    }

    #[test]
    fn leap_month_round_trips() {
        let converter = AstronomicalConverter::vietnam();
        let leap = LunarDate::leap(1, 2, 2023);
        let solar = converter.lunar_to_solar(&leap).unwrap();
        assert_eq!(solar, ymd(2023, 3, 22));
        assert_eq!(converter.solar_to_lunar(solar).unwrap(), leap);
    }

    #[test]
    fn leap_flag_on_wrong_month_is_rejected() {
        let converter = AstronomicalConverter::vietnam();
        let err = converter
            .lunar_to_solar(&LunarDate::leap(1, 3, 2023))
            .unwrap_err();
        assert_eq!(
            err,
            ConvertError::LeapMonthMismatch {
                year: 2023,
                month: 3
            }
        );

        let err = converter
            .lunar_to_solar(&LunarDate::leap(1, 2, 2024))
            .unwrap_err();
        assert!(matches!(err, ConvertError::LeapMonthMismatch { .. }));
    }

    #[test]
    fn rejects_years_outside_supported_window() {
        let converter = AstronomicalConverter::vietnam();
        assert!(matches!(
            converter.lunar_to_solar(&LunarDate::new(1, 1, 1700)),
            Err(ConvertError::YearOutOfRange { year: 1700, .. })
        ));
        assert!(matches!(
            converter.lunar_to_solar(&LunarDate::new(1, 1, 2101)),
            Err(ConvertError::YearOutOfRange { year: 2101, .. })
        ));
        assert!(matches!(
            converter.solar_to_lunar(ymd(1700, 6, 1)),
            Err(ConvertError::YearOutOfRange { .. })
        ));
    }

    #[test]
    fn rejects_structurally_invalid_parts() {
        let converter = AstronomicalConverter::vietnam();
        let bad = LunarDate::new(0, 5, 2000);
        assert_eq!(
            converter.lunar_to_solar(&bad).unwrap_err(),
            ConvertError::InvalidLunarDate(bad)
        );
    }
}
