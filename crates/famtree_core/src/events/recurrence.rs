//! Next-occurrence resolution for birthdays and death anniversaries.
//!
//! # Responsibility
//! - Resolve the next future occurrence of solar and lunar yearly dates.
//! - Derive one event list for a whole member snapshot.
//!
//! # Invariants
//! - A date counts as upcoming until the end of its day (23:59:59.999).
//! - Lunar occurrences advance by lunar year; leap flags pass through.
//! - One member's bad or unconvertible date never affects other members.
//! - Output order: date ASC, member id ASC, solar before lunar.

use crate::calendar::converter::{ConvertError, ConvertResult, LunarSolarConverter};
use crate::config::{LeapDayPolicy, LeapMonthPolicy, RecurrenceOptions};
use crate::events::event::{
    CalendarEvent, DateField, EventKind, EventSchedule, RecurrenceError, SkipReason, SkippedItem,
};
use crate::model::date_parts::parse_lunar_field;
use crate::model::member::{LunarDate, LunarField, Member, MemberId, SolarDate};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};

// Longest gap between two February 29ths (e.g. 2096 -> 2104) plus one.
const MAX_SOLAR_YEARS_AHEAD: i32 = 9;
// Leap-flag fallback and day clamping each need at most one retry.
const MAX_CONVERSION_ATTEMPTS: usize = 3;

/// Resolves the next Gregorian occurrence of `day/month` at or after
/// `reference`.
///
/// # Errors
/// - [`RecurrenceError::InvalidSolarDate`] when `day/month` exists in no year.
pub fn next_solar_occurrence(
    day: u32,
    month: u32,
    reference: NaiveDateTime,
    policy: LeapDayPolicy,
) -> Result<NaiveDate, RecurrenceError> {
    // 2000 is a leap year, so this accepts 29/2 and rejects 30/2 or 31/4.
    if NaiveDate::from_ymd_opt(2000, month, day).is_none() {
        return Err(RecurrenceError::InvalidSolarDate { day, month });
    }

    let start_year = reference.year();
    for year in start_year..start_year + MAX_SOLAR_YEARS_AHEAD {
        if let Some(candidate) = solar_in_year(day, month, year, policy) {
            if !has_passed(candidate, reference) {
                return Ok(candidate);
            }
        }
    }
    Err(RecurrenceError::NoOccurrence { day, month })
}

/// Resolves the next Gregorian occurrence of a lunar `day/month` at or after
/// `reference`.
///
/// The lunar year of `reference` is tried first, then the following lunar
/// year. `lunar.year` is ignored; `lunar.is_leap_month` is passed through.
///
/// # Errors
/// - [`RecurrenceError::Convert`] when the converter rejects either year.
pub fn next_lunar_occurrence<C: LunarSolarConverter + ?Sized>(
    lunar: &LunarDate,
    reference: NaiveDateTime,
    converter: &C,
    policy: LeapMonthPolicy,
) -> Result<NaiveDate, RecurrenceError> {
    let current_year = converter.solar_to_lunar(reference.date())?.year;
    let candidate = lunar_in_year(lunar, current_year, converter, policy)?;
    if !has_passed(candidate, reference) {
        return Ok(candidate);
    }
    lunar_in_year(lunar, current_year + 1, converter, policy).map_err(Into::into)
}

/// Computes the next birthday/anniversary events for a member snapshot.
///
/// Never fails; unreadable or unresolvable dates are listed in
/// [`EventSchedule::skipped`].
pub fn compute_events<C: LunarSolarConverter + ?Sized>(
    members: &[Member],
    reference: NaiveDateTime,
    converter: &C,
    options: &RecurrenceOptions,
) -> EventSchedule {
    compute_events_cancellable(
        members,
        reference,
        converter,
        options,
        &AtomicBool::new(false),
    )
}

/// Same as [`compute_events`], but stops before the next member once
/// `cancel` is set.
///
/// Events resolved before cancellation are kept and sorted;
/// [`EventSchedule::cancelled`] reports the early stop.
pub fn compute_events_cancellable<C: LunarSolarConverter + ?Sized>(
    members: &[Member],
    reference: NaiveDateTime,
    converter: &C,
    options: &RecurrenceOptions,
    cancel: &AtomicBool,
) -> EventSchedule {
    let mut collector = EventCollector {
        reference,
        converter,
        options,
        schedule: EventSchedule::default(),
    };

    for (processed, member) in members.iter().enumerate() {
        if cancel.load(Ordering::Relaxed) {
            info!(
                "event=events_cancelled module=events processed={} total={}",
                processed,
                members.len()
            );
            collector.schedule.cancelled = true;
            break;
        }
        collector.collect_member(member);
    }

    let mut schedule = collector.schedule;
    schedule.events.sort_by(|left, right| {
        left.date
            .cmp(&right.date)
            .then_with(|| left.member_id.cmp(&right.member_id))
            .then_with(|| left.is_lunar.cmp(&right.is_lunar))
    });
    debug!(
        "event=events_computed module=events members={} events={} skipped={} cancelled={}",
        members.len(),
        schedule.events.len(),
        schedule.skipped.len(),
        schedule.cancelled
    );
    schedule
}

struct EventCollector<'c, C: ?Sized> {
    reference: NaiveDateTime,
    converter: &'c C,
    options: &'c RecurrenceOptions,
    schedule: EventSchedule,
}

impl<C: LunarSolarConverter + ?Sized> EventCollector<'_, C> {
    fn collect_member(&mut self, member: &Member) {
        if member.is_alive {
            if let Some(solar) = member.birth.solar {
                self.push_solar(member.id, solar, EventKind::Birthday, DateField::BirthSolar);
            }
            if let Some(lunar) = &member.birth.lunar {
                self.push_lunar(member.id, lunar, EventKind::Birthday, DateField::BirthLunar);
            }
            return;
        }

        // A present lunar death date wins even when it turns out unusable.
        if let Some(lunar) = &member.death.lunar {
            self.push_lunar(
                member.id,
                lunar,
                EventKind::Anniversary,
                DateField::DeathLunar,
            );
        } else if let Some(solar) = member.death.solar {
            self.push_solar(
                member.id,
                solar,
                EventKind::Anniversary,
                DateField::DeathSolar,
            );
        }
    }

    fn push_solar(
        &mut self,
        member_id: MemberId,
        solar: SolarDate,
        kind: EventKind,
        field: DateField,
    ) {
        match next_solar_occurrence(
            solar.day,
            solar.month,
            self.reference,
            self.options.leap_day_policy,
        ) {
            Ok(date) => self.schedule.events.push(CalendarEvent {
                date,
                kind,
                member_id,
                is_lunar: false,
                original_label: solar_label(&solar),
            }),
            Err(err) => self.skip(member_id, field, SkipReason::Unresolvable(err)),
        }
    }

    fn push_lunar(
        &mut self,
        member_id: MemberId,
        field_value: &LunarField,
        kind: EventKind,
        field: DateField,
    ) {
        let lunar = match parse_lunar_field(field_value) {
            Ok(lunar) => lunar,
            Err(err) => return self.skip(member_id, field, SkipReason::Unparseable(err)),
        };
        match next_lunar_occurrence(
            &lunar,
            self.reference,
            self.converter,
            self.options.leap_month_policy,
        ) {
            Ok(date) => self.schedule.events.push(CalendarEvent {
                date,
                kind,
                member_id,
                is_lunar: true,
                original_label: lunar_label(&lunar),
            }),
            Err(err) => self.skip(member_id, field, SkipReason::Unresolvable(err)),
        }
    }

    fn skip(&mut self, member_id: MemberId, field: DateField, reason: SkipReason) {
        warn!(
            "event=date_skipped module=events member={} field={} reason=\"{}\"",
            member_id,
            field.as_str(),
            reason
        );
        self.schedule.skipped.push(SkippedItem {
            member_id,
            field,
            reason,
        });
    }
}

fn solar_in_year(day: u32, month: u32, year: i32, policy: LeapDayPolicy) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).or_else(|| {
        match (day, month, policy) {
            (29, 2, LeapDayPolicy::ShiftToFeb28) => NaiveDate::from_ymd_opt(year, 2, 28),
            _ => None,
        }
    })
}

/// Converts `lunar` placed in `year`, applying the month policies.
///
/// Day 30 in a 29-day month is observed on day 29.
fn lunar_in_year<C: LunarSolarConverter + ?Sized>(
    lunar: &LunarDate,
    year: i32,
    converter: &C,
    policy: LeapMonthPolicy,
) -> ConvertResult<NaiveDate> {
    let mut target = LunarDate { year, ..*lunar };
    for _ in 0..MAX_CONVERSION_ATTEMPTS {
        match converter.lunar_to_solar(&target) {
            Err(ConvertError::LeapMonthMismatch { .. })
                if target.is_leap_month && policy == LeapMonthPolicy::FallBackToRegularMonth =>
            {
                target.is_leap_month = false;
            }
            Err(ConvertError::DayOutOfMonth { days_in_month, .. })
                if days_in_month > 0 && days_in_month < target.day =>
            {
                target.day = days_in_month;
            }
            other => return other,
        }
    }
    converter.lunar_to_solar(&target)
}

fn has_passed(candidate: NaiveDate, reference: NaiveDateTime) -> bool {
    match candidate.and_hms_milli_opt(23, 59, 59, 999) {
        Some(end_of_day) => end_of_day < reference,
        None => candidate < reference.date(),
    }
}

fn solar_label(date: &SolarDate) -> String {
    format!("{:02}/{:02}/{}", date.day, date.month, date.year)
}

fn lunar_label(date: &LunarDate) -> String {
    let suffix = if date.is_leap_month {
        "lunar, leap month"
    } else {
        "lunar"
    };
    format!("{:02}/{:02}/{} ({suffix})", date.day, date.month, date.year)
}

#[cfg(test)]
mod tests {
    use super::{has_passed, lunar_label, next_solar_occurrence, solar_label};
    use crate::config::LeapDayPolicy;
    use crate::events::event::RecurrenceError;
    use crate::model::member::{LunarDate, SolarDate};
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(year: i32, month: u32, day: u32, hour: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(hour, min, 0)
            .unwrap()
    }

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn same_day_is_still_upcoming_until_midnight() {
        assert!(!has_passed(ymd(2024, 6, 5), at(2024, 6, 5, 23, 59)));
        assert!(has_passed(ymd(2024, 6, 5), at(2024, 6, 6, 0, 0)));
    }

    #[test]
    fn solar_occurrence_stays_in_year_when_upcoming() {
        let next =
            next_solar_occurrence(5, 6, at(2024, 6, 5, 12, 0), LeapDayPolicy::ShiftToFeb28)
                .unwrap();
        assert_eq!(next, ymd(2024, 6, 5));
    }

    #[test]
    fn leap_day_policies_differ_in_common_years() {
        let reference = at(2025, 1, 10, 8, 0);
        assert_eq!(
            next_solar_occurrence(29, 2, reference, LeapDayPolicy::ShiftToFeb28).unwrap(),
            ymd(2025, 2, 28)
        );
        assert_eq!(
            next_solar_occurrence(29, 2, reference, LeapDayPolicy::SkipToNextLeapYear).unwrap(),
            ymd(2028, 2, 29)
        );
    }

    #[test]
    fn leap_day_is_kept_in_leap_years() {
        let next = next_solar_occurrence(
            29,
            2,
            at(2024, 1, 1, 0, 0),
            LeapDayPolicy::ShiftToFeb28,
        )
        .unwrap();
        assert_eq!(next, ymd(2024, 2, 29));
    }

    #[test]
    fn skip_policy_crosses_century_gap() {
        let next = next_solar_occurrence(
            29,
            2,
            at(2096, 3, 1, 0, 0),
            LeapDayPolicy::SkipToNextLeapYear,
        )
        .unwrap();
        assert_eq!(next, ymd(2104, 2, 29));
    }

    #[test]
    fn impossible_solar_dates_are_rejected() {
        let err = next_solar_occurrence(31, 4, at(2024, 1, 1, 0, 0), LeapDayPolicy::ShiftToFeb28)
            .unwrap_err();
        assert_eq!(err, RecurrenceError::InvalidSolarDate { day: 31, month: 4 });
    }

    #[test]
    fn labels_render_source_dates() {
        assert_eq!(solar_label(&SolarDate::new(5, 6, 1990)), "05/06/1990");
        assert_eq!(
            lunar_label(&LunarDate::new(10, 3, 2023)),
            "10/03/2023 (lunar)"
        );
        assert_eq!(
            lunar_label(&LunarDate::leap(1, 2, 2023)),
            "01/02/2023 (lunar, leap month)"
        );
    }
}
