//! Calendar event read models.

use crate::calendar::converter::ConvertError;
use crate::model::date_parts::LunarParseError;
use crate::model::member::MemberId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Recurring event category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Yearly marker of a deceased member's death date.
    Anniversary,
    /// Yearly marker of a living member's birth date.
    Birthday,
}

/// Next occurrence of one member's recurring date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    /// Gregorian day of the next occurrence.
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub member_id: MemberId,
    /// Occurrence was resolved from a lunar date.
    pub is_lunar: bool,
    /// Source date as recorded, e.g. `10/03/2023 (lunar)`.
    pub original_label: String,
}

impl CalendarEvent {
    /// Whole days from `from` to this event; negative when already past.
    pub fn days_until(&self, from: NaiveDate) -> i64 {
        self.date.signed_duration_since(from).num_days()
    }
}

/// Member date field an event is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateField {
    BirthSolar,
    BirthLunar,
    DeathSolar,
    DeathLunar,
}

impl DateField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BirthSolar => "birth.solar",
            Self::BirthLunar => "birth.lunar",
            Self::DeathSolar => "death.solar",
            Self::DeathLunar => "death.lunar",
        }
    }
}

/// Errors from next-occurrence resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecurrenceError {
    /// Day/month pair does not exist in any year.
    InvalidSolarDate { day: u32, month: u32 },
    /// No matching day was found within the search horizon.
    NoOccurrence { day: u32, month: u32 },
    /// Lunar-solar conversion failed.
    Convert(ConvertError),
}

impl Display for RecurrenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSolarDate { day, month } => {
                write!(f, "solar date {day}/{month} does not exist")
            }
            Self::NoOccurrence { day, month } => {
                write!(f, "no upcoming occurrence found for {day}/{month}")
            }
            Self::Convert(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RecurrenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Convert(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConvertError> for RecurrenceError {
    fn from(value: ConvertError) -> Self {
        Self::Convert(value)
    }
}

/// Why one date field produced no event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Lunar field could not be normalized.
    Unparseable(LunarParseError),
    /// Date was readable but its next occurrence could not be resolved.
    Unresolvable(RecurrenceError),
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unparseable(err) => write!(f, "unparseable: {err}"),
            Self::Unresolvable(err) => write!(f, "unresolvable: {err}"),
        }
    }
}

/// Non-fatal note for a date field that contributed no event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedItem {
    pub member_id: MemberId,
    pub field: DateField,
    pub reason: SkipReason,
}

/// Sorted events plus notes for every skipped field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventSchedule {
    /// Ascending by date, then member id, then solar before lunar.
    pub events: Vec<CalendarEvent>,
    pub skipped: Vec<SkippedItem>,
    /// Computation stopped early on caller request.
    pub cancelled: bool,
}

impl EventSchedule {
    /// Events falling within `days` days from `from`, inclusive.
    pub fn within_days(&self, from: NaiveDate, days: i64) -> Vec<&CalendarEvent> {
        self.events
            .iter()
            .filter(|event| (0..=days).contains(&event.days_until(from)))
            .collect()
    }

    pub fn events_for(&self, member_id: MemberId) -> Vec<&CalendarEvent> {
        self.events
            .iter()
            .filter(|event| event.member_id == member_id)
            .collect()
    }
}
