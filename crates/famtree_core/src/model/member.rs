//! Member domain model.
//!
//! # Responsibility
//! - Define the read-only member record supplied by the repository snapshot.
//! - Keep the wire shape aligned with the repository's camelCase fields.
//!
//! # Invariants
//! - `id` is stable and never reused for another member.
//! - `parent_id` and `spouse_id` are weak lookups, never ownership edges.
//! - `relationship == Root` implies `parent_id.is_none()` in well-formed data.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for one member of a family tree.
pub type MemberId = Uuid;

/// Recorded gender of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Advisory relationship tag as entered by the user.
///
/// Only `Root` carries structural meaning; `Child`/`Spouse` are hints and the
/// assembler derives structure from `parent_id`/`spouse_id` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    Root,
    Child,
    Spouse,
}

/// Gregorian calendar date parts as stored by the repository.
///
/// Fields are not validated here; consumers decide how to handle impossible
/// combinations such as `31/4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolarDate {
    pub day: u32,
    pub month: u32,
    pub year: i32,
}

impl SolarDate {
    pub fn new(day: u32, month: u32, year: i32) -> Self {
        Self { day, month, year }
    }
}

/// Lunar calendar date parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LunarDate {
    pub day: u32,
    pub month: u32,
    pub year: i32,
    /// Month is the intercalary copy of `month` in `year`.
    #[serde(default)]
    pub is_leap_month: bool,
}

impl LunarDate {
    pub fn new(day: u32, month: u32, year: i32) -> Self {
        Self {
            day,
            month,
            year,
            is_leap_month: false,
        }
    }

    /// Same date marked as falling in the leap month.
    pub fn leap(day: u32, month: u32, year: i32) -> Self {
        Self {
            is_leap_month: true,
            ..Self::new(day, month, year)
        }
    }
}

/// Lunar date as delivered by the data layer.
///
/// Older rows keep the lunar date as an encoded string; newer rows store the
/// structured object. Use [`crate::model::date_parts::parse_lunar_field`] to
/// normalize either shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LunarField {
    Parts(LunarDate),
    Encoded(String),
    /// Any other JSON shape. Kept so one bad row cannot fail the snapshot.
    Malformed(serde_json::Value),
}

impl From<LunarDate> for LunarField {
    fn from(value: LunarDate) -> Self {
        Self::Parts(value)
    }
}

/// Birth or death date recorded in either or both calendars.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifeDate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solar: Option<SolarDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lunar: Option<LunarField>,
}

impl LifeDate {
    pub fn solar(date: SolarDate) -> Self {
        Self {
            solar: Some(date),
            lunar: None,
        }
    }

    pub fn lunar(field: impl Into<LunarField>) -> Self {
        Self {
            solar: None,
            lunar: Some(field.into()),
        }
    }

    /// Returns whether neither calendar carries a value.
    pub fn is_empty(&self) -> bool {
        self.solar.is_none() && self.lunar.is_none()
    }
}

/// Canonical member record from one tree snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: MemberId,
    pub full_name: String,
    pub gender: Gender,
    pub is_alive: bool,
    pub relationship: Relationship,
    #[serde(default)]
    pub parent_id: Option<MemberId>,
    #[serde(default)]
    pub spouse_id: Option<MemberId>,
    #[serde(default)]
    pub birth: LifeDate,
    #[serde(default)]
    pub death: LifeDate,
}

impl Member {
    /// Creates a living member with no links and no recorded dates.
    pub fn new(id: MemberId, full_name: impl Into<String>, relationship: Relationship) -> Self {
        Self {
            id,
            full_name: full_name.into(),
            gender: Gender::Other,
            is_alive: true,
            relationship,
            parent_id: None,
            spouse_id: None,
            birth: LifeDate::default(),
            death: LifeDate::default(),
        }
    }

    /// Returns whether this member is the declared root of the tree.
    pub fn is_root(&self) -> bool {
        self.relationship == Relationship::Root
    }
}
