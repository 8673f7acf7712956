//! Core domain logic for family trees.
//! This crate is the single source of truth for tree-shape and calendar
//! recurrence invariants; UI and storage layers consume it.

pub mod calendar;
pub mod config;
pub mod events;
pub mod family;
pub mod logging;
pub mod model;

pub use calendar::astronomical::AstronomicalConverter;
pub use calendar::converter::{ConvertError, ConvertResult, LunarSolarConverter};
pub use config::{ConfigError, CoreConfig, LeapDayPolicy, LeapMonthPolicy, RecurrenceOptions};
pub use events::event::{
    CalendarEvent, DateField, EventKind, EventSchedule, RecurrenceError, SkipReason, SkippedItem,
};
pub use events::recurrence::{
    compute_events, compute_events_cancellable, next_lunar_occurrence, next_solar_occurrence,
};
pub use family::assembler::assemble;
pub use family::forest::{FamilyForest, FamilyGroupNode, IntegrityWarning};
pub use logging::{init_logging, logging_status, LogLevel};
pub use model::date_parts::{parse_lunar_field, parse_lunar_str, LunarParseError};
pub use model::member::{
    Gender, LifeDate, LunarDate, LunarField, Member, MemberId, Relationship, SolarDate,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
