//! Core configuration.
//!
//! # Responsibility
//! - Hold calendar policies that the data cannot decide on its own.
//! - Load those policies from a JSON document with defaults for every field.
//!   Keys are camelCase like the member snapshot; policy values are snake_case.
//!
//! # Invariants
//! - An empty JSON object yields the default configuration.
//! - Time zone offsets are limited to `-12..=14` hours.

use crate::calendar::astronomical::{AstronomicalConverter, VIETNAM_TIME_ZONE_HOURS};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

const MIN_TIME_ZONE_HOURS: f64 = -12.0;
const MAX_TIME_ZONE_HOURS: f64 = 14.0;

/// How a solar February 29 recurs in non-leap years.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeapDayPolicy {
    /// Observe on February 28.
    #[default]
    ShiftToFeb28,
    /// Wait for the next year that has a February 29.
    SkipToNextLeapYear,
}

/// How a leap-month lunar date recurs in years without that leap month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeapMonthPolicy {
    /// Pass the leap flag through; a missing leap month skips the event.
    #[default]
    Strict,
    /// Retry with the regular month of the same number.
    FallBackToRegularMonth,
}

/// Policies used by the recurrence calculator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecurrenceOptions {
    pub leap_day_policy: LeapDayPolicy,
    pub leap_month_policy: LeapMonthPolicy,
}

/// Settings for the bundled lunar converter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConverterConfig {
    /// UTC offset (hours) where lunar month boundaries are observed.
    pub time_zone_offset_hours: f64,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            time_zone_offset_hours: VIETNAM_TIME_ZONE_HOURS,
        }
    }
}

impl ConverterConfig {
    /// Builds the converter described by this configuration.
    pub fn build(&self) -> AstronomicalConverter {
        AstronomicalConverter::new(self.time_zone_offset_hours)
    }
}

/// Top-level core configuration document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub recurrence: RecurrenceOptions,
    pub converter: ConverterConfig,
}

impl CoreConfig {
    /// Parses and validates a JSON configuration document.
    ///
    /// # Errors
    /// - Returns [`ConfigError::Json`] when the document is not valid JSON for
    ///   this schema.
    /// - Returns [`ConfigError::TimeZoneOutOfRange`] for offsets outside
    ///   `-12..=14`.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON configuration file.
    ///
    /// # Errors
    /// - Returns [`ConfigError::Io`] when the file cannot be read.
    /// - Otherwise the same errors as [`CoreConfig::from_json_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Validates cross-field invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let offset = self.converter.time_zone_offset_hours;
        if !offset.is_finite() || !(MIN_TIME_ZONE_HOURS..=MAX_TIME_ZONE_HOURS).contains(&offset) {
            return Err(ConfigError::TimeZoneOutOfRange(offset));
        }
        Ok(())
    }
}

/// Errors from configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    Io(std::io::Error),
    /// Document is malformed or has wrongly typed fields.
    Json(serde_json::Error),
    /// Converter time zone offset is outside the accepted window.
    TimeZoneOutOfRange(f64),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "cannot read configuration: {err}"),
            Self::Json(err) => write!(f, "invalid configuration: {err}"),
            Self::TimeZoneOutOfRange(value) => write!(
                f,
                "timeZoneOffsetHours must be within {MIN_TIME_ZONE_HOURS}..={MAX_TIME_ZONE_HOURS}, got {value}"
            ),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::TimeZoneOutOfRange(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}
