//! Lunar-solar calendar conversion.
//!
//! # Responsibility
//! - Define the converter capability injected into recurrence computations.
//! - Ship a deterministic astronomical implementation for 1800..=2100.
//!
//! # Invariants
//! - Conversions are pure; identical inputs yield identical outputs.
//! - Leap-month flags pass through conversions unchanged.

pub mod astronomical;
pub mod converter;
