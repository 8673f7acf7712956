//! Recurring calendar events derived from member dates.
//!
//! # Responsibility
//! - Resolve birthdays and death anniversaries to their next occurrence.
//! - Record skipped date fields instead of failing a whole batch.
//!
//! # Invariants
//! - Event lists are sorted by date, then member id.

pub mod event;
pub mod recurrence;
