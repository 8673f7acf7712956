//! Family hierarchy assembly.
//!
//! # Responsibility
//! - Rebuild a spouse-grouped parent/child forest from a flat snapshot.
//! - Report structural anomalies as warnings instead of failing.
//!
//! # See also
//! - `assembler` for the grouping and attachment rules.

pub mod assembler;
pub mod forest;
