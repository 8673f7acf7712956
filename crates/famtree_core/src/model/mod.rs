//! Family member domain model.
//!
//! # Responsibility
//! - Define the read-only member snapshot shape consumed by core algorithms.
//! - Normalize loosely-typed date fields at the data-layer boundary.
//!
//! # Invariants
//! - Every member is identified by a stable `MemberId`.
//! - Core code never mutates snapshot members.

pub mod date_parts;
pub mod member;
