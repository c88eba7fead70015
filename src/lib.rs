//! Deterministic statutory accrual engine for paid sick leave.
//!
//! This crate interprets a jurisdiction's earned-sick-time statute, encoded as
//! a versioned ruleset document, and computes accrual, waiting-period and
//! carryover results annotated with the clause they implement. The Michigan
//! Earned Sick Time Act is the reference jurisdiction.

#![warn(missing_docs)]

pub mod calculation;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
