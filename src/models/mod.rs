//! Core data models for the statutory accrual engine.
//!
//! Facts flow in, results flow out; neither side holds references to the
//! other or to the ruleset.

mod facts;
mod results;

pub use facts::{AccrualFact, CarryoverFact, WaitingPeriodFact};
pub use results::{
    AccrualResult, AuditStep, CarryoverResult, EffectiveDateStatus, FactViolation,
    IntegrityReport, LegislativeReference, WaitingPeriodResult,
};
