//! Calculation logic for the statutory accrual engine.
//!
//! This module contains the pure rule functions: effective-date gating,
//! accrual with annual caps, waiting-period clamping, carryover validation,
//! golden-value integrity checking and legislative reference resolution.
//! Every function takes the ruleset and facts by reference and returns a new
//! value; none reads a clock or holds state.

mod accrual;
mod carryover;
mod effective_date;
mod integrity;
mod reference;
mod waiting_period;

pub use accrual::calculate_accrual;
pub use carryover::validate_carryover;
pub use effective_date::is_effective;
pub use integrity::{GoldenTier, GoldenValues, check_integrity, check_integrity_against};
pub use reference::{RuleKey, resolve_reference};
pub use waiting_period::{
    effective_waiting_days, evaluate_waiting_period, is_in_waiting_period, waiting_ceiling_days,
    waiting_period_end,
};
