//! Result records returned by the accrual engine.
//!
//! Every result is a plain value: no timestamps, identifiers or other
//! run-dependent fields, so serializing the same result twice yields the same
//! bytes.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{AccrualMethod, EmployerSizeTier};

/// A problem with a single fact record, reported in the result rather than
/// returned as an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactViolation {
    /// The offending fact field.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl FactViolation {
    /// Creates a new violation.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A record of one rule application, for explainability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The statutory citation for this rule.
    pub clause_ref: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// A citation and plain-language explanation attached to a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegislativeReference {
    /// The rule key the citation was resolved for.
    pub rule_key: String,
    /// The tier whose reference map supplied it.
    pub tier: EmployerSizeTier,
    /// The statutory citation.
    pub citation: String,
    /// Plain-language explanation of the rule.
    pub summary: String,
}

/// Whether a tier's obligations exist on a given date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveDateStatus {
    /// The tier that was checked.
    pub tier: EmployerSizeTier,
    /// True when `as_of_date` is on or after `effective_date`.
    pub is_effective: bool,
    /// The tier's configured effective date.
    pub effective_date: NaiveDate,
    /// The date that was checked.
    pub as_of_date: NaiveDate,
    /// Days remaining until the tier becomes effective; zero once effective.
    pub days_until_effective: i64,
    /// Why the tier is or is not effective.
    pub reason: String,
}

/// The outcome of an accrual calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualResult {
    /// The employee identifier from the fact, if one was supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
    /// The tier the calculation used.
    pub tier: EmployerSizeTier,
    /// Leave earned in this period, after the annual cap.
    pub accrued_this_period: Decimal,
    /// The accrual method applied.
    pub method: AccrualMethod,
    /// The tier's annual cap.
    pub annual_cap_hours: Decimal,
    /// Cap headroom left after this period's accrual.
    pub remaining_before_cap: Decimal,
    /// True when the uncapped amount would have exceeded the annual cap.
    pub capped: bool,
    /// False when the tier was not yet effective on the as-of date.
    pub effective: bool,
    /// Explanation of how the amount was reached.
    pub reason: String,
    /// Portion of the entitlement that may be unpaid, where configured.
    pub unpaid_cap_hours: Option<Decimal>,
    /// Citation for the rule that produced the amount.
    pub legislative_reference: LegislativeReference,
    /// Problems with the supplied fact. Non-empty means the accrual is zero.
    pub validation_errors: Vec<FactViolation>,
    /// Audit record of the calculation.
    pub audit_step: AuditStep,
}

impl AccrualResult {
    /// True when the fact was valid.
    pub fn is_valid(&self) -> bool {
        self.validation_errors.is_empty()
    }
}

/// The outcome of a waiting-period evaluation.
///
/// This describes usage eligibility only. Accrual is never gated by it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitingPeriodResult {
    /// The tier the evaluation used.
    pub tier: EmployerSizeTier,
    /// The employee's hire date.
    pub hire_date: NaiveDate,
    /// The waiting period the employer asked for.
    pub requested_days: u32,
    /// The waiting period after clamping to the statutory ceiling.
    pub effective_days: u32,
    /// True when the request exceeded the ceiling.
    pub clamped: bool,
    /// First date on which accrued leave may be used.
    pub effective_waiting_end_date: NaiveDate,
    /// True when `current_date` falls before the end date.
    pub in_waiting_period: bool,
    /// Citation for the waiting-period rule.
    pub legislative_reference: LegislativeReference,
    /// Audit record of the evaluation.
    pub audit_step: AuditStep,
}

/// The outcome of a year-end carryover validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarryoverResult {
    /// The tier the validation used.
    pub tier: EmployerSizeTier,
    /// The balance that was validated.
    pub balance: Decimal,
    /// Hours carried into the next year.
    pub carryover_amount: Decimal,
    /// Hours forfeited.
    pub forfeited_amount: Decimal,
    /// The tier's carryover cap.
    pub carryover_cap_hours: Decimal,
    /// False when the balance itself was invalid.
    pub is_valid: bool,
    /// Problems with the supplied balance.
    pub validation_errors: Vec<FactViolation>,
    /// Citation for the carryover rule.
    pub legislative_reference: LegislativeReference,
    /// Audit record of the validation.
    pub audit_step: AuditStep,
}

/// The outcome of a golden-value integrity check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    /// False when any blocking error was found.
    pub valid: bool,
    /// The version of the ruleset that was checked.
    pub ruleset_version: String,
    /// The fingerprint of the ruleset that was checked.
    pub fingerprint: String,
    /// Blocking errors, in check order.
    pub errors: Vec<String>,
    /// Non-blocking anomalies, in check order.
    pub warnings: Vec<String>,
}
