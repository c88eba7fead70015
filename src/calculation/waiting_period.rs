//! Waiting period evaluation.
//!
//! An employer may delay when a new employee can *use* accrued leave, but
//! never beyond the statutory ceiling. This module only answers the usage
//! question; accrual starts on the first day regardless.

use chrono::{Days, NaiveDate};
use tracing::debug;

use crate::config::{EmployerSizeTier, Ruleset};
use crate::error::EngineResult;
use crate::models::{AuditStep, WaitingPeriodFact, WaitingPeriodResult};

use super::reference::{RuleKey, resolve_reference};

/// The waiting ceiling for `tier`: the global ceiling, tightened by the
/// tier's own ceiling where one is configured.
pub fn waiting_ceiling_days(ruleset: &Ruleset, tier: EmployerSizeTier) -> u32 {
    let global = ruleset.max_waiting_period_days();
    ruleset
        .tier(tier)
        .max_waiting_period_days
        .map_or(global, |days| days.min(global))
}

/// Clamps a requested waiting period to the statutory ceiling.
pub fn effective_waiting_days(ruleset: &Ruleset, requested_days: u32, tier: EmployerSizeTier) -> u32 {
    requested_days.min(waiting_ceiling_days(ruleset, tier))
}

/// First date on which an employee hired on `hire_date` may use accrued leave.
///
/// The requested period is clamped to the ceiling even if the employer asked
/// for more. Dates past the end of the calendar saturate at
/// [`NaiveDate::MAX`].
///
/// # Examples
///
/// ```
/// use esta_engine::calculation::waiting_period_end;
/// use esta_engine::config::{EmployerSizeTier, RulesetStore};
/// use chrono::NaiveDate;
///
/// let store = RulesetStore::load("./config/michigan-esta.json").unwrap();
/// let hire = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
///
/// // 200 requested, 120 allowed.
/// let end = waiting_period_end(store.ruleset(), hire, 200, EmployerSizeTier::Large);
/// assert_eq!(end, NaiveDate::from_ymd_opt(2024, 4, 30).unwrap());
/// ```
pub fn waiting_period_end(
    ruleset: &Ruleset,
    hire_date: NaiveDate,
    requested_days: u32,
    tier: EmployerSizeTier,
) -> NaiveDate {
    let days = effective_waiting_days(ruleset, requested_days, tier);
    hire_date
        .checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MAX)
}

/// True when `current_date` falls before the end of the clamped waiting period.
pub fn is_in_waiting_period(
    ruleset: &Ruleset,
    hire_date: NaiveDate,
    current_date: NaiveDate,
    requested_days: u32,
    tier: EmployerSizeTier,
) -> bool {
    current_date < waiting_period_end(ruleset, hire_date, requested_days, tier)
}

/// Evaluates usage eligibility for one employee, with citation and audit step.
///
/// # Errors
///
/// Returns `MissingReference` when the tier has no `waitingPeriod` citation.
pub fn evaluate_waiting_period(
    ruleset: &Ruleset,
    fact: &WaitingPeriodFact,
) -> EngineResult<WaitingPeriodResult> {
    let tier = fact.employer_tier;
    let ceiling = waiting_ceiling_days(ruleset, tier);
    let effective_days = effective_waiting_days(ruleset, fact.requested_waiting_days, tier);
    let clamped = fact.requested_waiting_days > ceiling;
    let end = waiting_period_end(ruleset, fact.hire_date, fact.requested_waiting_days, tier);
    let in_waiting_period = fact.current_date < end;

    let reference = resolve_reference(ruleset, tier, RuleKey::WaitingPeriod)?;

    let reasoning = if clamped {
        format!(
            "Requested {} days exceeds the {}-day ceiling; waiting period ends {} days after hire on {}",
            fact.requested_waiting_days, ceiling, effective_days, end
        )
    } else {
        format!(
            "Waiting period of {} days ends on {}",
            effective_days, end
        )
    };

    debug!(
        tier = %tier,
        requested_days = fact.requested_waiting_days,
        effective_days,
        clamped,
        in_waiting_period,
        "Evaluated waiting period"
    );

    let audit_step = AuditStep {
        rule_id: "waiting_period".to_string(),
        rule_name: "Usage Waiting Period".to_string(),
        clause_ref: reference.citation.clone(),
        input: serde_json::json!({
            "hire_date": fact.hire_date.to_string(),
            "current_date": fact.current_date.to_string(),
            "requested_waiting_days": fact.requested_waiting_days,
            "tier": tier.as_str()
        }),
        output: serde_json::json!({
            "effective_days": effective_days,
            "clamped": clamped,
            "effective_waiting_end_date": end.to_string(),
            "in_waiting_period": in_waiting_period
        }),
        reasoning,
    };

    Ok(WaitingPeriodResult {
        tier,
        hire_date: fact.hire_date,
        requested_days: fact.requested_waiting_days,
        effective_days,
        clamped,
        effective_waiting_end_date: end,
        in_waiting_period,
        legislative_reference: reference,
        audit_step,
    })
}
