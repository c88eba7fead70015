//! Accrual calculation functionality.
//!
//! This module computes earned sick time for a period from hours worked,
//! applying the tier's accrual method and annual cap. The cap comparison is
//! exact: the per-hour rate is kept as a rational and cross-multiplied, never
//! divided, before deciding whether the cap binds.

use rust_decimal::Decimal;
use tracing::debug;

use crate::config::{AccrualMethod, EmployerSizeTier, Ruleset, TierRules};
use crate::error::{EngineError, EngineResult};
use crate::models::{AccrualFact, AccrualResult, AuditStep, FactViolation};

use super::effective_date::is_effective;
use super::reference::{RuleKey, resolve_reference};

const RULE_ID: &str = "accrual";
const RULE_NAME: &str = "Earned Sick Time Accrual";

/// Calculates leave accrued for one period.
///
/// # Algorithm
///
/// 1. Facts with negative hours or negative prior accrual yield zero accrual
///    and a populated `validation_errors`.
/// 2. If the tier is not yet effective on `as_of_date`, the result is zero
///    and carries the gate's reason.
/// 3. Per-hour-rate tiers earn `hours_worked * rate`; fixed-grant tiers earn
///    the whole annual cap regardless of hours.
/// 4. The amount is limited so that `yearly_accrued_so_far + accrued` never
///    exceeds the annual cap, and is never negative.
///
/// Accrual is not affected by any waiting period.
///
/// # Errors
///
/// Returns `MissingReference` when the rule that produced the result has no
/// citation, and `InvalidConfig` if a per-hour-rate tier has no rate.
///
/// # Examples
///
/// ```
/// use esta_engine::calculation::calculate_accrual;
/// use esta_engine::config::{EmployerSizeTier, RulesetStore};
/// use esta_engine::models::AccrualFact;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let store = RulesetStore::load("./config/michigan-esta.json").unwrap();
/// let fact = AccrualFact {
///     employee_id: None,
///     hours_worked: Decimal::from(300),
///     employer_tier: EmployerSizeTier::Large,
///     yearly_accrued_so_far: Decimal::ZERO,
///     as_of_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
/// };
///
/// let result = calculate_accrual(store.ruleset(), &fact).unwrap();
/// assert_eq!(result.accrued_this_period, Decimal::from(10));
/// assert!(!result.capped);
/// ```
pub fn calculate_accrual(ruleset: &Ruleset, fact: &AccrualFact) -> EngineResult<AccrualResult> {
    let tier = fact.employer_tier;
    let rules = ruleset.tier(tier);
    let gate = is_effective(ruleset, tier, fact.as_of_date);

    let violations = validate_fact(fact);
    if !violations.is_empty() {
        let reason = format!(
            "Fact rejected: {}",
            violations
                .iter()
                .map(|v| format!("{} {}", v.field, v.message))
                .collect::<Vec<_>>()
                .join("; ")
        );
        return zero_result(ruleset, fact, rules, gate.is_effective, RuleKey::Accrual, reason, violations);
    }

    if !gate.is_effective {
        return zero_result(
            ruleset,
            fact,
            rules,
            false,
            RuleKey::EffectiveDate,
            gate.reason,
            Vec::new(),
        );
    }

    let cap = rules.annual_cap_hours;
    let prior = fact.yearly_accrued_so_far;

    // Exact form: raw = numerator / denominator.
    let (numerator, denominator, description) = match rules.accrual_method {
        AccrualMethod::PerHourRate => {
            let rate = rules.accrual_rate.ok_or_else(|| EngineError::InvalidConfig {
                field: format!("tiers.{}.accrualRate", tier),
                message: "required when accrualMethod is per-hour-rate".to_string(),
            })?;
            if rate.den == 0 {
                return Err(EngineError::InvalidConfig {
                    field: format!("tiers.{}.accrualRate", tier),
                    message: "denominator must be non-zero".to_string(),
                });
            }
            let uncapped = rate
                .apply(fact.hours_worked)
                .map(|amount| amount.to_string())
                .unwrap_or_else(|| "more than can be represented".to_string());
            (
                rate.scaled_numerator(fact.hours_worked),
                Decimal::from(rate.den),
                format!(
                    "{} hours x {} = {} hours",
                    fact.hours_worked.normalize(),
                    rate,
                    uncapped
                ),
            )
        }
        AccrualMethod::FixedGrant => (
            Some(cap),
            Decimal::ONE,
            format!("Fixed grant of {} hours", cap.normalize()),
        ),
    };

    let capped = exceeds_cap(prior, numerator, denominator, cap);

    let accrued = if capped {
        (cap - prior).max(Decimal::ZERO).normalize()
    } else {
        match rules.accrual_method {
            AccrualMethod::PerHourRate => rules
                .accrual_rate
                .and_then(|rate| rate.apply(fact.hours_worked))
                .unwrap_or(Decimal::ZERO),
            AccrualMethod::FixedGrant => cap.normalize(),
        }
    };

    let remaining = (cap - prior - accrued).max(Decimal::ZERO).normalize();

    let reason = if capped {
        format!(
            "{}; {} already accrued, limited to annual cap of {} hours: {} hours",
            description,
            prior.normalize(),
            cap.normalize(),
            accrued
        )
    } else {
        format!(
            "{}; {} already accrued, within annual cap of {} hours",
            description,
            prior.normalize(),
            cap.normalize()
        )
    };

    let reference = resolve_reference(ruleset, tier, RuleKey::Accrual)?;

    debug!(
        tier = %tier,
        method = %rules.accrual_method,
        hours_worked = %fact.hours_worked,
        accrued = %accrued,
        capped,
        "Calculated accrual"
    );

    let audit_step = AuditStep {
        rule_id: RULE_ID.to_string(),
        rule_name: RULE_NAME.to_string(),
        clause_ref: reference.citation.clone(),
        input: fact_json(fact, rules),
        output: serde_json::json!({
            "accrued_this_period": accrued.to_string(),
            "capped": capped,
            "remaining_before_cap": remaining.to_string(),
            "effective": true
        }),
        reasoning: reason.clone(),
    };

    Ok(AccrualResult {
        employee_id: fact.employee_id.clone(),
        tier,
        accrued_this_period: accrued,
        method: rules.accrual_method,
        annual_cap_hours: cap,
        remaining_before_cap: remaining,
        capped,
        effective: true,
        reason,
        unpaid_cap_hours: rules.unpaid_cap_hours,
        legislative_reference: reference,
        validation_errors: Vec::new(),
        audit_step,
    })
}

/// Exact test of `prior + numerator / denominator > cap`.
///
/// Rearranged as `numerator > (cap - prior) * denominator` so neither side
/// depends on the size of `prior`. A side that overflows is larger than any
/// representable value; when both do, the period is treated as capped,
/// which grants at most the remaining headroom.
fn exceeds_cap(
    prior: Decimal,
    numerator: Option<Decimal>,
    denominator: Decimal,
    cap: Decimal,
) -> bool {
    if prior > cap {
        return true;
    }
    match (numerator, (cap - prior).checked_mul(denominator)) {
        (Some(numerator), Some(limit)) => numerator > limit,
        (Some(_), None) => false,
        (None, _) => true,
    }
}

fn validate_fact(fact: &AccrualFact) -> Vec<FactViolation> {
    let mut violations = Vec::new();
    if fact.hours_worked < Decimal::ZERO {
        violations.push(FactViolation::new(
            "hours_worked",
            format!("cannot be negative (got {})", fact.hours_worked),
        ));
    }
    if fact.yearly_accrued_so_far < Decimal::ZERO {
        violations.push(FactViolation::new(
            "yearly_accrued_so_far",
            format!("cannot be negative (got {})", fact.yearly_accrued_so_far),
        ));
    }
    violations
}

fn zero_result(
    ruleset: &Ruleset,
    fact: &AccrualFact,
    rules: &TierRules,
    effective: bool,
    rule_key: RuleKey,
    reason: String,
    validation_errors: Vec<FactViolation>,
) -> EngineResult<AccrualResult> {
    let tier: EmployerSizeTier = fact.employer_tier;
    let reference = resolve_reference(ruleset, tier, rule_key)?;
    let remaining = (rules.annual_cap_hours - fact.yearly_accrued_so_far.max(Decimal::ZERO))
        .max(Decimal::ZERO)
        .normalize();

    debug!(tier = %tier, rule = %rule_key, reason = %reason, "Accrual short-circuited to zero");

    let audit_step = AuditStep {
        rule_id: RULE_ID.to_string(),
        rule_name: RULE_NAME.to_string(),
        clause_ref: reference.citation.clone(),
        input: fact_json(fact, rules),
        output: serde_json::json!({
            "accrued_this_period": "0",
            "capped": false,
            "remaining_before_cap": remaining.to_string(),
            "effective": effective
        }),
        reasoning: reason.clone(),
    };

    Ok(AccrualResult {
        employee_id: fact.employee_id.clone(),
        tier,
        accrued_this_period: Decimal::ZERO,
        method: rules.accrual_method,
        annual_cap_hours: rules.annual_cap_hours,
        remaining_before_cap: remaining,
        capped: false,
        effective,
        reason,
        unpaid_cap_hours: rules.unpaid_cap_hours,
        legislative_reference: reference,
        validation_errors,
        audit_step,
    })
}

fn fact_json(fact: &AccrualFact, rules: &TierRules) -> serde_json::Value {
    serde_json::json!({
        "hours_worked": fact.hours_worked.normalize().to_string(),
        "yearly_accrued_so_far": fact.yearly_accrued_so_far.normalize().to_string(),
        "as_of_date": fact.as_of_date.to_string(),
        "tier": fact.employer_tier.as_str(),
        "method": rules.accrual_method.as_str(),
        "rate": rules.accrual_rate.map(|r| r.to_string()),
        "annual_cap_hours": rules.annual_cap_hours.normalize().to_string()
    })
}
