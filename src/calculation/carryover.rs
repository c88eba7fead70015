//! Carryover validation functionality.
//!
//! This module splits an end-of-year balance into the portion carried into
//! the next year and the portion forfeited, against the tier's carryover cap.

use rust_decimal::Decimal;
use tracing::debug;

use crate::config::{EmployerSizeTier, Ruleset};
use crate::error::EngineResult;
use crate::models::{AuditStep, CarryoverResult, FactViolation};

use super::reference::{RuleKey, resolve_reference};

/// Validates a year-end balance against the carryover cap.
///
/// Branches, in order of precedence:
/// 1. `balance < 0`: invalid; carryover and forfeit are both zero and an
///    error is reported in the result.
/// 2. `balance <= cap`: everything carries over.
/// 3. `balance > cap`: the cap carries over and the rest is forfeited.
///
/// For any non-negative balance `carryover_amount + forfeited_amount == balance`.
///
/// # Errors
///
/// Returns `MissingReference` when the tier has no `carryover` citation.
///
/// # Examples
///
/// ```
/// use esta_engine::calculation::validate_carryover;
/// use esta_engine::config::{EmployerSizeTier, RulesetStore};
/// use rust_decimal::Decimal;
///
/// let store = RulesetStore::load("./config/michigan-esta.json").unwrap();
/// let result = validate_carryover(store.ruleset(), Decimal::from(90), EmployerSizeTier::Large).unwrap();
///
/// assert_eq!(result.carryover_amount, Decimal::from(72));
/// assert_eq!(result.forfeited_amount, Decimal::from(18));
/// ```
pub fn validate_carryover(
    ruleset: &Ruleset,
    balance: Decimal,
    tier: EmployerSizeTier,
) -> EngineResult<CarryoverResult> {
    let cap = ruleset.tier(tier).carryover_cap_hours;
    let reference = resolve_reference(ruleset, tier, RuleKey::Carryover)?;

    let mut validation_errors = Vec::new();
    let (carryover_amount, forfeited_amount, reasoning) = if balance < Decimal::ZERO {
        validation_errors.push(FactViolation::new(
            "current_balance",
            "balance cannot be negative",
        ));
        (
            Decimal::ZERO,
            Decimal::ZERO,
            format!(
                "Balance {} is negative; nothing carried over or forfeited",
                balance.normalize()
            ),
        )
    } else if balance <= cap {
        (
            balance,
            Decimal::ZERO,
            format!(
                "Balance {} is within the carryover cap of {}; all of it carries over",
                balance.normalize(),
                cap.normalize()
            ),
        )
    } else {
        let forfeited = balance - cap;
        (
            cap,
            forfeited,
            format!(
                "Balance {} exceeds the carryover cap of {}; {} carries over, {} forfeited",
                balance.normalize(),
                cap.normalize(),
                cap.normalize(),
                forfeited.normalize()
            ),
        )
    };

    let carryover_amount = carryover_amount.normalize();
    let forfeited_amount = forfeited_amount.normalize();
    let is_valid = validation_errors.is_empty();

    debug!(
        tier = %tier,
        balance = %balance,
        carryover = %carryover_amount,
        forfeited = %forfeited_amount,
        is_valid,
        "Validated carryover"
    );

    let audit_step = AuditStep {
        rule_id: "carryover".to_string(),
        rule_name: "Year-End Carryover".to_string(),
        clause_ref: reference.citation.clone(),
        input: serde_json::json!({
            "balance": balance.normalize().to_string(),
            "tier": tier.as_str(),
            "carryover_cap_hours": cap.normalize().to_string()
        }),
        output: serde_json::json!({
            "carryover_amount": carryover_amount.to_string(),
            "forfeited_amount": forfeited_amount.to_string(),
            "is_valid": is_valid
        }),
        reasoning,
    };

    Ok(CarryoverResult {
        tier,
        balance,
        carryover_amount,
        forfeited_amount,
        carryover_cap_hours: cap,
        is_valid,
        validation_errors,
        legislative_reference: reference,
        audit_step,
    })
}
