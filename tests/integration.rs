//! Integration tests for the statutory accrual engine.
//!
//! This test suite drives the public surface end to end:
//! - Loading and verifying the reference ruleset
//! - Accrual for large (per-hour) and small (fixed-grant) employers
//! - Effective-date gating
//! - Waiting-period clamping and its independence from accrual
//! - Carryover and forfeiture
//! - Drift detection and refusal
//! - Legislative references on every result

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use esta_engine::calculation::{RuleKey, check_integrity};
use esta_engine::config::{AccrualMethod, EmployerSizeTier, RulesetStore};
use esta_engine::engine::RulesEngine;
use esta_engine::error::EngineError;
use esta_engine::models::{AccrualFact, WaitingPeriodFact};

// =============================================================================
// Test Helpers
// =============================================================================

const RULESET_PATH: &str = "./config/michigan-esta.json";

fn create_engine() -> RulesEngine {
    let store = RulesetStore::load(RULESET_PATH).expect("Failed to load ruleset");
    RulesEngine::new(store).expect("Reference ruleset failed integrity")
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::from_str(s).unwrap()
}

fn accrual_fact(tier: EmployerSizeTier, hours: &str, prior: &str, as_of: &str) -> AccrualFact {
    AccrualFact {
        employee_id: None,
        hours_worked: dec(hours),
        employer_tier: tier,
        yearly_accrued_so_far: dec(prior),
        as_of_date: date(as_of),
    }
}

fn edited_store(edit: impl FnOnce(&mut Value)) -> RulesetStore {
    let content = std::fs::read_to_string(RULESET_PATH).unwrap();
    let mut doc: Value = serde_json::from_str(&content).unwrap();
    edit(&mut doc);
    RulesetStore::from_json_str(&doc.to_string()).unwrap()
}

// =============================================================================
// Accrual
// =============================================================================

#[test]
fn test_large_employer_300_hours() {
    let engine = create_engine();
    let result = engine
        .calculate_accrual(&accrual_fact(EmployerSizeTier::Large, "300", "0", "2025-07-01"))
        .unwrap();

    assert_eq!(result.accrued_this_period, dec("10.0"));
    assert!(!result.capped);
    assert_eq!(result.annual_cap_hours, dec("72"));
    assert_eq!(result.legislative_reference.citation, "MCL 408.963(1)");
}

#[test]
fn test_large_employer_2200_hours_capped() {
    let engine = create_engine();
    let result = engine
        .calculate_accrual(&accrual_fact(EmployerSizeTier::Large, "2200", "0", "2025-12-31"))
        .unwrap();

    assert_eq!(result.accrued_this_period, dec("72.0"));
    assert!(result.capped);
}

#[test]
fn test_small_employer_fixed_grant() {
    let engine = create_engine();
    let result = engine
        .calculate_accrual(&accrual_fact(EmployerSizeTier::Small, "7", "0", "2025-10-01"))
        .unwrap();

    assert_eq!(result.accrued_this_period, dec("40.0"));
    assert_eq!(result.method, AccrualMethod::FixedGrant);

    let again = engine
        .calculate_accrual(&accrual_fact(EmployerSizeTier::Small, "7", "40", "2025-11-01"))
        .unwrap();
    assert_eq!(again.accrued_this_period, Decimal::ZERO);
}

#[test]
fn test_accrual_running_total_never_exceeds_cap() {
    let engine = create_engine();
    let mut total = Decimal::ZERO;

    // 52 weekly periods of 45 hours: 1.5 hours a week until the cap binds.
    for _ in 0..52 {
        let result = engine
            .calculate_accrual(&AccrualFact {
                employee_id: None,
                hours_worked: dec("45"),
                employer_tier: EmployerSizeTier::Large,
                yearly_accrued_so_far: total,
                as_of_date: date("2025-06-01"),
            })
            .unwrap();
        total += result.accrued_this_period;
        assert!(total <= dec("72"));
    }

    assert_eq!(total, dec("72"));
}

#[test]
fn test_minutes_based_fact() {
    let engine = create_engine();
    let fact = AccrualFact::from_minutes(
        18_000,
        EmployerSizeTier::Large,
        Decimal::ZERO,
        date("2025-06-01"),
    );

    let result = engine.calculate_accrual(&fact).unwrap();
    assert_eq!(result.accrued_this_period, dec("10"));
}

// =============================================================================
// Effective dates
// =============================================================================

#[test]
fn test_small_employer_before_effective_date_accrues_nothing() {
    let engine = create_engine();
    let result = engine
        .calculate_accrual(&accrual_fact(EmployerSizeTier::Small, "1000", "0", "2025-06-01"))
        .unwrap();

    assert_eq!(result.accrued_this_period, Decimal::ZERO);
    assert!(!result.effective);
    assert_eq!(result.legislative_reference.rule_key, "effectiveDate");
}

#[test]
fn test_large_tier_effective_while_small_is_not() {
    let engine = create_engine();
    let as_of = date("2025-06-01");

    assert!(engine.is_effective(EmployerSizeTier::Large, as_of).is_effective);

    let small = engine.is_effective(EmployerSizeTier::Small, as_of);
    assert!(!small.is_effective);
    assert_eq!(small.days_until_effective, 122);
}

// =============================================================================
// Waiting period
// =============================================================================

#[test]
fn test_waiting_period_clamped_to_120_days() {
    let engine = create_engine();
    let end = engine.waiting_period_end(date("2024-01-01"), 200, EmployerSizeTier::Large);

    assert_eq!(end, date("2024-04-30"));
}

#[test]
fn test_waiting_period_does_not_gate_accrual() {
    let engine = create_engine();
    let hire = date("2025-03-01");
    let today = date("2025-04-01");

    assert!(engine.is_in_waiting_period(hire, today, 90, EmployerSizeTier::Large));

    let accrual = engine
        .calculate_accrual(&accrual_fact(EmployerSizeTier::Large, "150", "0", "2025-04-01"))
        .unwrap();
    assert_eq!(accrual.accrued_this_period, dec("5"));
}

#[test]
fn test_waiting_period_result_carries_citation() {
    let engine = create_engine();
    let result = engine
        .evaluate_waiting_period(&WaitingPeriodFact {
            hire_date: date("2025-01-01"),
            current_date: date("2025-02-01"),
            requested_waiting_days: 60,
            employer_tier: EmployerSizeTier::Small,
        })
        .unwrap();

    assert!(result.in_waiting_period);
    assert_eq!(result.effective_waiting_end_date, date("2025-03-02"));
    assert_eq!(result.legislative_reference.citation, "MCL 408.963(6)");
}

// =============================================================================
// Carryover
// =============================================================================

#[test]
fn test_carryover_90_against_72() {
    let engine = create_engine();
    let result = engine
        .validate_carryover(dec("90"), EmployerSizeTier::Large)
        .unwrap();

    assert_eq!(result.carryover_amount, dec("72"));
    assert_eq!(result.forfeited_amount, dec("18"));
}

#[test]
fn test_carryover_negative_balance_reported() {
    let engine = create_engine();
    let result = engine
        .validate_carryover(dec("-1"), EmployerSizeTier::Small)
        .unwrap();

    assert!(!result.is_valid);
    assert_eq!(result.validation_errors[0].field, "current_balance");
}

// =============================================================================
// Integrity
// =============================================================================

#[test]
fn test_drifted_rate_is_reported_and_refused() {
    let store = edited_store(|doc| {
        doc["tiers"]["large"]["accrualRate"] = serde_json::json!({"num": 1, "den": 20});
    });

    let report = check_integrity(store.ruleset());
    assert!(!report.valid);
    assert!(report.errors.iter().any(|e| e.contains("accrualRate")));

    assert!(matches!(
        RulesEngine::new(store),
        Err(EngineError::IntegrityViolation { .. })
    ));
}

#[test]
fn test_yaml_ruleset_verifies_like_json() {
    let content = std::fs::read_to_string(RULESET_PATH).unwrap();
    let doc: Value = serde_json::from_str(&content).unwrap();
    let yaml = serde_yaml::to_string(&doc).unwrap();

    let engine = RulesEngine::new(RulesetStore::from_yaml_str(&yaml).unwrap()).unwrap();
    assert_eq!(engine.fingerprint(), create_engine().fingerprint());
}

// =============================================================================
// References
// =============================================================================

#[test]
fn test_every_result_rule_has_a_citation_for_both_tiers() {
    let engine = create_engine();
    for tier in [EmployerSizeTier::Small, EmployerSizeTier::Large] {
        for key in [
            RuleKey::Accrual,
            RuleKey::Carryover,
            RuleKey::WaitingPeriod,
            RuleKey::EffectiveDate,
        ] {
            let reference = engine.resolve_reference(tier, key).unwrap();
            assert!(!reference.citation.is_empty());
            assert!(!reference.summary.is_empty());
        }
    }
}

#[test]
fn test_unpaid_leave_citation_only_on_small_tier() {
    let engine = create_engine();
    assert!(
        engine
            .resolve_reference(EmployerSizeTier::Small, RuleKey::UnpaidLeave)
            .is_ok()
    );
    assert!(matches!(
        engine.resolve_reference(EmployerSizeTier::Large, RuleKey::UnpaidLeave),
        Err(EngineError::MissingReference { .. })
    ));
}
