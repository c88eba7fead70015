//! Integrity-gated entry point for callers.
//!
//! [`RulesEngine`] owns a loaded ruleset that has passed its golden-value
//! check. It cannot be constructed from a ruleset whose integrity report has
//! errors, so every calculation made through it runs against rules known to
//! match the statute.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::calculation::{
    GoldenValues, RuleKey, calculate_accrual, check_integrity_against, evaluate_waiting_period,
    is_effective, is_in_waiting_period, resolve_reference, validate_carryover, waiting_period_end,
};
use crate::config::{EmployerSizeTier, Ruleset, RulesetStore};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AccrualFact, AccrualResult, CarryoverFact, CarryoverResult, EffectiveDateStatus,
    IntegrityReport, LegislativeReference, WaitingPeriodFact, WaitingPeriodResult,
};

/// A verified ruleset plus the operations callers consume.
///
/// Cloning is cheap and clones share the same ruleset; the engine holds no
/// mutable state, so clones may be used from any number of threads at once.
///
/// # Example
///
/// ```no_run
/// use esta_engine::config::{EmployerSizeTier, RulesetStore};
/// use esta_engine::engine::RulesEngine;
/// use esta_engine::models::AccrualFact;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let engine = RulesEngine::new(RulesetStore::load("./config/michigan-esta.json")?)?;
/// let result = engine.calculate_accrual(&AccrualFact {
///     employee_id: None,
///     hours_worked: Decimal::from(300),
///     employer_tier: EmployerSizeTier::Large,
///     yearly_accrued_so_far: Decimal::ZERO,
///     as_of_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
/// })?;
/// println!("accrued {} ({})", result.accrued_this_period, result.legislative_reference.citation);
/// # Ok::<(), esta_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RulesEngine {
    store: Arc<RulesetStore>,
    report: Arc<IntegrityReport>,
}

impl RulesEngine {
    /// Verifies `store` against the Michigan ESTA golden values.
    ///
    /// # Errors
    ///
    /// Returns `IntegrityViolation` listing every blocking error if the
    /// ruleset has drifted from the statute.
    pub fn new(store: RulesetStore) -> EngineResult<Self> {
        Self::with_golden_values(store, &GoldenValues::michigan_esta())
    }

    /// Verifies `store` against explicit golden values.
    pub fn with_golden_values(store: RulesetStore, golden: &GoldenValues) -> EngineResult<Self> {
        let report = check_integrity_against(store.ruleset(), golden);

        for warning in &report.warnings {
            warn!(version = %report.ruleset_version, warning = %warning, "Ruleset integrity warning");
        }

        if !report.valid {
            warn!(
                version = %report.ruleset_version,
                fingerprint = %report.fingerprint,
                errors = report.errors.len(),
                "Refusing ruleset that failed integrity check"
            );
            return Err(EngineError::IntegrityViolation {
                errors: report.errors,
            });
        }

        info!(
            version = %report.ruleset_version,
            fingerprint = %report.fingerprint,
            "Ruleset verified"
        );

        Ok(Self {
            store: Arc::new(store),
            report: Arc::new(report),
        })
    }

    /// The verified ruleset.
    pub fn ruleset(&self) -> &Ruleset {
        self.store.ruleset()
    }

    /// Fingerprint of the verified ruleset.
    pub fn fingerprint(&self) -> &str {
        self.store.fingerprint()
    }

    /// The integrity report produced at construction. Always valid, but may
    /// carry warnings.
    pub fn integrity_report(&self) -> &IntegrityReport {
        &self.report
    }

    /// Classifies an employer by head count.
    pub fn tier_for_employee_count(&self, employee_count: u32) -> EmployerSizeTier {
        self.ruleset().tier_for_employee_count(employee_count)
    }

    /// See [`is_effective`](crate::calculation::is_effective).
    pub fn is_effective(&self, tier: EmployerSizeTier, as_of_date: NaiveDate) -> EffectiveDateStatus {
        is_effective(self.ruleset(), tier, as_of_date)
    }

    /// See [`calculate_accrual`](crate::calculation::calculate_accrual).
    pub fn calculate_accrual(&self, fact: &AccrualFact) -> EngineResult<AccrualResult> {
        calculate_accrual(self.ruleset(), fact)
    }

    /// Calculates accrual for many employees.
    ///
    /// Each fact gets its own entry, in input order, carrying the fact's
    /// `employee_id`. An invalid fact yields a result with validation errors
    /// and does not affect the others.
    pub fn calculate_accrual_batch(&self, facts: &[AccrualFact]) -> Vec<EngineResult<AccrualResult>> {
        facts.iter().map(|fact| self.calculate_accrual(fact)).collect()
    }

    /// See [`waiting_period_end`](crate::calculation::waiting_period_end).
    pub fn waiting_period_end(
        &self,
        hire_date: NaiveDate,
        requested_days: u32,
        tier: EmployerSizeTier,
    ) -> NaiveDate {
        waiting_period_end(self.ruleset(), hire_date, requested_days, tier)
    }

    /// See [`is_in_waiting_period`](crate::calculation::is_in_waiting_period).
    pub fn is_in_waiting_period(
        &self,
        hire_date: NaiveDate,
        current_date: NaiveDate,
        requested_days: u32,
        tier: EmployerSizeTier,
    ) -> bool {
        is_in_waiting_period(self.ruleset(), hire_date, current_date, requested_days, tier)
    }

    /// See [`evaluate_waiting_period`](crate::calculation::evaluate_waiting_period).
    pub fn evaluate_waiting_period(&self, fact: &WaitingPeriodFact) -> EngineResult<WaitingPeriodResult> {
        evaluate_waiting_period(self.ruleset(), fact)
    }

    /// See [`validate_carryover`](crate::calculation::validate_carryover).
    pub fn validate_carryover(
        &self,
        balance: Decimal,
        tier: EmployerSizeTier,
    ) -> EngineResult<CarryoverResult> {
        validate_carryover(self.ruleset(), balance, tier)
    }

    /// Validates carryover for a fact record.
    pub fn validate_carryover_fact(&self, fact: &CarryoverFact) -> EngineResult<CarryoverResult> {
        self.validate_carryover(fact.current_balance, fact.employer_tier)
    }

    /// See [`resolve_reference`](crate::calculation::resolve_reference).
    pub fn resolve_reference(
        &self,
        tier: EmployerSizeTier,
        rule_key: RuleKey,
    ) -> EngineResult<LegislativeReference> {
        resolve_reference(self.ruleset(), tier, rule_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    const MICHIGAN: &str = include_str!("../config/michigan-esta.json");

    fn engine() -> RulesEngine {
        RulesEngine::new(RulesetStore::from_json_str(MICHIGAN).unwrap()).unwrap()
    }

    #[test]
    fn test_engine_is_send_sync_and_clone() {
        fn assert_traits<T: Send + Sync + Clone>() {}
        assert_traits::<RulesEngine>();
    }

    #[test]
    fn test_engine_accepts_reference_ruleset() {
        let engine = engine();
        assert!(engine.integrity_report().valid);
        assert_eq!(engine.fingerprint(), engine.integrity_report().fingerprint);
    }

    #[test]
    fn test_engine_refuses_drifted_ruleset() {
        let mut doc: Value = serde_json::from_str(MICHIGAN).unwrap();
        doc["tiers"]["large"]["accrualRate"]["den"] = Value::from(20);
        let store = RulesetStore::from_json_str(&doc.to_string()).unwrap();

        match RulesEngine::new(store) {
            Err(EngineError::IntegrityViolation { errors }) => {
                assert_eq!(errors.len(), 1);
                assert!(errors[0].contains("accrualRate"));
            }
            other => panic!("Expected IntegrityViolation, got {:?}", other),
        }
    }

    #[test]
    fn test_tier_for_employee_count_uses_ruleset_threshold() {
        let engine = engine();
        assert_eq!(engine.tier_for_employee_count(9), EmployerSizeTier::Small);
        assert_eq!(engine.tier_for_employee_count(10), EmployerSizeTier::Large);
    }

    #[test]
    fn test_batch_is_not_aborted_by_bad_record() {
        let engine = engine();
        let as_of = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let large = |id: &str, hours: i64, prior: Decimal| AccrualFact {
            employee_id: Some(id.to_string()),
            hours_worked: Decimal::from(hours),
            employer_tier: EmployerSizeTier::Large,
            yearly_accrued_so_far: prior,
            as_of_date: as_of,
        };
        let facts = vec![
            large("E-1", 60, Decimal::ZERO),
            large("E-2", -10, Decimal::ZERO),
            large("E-3", 90, Decimal::MAX),
            large("E-4", 90, Decimal::ZERO),
        ];

        let results = engine.calculate_accrual_batch(&facts);

        assert_eq!(results.len(), 4);
        let results: Vec<AccrualResult> = results.into_iter().map(|r| r.unwrap()).collect();
        let ids: Vec<&str> = results
            .iter()
            .filter_map(|r| r.employee_id.as_deref())
            .collect();
        assert_eq!(ids, vec!["E-1", "E-2", "E-3", "E-4"]);
        assert_eq!(results[0].accrued_this_period, Decimal::from(2));
        assert!(!results[1].is_valid());
        assert!(results[2].capped);
        assert_eq!(results[2].accrued_this_period, Decimal::ZERO);
        assert_eq!(results[3].accrued_this_period, Decimal::from(3));
    }

    #[test]
    fn test_carryover_fact_matches_direct_call() {
        let engine = engine();
        let fact = CarryoverFact {
            current_balance: Decimal::from(90),
            employer_tier: EmployerSizeTier::Large,
        };

        assert_eq!(
            engine.validate_carryover_fact(&fact).unwrap(),
            engine
                .validate_carryover(Decimal::from(90), EmployerSizeTier::Large)
                .unwrap()
        );
    }

    #[test]
    fn test_engine_can_be_shared_across_threads() {
        let engine = engine();
        let as_of = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = engine.clone();
                std::thread::spawn(move || {
                    engine
                        .calculate_accrual(&AccrualFact {
                            employee_id: None,
                            hours_worked: Decimal::from(300),
                            employer_tier: EmployerSizeTier::Large,
                            yearly_accrued_so_far: Decimal::ZERO,
                            as_of_date: as_of,
                        })
                        .unwrap()
                })
            })
            .collect();

        let results: Vec<AccrualResult> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.windows(2).all(|pair| pair[0] == pair[1]));
    }
}
