//! Ruleset integrity (drift) checking.
//!
//! A ruleset can be structurally valid and still be legally wrong: someone
//! edits a rate from 1/30 to 1/20 and every number downstream silently
//! changes. This module compares a loaded ruleset to a fixed set of known
//! statutory values and reports every divergence. A report with errors must
//! block use of the ruleset.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{AccrualMethod, AccrualRate, EmployerSizeTier, Ruleset, fingerprint_of};
use crate::models::IntegrityReport;

use super::reference::RuleKey;

/// Expected statutory values for one tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoldenTier {
    /// Expected effective date.
    pub effective_date: NaiveDate,
    /// Expected accrual method.
    pub accrual_method: AccrualMethod,
    /// Expected rate for per-hour-rate tiers.
    #[serde(default)]
    pub accrual_rate: Option<AccrualRate>,
    /// Expected annual cap.
    pub annual_cap_hours: Decimal,
    /// Expected carryover cap.
    pub carryover_cap_hours: Decimal,
    /// Largest unpaid cap the statute allows; `None` means no unpaid portion.
    #[serde(default)]
    pub unpaid_cap_hours: Option<Decimal>,
}

/// The known-good statutory values a ruleset is checked against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoldenValues {
    /// Expected employer size threshold.
    pub employer_size_threshold_employees: u32,
    /// Expected waiting-period ceiling.
    pub max_waiting_period_days: u32,
    /// Small-employer expectations.
    pub small: GoldenTier,
    /// Large-employer expectations.
    pub large: GoldenTier,
    /// When set, the ruleset fingerprint must match exactly.
    #[serde(default)]
    pub pinned_fingerprint: Option<String>,
}

impl GoldenValues {
    /// Michigan Earned Sick Time Act, as amended by 2024 PA 224.
    pub fn michigan_esta() -> Self {
        Self {
            employer_size_threshold_employees: 10,
            max_waiting_period_days: 120,
            large: GoldenTier {
                effective_date: NaiveDate::from_ymd_opt(2025, 2, 21).unwrap_or_default(),
                accrual_method: AccrualMethod::PerHourRate,
                accrual_rate: Some(AccrualRate::new(1, 30)),
                annual_cap_hours: Decimal::from(72),
                carryover_cap_hours: Decimal::from(72),
                unpaid_cap_hours: None,
            },
            small: GoldenTier {
                effective_date: NaiveDate::from_ymd_opt(2025, 10, 1).unwrap_or_default(),
                accrual_method: AccrualMethod::FixedGrant,
                accrual_rate: None,
                annual_cap_hours: Decimal::from(40),
                carryover_cap_hours: Decimal::from(40),
                unpaid_cap_hours: Some(Decimal::from(32)),
            },
            pinned_fingerprint: None,
        }
    }

    /// Pins the expected fingerprint of the ruleset document.
    pub fn with_pinned_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.pinned_fingerprint = Some(fingerprint.into());
        self
    }

    fn tier(&self, tier: EmployerSizeTier) -> &GoldenTier {
        match tier {
            EmployerSizeTier::Small => &self.small,
            EmployerSizeTier::Large => &self.large,
        }
    }
}

impl Default for GoldenValues {
    fn default() -> Self {
        Self::michigan_esta()
    }
}

/// Checks a ruleset against the Michigan ESTA golden values.
///
/// # Examples
///
/// ```
/// use esta_engine::calculation::check_integrity;
/// use esta_engine::config::RulesetStore;
///
/// let store = RulesetStore::load("./config/michigan-esta.json").unwrap();
/// let report = check_integrity(store.ruleset());
/// assert!(report.valid, "{:?}", report.errors);
/// ```
pub fn check_integrity(ruleset: &Ruleset) -> IntegrityReport {
    check_integrity_against(ruleset, &GoldenValues::michigan_esta())
}

/// Checks a ruleset against an explicit set of golden values.
pub fn check_integrity_against(ruleset: &Ruleset, golden: &GoldenValues) -> IntegrityReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if ruleset.employer_size_threshold_employees() != golden.employer_size_threshold_employees {
        errors.push(format!(
            "employerSizeThresholdEmployees: expected {}, found {}",
            golden.employer_size_threshold_employees,
            ruleset.employer_size_threshold_employees()
        ));
    }

    if ruleset.max_waiting_period_days() != golden.max_waiting_period_days {
        errors.push(format!(
            "maxWaitingPeriodDays: expected {}, found {}",
            golden.max_waiting_period_days,
            ruleset.max_waiting_period_days()
        ));
    }

    for tier in [EmployerSizeTier::Large, EmployerSizeTier::Small] {
        check_tier(ruleset, tier, golden.tier(tier), &mut errors, &mut warnings);
    }

    let fingerprint = match fingerprint_of(ruleset) {
        Ok(fingerprint) => fingerprint,
        Err(e) => {
            errors.push(format!("fingerprint: {}", e));
            String::new()
        }
    };

    if let Some(pinned) = &golden.pinned_fingerprint {
        if !fingerprint.is_empty() && pinned != &fingerprint {
            errors.push(format!(
                "fingerprint: expected {}, found {}",
                pinned, fingerprint
            ));
        }
    }

    debug!(
        version = %ruleset.version(),
        errors = errors.len(),
        warnings = warnings.len(),
        "Checked ruleset integrity"
    );

    IntegrityReport {
        valid: errors.is_empty(),
        ruleset_version: ruleset.version().to_string(),
        fingerprint,
        errors,
        warnings,
    }
}

fn check_tier(
    ruleset: &Ruleset,
    tier: EmployerSizeTier,
    golden: &GoldenTier,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    let rules = ruleset.tier(tier);

    if rules.effective_date != golden.effective_date {
        errors.push(format!(
            "{}.effectiveDate: expected {}, found {}",
            tier, golden.effective_date, rules.effective_date
        ));
    }

    if rules.accrual_method != golden.accrual_method {
        errors.push(format!(
            "{}.accrualMethod: expected {}, found {}",
            tier, golden.accrual_method, rules.accrual_method
        ));
    }

    if let Some(expected) = golden.accrual_rate {
        match rules.accrual_rate {
            Some(actual) if actual.same_ratio(&expected) => {}
            Some(actual) => errors.push(format!(
                "{}.accrualRate: expected {}, found {}",
                tier, expected, actual
            )),
            None => errors.push(format!(
                "{}.accrualRate: expected {}, found none",
                tier, expected
            )),
        }
    }

    if rules.annual_cap_hours != golden.annual_cap_hours {
        errors.push(format!(
            "{}.annualCapHours: expected {}, found {}",
            tier,
            golden.annual_cap_hours.normalize(),
            rules.annual_cap_hours.normalize()
        ));
    }

    if rules.carryover_cap_hours != golden.carryover_cap_hours {
        errors.push(format!(
            "{}.carryoverCapHours: expected {}, found {}",
            tier,
            golden.carryover_cap_hours.normalize(),
            rules.carryover_cap_hours.normalize()
        ));
    }

    match &rules.tenure_based_rate {
        Some(tenure) if tenure.enabled => errors.push(format!(
            "{}.tenureBasedRate: tenure-based accrual must be absent or disabled",
            tier
        )),
        Some(_) => warnings.push(format!(
            "{}.tenureBasedRate: present but disabled; consider removing it",
            tier
        )),
        None => {}
    }

    match (rules.unpaid_cap_hours, golden.unpaid_cap_hours) {
        (Some(actual), Some(allowed)) if actual > allowed => warnings.push(format!(
            "{}.unpaidCapHours: {} is unusually large (statutory ceiling {})",
            tier,
            actual.normalize(),
            allowed.normalize()
        )),
        (Some(actual), None) => warnings.push(format!(
            "{}.unpaidCapHours: {} configured on a tier with no unpaid entitlement",
            tier,
            actual.normalize()
        )),
        (None, Some(allowed)) => warnings.push(format!(
            "{}.unpaidCapHours: absent; up to {} hours may be provided unpaid",
            tier,
            allowed.normalize()
        )),
        _ => {}
    }

    if let Some(unpaid) = rules.unpaid_cap_hours {
        if unpaid > rules.annual_cap_hours {
            warnings.push(format!(
                "{}.unpaidCapHours: {} exceeds the annual cap of {}",
                tier,
                unpaid.normalize(),
                rules.annual_cap_hours.normalize()
            ));
        }
    }

    let mut cited = vec![
        RuleKey::Accrual,
        RuleKey::Carryover,
        RuleKey::WaitingPeriod,
        RuleKey::EffectiveDate,
    ];
    if rules.unpaid_cap_hours.is_some() {
        cited.push(RuleKey::UnpaidLeave);
    }
    for key in cited {
        if !rules.legislative_references.contains_key(key.as_str()) {
            warnings.push(format!(
                "{}.legislativeReferences: no citation for '{}'; results for this rule will fail",
                tier, key
            ));
        }
    }
}
