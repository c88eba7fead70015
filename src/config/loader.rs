//! Ruleset loading functionality.
//!
//! This module provides the [`RulesetStore`] type for loading a ruleset
//! document from JSON or YAML and validating its structural invariants.

use std::fs;
use std::path::Path;

use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::{EngineError, EngineResult};

use super::types::{AccrualMethod, EmployerSizeTier, Ruleset, TierRules};

const INLINE_SOURCE: &str = "<inline>";

/// Loads and owns one validated, immutable [`Ruleset`].
///
/// The document is read once. A store never changes after construction; to
/// pick up a legislative update, load a new store.
///
/// # Document Format
///
/// ```text
/// {
///   "version": "2025.1.0",
///   "employerSizeThresholdEmployees": 10,
///   "maxWaitingPeriodDays": 120,
///   "tiers": {
///     "large": { "effectiveDate": "2025-02-21", "accrualMethod": "per-hour-rate",
///                "accrualRate": {"num": 1, "den": 30}, "annualCapHours": 72, ... },
///     "small": { "effectiveDate": "2025-10-01", "accrualMethod": "fixed-grant", ... }
///   }
/// }
/// ```
///
/// # Example
///
/// ```no_run
/// use esta_engine::config::{EmployerSizeTier, RulesetStore};
///
/// let store = RulesetStore::load("./config/michigan-esta.json")?;
/// let large = store.ruleset().tier(EmployerSizeTier::Large);
/// println!("Large employers accrue at {:?}", large.accrual_rate);
/// # Ok::<(), esta_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RulesetStore {
    ruleset: Ruleset,
    fingerprint: String,
}

impl RulesetStore {
    /// Loads a ruleset from a `.json`, `.yaml` or `.yml` file.
    ///
    /// # Returns
    ///
    /// Returns a `RulesetStore` on success, or an error if:
    /// - The file cannot be read (`ConfigNotFound`)
    /// - The document is malformed or misses a required field (`ConfigParseError`)
    /// - A value fails its invariant (`InvalidConfig`)
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        let is_yaml = path
            .extension()
            .is_some_and(|ext| ext == "yaml" || ext == "yml");

        let ruleset = if is_yaml {
            Self::parse_yaml(&content, &path_str)?
        } else {
            Self::parse_json(&content, &path_str)?
        };

        Self::from_ruleset(ruleset, &path_str)
    }

    /// Parses and validates a JSON document held in memory.
    pub fn from_json_str(content: &str) -> EngineResult<Self> {
        let ruleset = Self::parse_json(content, INLINE_SOURCE)?;
        Self::from_ruleset(ruleset, INLINE_SOURCE)
    }

    /// Parses and validates a YAML document held in memory.
    pub fn from_yaml_str(content: &str) -> EngineResult<Self> {
        let ruleset = Self::parse_yaml(content, INLINE_SOURCE)?;
        Self::from_ruleset(ruleset, INLINE_SOURCE)
    }

    fn parse_json(content: &str, source: &str) -> EngineResult<Ruleset> {
        serde_json::from_str(content).map_err(|e| EngineError::ConfigParseError {
            path: source.to_string(),
            message: e.to_string(),
        })
    }

    fn parse_yaml(content: &str, source: &str) -> EngineResult<Ruleset> {
        serde_yaml::from_str(content).map_err(|e| EngineError::ConfigParseError {
            path: source.to_string(),
            message: e.to_string(),
        })
    }

    fn from_ruleset(ruleset: Ruleset, source: &str) -> EngineResult<Self> {
        validate(&ruleset)?;
        let fingerprint = fingerprint_of(&ruleset)?;

        info!(
            source = %source,
            version = %ruleset.version(),
            fingerprint = %fingerprint,
            "Loaded ruleset"
        );

        Ok(Self {
            ruleset,
            fingerprint,
        })
    }

    /// Returns the loaded ruleset.
    pub fn ruleset(&self) -> &Ruleset {
        &self.ruleset
    }

    /// Consumes the store, returning the ruleset.
    pub fn into_ruleset(self) -> Ruleset {
        self.ruleset
    }

    /// SHA-256 hex digest of the canonical JSON form of the parsed ruleset.
    ///
    /// Two documents that differ only in whitespace, key order or file format
    /// share a fingerprint; any change to a value changes it.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

/// Computes the canonical fingerprint of a ruleset.
pub fn fingerprint_of(ruleset: &Ruleset) -> EngineResult<String> {
    let canonical = serde_json::to_vec(ruleset).map_err(|e| EngineError::ConfigParseError {
        path: INLINE_SOURCE.to_string(),
        message: format!("could not canonicalize ruleset: {}", e),
    })?;
    let digest = Sha256::digest(&canonical);
    Ok(digest.iter().map(|b| format!("{b:02x}")).collect())
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> EngineError {
    EngineError::InvalidConfig {
        field: field.into(),
        message: message.into(),
    }
}

fn validate(ruleset: &Ruleset) -> EngineResult<()> {
    if !is_semver(ruleset.version()) {
        return Err(invalid(
            "version",
            format!("'{}' is not a semantic version (MAJOR.MINOR.PATCH)", ruleset.version()),
        ));
    }

    if ruleset.employer_size_threshold_employees() == 0 {
        return Err(invalid(
            "employerSizeThresholdEmployees",
            "must be at least 1",
        ));
    }

    for tier in [EmployerSizeTier::Small, EmployerSizeTier::Large] {
        validate_tier(tier, ruleset.tier(tier), ruleset.max_waiting_period_days())?;
    }

    let large = ruleset.tier(EmployerSizeTier::Large).effective_date;
    let small = ruleset.tier(EmployerSizeTier::Small).effective_date;
    if large > small {
        return Err(invalid(
            "tiers.large.effectiveDate",
            format!(
                "large-employer date {} is after small-employer date {}; effective dates must not decrease with employer size",
                large, small
            ),
        ));
    }

    Ok(())
}

fn validate_tier(tier: EmployerSizeTier, rules: &TierRules, global_ceiling: u32) -> EngineResult<()> {
    let field = |name: &str| format!("tiers.{}.{}", tier, name);

    non_negative(&field("annualCapHours"), rules.annual_cap_hours)?;
    non_negative(&field("carryoverCapHours"), rules.carryover_cap_hours)?;
    if let Some(unpaid) = rules.unpaid_cap_hours {
        non_negative(&field("unpaidCapHours"), unpaid)?;
    }

    if rules.accrual_method == AccrualMethod::PerHourRate {
        match rules.accrual_rate {
            None => {
                return Err(invalid(
                    field("accrualRate"),
                    "required when accrualMethod is per-hour-rate",
                ));
            }
            Some(rate) if rate.den == 0 => {
                return Err(invalid(field("accrualRate"), "denominator must be non-zero"));
            }
            Some(_) => {}
        }
    }

    if let Some(days) = rules.max_waiting_period_days {
        if days > global_ceiling {
            return Err(invalid(
                field("maxWaitingPeriodDays"),
                format!(
                    "{} exceeds the global ceiling of {} days",
                    days, global_ceiling
                ),
            ));
        }
    }

    Ok(())
}

fn non_negative(field: &str, value: Decimal) -> EngineResult<()> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(invalid(field, format!("must not be negative (got {})", value)));
    }
    Ok(())
}

/// `MAJOR.MINOR.PATCH` with optional `-pre.release` and `+build` suffixes.
fn is_semver(version: &str) -> bool {
    let (version, build) = match version.split_once('+') {
        Some((version, build)) => (version, Some(build)),
        None => (version, None),
    };
    let (core, pre) = match version.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (version, None),
    };

    let parts: Vec<&str> = core.split('.').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
        && pre.is_none_or(is_dotted_identifiers)
        && build.is_none_or(is_dotted_identifiers)
}

fn is_dotted_identifiers(s: &str) -> bool {
    s.split('.').all(|id| {
        !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}
