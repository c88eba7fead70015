//! Ruleset types for statutory accrual interpretation.
//!
//! This module contains the strongly-typed structures that a ruleset document
//! is deserialized into. Every statutory number the engine uses lives here;
//! calculation code never carries its own rates, caps or dates.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of decimal places kept when an uncapped per-hour accrual is rounded.
pub const ACCRUAL_DECIMAL_PLACES: u32 = 4;

/// Employer size classification driving which rule tier applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployerSizeTier {
    /// Employers below the size threshold.
    Small,
    /// Employers at or above the size threshold.
    Large,
}

impl EmployerSizeTier {
    /// Classifies an employer by head count.
    ///
    /// An employer whose `employee_count` is greater than or equal to
    /// `threshold` is [`Large`](Self::Large).
    ///
    /// ```
    /// use esta_engine::config::EmployerSizeTier;
    ///
    /// assert_eq!(EmployerSizeTier::from_employee_count(9, 10), EmployerSizeTier::Small);
    /// assert_eq!(EmployerSizeTier::from_employee_count(10, 10), EmployerSizeTier::Large);
    /// ```
    pub fn from_employee_count(employee_count: u32, threshold: u32) -> Self {
        if employee_count >= threshold {
            EmployerSizeTier::Large
        } else {
            EmployerSizeTier::Small
        }
    }

    /// Returns the lowercase name used in documents and messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            EmployerSizeTier::Small => "small",
            EmployerSizeTier::Large => "large",
        }
    }
}

impl fmt::Display for EmployerSizeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a tier earns leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccrualMethod {
    /// Leave is earned at a fixed rate per hour worked.
    PerHourRate,
    /// The whole annual entitlement is granted at once.
    FixedGrant,
}

impl AccrualMethod {
    /// Returns the document spelling of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccrualMethod::PerHourRate => "per-hour-rate",
            AccrualMethod::FixedGrant => "fixed-grant",
        }
    }
}

impl fmt::Display for AccrualMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An exact accrual rate expressed as `num / den` hours of leave per hour worked.
///
/// The rate is never converted to a float. Comparisons against caps are
/// done by cross-multiplying with the denominator.
///
/// ```
/// use esta_engine::config::AccrualRate;
/// use rust_decimal::Decimal;
///
/// let rate = AccrualRate::new(1, 30);
/// assert_eq!(rate.to_string(), "1/30");
/// assert_eq!(rate.apply(Decimal::from(300)), Some(Decimal::from(10)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccrualRate {
    /// Numerator: hours of leave.
    pub num: u32,
    /// Denominator: hours worked. Must be non-zero.
    pub den: u32,
}

impl AccrualRate {
    /// Creates a rate of `num / den`.
    pub fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }

    /// `hours * num` as an exact decimal (the numerator of the accrued
    /// amount), or `None` if it does not fit in a `Decimal`.
    pub fn scaled_numerator(&self, hours: Decimal) -> Option<Decimal> {
        hours.checked_mul(Decimal::from(self.num))
    }

    /// Leave earned for `hours`, rounded toward zero to
    /// [`ACCRUAL_DECIMAL_PLACES`] places.
    ///
    /// Returns `None` for a zero denominator or when `hours * num` overflows.
    pub fn apply(&self, hours: Decimal) -> Option<Decimal> {
        let numerator = self.scaled_numerator(hours)?;
        let amount = numerator.checked_div(Decimal::from(self.den))?;
        Some(
            amount
                .round_dp_with_strategy(ACCRUAL_DECIMAL_PLACES, RoundingStrategy::ToZero)
                .normalize(),
        )
    }

    /// True when both rates denote the same ratio (`2/60 == 1/30`).
    pub fn same_ratio(&self, other: &AccrualRate) -> bool {
        u64::from(self.num) * u64::from(other.den) == u64::from(other.num) * u64::from(self.den)
    }
}

impl fmt::Display for AccrualRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// A seniority-based accrual rate. The statutes this engine encodes do not
/// scale accrual with tenure, so integrity checks require this to be absent
/// or disabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenureBasedRate {
    /// Whether the tenure rate is in force.
    #[serde(default)]
    pub enabled: bool,
    /// Years of service after which the rate applies.
    #[serde(default)]
    pub min_years_of_service: Option<u32>,
    /// The rate that would apply.
    #[serde(default)]
    pub rate: Option<AccrualRate>,
}

/// A citation for one rule, as written in the ruleset document.
///
/// Either a bare citation (`"§3(1)"`) or an object carrying an explicit
/// plain-language summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReferenceEntry {
    /// Citation only; the summary is derived from the rule key.
    Citation(String),
    /// Citation with an explicit summary.
    Detailed {
        /// The statutory citation.
        citation: String,
        /// Plain-language explanation.
        summary: String,
    },
}

impl ReferenceEntry {
    /// The statutory citation.
    pub fn citation(&self) -> &str {
        match self {
            ReferenceEntry::Citation(citation) => citation,
            ReferenceEntry::Detailed { citation, .. } => citation,
        }
    }

    /// The configured summary, if the entry carries one.
    pub fn summary(&self) -> Option<&str> {
        match self {
            ReferenceEntry::Citation(_) => None,
            ReferenceEntry::Detailed { summary, .. } => Some(summary),
        }
    }
}

/// The rules applying to one employer size tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierRules {
    /// First date on which this tier's obligations exist.
    pub effective_date: NaiveDate,
    /// How leave is earned.
    pub accrual_method: AccrualMethod,
    /// Rate for [`AccrualMethod::PerHourRate`]; ignored for fixed grants.
    #[serde(default)]
    pub accrual_rate: Option<AccrualRate>,
    /// Maximum leave earned per year.
    pub annual_cap_hours: Decimal,
    /// Maximum unused balance carried into the next year.
    pub carryover_cap_hours: Decimal,
    /// Portion of the entitlement that may be unpaid, where the statute allows it.
    #[serde(default)]
    pub unpaid_cap_hours: Option<Decimal>,
    /// Tier-specific waiting ceiling; can only tighten the global one.
    #[serde(default)]
    pub max_waiting_period_days: Option<u32>,
    /// Seniority-based rate, expected to be absent.
    #[serde(default)]
    pub tenure_based_rate: Option<TenureBasedRate>,
    /// Citations keyed by rule key (`accrual`, `carryover`, ...).
    #[serde(default)]
    pub legislative_references: BTreeMap<String, ReferenceEntry>,
}

/// The two tiers of a ruleset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierSet {
    /// Small-employer rules.
    pub small: TierRules,
    /// Large-employer rules.
    pub large: TierRules,
}

/// A versioned, immutable ruleset encoding one jurisdiction's statute.
///
/// A `Ruleset` is only obtained through
/// [`RulesetStore`](crate::config::RulesetStore), which validates it. It
/// exposes no mutators; a legislative update is a new document loaded into a
/// new store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ruleset {
    version: String,
    employer_size_threshold_employees: u32,
    max_waiting_period_days: u32,
    tiers: TierSet,
}

impl Ruleset {
    /// The semantic version of the document.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Head count at which an employer becomes large.
    pub fn employer_size_threshold_employees(&self) -> u32 {
        self.employer_size_threshold_employees
    }

    /// Global statutory ceiling on waiting periods, in days.
    pub fn max_waiting_period_days(&self) -> u32 {
        self.max_waiting_period_days
    }

    /// Rules for the given tier.
    pub fn tier(&self, tier: EmployerSizeTier) -> &TierRules {
        match tier {
            EmployerSizeTier::Small => &self.tiers.small,
            EmployerSizeTier::Large => &self.tiers.large,
        }
    }

    /// Both tiers.
    pub fn tiers(&self) -> &TierSet {
        &self.tiers
    }

    /// Classifies an employer against this ruleset's size threshold.
    pub fn tier_for_employee_count(&self, employee_count: u32) -> EmployerSizeTier {
        EmployerSizeTier::from_employee_count(employee_count, self.employer_size_threshold_employees)
    }
}
