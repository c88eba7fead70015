//! Fact records supplied by callers.
//!
//! Facts are created per call and never retained. Every date the engine
//! reasons about arrives through one of these records; nothing here has a
//! "today" default.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::EmployerSizeTier;

/// Input to an accrual calculation.
///
/// # Example
///
/// ```
/// use esta_engine::config::EmployerSizeTier;
/// use esta_engine::models::AccrualFact;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let fact = AccrualFact {
///     employee_id: None,
///     hours_worked: Decimal::from(300),
///     employer_tier: EmployerSizeTier::Large,
///     yearly_accrued_so_far: Decimal::ZERO,
///     as_of_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
/// };
/// assert_eq!(fact.hours_worked, Decimal::from(300));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualFact {
    /// Caller's identifier for the employee, echoed on the result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
    /// Hours worked in the period. Must not be negative.
    pub hours_worked: Decimal,
    /// The employer's size tier.
    pub employer_tier: EmployerSizeTier,
    /// Leave already accrued this year. Must not be negative.
    pub yearly_accrued_so_far: Decimal,
    /// The date the calculation is made for.
    pub as_of_date: NaiveDate,
}

impl AccrualFact {
    /// Builds a fact from whole minutes worked, as timekeeping systems
    /// usually report them.
    ///
    /// ```
    /// use esta_engine::config::EmployerSizeTier;
    /// use esta_engine::models::AccrualFact;
    /// use chrono::NaiveDate;
    /// use rust_decimal::Decimal;
    /// use std::str::FromStr;
    ///
    /// let fact = AccrualFact::from_minutes(
    ///     90,
    ///     EmployerSizeTier::Large,
    ///     Decimal::ZERO,
    ///     NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
    /// );
    /// assert_eq!(fact.hours_worked, Decimal::from_str("1.5").unwrap());
    /// ```
    pub fn from_minutes(
        minutes_worked: u64,
        employer_tier: EmployerSizeTier,
        yearly_accrued_so_far: Decimal,
        as_of_date: NaiveDate,
    ) -> Self {
        Self {
            employee_id: None,
            hours_worked: (Decimal::from(minutes_worked) / Decimal::from(60)).normalize(),
            employer_tier,
            yearly_accrued_so_far,
            as_of_date,
        }
    }

    /// Tags the fact with the caller's employee identifier.
    pub fn with_employee_id(mut self, employee_id: impl Into<String>) -> Self {
        self.employee_id = Some(employee_id.into());
        self
    }
}

/// Input to a waiting-period evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitingPeriodFact {
    /// The employee's first day.
    pub hire_date: NaiveDate,
    /// The date usage eligibility is asked about.
    pub current_date: NaiveDate,
    /// The waiting period the employer configured, before clamping.
    pub requested_waiting_days: u32,
    /// The employer's size tier.
    pub employer_tier: EmployerSizeTier,
}

/// Input to a carryover validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarryoverFact {
    /// Unused balance at the end of the year.
    pub current_balance: Decimal,
    /// The employer's size tier.
    pub employer_tier: EmployerSizeTier,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn test_from_minutes_converts_whole_hours() {
        let fact = AccrualFact::from_minutes(1800, EmployerSizeTier::Large, Decimal::ZERO, as_of());
        assert_eq!(fact.hours_worked, dec("30"));
    }

    #[test]
    fn test_from_minutes_keeps_fractional_hours() {
        let fact = AccrualFact::from_minutes(45, EmployerSizeTier::Small, dec("2"), as_of());
        assert_eq!(fact.hours_worked, dec("0.75"));
        assert_eq!(fact.yearly_accrued_so_far, dec("2"));
    }

    #[test]
    fn test_deserialize_accrual_fact() {
        let json = r#"{
            "hours_worked": "37.5",
            "employer_tier": "large",
            "yearly_accrued_so_far": "4",
            "as_of_date": "2025-06-01"
        }"#;

        let fact: AccrualFact = serde_json::from_str(json).unwrap();
        assert_eq!(fact.hours_worked, dec("37.5"));
        assert_eq!(fact.employer_tier, EmployerSizeTier::Large);
        assert_eq!(fact.as_of_date, as_of());
        assert_eq!(fact.employee_id, None);
    }

    #[test]
    fn test_employee_id_is_read_and_omitted_when_absent() {
        let json = r#"{
            "employee_id": "E-1042",
            "hours_worked": "8",
            "employer_tier": "small",
            "yearly_accrued_so_far": "0",
            "as_of_date": "2025-06-01"
        }"#;
        let fact: AccrualFact = serde_json::from_str(json).unwrap();
        assert_eq!(fact.employee_id.as_deref(), Some("E-1042"));

        let untagged = AccrualFact::from_minutes(60, EmployerSizeTier::Small, Decimal::ZERO, as_of());
        let value = serde_json::to_value(&untagged).unwrap();
        assert!(value.get("employee_id").is_none());

        let tagged = untagged.with_employee_id("E-7");
        assert_eq!(tagged.employee_id.as_deref(), Some("E-7"));
    }

    #[test]
    fn test_deserialize_waiting_fact_requires_current_date() {
        let json = r#"{
            "hire_date": "2025-01-01",
            "requested_waiting_days": 90,
            "employer_tier": "small"
        }"#;

        let result: Result<WaitingPeriodFact, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
