//! Effective-date gating.
//!
//! A tier owes nothing before its effective date. Callers always pass the
//! as-of date; this module never reads a clock.

use chrono::NaiveDate;
use tracing::debug;

use crate::config::{EmployerSizeTier, Ruleset};
use crate::models::EffectiveDateStatus;

/// Determines whether `tier`'s rules are in force on `as_of_date`.
///
/// The tier is effective on its effective date itself and every day after.
///
/// # Examples
///
/// ```
/// use esta_engine::calculation::is_effective;
/// use esta_engine::config::{EmployerSizeTier, RulesetStore};
/// use chrono::NaiveDate;
///
/// let store = RulesetStore::load("./config/michigan-esta.json").unwrap();
/// let as_of = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
///
/// let status = is_effective(store.ruleset(), EmployerSizeTier::Small, as_of);
/// assert!(!status.is_effective);
/// assert_eq!(status.days_until_effective, 30);
/// ```
pub fn is_effective(
    ruleset: &Ruleset,
    tier: EmployerSizeTier,
    as_of_date: NaiveDate,
) -> EffectiveDateStatus {
    let effective_date = ruleset.tier(tier).effective_date;

    let status = if as_of_date < effective_date {
        let days_until_effective = (effective_date - as_of_date).num_days();
        EffectiveDateStatus {
            tier,
            is_effective: false,
            effective_date,
            as_of_date,
            days_until_effective,
            reason: format!(
                "{} employer rules take effect on {}; {} is {} day(s) before that date",
                tier, effective_date, as_of_date, days_until_effective
            ),
        }
    } else {
        EffectiveDateStatus {
            tier,
            is_effective: true,
            effective_date,
            as_of_date,
            days_until_effective: 0,
            reason: format!(
                "{} employer rules in effect since {}",
                tier, effective_date
            ),
        }
    };

    debug!(
        tier = %tier,
        as_of = %as_of_date,
        effective_date = %effective_date,
        is_effective = status.is_effective,
        "Checked effective date"
    );

    status
}
