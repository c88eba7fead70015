//! Legislative reference resolution.
//!
//! Every number the engine reports must be traceable to the statute. This
//! module looks citations up in a tier's reference map and fails when a rule
//! that produced a result has none.

use std::fmt;

use crate::config::{EmployerSizeTier, Ruleset};
use crate::error::{EngineError, EngineResult};
use crate::models::LegislativeReference;

/// The rules the engine cites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKey {
    /// Accrual rate or fixed grant, and the annual cap.
    Accrual,
    /// Year-end carryover cap.
    Carryover,
    /// Waiting period before accrued leave may be used.
    WaitingPeriod,
    /// Date the tier's obligations begin.
    EffectiveDate,
    /// Unpaid portion of the entitlement.
    UnpaidLeave,
}

impl RuleKey {
    /// The key as it appears in `legislativeReferences`.
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKey::Accrual => "accrual",
            RuleKey::Carryover => "carryover",
            RuleKey::WaitingPeriod => "waitingPeriod",
            RuleKey::EffectiveDate => "effectiveDate",
            RuleKey::UnpaidLeave => "unpaidLeave",
        }
    }

    /// Summary used when the ruleset gives a bare citation.
    pub fn default_summary(&self) -> &'static str {
        match self {
            RuleKey::Accrual => {
                "Earned sick time accrues from hours worked or is granted up front, up to an annual cap."
            }
            RuleKey::Carryover => {
                "Unused earned sick time carries into the next year up to the carryover cap; any excess is forfeited."
            }
            RuleKey::WaitingPeriod => {
                "An employer may delay use of accrued time for new employees, but no longer than the statutory maximum."
            }
            RuleKey::EffectiveDate => {
                "No accrual obligation exists before the date the statute takes effect for this employer size."
            }
            RuleKey::UnpaidLeave => {
                "Part of the annual entitlement may be provided as unpaid time, up to the configured limit."
            }
        }
    }
}

impl fmt::Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves the citation for `rule_key` on `tier`.
///
/// # Returns
///
/// The citation and its plain-language summary, or `MissingReference` if the
/// tier's reference map has no entry for the rule.
///
/// # Examples
///
/// ```
/// use esta_engine::calculation::{RuleKey, resolve_reference};
/// use esta_engine::config::{EmployerSizeTier, RulesetStore};
///
/// let store = RulesetStore::load("./config/michigan-esta.json").unwrap();
/// let reference = resolve_reference(store.ruleset(), EmployerSizeTier::Large, RuleKey::Carryover).unwrap();
/// assert_eq!(reference.citation, "MCL 408.963(4)");
/// ```
pub fn resolve_reference(
    ruleset: &Ruleset,
    tier: EmployerSizeTier,
    rule_key: RuleKey,
) -> EngineResult<LegislativeReference> {
    let entry = ruleset
        .tier(tier)
        .legislative_references
        .get(rule_key.as_str())
        .ok_or_else(|| EngineError::MissingReference {
            tier,
            rule_key: rule_key.as_str().to_string(),
        })?;

    Ok(LegislativeReference {
        rule_key: rule_key.as_str().to_string(),
        tier,
        citation: entry.citation().to_string(),
        summary: entry
            .summary()
            .unwrap_or_else(|| rule_key.default_summary())
            .to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RulesetStore;
    use serde_json::Value;

    const MICHIGAN: &str = include_str!("../../config/michigan-esta.json");

    fn ruleset() -> Ruleset {
        RulesetStore::from_json_str(MICHIGAN).unwrap().into_ruleset()
    }

    #[test]
    fn test_detailed_entry_uses_configured_summary() {
        let reference =
            resolve_reference(&ruleset(), EmployerSizeTier::Large, RuleKey::Accrual).unwrap();

        assert_eq!(reference.citation, "MCL 408.963(1)");
        assert_eq!(reference.rule_key, "accrual");
        assert_eq!(reference.tier, EmployerSizeTier::Large);
        assert!(reference.summary.contains("30 hours worked"));
    }

    #[test]
    fn test_bare_citation_gets_default_summary() {
        let reference =
            resolve_reference(&ruleset(), EmployerSizeTier::Small, RuleKey::Carryover).unwrap();

        assert_eq!(reference.citation, "MCL 408.963(4)");
        assert_eq!(reference.summary, RuleKey::Carryover.default_summary());
    }

    #[test]
    fn test_missing_reference_is_an_error() {
        // The large tier has no unpaid-leave entitlement and no citation for it.
        let result = resolve_reference(&ruleset(), EmployerSizeTier::Large, RuleKey::UnpaidLeave);

        match result {
            Err(EngineError::MissingReference { tier, rule_key }) => {
                assert_eq!(tier, EmployerSizeTier::Large);
                assert_eq!(rule_key, "unpaidLeave");
            }
            other => panic!("Expected MissingReference, got {:?}", other),
        }
    }

    #[test]
    fn test_lookup_is_per_tier() {
        let mut doc: Value = serde_json::from_str(MICHIGAN).unwrap();
        doc["tiers"]["small"]["legislativeReferences"]
            .as_object_mut()
            .unwrap()
            .remove("waitingPeriod");
        let ruleset = RulesetStore::from_json_str(&doc.to_string())
            .unwrap()
            .into_ruleset();

        assert!(resolve_reference(&ruleset, EmployerSizeTier::Large, RuleKey::WaitingPeriod).is_ok());
        assert!(resolve_reference(&ruleset, EmployerSizeTier::Small, RuleKey::WaitingPeriod).is_err());
    }

    #[test]
    fn test_rule_key_names_match_document_keys() {
        assert_eq!(RuleKey::WaitingPeriod.to_string(), "waitingPeriod");
        assert_eq!(RuleKey::EffectiveDate.as_str(), "effectiveDate");
    }
}
