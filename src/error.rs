//! Error types for the statutory accrual engine.
//!
//! Configuration-level failures are returned as [`EngineError`] and must halt
//! startup. Problems with an individual fact record (negative hours, a
//! negative balance) are never returned here: they are reported inside the
//! result as [`FactViolation`](crate::models::FactViolation) entries so that a
//! batch of employees is not aborted by one bad record.

use thiserror::Error;

use crate::config::EmployerSizeTier;

/// The main error type for the accrual engine.
///
/// # Example
///
/// ```
/// use esta_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/ruleset.json".to_string(),
/// };
/// assert_eq!(error.to_string(), "Ruleset file not found: /missing/ruleset.json");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// The ruleset document could not be read.
    #[error("Ruleset file not found: {path}")]
    ConfigNotFound {
        /// The path that could not be read.
        path: String,
    },

    /// The ruleset document is malformed or is missing a required field.
    #[error("Failed to parse ruleset '{path}': {message}")]
    ConfigParseError {
        /// The path (or `<inline>`) of the document that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A ruleset value failed one of its structural invariants.
    #[error("Invalid ruleset field '{field}': {message}")]
    InvalidConfig {
        /// The dotted path of the offending field, e.g. `large.annualCapHours`.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// The ruleset failed one or more golden statutory checks.
    #[error("Ruleset integrity violation: {}", errors.join("; "))]
    IntegrityViolation {
        /// The blocking errors from the integrity report, in check order.
        errors: Vec<String>,
    },

    /// A rule produced a result but the ruleset has no citation for it.
    #[error("No legislative reference configured for rule '{rule_key}' on the {tier} tier")]
    MissingReference {
        /// The tier whose reference map was consulted.
        tier: EmployerSizeTier,
        /// The rule key that has no citation.
        rule_key: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
