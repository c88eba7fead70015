//! Ruleset loading and management for the statutory accrual engine.
//!
//! This module loads a jurisdiction's ruleset from a JSON or YAML document,
//! validates its structural invariants and exposes it as an immutable
//! [`Ruleset`].
//!
//! # Example
//!
//! ```no_run
//! use esta_engine::config::RulesetStore;
//!
//! let store = RulesetStore::load("./config/michigan-esta.json").unwrap();
//! println!("Loaded ruleset {} ({})", store.ruleset().version(), store.fingerprint());
//! ```

mod loader;
mod types;

pub use loader::{RulesetStore, fingerprint_of};
pub use types::{
    ACCRUAL_DECIMAL_PLACES, AccrualMethod, AccrualRate, EmployerSizeTier, ReferenceEntry, Ruleset,
    TenureBasedRate, TierRules, TierSet,
};
