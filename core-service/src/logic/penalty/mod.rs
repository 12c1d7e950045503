//! Penalty Module - Reference Penalty Calculator
//!
//! Deterministic, rule-based ground truth used to label synthetic datasets.
//! Not used for live inference.
//!
//! - `rules.rs` - reference tables and configurable rule sets
//! - `calculator.rs` - fine / risk calculation with term breakdowns

pub mod rules;
pub mod calculator;

pub use calculator::{calculate, FineBreakdown, Reference, RiskBreakdown, RuleError};
pub use rules::{FineBand, FineRules, RiskRules};
