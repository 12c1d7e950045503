//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! Reference tables for the penalty rules live in `logic::penalty::rules`.

/// Default seed for synthetic dataset generation
pub const DEFAULT_SEED: u64 = 42;

/// Default row count for the risk-score dataset
pub const DEFAULT_RISK_ROWS: usize = 900;

/// Default row count for the fine dataset
pub const DEFAULT_FINE_ROWS: usize = 1_000_000;

/// Probability that a generated fine sample has no speeding at all
pub const DEFAULT_P_NO_VIOLATION: f64 = 0.3;

/// Default model artifact path
pub const DEFAULT_MODEL_PATH: &str = "models/fine_model.json";

/// Environment variable consulted for the model artifact path
pub const MODEL_PATH_ENV: &str = "PENALTY_MODEL_PATH";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Penalty Estimator";

// ============================================
// CLI exit codes
// ============================================

/// Result printed on stdout
pub const EXIT_SUCCESS: i32 = 0;

/// Generic failure (decode, validation, model, inference)
pub const EXIT_FAILURE: i32 = 1;

/// No payload supplied on argv or stdin
pub const EXIT_EMPTY_INPUT: i32 = 2;

// ============================================
// Helper functions
// ============================================

/// Default dataset size for a schema variant
pub fn default_rows(schema: crate::logic::features::Schema) -> usize {
    match schema {
        crate::logic::features::Schema::Risk => DEFAULT_RISK_ROWS,
        crate::logic::features::Schema::Fine => DEFAULT_FINE_ROWS,
    }
}
