//! Model Provider contract
//!
//! Any regression backend plugs in through `RegressionModel`.
//! `predict` takes `&self`: implementations hold no prediction-time mutable
//! state, so one loaded model serves concurrent requests without locking.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logic::features::{FeatureRow, Schema};

// ============================================================================
// TARGET
// ============================================================================

/// What a model predicts. Decides result shaping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// Currency amount, rounded to an integer
    FineAmount,
    /// Unitless 0-100 severity, may be fractional
    RiskScore,
}

impl Target {
    /// Schema A models predict risk scores, Schema B models predict fines
    pub fn default_for(schema: Schema) -> Self {
        match schema {
            Schema::Risk => Target::RiskScore,
            Schema::Fine => Target::FineAmount,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Target::FineAmount => "fine_amount",
            Target::RiskScore => "risk_score",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// ERRORS
// ============================================================================

/// Provider failed during prediction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct InferenceError(pub String);

/// No usable model behind the handle
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ModelUnavailable(pub String);

/// Artifact could not be loaded
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model artifact is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("model artifact rejected: {0}")]
    Invalid(String),
}

// ============================================================================
// PROVIDER TRAIT
// ============================================================================

/// Regression capability consumed by the prediction service
pub trait RegressionModel: Send + Sync {
    /// Schema the model was trained against
    fn schema(&self) -> Schema;

    fn target(&self) -> Target {
        Target::default_for(self.schema())
    }

    /// One output per row, in row order
    fn predict(&self, rows: &[FeatureRow]) -> Result<Vec<f64>, InferenceError>;

    /// Short description for status reporting
    fn kind(&self) -> &str {
        "regression"
    }
}
