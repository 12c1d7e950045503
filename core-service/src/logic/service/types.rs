//! Prediction Service types - results, error taxonomy, request stages

use std::fmt;

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logic::features::ValidationError;
use crate::logic::model::Target;

// ============================================================================
// RESULTS
// ============================================================================

/// One shaped model output
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PredictedValue {
    /// Rounded to the nearest currency unit, ties to even
    FineAmount(i64),
    /// Clamped to [0, 100]
    RiskScore(f64),
}

impl PredictedValue {
    pub const RISK_MIN: f64 = 0.0;
    pub const RISK_MAX: f64 = 100.0;

    /// Shape a raw model output according to what the model predicts
    pub fn shape(target: Target, raw: f64) -> Self {
        match target {
            Target::FineAmount => PredictedValue::FineAmount(raw.round_ties_even() as i64),
            Target::RiskScore => PredictedValue::RiskScore(raw.clamp(Self::RISK_MIN, Self::RISK_MAX)),
        }
    }

    pub fn target(&self) -> Target {
        match self {
            PredictedValue::FineAmount(_) => Target::FineAmount,
            PredictedValue::RiskScore(_) => Target::RiskScore,
        }
    }

    /// JSON key used by the CLI output object
    pub fn output_key(&self) -> &'static str {
        match self {
            PredictedValue::FineAmount(_) => "predicted_fine",
            PredictedValue::RiskScore(_) => "predicted_risk_score",
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            PredictedValue::FineAmount(v) => *v as f64,
            PredictedValue::RiskScore(v) => *v,
        }
    }
}

impl Serialize for PredictedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PredictedValue::FineAmount(v) => serializer.serialize_i64(*v),
            PredictedValue::RiskScore(v) => serializer.serialize_f64(*v),
        }
    }
}

/// Single-record result: `{"predicted_fine": 3000}` or `{"predicted_risk_score": 42.5}`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionResult {
    pub predicted_value: PredictedValue,
}

impl Serialize for PredictionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.predicted_value.output_key(), &self.predicted_value)?;
        map.end()
    }
}

/// `{"error": "..."}`. Never accompanies a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
}

impl ErrorEnvelope {
    pub fn new(message: impl Into<String>) -> Self {
        Self { error: message.into() }
    }

    /// Serialized form; falls back to a fixed string if serialization fails
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"error":"internal error"}"#.to_string())
    }
}

impl From<&ServiceError> for ErrorEnvelope {
    fn from(err: &ServiceError) -> Self {
        Self::new(err.to_string())
    }
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    #[error("No input data provided")]
    EmptyInput,

    #[error("Invalid JSON input: {0}")]
    Decode(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    ModelUnavailable(String),

    #[error("Prediction failed: {0}")]
    Inference(String),
}

impl ServiceError {
    /// Terminal stage a request ends in when it fails with this error
    pub fn stage(&self) -> RequestStage {
        match self {
            ServiceError::EmptyInput | ServiceError::Decode(_) | ServiceError::Validation(_) => {
                RequestStage::Rejected
            }
            ServiceError::ModelUnavailable(_) | ServiceError::Inference(_) => RequestStage::Failed,
        }
    }

    /// Caller's fault (bad input) as opposed to a server-side failure
    pub fn is_client_error(&self) -> bool {
        self.stage() == RequestStage::Rejected
    }
}

// ============================================================================
// REQUEST STAGES
// ============================================================================

/// Received -> Validated -> Scored -> Responded, or Rejected / Failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStage {
    Received,
    Validated,
    Scored,
    Responded,
    Rejected,
    Failed,
}

impl RequestStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStage::Responded | RequestStage::Rejected | RequestStage::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStage::Received => "received",
            RequestStage::Validated => "validated",
            RequestStage::Scored => "scored",
            RequestStage::Responded => "responded",
            RequestStage::Rejected => "rejected",
            RequestStage::Failed => "failed",
        }
    }
}

impl fmt::Display for RequestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fine_amount_rounds() {
        assert_eq!(PredictedValue::shape(Target::FineAmount, 2999.5), PredictedValue::FineAmount(3000));
        assert_eq!(PredictedValue::shape(Target::FineAmount, 2999.4), PredictedValue::FineAmount(2999));
        assert_eq!(PredictedValue::shape(Target::FineAmount, -0.2), PredictedValue::FineAmount(0));
    }

    #[test]
    fn test_fine_amount_half_rounds_to_even() {
        // two trees at 2997 and 3000 average to 2998.5
        assert_eq!(PredictedValue::shape(Target::FineAmount, 2998.5), PredictedValue::FineAmount(2998));
        assert_eq!(PredictedValue::shape(Target::FineAmount, 2500.5), PredictedValue::FineAmount(2500));
        assert_eq!(PredictedValue::shape(Target::FineAmount, 2999.5), PredictedValue::FineAmount(3000));
        assert_eq!(PredictedValue::shape(Target::FineAmount, -0.5), PredictedValue::FineAmount(0));
    }

    #[test]
    fn test_risk_score_clamps() {
        assert_eq!(PredictedValue::shape(Target::RiskScore, 104.2), PredictedValue::RiskScore(100.0));
        assert_eq!(PredictedValue::shape(Target::RiskScore, -3.0), PredictedValue::RiskScore(0.0));
        assert_eq!(PredictedValue::shape(Target::RiskScore, 42.5), PredictedValue::RiskScore(42.5));
    }

    #[test]
    fn test_result_json() {
        let fine = PredictionResult { predicted_value: PredictedValue::FineAmount(0) };
        assert_eq!(serde_json::to_string(&fine).unwrap(), r#"{"predicted_fine":0}"#);

        let risk = PredictionResult { predicted_value: PredictedValue::RiskScore(42.5) };
        assert_eq!(serde_json::to_string(&risk).unwrap(), r#"{"predicted_risk_score":42.5}"#);
    }

    #[test]
    fn test_envelope_json() {
        let envelope = ErrorEnvelope::from(&ServiceError::EmptyInput);
        assert_eq!(envelope.to_json(), r#"{"error":"No input data provided"}"#);
    }

    #[test]
    fn test_validation_message_passes_through() {
        let err: ServiceError = ValidationError::MissingField { field: "PastViolations" }.into();
        assert_eq!(err.to_string(), "Missing required key: PastViolations");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_error_stages() {
        assert_eq!(ServiceError::Decode("x".into()).stage(), RequestStage::Rejected);
        assert_eq!(ServiceError::ModelUnavailable("x".into()).stage(), RequestStage::Failed);
        assert_eq!(ServiceError::Inference("x".into()).stage(), RequestStage::Failed);
        assert!(RequestStage::Failed.is_terminal());
        assert!(!RequestStage::Validated.is_terminal());
    }
}
