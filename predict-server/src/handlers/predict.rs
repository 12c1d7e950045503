//! Prediction handler

use axum::{body::Bytes, extract::State, Json};
use penalty_core::PredictionService;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub predictions: Vec<f64>,
}

/// POST /predict - one JSON object or an array of objects
pub async fn predict(State(state): State<AppState>, body: Bytes) -> AppResult<Json<PredictResponse>> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("predict", %request_id, schema = %state.schema);

    span.in_scope(|| -> AppResult<Json<PredictResponse>> {
        let raw = std::str::from_utf8(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid JSON input: {}", e)))?;
        tracing::debug!("Received {} bytes", raw.len());

        let service = PredictionService::new(state.schema, &state.model);
        let values = service.predict_batch(raw)?;

        let predictions: Vec<f64> = values.iter().map(|v| round2(v.as_f64())).collect();
        tracing::info!("Scored {} record(s)", predictions.len());

        Ok(Json(PredictResponse { predictions }))
    })
}

/// Two decimals, ties to even
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(42.456), 42.46);
        assert_eq!(round2(3000.0), 3000.0);
        assert_eq!(round2(0.004), 0.0);
    }

    #[test]
    fn test_round2_ties_to_even() {
        assert_eq!(round2(42.125), 42.12);
        assert_eq!(round2(42.375), 42.38);
        assert_eq!(round2(2998.5), 2998.5);
    }
}
