//! Prediction pipeline
//!
//! Per request: Received -> Validated -> Scored -> Responded.
//! Bad input ends in Rejected before the model is touched; a missing model or
//! a provider failure ends in Failed. The model is only ever read.

use serde_json::{Map, Value};

use super::types::{PredictedValue, PredictionResult, RequestStage, ServiceError};
use crate::logic::features::{validate, FeatureRecord, FeatureRow, Schema};
use crate::logic::model::ModelHandle;

pub struct PredictionService<'a> {
    schema: Schema,
    handle: &'a ModelHandle,
}

impl<'a> PredictionService<'a> {
    pub fn new(schema: Schema, handle: &'a ModelHandle) -> Self {
        Self { schema, handle }
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    /// Score a single JSON object
    pub fn predict(&self, raw: &str) -> Result<PredictionResult, ServiceError> {
        self.run(raw, false)?
            .into_iter()
            .next()
            .map(|predicted_value| PredictionResult { predicted_value })
            .ok_or_else(|| ServiceError::Inference("model returned no output".to_string()))
    }

    /// Score a JSON object or an array of objects. One invalid element fails the batch.
    pub fn predict_batch(&self, raw: &str) -> Result<Vec<PredictedValue>, ServiceError> {
        self.run(raw, true)
    }

    fn run(&self, raw: &str, allow_array: bool) -> Result<Vec<PredictedValue>, ServiceError> {
        log::debug!("prediction request {} ({} bytes)", RequestStage::Received, raw.len());

        let outcome = self.decode(raw, allow_array).and_then(|records| {
            log::debug!("{} record(s) {}", records.len(), RequestStage::Validated);
            self.score(&records)
        });

        match &outcome {
            Ok(values) => log::debug!("{} prediction(s) {}", values.len(), RequestStage::Responded),
            Err(e) if e.is_client_error() => log::info!("prediction {}: {}", e.stage(), e),
            Err(e) => log::warn!("prediction {}: {}", e.stage(), e),
        }
        outcome
    }

    fn decode(&self, raw: &str, allow_array: bool) -> Result<Vec<FeatureRecord>, ServiceError> {
        if raw.trim().is_empty() {
            return Err(ServiceError::EmptyInput);
        }

        let value: Value = serde_json::from_str(raw).map_err(|e| ServiceError::Decode(e.to_string()))?;

        match value {
            Value::Object(map) => Ok(vec![validate(&map, self.schema)?]),
            Value::Array(items) if allow_array => {
                if items.is_empty() {
                    return Err(ServiceError::EmptyInput);
                }
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| -> Result<FeatureRecord, ServiceError> {
                        let map = as_object(item).ok_or_else(|| {
                            ServiceError::Decode(format!("element {} is {}, expected an object", i, kind_of(item)))
                        })?;
                        Ok(validate(map, self.schema)?)
                    })
                    .collect()
            }
            other => Err(ServiceError::Decode(format!(
                "expected a JSON object, found {}",
                kind_of(&other)
            ))),
        }
    }

    fn score(&self, records: &[FeatureRecord]) -> Result<Vec<PredictedValue>, ServiceError> {
        let loaded = self
            .handle
            .loaded()
            .map_err(|e| ServiceError::ModelUnavailable(e.to_string()))?;
        let model = loaded.model();

        if model.schema() != self.schema {
            return Err(ServiceError::ModelUnavailable(format!(
                "Loaded model expects {} features but the service accepts {} features",
                model.schema(),
                self.schema
            )));
        }

        let rows: Vec<FeatureRow> = records.iter().map(FeatureRecord::to_row).collect();
        let outputs = model
            .predict(&rows)
            .map_err(|e| ServiceError::Inference(e.to_string()))?;

        if outputs.len() != rows.len() {
            return Err(ServiceError::Inference(format!(
                "model returned {} outputs for {} rows",
                outputs.len(),
                rows.len()
            )));
        }
        if let Some(bad) = outputs.iter().find(|v| !v.is_finite()) {
            return Err(ServiceError::Inference(format!("model returned non-finite output {}", bad)));
        }

        log::debug!("{} row(s) {} by {} model", rows.len(), RequestStage::Scored, model.kind());

        let target = model.target();
        Ok(outputs.into_iter().map(|v| PredictedValue::shape(target, v)).collect())
    }
}

fn as_object(value: &Value) -> Option<&Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::features::{Cell, ValidationError};
    use crate::logic::model::{InferenceError, RegressionModel, Target};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Returns a fixed output per row and counts calls
    struct FixedModel {
        schema: Schema,
        target: Target,
        output: f64,
        calls: Arc<AtomicUsize>,
    }

    impl FixedModel {
        fn new(schema: Schema, target: Target, output: f64) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let model = Self { schema, target, output, calls: Arc::clone(&calls) };
            (model, calls)
        }
    }

    impl RegressionModel for FixedModel {
        fn schema(&self) -> Schema {
            self.schema
        }

        fn target(&self) -> Target {
            self.target
        }

        fn predict(&self, rows: &[FeatureRow]) -> Result<Vec<f64>, InferenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![self.output; rows.len()])
        }
    }

    /// Echoes Speed_Exceeded * 100 so batch order is observable
    struct EchoSpeed;

    impl RegressionModel for EchoSpeed {
        fn schema(&self) -> Schema {
            Schema::Fine
        }

        fn predict(&self, rows: &[FeatureRow]) -> Result<Vec<f64>, InferenceError> {
            rows.iter()
                .map(|r| {
                    r.number("Speed_Exceeded")
                        .map(|s| s * 100.0)
                        .ok_or_else(|| InferenceError("no speed".to_string()))
                })
                .collect()
        }
    }

    struct Broken(Vec<f64>);

    impl RegressionModel for Broken {
        fn schema(&self) -> Schema {
            Schema::Fine
        }

        fn predict(&self, _rows: &[FeatureRow]) -> Result<Vec<f64>, InferenceError> {
            if self.0.is_empty() {
                Err(InferenceError("tensor shape mismatch".to_string()))
            } else {
                Ok(self.0.clone())
            }
        }
    }

    const FINE_RECORD: &str = r#"{"Vehicle_Type": "Car", "Location_Risk": "High", "Road_Condition": "School", "Speed_Exceeded": 20, "Previous_Violations": 1}"#;

    #[test]
    fn test_risk_record_against_fine_amount_model() {
        let (model, calls) = FixedModel::new(Schema::Risk, Target::FineAmount, 0.0);
        let handle = ModelHandle::from_model(model);
        let service = PredictionService::new(Schema::Risk, &handle);

        let result = service
            .predict(r#"{"SpeedOverLimit": 5, "LocationType": "Residential", "TimeOfDay": "Day", "PastViolations": 0}"#)
            .unwrap();

        assert_eq!(result.predicted_value, PredictedValue::FineAmount(0));
        assert_eq!(serde_json::to_string(&result).unwrap(), r#"{"predicted_fine":0}"#);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_field_never_reaches_model() {
        let (model, calls) = FixedModel::new(Schema::Risk, Target::RiskScore, 50.0);
        let handle = ModelHandle::from_model(model);
        let service = PredictionService::new(Schema::Risk, &handle);

        let err = service
            .predict(r#"{"SpeedOverLimit": 5, "LocationType": "Urban", "TimeOfDay": "Day"}"#)
            .unwrap_err();

        assert_eq!(
            err,
            ServiceError::Validation(ValidationError::MissingField { field: "PastViolations" })
        );
        assert_eq!(err.stage(), RequestStage::Rejected);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_risk_score_shaping() {
        let (model, _) = FixedModel::new(Schema::Risk, Target::RiskScore, 123.4);
        let handle = ModelHandle::from_model(model);
        let service = PredictionService::new(Schema::Risk, &handle);

        let result = service
            .predict(r#"{"SpeedOverLimit": "12.5", "LocationType": "SchoolZone", "TimeOfDay": "Night", "PastViolations": 3}"#)
            .unwrap();
        assert_eq!(result.predicted_value, PredictedValue::RiskScore(100.0));
    }

    #[test]
    fn test_fine_amount_is_rounded() {
        let (model, _) = FixedModel::new(Schema::Fine, Target::FineAmount, 4999.6);
        let handle = ModelHandle::from_model(model);
        let service = PredictionService::new(Schema::Fine, &handle);
        assert_eq!(service.predict(FINE_RECORD).unwrap().predicted_value, PredictedValue::FineAmount(5000));
    }

    #[test]
    fn test_empty_and_whitespace_input() {
        let handle = ModelHandle::default();
        let service = PredictionService::new(Schema::Fine, &handle);
        assert_eq!(service.predict("").unwrap_err(), ServiceError::EmptyInput);
        assert_eq!(service.predict("  \n\t").unwrap_err(), ServiceError::EmptyInput);
        assert_eq!(service.predict_batch("[]").unwrap_err(), ServiceError::EmptyInput);
    }

    #[test]
    fn test_decode_errors() {
        let handle = ModelHandle::default();
        let service = PredictionService::new(Schema::Fine, &handle);
        assert!(matches!(service.predict("{not json"), Err(ServiceError::Decode(_))));
        assert!(matches!(service.predict("42"), Err(ServiceError::Decode(_))));
        // arrays only for batch
        assert!(matches!(service.predict(&format!("[{}]", FINE_RECORD)), Err(ServiceError::Decode(_))));
        let err = service.predict_batch(&format!("[{}, 7]", FINE_RECORD)).unwrap_err();
        assert_eq!(err, ServiceError::Decode("element 1 is a number, expected an object".to_string()));
    }

    #[test]
    fn test_validation_precedes_model_lookup() {
        let handle = ModelHandle::default();
        let service = PredictionService::new(Schema::Fine, &handle);
        let err = service.predict(r#"{"Vehicle_Type": "Car"}"#).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn test_model_unavailable() {
        let handle = ModelHandle::LoadFailed {
            source: "models/fine_model.json".to_string(),
            reason: "file not found".to_string(),
        };
        let service = PredictionService::new(Schema::Fine, &handle);
        let err = service.predict(FINE_RECORD).unwrap_err();
        assert!(matches!(err, ServiceError::ModelUnavailable(ref m) if m.contains("file not found")));
        assert_eq!(err.stage(), RequestStage::Failed);
    }

    #[test]
    fn test_schema_mismatch_is_model_unavailable() {
        let (model, calls) = FixedModel::new(Schema::Risk, Target::RiskScore, 1.0);
        let handle = ModelHandle::from_model(model);
        let service = PredictionService::new(Schema::Fine, &handle);
        assert!(matches!(service.predict(FINE_RECORD), Err(ServiceError::ModelUnavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_inference_failures() {
        let handle = ModelHandle::from_model(Broken(vec![]));
        let service = PredictionService::new(Schema::Fine, &handle);
        let err = service.predict(FINE_RECORD).unwrap_err();
        assert_eq!(err.to_string(), "Prediction failed: tensor shape mismatch");

        let handle = ModelHandle::from_model(Broken(vec![1.0, 2.0]));
        let service = PredictionService::new(Schema::Fine, &handle);
        assert!(matches!(service.predict(FINE_RECORD), Err(ServiceError::Inference(_))));

        let handle = ModelHandle::from_model(Broken(vec![f64::NAN]));
        let service = PredictionService::new(Schema::Fine, &handle);
        assert!(matches!(service.predict(FINE_RECORD), Err(ServiceError::Inference(_))));
    }

    #[test]
    fn test_batch_preserves_order() {
        let handle = ModelHandle::from_model(EchoSpeed);
        let service = PredictionService::new(Schema::Fine, &handle);
        let batch = format!(
            "[{}, {}]",
            FINE_RECORD,
            FINE_RECORD.replace("\"Speed_Exceeded\": 20", "\"Speed_Exceeded\": 3")
        );
        let values = service.predict_batch(&batch).unwrap();
        assert_eq!(values, vec![PredictedValue::FineAmount(2000), PredictedValue::FineAmount(300)]);
    }

    #[test]
    fn test_batch_single_object() {
        let handle = ModelHandle::from_model(EchoSpeed);
        let service = PredictionService::new(Schema::Fine, &handle);
        assert_eq!(service.predict_batch(FINE_RECORD).unwrap(), vec![PredictedValue::FineAmount(2000)]);
    }

    #[test]
    fn test_one_bad_element_fails_batch() {
        let (model, calls) = FixedModel::new(Schema::Fine, Target::FineAmount, 1.0);
        let handle = ModelHandle::from_model(model);
        let service = PredictionService::new(Schema::Fine, &handle);
        let batch = format!("[{}, {{\"Vehicle_Type\": \"Car\"}}]", FINE_RECORD);
        assert!(matches!(service.predict_batch(&batch), Err(ServiceError::Validation(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_forest_rows_carry_declared_names() {
        let record = validate(
            serde_json::from_str::<Value>(FINE_RECORD).unwrap().as_object().unwrap(),
            Schema::Fine,
        )
        .unwrap();
        let row = record.to_row();
        assert_eq!(row.get("Vehicle_Type"), Some(&Cell::Category("Car".to_string())));
        assert_eq!(row.number("Previous_Violations"), Some(1.0));
    }
}
