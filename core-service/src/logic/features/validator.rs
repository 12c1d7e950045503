//! FeatureRecord Validator
//!
//! Checks a raw JSON object against a schema:
//! 1. every required key present (first missing key in declared order wins)
//! 2. every value coercible to its declared type
//!
//! All-or-nothing. Extra keys are ignored.

use serde_json::{Map, Value};
use thiserror::Error;

use super::types::{column, ColumnKind, FeatureRecord, FineFeatures, RiskFeatures, Schema};

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required key: {field}")]
    MissingField { field: &'static str },

    #[error("Invalid value for {field}: expected {expected}, found {found}")]
    InvalidType {
        field: &'static str,
        expected: &'static str,
        found: String,
    },
}

impl ValidationError {
    /// Name of the offending field
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingField { field } => field,
            ValidationError::InvalidType { field, .. } => field,
        }
    }
}

// ============================================================================
// VALIDATION
// ============================================================================

/// Validate a raw object against `schema`
pub fn validate(raw: &Map<String, Value>, schema: Schema) -> Result<FeatureRecord, ValidationError> {
    for spec in schema.columns() {
        if !raw.contains_key(spec.name) {
            return Err(ValidationError::MissingField { field: spec.name });
        }
    }

    let record = match schema {
        Schema::Risk => FeatureRecord::Risk(RiskFeatures {
            speed_over_limit: number(raw, column::SPEED_OVER_LIMIT, ColumnKind::Number)?,
            location_type: category(raw, column::LOCATION_TYPE)?,
            time_of_day: category(raw, column::TIME_OF_DAY)?,
            past_violations: count(raw, column::PAST_VIOLATIONS)?,
        }),
        Schema::Fine => FeatureRecord::Fine(FineFeatures {
            vehicle_type: category(raw, column::VEHICLE_TYPE)?,
            location_risk: category(raw, column::LOCATION_RISK)?,
            road_condition: category(raw, column::ROAD_CONDITION)?,
            speed_exceeded: number(raw, column::SPEED_EXCEEDED, ColumnKind::NonNegativeNumber)?,
            previous_violations: count(raw, column::PREVIOUS_VIOLATIONS)?,
        }),
    };

    let extra = raw.keys().filter(|k| schema.column(k).is_none()).count();
    if extra > 0 {
        log::debug!("Ignoring {} extra key(s) for {} schema", extra, schema);
    }

    Ok(record)
}

// ============================================================================
// COERCION
// ============================================================================

static NULL: Value = Value::Null;

fn lookup<'a>(raw: &'a Map<String, Value>, field: &'static str) -> &'a Value {
    raw.get(field).unwrap_or(&NULL)
}

fn invalid(field: &'static str, kind: ColumnKind, value: &Value) -> ValidationError {
    ValidationError::InvalidType {
        field,
        expected: kind.expected(),
        found: describe(value),
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {}", b),
        Value::Number(n) => format!("number {}", n),
        Value::String(s) => format!("string {:?}", s),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}

fn number(raw: &Map<String, Value>, field: &'static str, kind: ColumnKind) -> Result<f64, ValidationError> {
    let value = lookup(raw, field);
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(v) if v.is_finite() && (kind != ColumnKind::NonNegativeNumber || v >= 0.0) => Ok(v),
        _ => Err(invalid(field, kind, value)),
    }
}

fn count(raw: &Map<String, Value>, field: &'static str) -> Result<u32, ValidationError> {
    let value = lookup(raw, field);
    let parsed = match value {
        Value::Number(n) => match n.as_u64() {
            Some(u) => u32::try_from(u).ok(),
            // 2.0 is accepted, 2.5 and -1 are not
            None => n
                .as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u32::MAX as f64)
                .map(|f| f as u32),
        },
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };

    parsed.ok_or_else(|| invalid(field, ColumnKind::Count, value))
}

fn category(raw: &Map<String, Value>, field: &'static str) -> Result<String, ValidationError> {
    let value = lookup(raw, field);
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(invalid(field, ColumnKind::Category, value)),
    }
}

// ============================================================================
// TESTS
// ============================================================================
