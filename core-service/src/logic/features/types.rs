//! Feature Types
//!
//! Core types for the two feature schemas.
//! No validation logic here - see `validator.rs`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// COLUMN NAMES
// ============================================================================

/// Exact column names, case-sensitive. Model artifacts are keyed by these.
pub mod column {
    pub const SPEED_OVER_LIMIT: &str = "SpeedOverLimit";
    pub const LOCATION_TYPE: &str = "LocationType";
    pub const TIME_OF_DAY: &str = "TimeOfDay";
    pub const PAST_VIOLATIONS: &str = "PastViolations";

    pub const VEHICLE_TYPE: &str = "Vehicle_Type";
    pub const LOCATION_RISK: &str = "Location_Risk";
    pub const ROAD_CONDITION: &str = "Road_Condition";
    pub const SPEED_EXCEEDED: &str = "Speed_Exceeded";
    pub const PREVIOUS_VIOLATIONS: &str = "Previous_Violations";
}

/// Declared type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Any finite float
    Number,
    /// Finite float >= 0
    NonNegativeNumber,
    /// Integer >= 0
    Count,
    /// Free-form category string
    Category,
}

impl ColumnKind {
    pub fn expected(&self) -> &'static str {
        match self {
            ColumnKind::Number => "number",
            ColumnKind::NonNegativeNumber => "non-negative number",
            ColumnKind::Count => "non-negative integer",
            ColumnKind::Category => "string",
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, ColumnKind::Category)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const RISK_COLUMNS: [ColumnSpec; 4] = [
    ColumnSpec { name: column::SPEED_OVER_LIMIT, kind: ColumnKind::Number },
    ColumnSpec { name: column::LOCATION_TYPE, kind: ColumnKind::Category },
    ColumnSpec { name: column::TIME_OF_DAY, kind: ColumnKind::Category },
    ColumnSpec { name: column::PAST_VIOLATIONS, kind: ColumnKind::Count },
];

const FINE_COLUMNS: [ColumnSpec; 5] = [
    ColumnSpec { name: column::VEHICLE_TYPE, kind: ColumnKind::Category },
    ColumnSpec { name: column::LOCATION_RISK, kind: ColumnKind::Category },
    ColumnSpec { name: column::ROAD_CONDITION, kind: ColumnKind::Category },
    ColumnSpec { name: column::SPEED_EXCEEDED, kind: ColumnKind::NonNegativeNumber },
    ColumnSpec { name: column::PREVIOUS_VIOLATIONS, kind: ColumnKind::Count },
];

// ============================================================================
// SCHEMA
// ============================================================================

/// Active feature schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Schema {
    /// Schema A - risk features (speed over limit, location type, time of day)
    Risk,
    /// Schema B - fine features (vehicle type, location risk, road condition)
    Fine,
}

impl Schema {
    pub fn as_str(&self) -> &'static str {
        match self {
            Schema::Risk => "risk",
            Schema::Fine => "fine",
        }
    }

    /// Required columns in declared order
    pub fn columns(&self) -> &'static [ColumnSpec] {
        match self {
            Schema::Risk => &RISK_COLUMNS,
            Schema::Fine => &FINE_COLUMNS,
        }
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns().iter().map(|c| c.name).collect()
    }

    pub fn column(&self, name: &str) -> Option<&'static ColumnSpec> {
        self.columns().iter().find(|c| c.name == name)
    }

    /// Label column written by the dataset generator
    pub fn label_column(&self) -> &'static str {
        match self {
            Schema::Risk => "RiskScore",
            Schema::Fine => "Fine",
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown schema '{0}' (expected 'risk' or 'fine')")]
pub struct ParseSchemaError(pub String);

impl FromStr for Schema {
    type Err = ParseSchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "risk" | "a" => Ok(Schema::Risk),
            "fine" | "b" => Ok(Schema::Fine),
            _ => Err(ParseSchemaError(s.to_string())),
        }
    }
}

// ============================================================================
// RECORDS
// ============================================================================

/// Schema A record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFeatures {
    #[serde(rename = "SpeedOverLimit")]
    pub speed_over_limit: f64,
    #[serde(rename = "LocationType")]
    pub location_type: String,
    #[serde(rename = "TimeOfDay")]
    pub time_of_day: String,
    #[serde(rename = "PastViolations")]
    pub past_violations: u32,
}

/// Schema B record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FineFeatures {
    #[serde(rename = "Vehicle_Type")]
    pub vehicle_type: String,
    #[serde(rename = "Location_Risk")]
    pub location_risk: String,
    #[serde(rename = "Road_Condition")]
    pub road_condition: String,
    #[serde(rename = "Speed_Exceeded")]
    pub speed_exceeded: f64,
    #[serde(rename = "Previous_Violations")]
    pub previous_violations: u32,
}

/// Validated, typed input to the estimation core
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureRecord {
    Risk(RiskFeatures),
    Fine(FineFeatures),
}

impl FeatureRecord {
    pub fn schema(&self) -> Schema {
        match self {
            FeatureRecord::Risk(_) => Schema::Risk,
            FeatureRecord::Fine(_) => Schema::Fine,
        }
    }

    /// Reshape into the provider-facing row
    pub fn to_row(&self) -> FeatureRow {
        let mut row = FeatureRow::default();
        match self {
            FeatureRecord::Risk(r) => {
                row.insert(column::SPEED_OVER_LIMIT, Cell::Number(r.speed_over_limit));
                row.insert(column::LOCATION_TYPE, Cell::Category(r.location_type.clone()));
                row.insert(column::TIME_OF_DAY, Cell::Category(r.time_of_day.clone()));
                row.insert(column::PAST_VIOLATIONS, Cell::Number(r.past_violations as f64));
            }
            FeatureRecord::Fine(r) => {
                row.insert(column::VEHICLE_TYPE, Cell::Category(r.vehicle_type.clone()));
                row.insert(column::LOCATION_RISK, Cell::Category(r.location_risk.clone()));
                row.insert(column::ROAD_CONDITION, Cell::Category(r.road_condition.clone()));
                row.insert(column::SPEED_EXCEEDED, Cell::Number(r.speed_exceeded));
                row.insert(column::PREVIOUS_VIOLATIONS, Cell::Number(r.previous_violations as f64));
            }
        }
        row
    }

    /// Cell values as text, in declared column order (CSV output)
    pub fn field_texts(&self) -> Vec<String> {
        match self {
            FeatureRecord::Risk(r) => vec![
                r.speed_over_limit.to_string(),
                r.location_type.clone(),
                r.time_of_day.clone(),
                r.past_violations.to_string(),
            ],
            FeatureRecord::Fine(r) => vec![
                r.vehicle_type.clone(),
                r.location_risk.clone(),
                r.road_condition.clone(),
                r.speed_exceeded.to_string(),
                r.previous_violations.to_string(),
            ],
        }
    }
}

impl From<RiskFeatures> for FeatureRecord {
    fn from(value: RiskFeatures) -> Self {
        FeatureRecord::Risk(value)
    }
}

impl From<FineFeatures> for FeatureRecord {
    fn from(value: FineFeatures) -> Self {
        FeatureRecord::Fine(value)
    }
}

// ============================================================================
// PROVIDER ROW SHAPE
// ============================================================================

/// One cell of a provider row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Category(String),
}

/// Name -> cell mapping handed to a model provider.
///
/// Order-independent; names match the schema exactly.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureRow {
    cells: BTreeMap<String, Cell>,
}

impl FeatureRow {
    pub fn insert(&mut self, name: &str, cell: Cell) {
        self.cells.insert(name.to_string(), cell);
    }

    pub fn get(&self, name: &str) -> Option<&Cell> {
        self.cells.get(name)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        match self.cells.get(name) {
            Some(Cell::Number(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn category(&self, name: &str) -> Option<&str> {
        match self.cells.get(name) {
            Some(Cell::Category(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_parse() {
        assert_eq!("risk".parse::<Schema>(), Ok(Schema::Risk));
        assert_eq!(" FINE ".parse::<Schema>(), Ok(Schema::Fine));
        assert_eq!("A".parse::<Schema>(), Ok(Schema::Risk));
        assert!("speed".parse::<Schema>().is_err());
    }

    #[test]
    fn test_schemas_do_not_share_columns() {
        let risk = Schema::Risk.column_names();
        for name in Schema::Fine.column_names() {
            assert!(!risk.contains(&name), "{} appears in both schemas", name);
        }
    }

    #[test]
    fn test_row_names_match_schema() {
        let record = FeatureRecord::Fine(FineFeatures {
            vehicle_type: "Car".to_string(),
            location_risk: "High".to_string(),
            road_condition: "School".to_string(),
            speed_exceeded: 12.0,
            previous_violations: 1,
        });
        let row = record.to_row();

        let mut expected = Schema::Fine.column_names();
        expected.sort();
        assert_eq!(row.names().collect::<Vec<_>>(), expected);
        assert_eq!(row.number(column::SPEED_EXCEEDED), Some(12.0));
        assert_eq!(row.category(column::VEHICLE_TYPE), Some("Car"));
        assert_eq!(row.number(column::VEHICLE_TYPE), None);
    }

    #[test]
    fn test_record_serializes_with_exact_column_names() {
        let record = FeatureRecord::Risk(RiskFeatures {
            speed_over_limit: 5.0,
            location_type: "Residential".to_string(),
            time_of_day: "Day".to_string(),
            past_violations: 0,
        });
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["SpeedOverLimit"], 5.0);
        assert_eq!(json["LocationType"], "Residential");
        assert_eq!(json["PastViolations"], 0);
    }
}
