//! Features Module - FeatureRecord schemas and validation
//!
//! Two schemas exist and never mix:
//! - `Schema::Risk` (A): SpeedOverLimit, LocationType, TimeOfDay, PastViolations
//! - `Schema::Fine` (B): Vehicle_Type, Location_Risk, Road_Condition, Speed_Exceeded, Previous_Violations
//!
//! Raw JSON maps go through `validate`, which returns a typed `FeatureRecord`
//! or the first `ValidationError`.

pub mod types;
pub mod validator;

// Re-export common types
pub use types::{
    column, Cell, ColumnKind, ColumnSpec, FeatureRecord, FeatureRow, FineFeatures,
    ParseSchemaError, RiskFeatures, Schema,
};
pub use validator::{validate, ValidationError};
