//! Forest Pipeline - persisted preprocessing + tree-ensemble regressor
//!
//! Artifact layout (JSON):
//!
//! ```text
//! {
//!   "schema": "fine",                 // feature schema the model was trained on
//!   "target": "fine_amount",          // optional, defaults per schema
//!   "categorical": [{"column": "Vehicle_Type", "categories": ["Auto", "Bike"]}],
//!   "numeric": ["Speed_Exceeded", "Previous_Violations"],
//!   "trees": [{"nodes": [{"split": {"feature": 0, "threshold": 0.5, "left": 1, "right": 2}},
//!                        {"leaf": {"value": 0.0}}, {"leaf": {"value": 3000.0}}]}]
//! }
//! ```
//!
//! Encoded vector: one-hot blocks for `categorical` (declared order), then
//! `numeric` passthrough. Unknown categories encode as all zeros.
//! Traversal goes left when `x[feature] <= threshold`. Output is the tree mean.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::provider::{InferenceError, LoadError, RegressionModel, Target};
use crate::logic::features::{FeatureRow, Schema};

// ============================================================================
// ARTIFACT TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalColumn {
    pub column: String,
    /// Categories seen at training time; position = one-hot index
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    /// Node 0 is the root
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestPipeline {
    pub schema: Schema,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,
    #[serde(default)]
    pub categorical: Vec<CategoricalColumn>,
    #[serde(default)]
    pub numeric: Vec<String>,
    pub trees: Vec<Tree>,
}

// ============================================================================
// LOADING & VALIDATION
// ============================================================================

impl ForestPipeline {
    /// Parse and validate an artifact
    pub fn from_slice(bytes: &[u8]) -> Result<Self, LoadError> {
        let pipeline: ForestPipeline = serde_json::from_slice(bytes)?;
        pipeline.validate()?;
        Ok(pipeline)
    }

    /// Encoded feature width
    pub fn width(&self) -> usize {
        self.categorical.iter().map(|c| c.categories.len()).sum::<usize>() + self.numeric.len()
    }

    /// Structural checks; a pipeline that passes cannot index out of bounds
    pub fn validate(&self) -> Result<(), LoadError> {
        self.validate_columns()?;

        if self.trees.is_empty() {
            return Err(LoadError::Invalid("pipeline has no trees".to_string()));
        }

        let width = self.width();
        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(LoadError::Invalid(format!("tree {} has no nodes", t)));
            }
            for (i, node) in tree.nodes.iter().enumerate() {
                match node {
                    Node::Split { feature, threshold, left, right } => {
                        if *feature >= width {
                            return Err(LoadError::Invalid(format!(
                                "tree {} node {}: feature {} outside encoded width {}",
                                t, i, feature, width
                            )));
                        }
                        if !threshold.is_finite() {
                            return Err(LoadError::Invalid(format!(
                                "tree {} node {}: non-finite threshold",
                                t, i
                            )));
                        }
                        // children after parent: rules out cycles, guarantees termination
                        for child in [*left, *right] {
                            if child <= i || child >= tree.nodes.len() {
                                return Err(LoadError::Invalid(format!(
                                    "tree {} node {}: bad child index {}",
                                    t, i, child
                                )));
                            }
                        }
                    }
                    Node::Leaf { value } => {
                        if !value.is_finite() {
                            return Err(LoadError::Invalid(format!(
                                "tree {} node {}: non-finite leaf value",
                                t, i
                            )));
                        }
                    }
                }
            }
        }

        Ok(())
    }

    fn validate_columns(&self) -> Result<(), LoadError> {
        let mut seen = BTreeSet::new();

        for cat in &self.categorical {
            match self.schema.column(&cat.column) {
                Some(spec) if !spec.kind.is_numeric() => {}
                Some(_) => {
                    return Err(LoadError::Invalid(format!(
                        "column {} is numeric in the {} schema but encoded as categorical",
                        cat.column, self.schema
                    )))
                }
                None => {
                    return Err(LoadError::Invalid(format!(
                        "column {} is not part of the {} schema",
                        cat.column, self.schema
                    )))
                }
            }
            if !seen.insert(cat.column.as_str()) {
                return Err(LoadError::Invalid(format!("duplicate column {}", cat.column)));
            }
        }

        for name in &self.numeric {
            match self.schema.column(name) {
                Some(spec) if spec.kind.is_numeric() => {}
                Some(_) => {
                    return Err(LoadError::Invalid(format!(
                        "column {} is categorical in the {} schema but passed through as numeric",
                        name, self.schema
                    )))
                }
                None => {
                    return Err(LoadError::Invalid(format!(
                        "column {} is not part of the {} schema",
                        name, self.schema
                    )))
                }
            }
            if !seen.insert(name.as_str()) {
                return Err(LoadError::Invalid(format!("duplicate column {}", name)));
            }
        }

        let missing: Vec<&str> = self
            .schema
            .column_names()
            .into_iter()
            .filter(|c| !seen.contains(c))
            .collect();
        if !missing.is_empty() {
            return Err(LoadError::Invalid(format!(
                "pipeline does not cover columns: {}",
                missing.join(", ")
            )));
        }

        Ok(())
    }
}

// ============================================================================
// INFERENCE
// ============================================================================

impl ForestPipeline {
    /// One-hot + passthrough encoding of a row
    pub fn encode(&self, row: &FeatureRow) -> Result<Vec<f64>, InferenceError> {
        let mut x = Vec::with_capacity(self.width());

        for cat in &self.categorical {
            let value = row.category(&cat.column).ok_or_else(|| {
                InferenceError(format!("row has no categorical column {}", cat.column))
            })?;
            // handle_unknown = ignore
            x.extend(cat.categories.iter().map(|c| if c == value { 1.0 } else { 0.0 }));
        }

        for name in &self.numeric {
            let value = row
                .number(name)
                .ok_or_else(|| InferenceError(format!("row has no numeric column {}", name)))?;
            x.push(value);
        }

        Ok(x)
    }

    /// Mean of tree outputs for an encoded vector
    pub fn predict_encoded(&self, x: &[f64]) -> Result<f64, InferenceError> {
        if x.len() != self.width() {
            return Err(InferenceError(format!(
                "encoded width {} does not match pipeline width {}",
                x.len(),
                self.width()
            )));
        }
        let mut sum = 0.0;
        for tree in &self.trees {
            sum += tree.evaluate(x)?;
        }
        Ok(sum / self.trees.len() as f64)
    }
}

impl Tree {
    pub fn evaluate(&self, x: &[f64]) -> Result<f64, InferenceError> {
        let mut index = 0;
        loop {
            match self.nodes.get(index) {
                Some(Node::Leaf { value }) => return Ok(*value),
                Some(Node::Split { feature, threshold, left, right }) => {
                    let v = x.get(*feature).copied().ok_or_else(|| {
                        InferenceError(format!("feature index {} out of range", feature))
                    })?;
                    let next = if v <= *threshold { *left } else { *right };
                    if next <= index {
                        return Err(InferenceError(format!("tree loops back at node {}", index)));
                    }
                    index = next;
                }
                None => return Err(InferenceError(format!("tree has no node {}", index))),
            }
        }
    }
}

impl RegressionModel for ForestPipeline {
    fn schema(&self) -> Schema {
        self.schema
    }

    fn target(&self) -> Target {
        self.target.unwrap_or_else(|| Target::default_for(self.schema))
    }

    fn predict(&self, rows: &[FeatureRow]) -> Result<Vec<f64>, InferenceError> {
        rows.iter()
            .map(|row| {
                let x = self.encode(row)?;
                self.predict_encoded(&x)
            })
            .collect()
    }

    fn kind(&self) -> &str {
        "forest"
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::features::{FeatureRecord, FineFeatures};

    /// Fine pipeline: 4 + 3 + 3 one-hot slots, then Speed_Exceeded (10), Previous_Violations (11)
    fn fine_pipeline_json() -> String {
        r#"{
            "schema": "fine",
            "categorical": [
                {"column": "Vehicle_Type", "categories": ["Auto", "Bike", "Car", "Heavy Vehicle"]},
                {"column": "Location_Risk", "categories": ["High", "Low", "Medium"]},
                {"column": "Road_Condition", "categories": ["Highway", "Normal", "School"]}
            ],
            "numeric": ["Speed_Exceeded", "Previous_Violations"],
            "trees": [
                {"nodes": [
                    {"split": {"feature": 10, "threshold": 0.5, "left": 1, "right": 2}},
                    {"leaf": {"value": 0.0}},
                    {"split": {"feature": 2, "threshold": 0.5, "left": 3, "right": 4}},
                    {"leaf": {"value": 5000.0}},
                    {"leaf": {"value": 3000.0}}
                ]},
                {"nodes": [
                    {"split": {"feature": 11, "threshold": 0.5, "left": 1, "right": 2}},
                    {"leaf": {"value": 0.0}},
                    {"leaf": {"value": 2000.0}}
                ]}
            ]
        }"#
        .to_string()
    }

    fn row(vehicle: &str, speed: f64, prev: u32) -> FeatureRow {
        FeatureRecord::Fine(FineFeatures {
            vehicle_type: vehicle.to_string(),
            location_risk: "High".to_string(),
            road_condition: "School".to_string(),
            speed_exceeded: speed,
            previous_violations: prev,
        })
        .to_row()
    }

    #[test]
    fn test_load_and_predict() {
        let pipeline = ForestPipeline::from_slice(fine_pipeline_json().as_bytes()).unwrap();
        assert_eq!(pipeline.width(), 12);
        assert_eq!(pipeline.target(), Target::FineAmount);

        let out = pipeline
            .predict(&[row("Car", 0.0, 0), row("Car", 20.0, 0), row("Bike", 20.0, 1)])
            .unwrap();
        assert_eq!(out, vec![0.0, 1500.0, 3500.0]);
    }

    #[test]
    fn test_one_hot_encoding() {
        let pipeline = ForestPipeline::from_slice(fine_pipeline_json().as_bytes()).unwrap();
        let x = pipeline.encode(&row("Car", 12.0, 2)).unwrap();
        assert_eq!(x, vec![0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 12.0, 2.0]);
    }

    #[test]
    fn test_unknown_category_encodes_as_zeros() {
        let pipeline = ForestPipeline::from_slice(fine_pipeline_json().as_bytes()).unwrap();
        let x = pipeline.encode(&row("Hovercraft", 12.0, 0)).unwrap();
        assert_eq!(&x[0..4], &[0.0, 0.0, 0.0, 0.0]);
        // Car slot is 0 so the first tree takes the 5000 branch
        assert_eq!(pipeline.predict(&[row("Hovercraft", 12.0, 0)]).unwrap(), vec![2500.0]);
    }

    #[test]
    fn test_row_from_other_schema_is_inference_error() {
        let pipeline = ForestPipeline::from_slice(fine_pipeline_json().as_bytes()).unwrap();
        let mut other = FeatureRow::default();
        other.insert("SpeedOverLimit", crate::logic::features::Cell::Number(3.0));
        let err = pipeline.predict(&[other]).unwrap_err();
        assert!(err.0.contains("Vehicle_Type"));
    }

    #[test]
    fn test_target_override() {
        let json = fine_pipeline_json().replacen("\"schema\": \"fine\",", "\"schema\": \"fine\", \"target\": \"risk_score\",", 1);
        let pipeline = ForestPipeline::from_slice(json.as_bytes()).unwrap();
        assert_eq!(pipeline.target(), Target::RiskScore);
    }

    #[test]
    fn test_rejects_missing_column() {
        let json = fine_pipeline_json().replace("\"numeric\": [\"Speed_Exceeded\", \"Previous_Violations\"]", "\"numeric\": [\"Speed_Exceeded\"]");
        let err = ForestPipeline::from_slice(json.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Previous_Violations"), "{}", err);
    }

    #[test]
    fn test_rejects_wrong_schema_columns() {
        let json = fine_pipeline_json().replace("\"schema\": \"fine\"", "\"schema\": \"risk\"");
        assert!(matches!(
            ForestPipeline::from_slice(json.as_bytes()),
            Err(LoadError::Invalid(_))
        ));
    }

    #[test]
    fn test_rejects_backward_child() {
        let json = fine_pipeline_json().replace(
            "{\"split\": {\"feature\": 11, \"threshold\": 0.5, \"left\": 1, \"right\": 2}}",
            "{\"split\": {\"feature\": 11, \"threshold\": 0.5, \"left\": 0, \"right\": 2}}",
        );
        let err = ForestPipeline::from_slice(json.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("bad child index 0"), "{}", err);
    }

    #[test]
    fn test_rejects_feature_out_of_width() {
        let json = fine_pipeline_json().replace("\"feature\": 11", "\"feature\": 12");
        assert!(ForestPipeline::from_slice(json.as_bytes()).is_err());
    }

    #[test]
    fn test_rejects_empty_forest() {
        let mut pipeline = ForestPipeline::from_slice(fine_pipeline_json().as_bytes()).unwrap();
        pipeline.trees.clear();
        assert!(pipeline.validate().is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            ForestPipeline::from_slice(b"not json"),
            Err(LoadError::Parse(_))
        ));
    }
}
