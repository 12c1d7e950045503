//! Labeled dataset table, CSV output and summary statistics

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::logic::features::{Cell, FeatureRecord, Schema};

/// One labeled row. Labels are integral for both schemas.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub features: FeatureRecord,
    pub label: i64,
}

#[derive(Debug, Clone)]
pub struct Dataset {
    schema: Schema,
    seed: u64,
    samples: Vec<Sample>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

impl NumericRange {
    fn include(range: Option<NumericRange>, v: f64) -> NumericRange {
        match range {
            Some(r) => NumericRange { min: r.min.min(v), max: r.max.max(v) },
            None => NumericRange { min: v, max: v },
        }
    }
}

/// Dataset statistics (row count, label range, feature ranges, categories seen)
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub schema: Schema,
    pub rows: usize,
    pub label_column: &'static str,
    pub label_min: Option<i64>,
    pub label_max: Option<i64>,
    pub numeric: BTreeMap<String, NumericRange>,
    pub categories: BTreeMap<String, BTreeSet<String>>,
}

impl Dataset {
    pub fn new(schema: Schema, seed: u64, samples: Vec<Sample>) -> Self {
        Self { schema, seed, samples }
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Schema columns in declared order, then the label column
    pub fn header(&self) -> Vec<&'static str> {
        let mut header = self.schema.column_names();
        header.push(self.schema.label_column());
        header
    }

    pub fn write_csv<W: Write>(&self, mut out: W) -> io::Result<()> {
        writeln!(out, "{}", self.header().join(","))?;
        for sample in &self.samples {
            let mut fields: Vec<String> = sample
                .features
                .field_texts()
                .iter()
                .map(|f| escape_csv(f))
                .collect();
            fields.push(sample.label.to_string());
            writeln!(out, "{}", fields.join(","))?;
        }
        out.flush()
    }

    pub fn to_csv(&self) -> String {
        let mut buf = Vec::new();
        // writing into a Vec cannot fail
        let _ = self.write_csv(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// SHA-256 of the CSV bytes, hex encoded
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(self.to_csv().as_bytes()))
    }

    pub fn summary(&self) -> DatasetSummary {
        let mut numeric: BTreeMap<String, NumericRange> = BTreeMap::new();
        let mut categories: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for sample in &self.samples {
            let row = sample.features.to_row();
            for name in self.schema.column_names() {
                match row.get(name) {
                    Some(Cell::Number(v)) => {
                        let range = NumericRange::include(numeric.get(name).copied(), *v);
                        numeric.insert(name.to_string(), range);
                    }
                    Some(Cell::Category(c)) => {
                        categories.entry(name.to_string()).or_default().insert(c.clone());
                    }
                    None => {}
                }
            }
        }

        DatasetSummary {
            schema: self.schema,
            rows: self.samples.len(),
            label_column: self.schema.label_column(),
            label_min: self.samples.iter().map(|s| s.label).min(),
            label_max: self.samples.iter().map(|s| s.label).max(),
            numeric,
            categories,
        }
    }
}

fn escape_csv(field: &str) -> String {
    if field.contains(|c: char| matches!(c, ',' | '"' | '\n' | '\r')) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
