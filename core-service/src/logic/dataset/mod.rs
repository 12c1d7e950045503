//! Dataset Module - Synthetic labeled datasets
//!
//! Draws seeded random feature tuples, labels them with the reference
//! penalty rules and writes CSV. Same seed + same row count = same bytes.

pub mod generator;
pub mod table;

pub use generator::{generate, DatasetGenerator, GeneratorConfig, GeneratorError};
pub use table::{Dataset, DatasetSummary, NumericRange, Sample};
