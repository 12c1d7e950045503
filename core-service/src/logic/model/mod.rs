//! Model Module - Model Provider
//!
//! The trained regression pipeline is an opaque `predict` capability.
//! - `provider.rs` - `RegressionModel` trait, targets, errors
//! - `handle.rs` - lifecycle handle (Uninitialized / Loaded / LoadFailed)
//! - `forest.rs` - JSON pipeline artifact: one-hot preprocessing + tree ensemble

pub mod provider;
pub mod handle;
pub mod forest;

// Re-export common types
pub use forest::{CategoricalColumn, ForestPipeline, Node, Tree};
pub use handle::{LoadedModel, ModelHandle, ModelMetadata, ModelStatus};
pub use provider::{InferenceError, LoadError, ModelUnavailable, RegressionModel, Target};
