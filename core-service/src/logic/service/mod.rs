//! Service Module - Prediction Service
//!
//! Validate -> score -> shape, shared by the CLI and the HTTP server.
//! - `types.rs` - results, error taxonomy, request stages
//! - `pipeline.rs` - `PredictionService`

pub mod types;
pub mod pipeline;

// Re-export common types
pub use pipeline::PredictionService;
pub use types::{ErrorEnvelope, PredictedValue, PredictionResult, RequestStage, ServiceError};
