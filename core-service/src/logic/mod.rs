//! Logic Module - Estimation Core
//!
//! - `features/` - FeatureRecord schemas and the validator
//! - `penalty/` - Reference penalty rules (fine + risk)
//! - `dataset/` - Seeded synthetic dataset generation
//! - `model/` - Model provider trait, lifecycle handle, forest artifact
//! - `service/` - Prediction request state machine

pub mod features;
pub mod penalty;
pub mod dataset;
pub mod model;
pub mod service;
