//! Traffic Penalty Estimator - Core Service
//!
//! Estimates a fine amount or a risk score for a traffic violation.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     PENALTY CORE                             │
//! ├──────────────────────────────────────────────────────────────┤
//! │  raw JSON ──► features::validate ──► FeatureRecord           │
//! │                                          │                   │
//! │                                          ▼                   │
//! │               service::PredictionService ──► model::Handle   │
//! │                                          │                   │
//! │                                          ▼                   │
//! │                          PredictionResult | ErrorEnvelope    │
//! │                                                              │
//! │  penalty::rules ──► dataset::generate ──► labeled CSV        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The CLI (`api::cli`) and the HTTP server crate are thin adapters around
//! [`logic::service::PredictionService`].

pub mod api;
pub mod constants;
pub mod logic;

pub use logic::features::{FeatureRecord, Schema};
pub use logic::model::{ModelHandle, RegressionModel, Target};
pub use logic::service::{ErrorEnvelope, PredictionResult, PredictionService, ServiceError};
