//! Traffic Penalty Estimator - HTTP Prediction Server
//!
//! Thin axum adapter over the core prediction service.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PENALTY SERVER                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  GET  /health   ──► model status                            │
//! │  POST /predict  ──► PredictionService::predict_batch        │
//! │                          │                                  │
//! │                          ▼                                  │
//! │                 Arc<ModelHandle> (loaded once, read-only)   │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use penalty_core::{ModelHandle, Schema};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "penalty_server=debug,tower_http=debug".into());
    if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Penalty prediction server starting...");
    tracing::info!("Model: {}", config.model_path);

    // Load model once; a failed load keeps serving and answers 503
    let model = ModelHandle::load(&config.model_path);
    if let ModelHandle::LoadFailed { reason, .. } = &model {
        tracing::warn!("Serving without a model: {}", reason);
    }

    let schema = config
        .schema
        .or_else(|| model.metadata().map(|m| m.schema))
        .unwrap_or(Schema::Fine);
    tracing::info!("Accepting {} schema records", schema);

    // Build application state
    let state = AppState {
        model: Arc::new(model),
        schema,
        config: config.clone(),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot bind {}", addr))?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<ModelHandle>,
    pub schema: Schema,
    pub config: config::Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    tracing::debug!("Building router for {} environment", state.config.environment);

    Router::new()
        .route("/health", get(handlers::health::check))
        .route("/predict", post(handlers::predict::predict))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
