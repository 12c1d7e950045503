//! Model Handle - lifecycle-scoped model provider
//!
//! Built once at process start and passed by reference to the prediction
//! service. Three states, no nullable global:
//! - `Uninitialized` - nothing was loaded
//! - `Loaded` - immutable, shareable model + metadata
//! - `LoadFailed` - load error kept for diagnostics, surfaced on first use

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use super::forest::ForestPipeline;
use super::provider::{LoadError, ModelUnavailable, RegressionModel, Target};
use crate::logic::features::Schema;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Model metadata
#[derive(Debug, Clone, Serialize)]
pub struct ModelMetadata {
    /// File path, or "<memory>"
    pub source: String,
    pub kind: String,
    pub schema: Schema,
    pub target: Target,
    /// Ensemble size, for tree models
    pub trees: Option<usize>,
    /// SHA-256 of the artifact bytes, when loaded from bytes
    pub checksum: Option<String>,
    pub loaded_at: DateTime<Utc>,
}

/// Model status for health reporting
#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    pub state: &'static str,
    pub model_loaded: bool,
    pub schema: Option<Schema>,
    pub target: Option<Target>,
    pub source: Option<String>,
    pub checksum: Option<String>,
    pub error: Option<String>,
}

pub struct LoadedModel {
    model: Arc<dyn RegressionModel>,
    metadata: ModelMetadata,
}

impl LoadedModel {
    pub fn model(&self) -> &dyn RegressionModel {
        self.model.as_ref()
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}

impl fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModel")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub enum ModelHandle {
    #[default]
    Uninitialized,
    Loaded(LoadedModel),
    LoadFailed {
        source: String,
        reason: String,
    },
}

// ============================================================================
// CONSTRUCTION
// ============================================================================

impl ModelHandle {
    /// Load a forest pipeline artifact. Never panics: failures become `LoadFailed`.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        log::info!("Loading model artifact from: {}", path.display());

        match Self::try_load(path) {
            Ok(handle) => handle,
            Err(e) => {
                log::warn!("Model not loaded from {}: {}", path.display(), e);
                ModelHandle::LoadFailed {
                    source: path.display().to_string(),
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Load, returning the error instead of recording it
    pub fn try_load(path: &Path) -> Result<Self, LoadError> {
        let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(&bytes, &path.display().to_string())
    }

    /// Load a forest pipeline from memory
    pub fn from_bytes(bytes: &[u8], source: &str) -> Result<Self, LoadError> {
        let pipeline = ForestPipeline::from_slice(bytes)?;
        let checksum = hex::encode(Sha256::digest(bytes));

        log::info!(
            "Model loaded: {} schema, {} target, {} trees (sha256 {})",
            pipeline.schema,
            pipeline.target(),
            pipeline.trees.len(),
            checksum
        );

        let trees = Some(pipeline.trees.len());
        Ok(Self::with_metadata(pipeline, source, trees, Some(checksum)))
    }

    /// Wrap an already-built provider
    pub fn from_model<M: RegressionModel + 'static>(model: M) -> Self {
        Self::with_metadata(model, "<memory>", None, None)
    }

    fn with_metadata<M: RegressionModel + 'static>(
        model: M,
        source: &str,
        trees: Option<usize>,
        checksum: Option<String>,
    ) -> Self {
        let metadata = ModelMetadata {
            source: source.to_string(),
            kind: model.kind().to_string(),
            schema: model.schema(),
            target: model.target(),
            trees,
            checksum,
            loaded_at: Utc::now(),
        };
        ModelHandle::Loaded(LoadedModel {
            model: Arc::new(model),
            metadata,
        })
    }
}

// ============================================================================
// ACCESS
// ============================================================================

impl ModelHandle {
    /// The loaded model, or why there is none
    pub fn loaded(&self) -> Result<&LoadedModel, ModelUnavailable> {
        match self {
            ModelHandle::Loaded(loaded) => Ok(loaded),
            ModelHandle::Uninitialized => Err(ModelUnavailable("Model not loaded".to_string())),
            ModelHandle::LoadFailed { source, reason } => Err(ModelUnavailable(format!(
                "Model not loaded from {}: {}",
                source, reason
            ))),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, ModelHandle::Loaded(_))
    }

    pub fn metadata(&self) -> Option<&ModelMetadata> {
        self.loaded().ok().map(LoadedModel::metadata)
    }

    pub fn state_name(&self) -> &'static str {
        match self {
            ModelHandle::Uninitialized => "uninitialized",
            ModelHandle::Loaded(_) => "loaded",
            ModelHandle::LoadFailed { .. } => "load_failed",
        }
    }

    pub fn status(&self) -> ModelStatus {
        let metadata = self.metadata();
        ModelStatus {
            state: self.state_name(),
            model_loaded: self.is_loaded(),
            schema: metadata.map(|m| m.schema),
            target: metadata.map(|m| m.target),
            source: metadata.map(|m| m.source.clone()),
            checksum: metadata.and_then(|m| m.checksum.clone()),
            error: match self {
                ModelHandle::LoadFailed { reason, .. } => Some(reason.clone()),
                _ => None,
            },
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
