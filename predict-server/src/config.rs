//! Configuration module

use std::env;

use penalty_core::constants::DEFAULT_MODEL_PATH;
use penalty_core::Schema;

/// Default listening port
pub const DEFAULT_PORT: u16 = 5000;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Model artifact loaded at startup
    pub model_path: String,

    /// Feature schema accepted by `/predict`; falls back to the model's schema
    pub schema: Option<Schema>,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),

            model_path: env::var("MODEL_PATH")
                .unwrap_or_else(|_| DEFAULT_MODEL_PATH.to_string()),

            schema: env::var("PREDICT_SCHEMA").ok().and_then(|s| parse_schema(&s)),

            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            model_path: DEFAULT_MODEL_PATH.to_string(),
            schema: None,
            environment: "development".to_string(),
        }
    }
}

fn parse_schema(value: &str) -> Option<Schema> {
    match value.parse() {
        Ok(schema) => Some(schema),
        Err(e) => {
            tracing::warn!("Ignoring PREDICT_SCHEMA: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_schema() {
        assert_eq!(parse_schema("fine"), Some(Schema::Fine));
        assert_eq!(parse_schema("A"), Some(Schema::Risk));
        assert_eq!(parse_schema("vehicles"), None);
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.model_path, "models/fine_model.json");
        assert!(!config.is_production());
    }
}
