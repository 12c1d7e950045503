//! CLI adapter
//!
//! Exactly one JSON object per invocation:
//! - success: result on stdout, exit 0
//! - failure: `{"error": ...}` on stderr, exit 2 for empty input, 1 otherwise

use std::io::Read;

use crate::constants::{EXIT_EMPTY_INPUT, EXIT_FAILURE, EXIT_SUCCESS};
use crate::logic::features::Schema;
use crate::logic::model::ModelHandle;
use crate::logic::service::{ErrorEnvelope, PredictionService, ServiceError};

/// What the process should print and return
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOutcome {
    pub exit_code: i32,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
}

impl CliOutcome {
    fn success(body: String) -> Self {
        Self {
            exit_code: EXIT_SUCCESS,
            stdout: Some(body),
            stderr: None,
        }
    }

    fn failure(err: &ServiceError) -> Self {
        let exit_code = match err {
            ServiceError::EmptyInput => EXIT_EMPTY_INPUT,
            _ => EXIT_FAILURE,
        };
        Self {
            exit_code,
            stdout: None,
            stderr: Some(ErrorEnvelope::from(err).to_json()),
        }
    }

    /// Write the outcome to the process streams
    pub fn emit(&self) {
        if let Some(out) = &self.stdout {
            println!("{}", out);
        }
        if let Some(err) = &self.stderr {
            eprintln!("{}", err);
        }
    }
}

/// Read the payload from `payload` if given, otherwise from `stdin`, and score it
pub fn run_predict<R: Read>(
    payload: Option<String>,
    mut stdin: R,
    schema: Schema,
    handle: &ModelHandle,
) -> CliOutcome {
    let raw = match payload {
        Some(p) => p,
        None => {
            let mut buf = String::new();
            if let Err(e) = stdin.read_to_string(&mut buf) {
                log::error!("Failed to read stdin: {}", e);
                return CliOutcome::failure(&ServiceError::Decode(format!("cannot read stdin: {}", e)));
            }
            buf
        }
    };

    let service = PredictionService::new(schema, handle);
    match service.predict(&raw) {
        Ok(result) => match serde_json::to_string(&result) {
            Ok(body) => CliOutcome::success(body),
            Err(e) => CliOutcome::failure(&ServiceError::Inference(e.to_string())),
        },
        Err(e) => CliOutcome::failure(&e),
    }
}
