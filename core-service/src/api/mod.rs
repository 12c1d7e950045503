//! API Module
//!
//! Front-end adapters over the prediction service.
//!
//! Structure:
//! - cli.rs: payload (argument or stdin) -> stdout/stderr JSON + exit code
//!
//! The HTTP adapter lives in the `penalty-server` crate.

pub mod cli;

// Re-export current version as default
pub use cli::*;
