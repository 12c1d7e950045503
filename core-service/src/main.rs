//! Traffic Penalty Estimator - CLI Entry Point
//!
//! `penalty predict` scores one JSON record with a persisted model.
//! `penalty generate` writes a synthetic labeled dataset as CSV.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use penalty_core::api::cli::run_predict;
use penalty_core::constants::{self, APP_NAME, APP_VERSION, MODEL_PATH_ENV};
use penalty_core::logic::dataset::{generate, GeneratorConfig};
use penalty_core::logic::features::Schema;
use penalty_core::ModelHandle;

#[derive(Parser)]
#[command(name = "penalty", version, about = "Traffic violation fine / risk estimator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score one JSON record (argument or stdin)
    Predict {
        /// JSON object; read from stdin when omitted
        payload: Option<String>,

        /// Model artifact
        #[arg(long, env = MODEL_PATH_ENV, default_value = constants::DEFAULT_MODEL_PATH)]
        model: PathBuf,

        /// Feature schema (risk|fine); defaults to the model's schema
        #[arg(long)]
        schema: Option<Schema>,
    },

    /// Write a synthetic labeled dataset as CSV
    Generate {
        /// Dataset variant (risk|fine)
        #[arg(long, default_value = "risk")]
        variant: Schema,

        /// Row count; defaults per variant
        #[arg(long)]
        rows: Option<usize>,

        #[arg(long, default_value_t = constants::DEFAULT_SEED)]
        seed: u64,

        /// Chance a fine sample has no speeding
        #[arg(long, default_value_t = constants::DEFAULT_P_NO_VIOLATION)]
        p_no_violation: f64,

        /// Output file; stdout when omitted
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(default_log_filter(&cli.command));

    match cli.command {
        Command::Predict { payload, model, schema } => {
            let handle = ModelHandle::load(&model);
            let schema = schema
                .or_else(|| handle.metadata().map(|m| m.schema))
                .unwrap_or(Schema::Fine);

            let outcome = run_predict(payload, io::stdin().lock(), schema, &handle);
            outcome.emit();
            std::process::exit(outcome.exit_code);
        }
        Command::Generate {
            variant,
            rows,
            seed,
            p_no_violation,
            output,
        } => {
            let config = GeneratorConfig {
                target_rows: rows.unwrap_or_else(|| constants::default_rows(variant)),
                seed,
                p_no_violation,
            };
            if let Err(e) = run_generate(variant, &config, output) {
                log::error!("{:#}", e);
                std::process::exit(constants::EXIT_FAILURE);
            }
        }
    }
}

/// `predict` keeps stderr for the error envelope alone unless RUST_LOG says otherwise
fn default_log_filter(command: &Command) -> &'static str {
    match command {
        Command::Predict { .. } => "off",
        Command::Generate { .. } => "info",
    }
}

fn init_logging(default_level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Stderr)
        .init();
}

fn run_generate(variant: Schema, config: &GeneratorConfig, output: Option<PathBuf>) -> anyhow::Result<()> {
    log::info!("{} v{} - generating {} dataset", APP_NAME, APP_VERSION, variant);

    let dataset = generate(variant, config).context("dataset generation failed")?;

    match &output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
            dataset
                .write_csv(BufWriter::new(file))
                .with_context(|| format!("cannot write {}", path.display()))?;
            log::info!("Dataset written to {}", path.display());
        }
        None => dataset
            .write_csv(BufWriter::new(io::stdout().lock()))
            .context("cannot write dataset to stdout")?,
    }

    let summary = dataset.summary();
    log::info!(
        "{} rows, {} range [{}, {}]",
        summary.rows,
        summary.label_column,
        summary.label_min.unwrap_or_default(),
        summary.label_max.unwrap_or_default()
    );
    for (column, range) in &summary.numeric {
        log::info!("  {}: [{}, {}]", column, range.min, range.max);
    }
    for (column, seen) in &summary.categories {
        let seen: Vec<&str> = seen.iter().map(String::as_str).collect();
        log::info!("  {}: {}", column, seen.join(", "));
    }
    log::info!("Fingerprint (sha256): {}", dataset.fingerprint());

    Ok(())
}
