//! Synthetic Dataset Generator
//!
//! Draw order per sample is fixed so a seed fully determines the output:
//! - risk: speed, location, time, past violations, jitter
//! - fine: vehicle, location risk, road condition, previous violations, no-violation roll, speed

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::table::{Dataset, Sample};
use crate::constants::{default_rows, DEFAULT_P_NO_VIOLATION, DEFAULT_SEED};
use crate::logic::features::{FeatureRecord, FineFeatures, RiskFeatures, Schema};
use crate::logic::penalty::rules::{
    LOCATION_RISKS, LOCATION_TYPES, ROAD_CONDITIONS, TIMES_OF_DAY, VEHICLE_TYPES,
};
use crate::logic::penalty::{FineRules, RiskRules, RuleError};

// ============================================================================
// SAMPLING RANGES
// ============================================================================

/// Risk speed-over-limit, inclusive
pub const RISK_SPEED_MIN: u32 = 1;
pub const RISK_SPEED_MAX: u32 = 34;

/// Past violations drawn from 0..=max
pub const RISK_PAST_VIOLATIONS_MAX: u32 = 5;
pub const FINE_PREVIOUS_VIOLATIONS_MAX: u32 = 3;

/// Fine speed exceeded tops out at this percent of the vehicle's limit
pub const MAX_EXCEED_PERCENT: f64 = 80.0;

/// Multiplicative label jitter for risk samples, [min, max)
pub const JITTER_MIN: f64 = 0.85;
pub const JITTER_MAX: f64 = 1.15;

// ============================================================================
// CONFIG & ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub target_rows: usize,
    pub seed: u64,
    /// Chance a fine sample has speed_exceeded = 0
    pub p_no_violation: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::for_schema(Schema::Risk)
    }
}

impl GeneratorConfig {
    pub fn new(target_rows: usize, seed: u64) -> Self {
        Self {
            target_rows,
            seed,
            p_no_violation: DEFAULT_P_NO_VIOLATION,
        }
    }

    /// Reference row count for the variant
    pub fn for_schema(schema: Schema) -> Self {
        Self::new(default_rows(schema), DEFAULT_SEED)
    }

    pub fn validate(&self) -> Result<(), GeneratorError> {
        if !(0.0..=1.0).contains(&self.p_no_violation) {
            return Err(GeneratorError::InvalidConfig(format!(
                "p_no_violation must be within [0, 1], got {}",
                self.p_no_violation
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("invalid generator config: {0}")]
    InvalidConfig(String),

    #[error("reference rule failed: {0}")]
    Rule(#[from] RuleError),
}

// ============================================================================
// GENERATOR
// ============================================================================

/// Seeded sample source. Never touches thread-local or global randomness.
pub struct DatasetGenerator {
    rng: StdRng,
    config: GeneratorConfig,
    fine_rules: FineRules,
    risk_rules: RiskRules,
}

impl DatasetGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self, GeneratorError> {
        Self::with_rules(config, FineRules::default(), RiskRules::default())
    }

    pub fn with_rules(
        config: GeneratorConfig,
        fine_rules: FineRules,
        risk_rules: RiskRules,
    ) -> Result<Self, GeneratorError> {
        config.validate()?;
        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            fine_rules,
            risk_rules,
        })
    }

    /// Draw `target_rows` samples
    pub fn generate(&mut self, schema: Schema) -> Result<Dataset, GeneratorError> {
        let mut samples = Vec::with_capacity(self.config.target_rows);
        for _ in 0..self.config.target_rows {
            samples.push(self.next_sample(schema)?);
        }

        log::info!(
            "Generated {} {} samples (seed {})",
            samples.len(),
            schema,
            self.config.seed
        );

        Ok(Dataset::new(schema, self.config.seed, samples))
    }

    pub fn next_sample(&mut self, schema: Schema) -> Result<Sample, GeneratorError> {
        match schema {
            Schema::Risk => self.next_risk_sample(),
            Schema::Fine => self.next_fine_sample(),
        }
    }

    fn pick<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }

    fn next_risk_sample(&mut self) -> Result<Sample, GeneratorError> {
        let speed = self.rng.gen_range(RISK_SPEED_MIN..=RISK_SPEED_MAX);
        let location = self.pick(&LOCATION_TYPES);
        let time = self.pick(&TIMES_OF_DAY);
        let past = self.rng.gen_range(0..=RISK_PAST_VIOLATIONS_MAX);

        let features = RiskFeatures {
            speed_over_limit: speed as f64,
            location_type: location.to_string(),
            time_of_day: time.to_string(),
            past_violations: past,
        };

        let reference = self.risk_rules.calculate(&features)?.score;
        let jitter = self.rng.gen_range(JITTER_MIN..JITTER_MAX);
        // truncate, then re-clamp: stored labels are integral
        let label = self.risk_rules.clamp_score((reference * jitter).trunc()) as i64;

        Ok(Sample {
            features: FeatureRecord::Risk(features),
            label,
        })
    }

    fn next_fine_sample(&mut self) -> Result<Sample, GeneratorError> {
        let vehicle = self.pick(&VEHICLE_TYPES);
        let location = self.pick(&LOCATION_RISKS);
        let road = self.pick(&ROAD_CONDITIONS);
        let previous = self.rng.gen_range(0..=FINE_PREVIOUS_VIOLATIONS_MAX);

        let speed_limit = self.fine_rules.speed_limit(vehicle).ok_or_else(|| {
            RuleError::UnknownCategory {
                field: crate::logic::features::column::VEHICLE_TYPE,
                value: vehicle.to_string(),
            }
        })?;

        let no_violation = self.rng.gen::<f64>() < self.config.p_no_violation;
        let speed = if no_violation {
            0
        } else {
            let max = ((speed_limit * MAX_EXCEED_PERCENT / 100.0).floor() as u32).max(1);
            self.rng.gen_range(1..=max)
        };

        let features = FineFeatures {
            vehicle_type: vehicle.to_string(),
            location_risk: location.to_string(),
            road_condition: road.to_string(),
            speed_exceeded: speed as f64,
            previous_violations: previous,
        };

        let label = self.fine_rules.calculate(&features)?.total as i64;

        Ok(Sample {
            features: FeatureRecord::Fine(features),
            label,
        })
    }
}

/// Generate a dataset with the default rule tables
pub fn generate(schema: Schema, config: &GeneratorConfig) -> Result<Dataset, GeneratorError> {
    DatasetGenerator::new(config.clone())?.generate(schema)
}

// ============================================================================
// TESTS
// ============================================================================
