//! Reference Penalty Calculator
//!
//! Pure functions only. Input: typed feature records. Output: breakdowns.
//! Identical inputs always give identical outputs.

use serde::Serialize;
use thiserror::Error;

use super::rules::{FineRules, RiskRules};
use crate::logic::features::{column, FeatureRecord, FineFeatures, RiskFeatures};

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleError {
    #[error("no reference rule for {field} '{value}'")]
    UnknownCategory { field: &'static str, value: String },

    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: f64 },
}

// ============================================================================
// BREAKDOWNS
// ============================================================================

/// Fine calculation terms
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FineBreakdown {
    pub speed_limit: f64,
    pub exceed_percent: f64,
    pub base_fine: u64,
    pub violation_penalty: u64,
    pub total: u64,
}

/// Risk calculation terms
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskBreakdown {
    pub base_risk: f64,
    pub location_risk: f64,
    pub time_risk: f64,
    pub violation_risk: f64,
    /// Sum before clamping
    pub raw_score: f64,
    /// Clamped to [min_score, max_score]
    pub score: f64,
}

/// Reference value for either schema
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reference {
    Fine(FineBreakdown),
    Risk(RiskBreakdown),
}

impl Reference {
    pub fn value(&self) -> f64 {
        match self {
            Reference::Fine(b) => b.total as f64,
            Reference::Risk(b) => b.score,
        }
    }
}

// ============================================================================
// CALCULATION
// ============================================================================

/// Reference value for a record, using the default rule tables
pub fn calculate(record: &FeatureRecord) -> Result<Reference, RuleError> {
    match record {
        FeatureRecord::Fine(f) => FineRules::default().calculate(f).map(Reference::Fine),
        FeatureRecord::Risk(r) => RiskRules::default().calculate(r).map(Reference::Risk),
    }
}

impl FineRules {
    /// Banded base fine plus a linear per-violation penalty
    pub fn calculate(&self, features: &FineFeatures) -> Result<FineBreakdown, RuleError> {
        let speed_limit = self
            .speed_limit(&features.vehicle_type)
            .ok_or_else(|| RuleError::UnknownCategory {
                field: column::VEHICLE_TYPE,
                value: features.vehicle_type.clone(),
            })?;

        let speed = features.speed_exceeded;
        if !speed.is_finite() || speed < 0.0 {
            return Err(RuleError::InvalidValue { field: column::SPEED_EXCEEDED, value: speed });
        }

        let (exceed_percent, base_fine) = if speed == 0.0 {
            (0.0, 0)
        } else {
            let percent = 100.0 * speed / speed_limit;
            (percent, self.base_fine(percent))
        };

        let violation_penalty =
            (features.previous_violations as u64).saturating_mul(self.per_violation_penalty);

        Ok(FineBreakdown {
            speed_limit,
            exceed_percent,
            base_fine,
            violation_penalty,
            total: base_fine.saturating_add(violation_penalty),
        })
    }

    /// First band whose upper bound (inclusive) covers `exceed_percent`
    pub fn base_fine(&self, exceed_percent: f64) -> u64 {
        self.bands
            .iter()
            .find(|band| exceed_percent <= band.max_percent)
            .map(|band| band.base_fine)
            .unwrap_or(self.top_band_fine)
    }
}

impl RiskRules {
    /// Capped speed term + location + time + piecewise violation term, clamped
    pub fn calculate(&self, features: &RiskFeatures) -> Result<RiskBreakdown, RuleError> {
        let speed = features.speed_over_limit;
        if !speed.is_finite() {
            return Err(RuleError::InvalidValue { field: column::SPEED_OVER_LIMIT, value: speed });
        }

        let location_risk = *self
            .location_points
            .get(&features.location_type)
            .ok_or_else(|| RuleError::UnknownCategory {
                field: column::LOCATION_TYPE,
                value: features.location_type.clone(),
            })?;

        let time_risk = *self
            .time_points
            .get(&features.time_of_day)
            .ok_or_else(|| RuleError::UnknownCategory {
                field: column::TIME_OF_DAY,
                value: features.time_of_day.clone(),
            })?;

        let base_risk = (speed * self.speed_weight).min(self.speed_cap);
        let violation_risk = self.violation_risk(features.past_violations);
        let raw_score = base_risk + location_risk + time_risk + violation_risk;

        Ok(RiskBreakdown {
            base_risk,
            location_risk,
            time_risk,
            violation_risk,
            raw_score,
            score: self.clamp_score(raw_score),
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
