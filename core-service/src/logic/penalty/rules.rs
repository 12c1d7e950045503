//! Penalty Rules & Reference Tables
//!
//! Constants and configurable rule sets only.
//! No calculation here - see `calculator.rs`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ============================================================================
// CATEGORY SETS (declared order is the sampling order)
// ============================================================================

/// Schema B vehicle types
pub const VEHICLE_TYPES: [&str; 4] = ["Bike", "Auto", "Heavy Vehicle", "Car"];

/// Schema B location risk levels
pub const LOCATION_RISKS: [&str; 3] = ["Low", "Medium", "High"];

/// Schema B road conditions
pub const ROAD_CONDITIONS: [&str; 3] = ["Normal", "Highway", "School"];

/// Schema A location types
pub const LOCATION_TYPES: [&str; 4] = ["Highway", "SchoolZone", "Residential", "Urban"];

/// Schema A time-of-day buckets
pub const TIMES_OF_DAY: [&str; 4] = ["Morning", "Day", "Evening", "Night"];

// ============================================================================
// FINE REFERENCE VALUES
// ============================================================================

/// Per-vehicle speed limits (km/h)
pub const SPEED_LIMITS: [(&str, f64); 4] = [
    ("Bike", 80.0),
    ("Auto", 50.0),
    ("Heavy Vehicle", 70.0),
    ("Car", 100.0),
];

/// (max exceed percent, base fine), ascending, upper bound inclusive
pub const FINE_BANDS: [(f64, u64); 3] = [(20.0, 3000), (30.0, 5000), (50.0, 10000)];

/// Base fine above the last band
pub const TOP_BAND_FINE: u64 = 15000;

/// Added per previous violation
pub const PER_VIOLATION_PENALTY: u64 = 2000;

// ============================================================================
// RISK REFERENCE VALUES
// ============================================================================

/// Risk points per km/h over the limit
pub const SPEED_RISK_WEIGHT: f64 = 2.0;

/// Speed contributes at most this many points
pub const SPEED_RISK_CAP: f64 = 60.0;

pub const LOCATION_RISK_POINTS: [(&str, f64); 4] = [
    ("SchoolZone", 25.0),
    ("Residential", 15.0),
    ("Urban", 10.0),
    ("Highway", 5.0),
];

pub const TIME_RISK_POINTS: [(&str, f64); 4] = [
    ("Night", 10.0),
    ("Evening", 5.0),
    ("Morning", 5.0),
    ("Day", 0.0),
];

/// Violation counts up to and including this use the low weight
pub const VIOLATION_STEP_AT: u32 = 2;
pub const LOW_VIOLATION_WEIGHT: f64 = 3.0;
pub const HIGH_VIOLATION_WEIGHT: f64 = 5.0;

pub const MIN_RISK_SCORE: f64 = 10.0;
pub const MAX_RISK_SCORE: f64 = 100.0;

// ============================================================================
// CONFIGURABLE RULE SETS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FineBand {
    /// Upper bound on exceed percent, inclusive
    pub max_percent: f64,
    pub base_fine: u64,
}

/// Fine rules (Schema B)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FineRules {
    /// Speed limit per vehicle type; extend to support new vehicles
    pub speed_limits: BTreeMap<String, f64>,
    /// Evaluated in ascending order, first match wins
    pub bands: Vec<FineBand>,
    /// Base fine when no band matches
    pub top_band_fine: u64,
    pub per_violation_penalty: u64,
}

impl Default for FineRules {
    fn default() -> Self {
        Self {
            speed_limits: SPEED_LIMITS.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            bands: FINE_BANDS
                .iter()
                .map(|&(max_percent, base_fine)| FineBand { max_percent, base_fine })
                .collect(),
            top_band_fine: TOP_BAND_FINE,
            per_violation_penalty: PER_VIOLATION_PENALTY,
        }
    }
}

impl FineRules {
    pub fn speed_limit(&self, vehicle_type: &str) -> Option<f64> {
        self.speed_limits.get(vehicle_type).copied()
    }

    /// Add or replace a vehicle type
    pub fn with_vehicle(mut self, vehicle_type: &str, speed_limit: f64) -> Self {
        self.speed_limits.insert(vehicle_type.to_string(), speed_limit);
        self
    }
}

/// Risk rules (Schema A)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRules {
    pub speed_weight: f64,
    pub speed_cap: f64,
    pub location_points: BTreeMap<String, f64>,
    pub time_points: BTreeMap<String, f64>,
    pub violation_step_at: u32,
    pub low_violation_weight: f64,
    pub high_violation_weight: f64,
    pub min_score: f64,
    pub max_score: f64,
}

impl Default for RiskRules {
    fn default() -> Self {
        Self {
            speed_weight: SPEED_RISK_WEIGHT,
            speed_cap: SPEED_RISK_CAP,
            location_points: LOCATION_RISK_POINTS.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            time_points: TIME_RISK_POINTS.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            violation_step_at: VIOLATION_STEP_AT,
            low_violation_weight: LOW_VIOLATION_WEIGHT,
            high_violation_weight: HIGH_VIOLATION_WEIGHT,
            min_score: MIN_RISK_SCORE,
            max_score: MAX_RISK_SCORE,
        }
    }
}

impl RiskRules {
    /// Piecewise violation term. Discontinuous at the step: 2 -> 6, 3 -> 15.
    pub fn violation_risk(&self, past_violations: u32) -> f64 {
        let v = past_violations as f64;
        if past_violations <= self.violation_step_at {
            v * self.low_violation_weight
        } else {
            v * self.high_violation_weight
        }
    }

    pub fn clamp_score(&self, score: f64) -> f64 {
        score.clamp(self.min_score, self.max_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_limit_table() {
        let rules = FineRules::default();
        assert_eq!(rules.speed_limit("Bike"), Some(80.0));
        assert_eq!(rules.speed_limit("Auto"), Some(50.0));
        assert_eq!(rules.speed_limit("Heavy Vehicle"), Some(70.0));
        assert_eq!(rules.speed_limit("Car"), Some(100.0));
        assert_eq!(rules.speed_limit("car"), None);
    }

    #[test]
    fn test_speed_limit_table_is_extensible() {
        let rules = FineRules::default().with_vehicle("Tractor", 40.0);
        assert_eq!(rules.speed_limit("Tractor"), Some(40.0));
        assert_eq!(rules.speed_limits.len(), 5);
    }

    #[test]
    fn test_violation_risk_step() {
        let rules = RiskRules::default();
        assert_eq!(rules.violation_risk(0), 0.0);
        assert_eq!(rules.violation_risk(1), 3.0);
        assert_eq!(rules.violation_risk(2), 6.0);
        assert_eq!(rules.violation_risk(3), 15.0);
        assert_eq!(rules.violation_risk(5), 25.0);
    }

    #[test]
    fn test_category_sets_covered_by_tables() {
        let fine = FineRules::default();
        for v in VEHICLE_TYPES {
            assert!(fine.speed_limit(v).is_some(), "{} has no speed limit", v);
        }
        let risk = RiskRules::default();
        for l in LOCATION_TYPES {
            assert!(risk.location_points.contains_key(l));
        }
        for t in TIMES_OF_DAY {
            assert!(risk.time_points.contains_key(t));
        }
    }

    #[test]
    fn test_rules_deserialize_from_json() {
        let json = serde_json::to_string(&FineRules::default()).unwrap();
        let back: FineRules = serde_json::from_str(&json).unwrap();
        assert_eq!(back, FineRules::default());
    }
}
