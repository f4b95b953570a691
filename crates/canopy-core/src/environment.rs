//! # Environment Module
//!
//! Piecewise environmental factors as configuration data.
//!
//! Two independent threshold tables live here:
//! - [`MultiplierTable`]: scales sequestration by growing conditions.
//! - [`HealthBands`]: the binary sub-scores of environmental health.
//!
//! Their bands overlap but differ on purpose and must not be merged.

use crate::sensor::SensorData;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

// =============================================================================
// FACTORS AND BANDS
// =============================================================================

/// A sensor reading that takes part in environmental scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentalFactor {
    Temperature,
    Humidity,
    LightIntensity,
    SoilMoisture,
    Ph,
}

impl EnvironmentalFactor {
    /// Extract this factor's reading from a snapshot.
    #[must_use]
    pub fn reading(self, sensor: &SensorData) -> f64 {
        match self {
            EnvironmentalFactor::Temperature => sensor.temperature,
            EnvironmentalFactor::Humidity => sensor.humidity,
            EnvironmentalFactor::LightIntensity => sensor.light_intensity,
            EnvironmentalFactor::SoilMoisture => sensor.soil_moisture,
            EnvironmentalFactor::Ph => sensor.ph,
        }
    }
}

/// Closed interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

impl Band {
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Inclusive on both ends. NaN is never contained.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

// =============================================================================
// MULTIPLIER TABLE
// =============================================================================

/// One tier of a factor rule: readings inside `band` multiply by `factor`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub band: Band,
    pub factor: f64,
}

/// Ordered tiers for one factor, first match wins, else `fallback`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorRule {
    pub factor: EnvironmentalFactor,
    pub tiers: Vec<Tier>,
    pub fallback: f64,
}

impl FactorRule {
    fn new(factor: EnvironmentalFactor, tiers: &[(f64, f64, f64)], fallback: f64) -> Self {
        Self {
            factor,
            tiers: tiers
                .iter()
                .map(|&(min, max, factor)| Tier {
                    band: Band::new(min, max),
                    factor,
                })
                .collect(),
            fallback,
        }
    }

    /// The multiplicative factor for a reading.
    #[must_use]
    pub fn factor_for(&self, value: f64) -> f64 {
        self.tiers
            .iter()
            .find(|tier| tier.band.contains(value))
            .map_or(self.fallback, |tier| tier.factor)
    }
}

/// The full set of factor rules applied to a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiplierTable {
    pub rules: Vec<FactorRule>,
}

static STANDARD_MULTIPLIERS: LazyLock<MultiplierTable> = LazyLock::new(|| MultiplierTable {
    rules: vec![
        FactorRule::new(
            EnvironmentalFactor::Temperature,
            &[(20.0, 30.0, 1.20), (15.0, 35.0, 1.0)],
            0.70,
        ),
        FactorRule::new(
            EnvironmentalFactor::Humidity,
            &[(40.0, 80.0, 1.15), (20.0, 90.0, 1.0)],
            0.75,
        ),
        FactorRule::new(
            EnvironmentalFactor::LightIntensity,
            &[(400.0, 800.0, 1.25), (200.0, 1000.0, 1.0)],
            0.60,
        ),
        FactorRule::new(EnvironmentalFactor::SoilMoisture, &[(30.0, 70.0, 1.10)], 0.85),
        FactorRule::new(EnvironmentalFactor::Ph, &[(5.5, 7.5, 1.10)], 0.90),
    ],
});

impl MultiplierTable {
    /// The growing-condition table used by the scoring engine.
    #[must_use]
    pub fn standard() -> &'static MultiplierTable {
        &STANDARD_MULTIPLIERS
    }

    /// Product of every rule's factor, starting from 1.0.
    #[must_use]
    pub fn multiplier(&self, sensor: &SensorData) -> f64 {
        self.rules
            .iter()
            .fold(1.0, |acc, rule| acc * rule.factor_for(rule.factor.reading(sensor)))
    }
}

/// Environmental multiplier of a snapshot under the standard table.
#[must_use]
pub fn compute_environmental_multiplier(sensor: &SensorData) -> f64 {
    MultiplierTable::standard().multiplier(sensor)
}

// =============================================================================
// HEALTH BANDS
// =============================================================================

/// Score of a reading inside its health band.
pub const HEALTHY_SUBSCORE: f64 = 100.0;

/// Score of a reading outside its health band.
pub const UNHEALTHY_SUBSCORE: f64 = 50.0;

/// Bands of the environmental-health sub-scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthBands {
    pub bands: Vec<(EnvironmentalFactor, Band)>,
}

static STANDARD_HEALTH: LazyLock<HealthBands> = LazyLock::new(|| HealthBands {
    bands: vec![
        (EnvironmentalFactor::Temperature, Band::new(18.0, 32.0)),
        (EnvironmentalFactor::Humidity, Band::new(30.0, 80.0)),
        (EnvironmentalFactor::LightIntensity, Band::new(200.0, 1000.0)),
        (EnvironmentalFactor::SoilMoisture, Band::new(20.0, 80.0)),
    ],
});

impl HealthBands {
    #[must_use]
    pub fn standard() -> &'static HealthBands {
        &STANDARD_HEALTH
    }

    /// Unrounded mean of the binary sub-scores.
    #[must_use]
    pub fn mean(&self, sensor: &SensorData) -> f64 {
        if self.bands.is_empty() {
            return HEALTHY_SUBSCORE;
        }
        let total: f64 = self
            .bands
            .iter()
            .map(|(factor, band)| {
                if band.contains(factor.reading(sensor)) {
                    HEALTHY_SUBSCORE
                } else {
                    UNHEALTHY_SUBSCORE
                }
            })
            .sum();
        total / self.bands.len() as f64
    }
}

/// Environmental health (0-100) under the standard bands, rounded.
#[must_use]
pub fn compute_environmental_health(sensor: &SensorData) -> u8 {
    HealthBands::standard().mean(sensor).round() as u8
}

// =============================================================================
// TESTS
// =============================================================================
