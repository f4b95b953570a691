//! # Score Module
//!
//! The composite carbon-credit score of one tree under one sensor snapshot.
//!
//! ```text
//! total = 0.35 * sequestration
//!       + 0.25 * emission offset
//!       + 0.25 * environmental health
//!       + 0.15 * oxygen production
//! ```
//!
//! Every reported component and the total are integers clamped into
//! `0..=100`. The sequestration term enters the sum uncapped, so a strong
//! environmental multiplier can carry the total past weaker components.

use crate::chave::{CREDIT_PRICE_USD, compute_chave_result};
use crate::environment::{compute_environmental_health, compute_environmental_multiplier};
use crate::rounding::{clamp_score, round2, round4, round_score};
use crate::sensor::SensorData;
use crate::species::TreeSpecies;
use serde::{Deserialize, Serialize};
use std::fmt;

/// CO2 sequestered (kg) that earns a full sequestration score.
pub const SEQUESTRATION_REFERENCE_KG: f64 = 500.0;

/// O2 released (ppm) that earns a full oxygen score.
pub const OXYGEN_REFERENCE_PPM: f64 = 200.0;

const WEIGHT_SEQUESTRATION: f64 = 0.35;
const WEIGHT_EMISSION: f64 = 0.25;
const WEIGHT_HEALTH: f64 = 0.25;
const WEIGHT_OXYGEN: f64 = 0.15;

// =============================================================================
// GRADE
// =============================================================================

/// Letter grade of a total score.
///
/// Variants are declared worst to best, so the derived ordering is the
/// grade rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "F")]
    F,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "A+")]
    APlus,
}

impl Grade {
    /// Inclusive lower bounds, highest first.
    const THRESHOLDS: [(u8, Grade); 6] = [
        (90, Grade::APlus),
        (80, Grade::A),
        (70, Grade::BPlus),
        (60, Grade::B),
        (50, Grade::C),
        (40, Grade::D),
    ];

    /// Grade of a total score.
    #[must_use]
    pub fn from_score(score: u8) -> Self {
        Self::THRESHOLDS
            .iter()
            .find(|(min, _)| score >= *min)
            .map_or(Grade::F, |(_, grade)| *grade)
    }

    /// Display label ("A+", "B", ...).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// SCORE
// =============================================================================

/// The four weighted components, each in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub sequestration_score: u8,
    pub emission_offset: u8,
    pub environmental_health: u8,
    pub oxygen_production: u8,
}

/// Composite score of a tree under one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarbonCreditScore {
    pub total_score: u8,
    pub grade: Grade,
    pub breakdown: ScoreBreakdown,
    /// Environment-adjusted credits in t CO2e (4 dp).
    pub credits_earned: f64,
    /// USD value of `credits_earned` (2 dp).
    #[serde(rename = "creditValueUSD")]
    pub credit_value_usd: f64,
    /// `co2_absorbed - co2_emitted` in ppm (2 dp, signed).
    pub net_carbon_balance: f64,
}

/// Score `species` under the conditions in `sensor`.
///
/// Pure and deterministic. Inputs are not validated: a NaN reading falls
/// into the penalty band of its factor and into the floor of any component
/// it feeds.
#[must_use]
pub fn compute_carbon_credit_score(sensor: &SensorData, species: &TreeSpecies) -> CarbonCreditScore {
    let chave = compute_chave_result(species);
    let multiplier = compute_environmental_multiplier(sensor);

    // Base is capped before multiplying. The product is weighted as is
    // and capped only in the breakdown.
    let base = cap_percent(chave.co2_sequestered / SEQUESTRATION_REFERENCE_KG * 100.0);
    let sequestration = round_score(base * multiplier);
    let sequestration_score = clamp_score(sequestration);

    let emission_offset =
        clamp_score(sensor.co2_absorbed / sensor.co2_emitted.max(1.0) * 100.0);

    let environmental_health = compute_environmental_health(sensor);

    let oxygen_production = clamp_score(sensor.o2_released / OXYGEN_REFERENCE_PPM * 100.0);

    let total_score = clamp_score(
        sequestration * WEIGHT_SEQUESTRATION
            + f64::from(emission_offset) * WEIGHT_EMISSION
            + f64::from(environmental_health) * WEIGHT_HEALTH
            + f64::from(oxygen_production) * WEIGHT_OXYGEN,
    );

    let credits_earned = round4(chave.carbon_credits * multiplier);

    CarbonCreditScore {
        total_score,
        grade: Grade::from_score(total_score),
        breakdown: ScoreBreakdown {
            sequestration_score,
            emission_offset,
            environmental_health,
            oxygen_production,
        },
        credits_earned,
        credit_value_usd: round2(credits_earned * CREDIT_PRICE_USD),
        net_carbon_balance: round2(sensor.co2_absorbed - sensor.co2_emitted),
    }
}

/// `min(value, 100)` that keeps NaN, unlike `f64::min`.
fn cap_percent(value: f64) -> f64 {
    if value > 100.0 { 100.0 } else { value }
}

// =============================================================================
// TESTS
// =============================================================================
