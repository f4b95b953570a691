//! # Chave Module
//!
//! Biomass and sequestration from the Chave et al. allometric model:
//!
//! ```text
//! AGB = a * (ρ * D² * H)^b
//! ```
//!
//! with ρ the wood density (g/cm³), D the DBH (cm) and H the height (m).
//! The scoring pipeline always uses the pantropical coefficients
//! (a = 0.0673, b = 0.976); the other forest types feed growth projections.

use crate::rounding::{round2, round4};
use crate::species::TreeSpecies;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Molecular weight ratio CO2 / C.
pub const CO2_PER_CARBON: f64 = 44.0 / 12.0;

/// Kilograms of CO2 per carbon credit (one metric ton).
pub const KG_PER_CREDIT: f64 = 1000.0;

/// Illustrative market price of one credit in USD.
pub const CREDIT_PRICE_USD: f64 = 40.0;

/// Default annual DBH increment used by [`annual_sequestration`].
pub const DEFAULT_DBH_GROWTH_RATE: f64 = 0.02;

// =============================================================================
// FOREST TYPE
// =============================================================================

/// Forest classification selecting the allometric coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForestType {
    /// Wet tropical forest; the pantropical model.
    #[default]
    Wet,
    /// Moist tropical forest.
    Moist,
    /// Dry tropical forest.
    Dry,
    /// Temperate forest.
    Temperate,
}

impl ForestType {
    /// Coefficients `(a, b)` of `AGB = a * (ρ D² H)^b`.
    #[must_use]
    pub fn coefficients(self) -> (f64, f64) {
        match self {
            ForestType::Wet => (0.0673, 0.976),
            ForestType::Moist | ForestType::Dry => (0.0919, 0.906),
            ForestType::Temperate => (0.0549, 0.995),
        }
    }
}

impl fmt::Display for ForestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ForestType::Wet => "wet",
            ForestType::Moist => "moist",
            ForestType::Dry => "dry",
            ForestType::Temperate => "temperate",
        };
        f.write_str(name)
    }
}

impl FromStr for ForestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "wet" | "pantropical" => Ok(ForestType::Wet),
            "moist" => Ok(ForestType::Moist),
            "dry" => Ok(ForestType::Dry),
            "temperate" => Ok(ForestType::Temperate),
            other => Err(format!(
                "unknown forest type '{other}' (expected wet, moist, dry or temperate)"
            )),
        }
    }
}

// =============================================================================
// BIOMASS
// =============================================================================

/// Above-ground biomass in kg with the pantropical coefficients.
///
/// Inputs are not validated. Non-positive values produce NaN or a
/// meaningless result; validate at the boundary with
/// [`TreeSpecies::validate`].
#[must_use]
pub fn compute_biomass(wood_density: f64, dbh: f64, height: f64) -> f64 {
    compute_biomass_for(ForestType::Wet, wood_density, dbh, height)
}

/// Above-ground biomass in kg for a given forest type.
#[must_use]
pub fn compute_biomass_for(forest_type: ForestType, wood_density: f64, dbh: f64, height: f64) -> f64 {
    let (a, b) = forest_type.coefficients();
    a * (wood_density * dbh * dbh * height).powf(b)
}

/// Height in m estimated from DBH when no measurement exists.
///
/// `H = 127 * (1 - e^(-0.0276 D))^0.8706`
#[must_use]
pub fn estimate_height(dbh: f64) -> f64 {
    127.0 * (1.0 - (-0.0276 * dbh).exp()).powf(0.8706)
}

// =============================================================================
// CHAVE RESULT
// =============================================================================

/// Biomass and sequestration of one tree, rounded for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChaveResult {
    /// Above-ground biomass, kg (2 dp).
    pub agb: f64,
    /// Carbon stored, kg (2 dp).
    pub carbon_stored: f64,
    /// CO2 equivalent sequestered, kg (2 dp).
    pub co2_sequestered: f64,
    /// Credits in metric tons CO2e (4 dp).
    pub carbon_credits: f64,
    /// Credit value in USD (2 dp).
    #[serde(rename = "creditValueUSD")]
    pub credit_value_usd: f64,
}

/// Run the calculator on a species' average dimensions.
///
/// Each field is derived from the unrounded intermediates and rounded
/// independently as the last step.
#[must_use]
pub fn compute_chave_result(species: &TreeSpecies) -> ChaveResult {
    let agb = compute_biomass(species.wood_density, species.avg_dbh, species.avg_height);
    let carbon_stored = agb * species.carbon_fraction;
    let co2_sequestered = carbon_stored * CO2_PER_CARBON;
    let carbon_credits = co2_sequestered / KG_PER_CREDIT;
    let credit_value_usd = carbon_credits * CREDIT_PRICE_USD;

    ChaveResult {
        agb: round2(agb),
        carbon_stored: round2(carbon_stored),
        co2_sequestered: round2(co2_sequestered),
        carbon_credits: round4(carbon_credits),
        credit_value_usd: round2(credit_value_usd),
    }
}

// =============================================================================
// GROWTH PROJECTION
// =============================================================================

/// Yearly and monthly increments from one year of DBH growth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnualSequestration {
    pub forest_type: ForestType,
    pub dbh_growth_rate: f64,
    pub annual_agb_increment_kg: f64,
    pub annual_carbon_kg: f64,
    pub annual_co2_kg: f64,
    pub monthly_carbon_kg: f64,
    pub monthly_co2_kg: f64,
}

#[derive(Clone, Copy)]
struct Stock {
    agb: f64,
    carbon: f64,
    co2: f64,
}

fn stock(forest_type: ForestType, species: &TreeSpecies, dbh: f64) -> Stock {
    let agb = compute_biomass_for(forest_type, species.wood_density, dbh, species.avg_height);
    let carbon = agb * species.carbon_fraction;
    Stock {
        agb: round2(agb),
        carbon: round2(carbon),
        co2: round2(carbon * CO2_PER_CARBON),
    }
}

/// Project one year of growth at `dbh_growth_rate` (0.02 = 2% DBH per year)
/// and report the sequestration increments.
///
/// Increments are differences of the 2 dp stocks; monthly figures are the
/// annual increment over twelve, rounded to 2 dp.
#[must_use]
pub fn annual_sequestration(
    species: &TreeSpecies,
    forest_type: ForestType,
    dbh_growth_rate: f64,
) -> AnnualSequestration {
    let current = stock(forest_type, species, species.avg_dbh);
    let projected = stock(forest_type, species, species.avg_dbh * (1.0 + dbh_growth_rate));

    let carbon = projected.carbon - current.carbon;
    let co2 = projected.co2 - current.co2;

    AnnualSequestration {
        forest_type,
        dbh_growth_rate,
        annual_agb_increment_kg: round2(projected.agb - current.agb),
        annual_carbon_kg: round2(carbon),
        annual_co2_kg: round2(co2),
        monthly_carbon_kg: round2(carbon / 12.0),
        monthly_co2_kg: round2(co2 / 12.0),
    }
}

// =============================================================================
// TESTS
// =============================================================================
