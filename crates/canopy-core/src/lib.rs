//! # Canopy Core
//!
//! The deterministic carbon-scoring engine.
//!
//! Two composed stages, both depending only on static lookup data:
//!
//! ```text
//! TreeSpecies ──► [chave] ──► ChaveResult
//!                                  │
//! SensorData ──► [environment] ──► [score] ──► CarbonCreditScore
//! ```
//!
//! Every scoring function here is pure: no I/O, no shared mutable state,
//! no wall clock. The only stateful component is the [`storage`] module,
//! which persists scored readings for the application layer.

pub mod chave;
pub mod environment;
pub mod error;
pub mod report;
pub mod rounding;
pub mod score;
pub mod sensor;
pub mod source;
pub mod species;
pub mod storage;

pub use chave::{
    AnnualSequestration, ChaveResult, DEFAULT_DBH_GROWTH_RATE, ForestType, annual_sequestration,
    compute_biomass, compute_chave_result, estimate_height,
};
pub use environment::{
    Band, EnvironmentalFactor, FactorRule, HealthBands, MultiplierTable,
    compute_environmental_health, compute_environmental_multiplier,
};
pub use error::{CoreError, Result};
pub use report::ScoreReport;
pub use score::{CarbonCreditScore, Grade, ScoreBreakdown, compute_carbon_credit_score};
pub use sensor::{SensorData, SensorUpdate};
pub use source::{ReplaySource, SensorSource};
pub use species::{SpeciesCatalog, TreeSpecies};
pub use storage::{ReadingRecord, ReadingStore};
