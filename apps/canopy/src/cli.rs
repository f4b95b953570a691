//! # CLI
//!
//! Command definitions and their implementations.
//!
//! Every `cmd_*` function prints its result and returns an error instead of
//! exiting, so tests can drive them directly.

use crate::api::{self, AppState};
use crate::config::{ServerConfig, ServerOverrides};
use crate::simulator::SimulatedSensor;
use canopy_core::{
    DEFAULT_DBH_GROWTH_RATE, ForestType, ReadingRecord, ReadingStore, ScoreReport, SensorData,
    SensorSource, SensorUpdate, SpeciesCatalog, TreeSpecies, annual_sequestration,
    compute_carbon_credit_score, estimate_height,
};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use std::collections::BTreeMap;
use std::error::Error;
use std::path::{Path, PathBuf};

/// Result of a CLI command.
pub type CliResult<T = ()> = Result<T, Box<dyn Error + Send + Sync>>;

pub const DEFAULT_DATABASE: &str = "canopy.redb";

/// Carbon fraction assumed for ad-hoc trees.
pub const DEFAULT_CARBON_FRACTION: f64 = 0.47;

// =============================================================================
// ARGUMENTS
// =============================================================================

#[derive(Debug, Parser)]
#[command(name = "canopy", version, about = "Tree carbon-credit scoring")]
pub struct Cli {
    /// Reading database file.
    #[arg(long, global = true, default_value = DEFAULT_DATABASE)]
    pub database: PathBuf,

    /// Species catalog JSON (object of key -> species). Built-in if omitted.
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the species catalog.
    Species,
    /// Biomass, credits and growth projection of one tree.
    Chave(ChaveArgs),
    /// Score one sensor snapshot.
    Score(ScoreArgs),
    /// Create the reading database.
    Init {
        /// Replace an existing database.
        #[arg(long)]
        force: bool,
    },
    /// Score and store readings from a JSON file.
    Ingest {
        #[arg(long)]
        device: String,
        #[arg(long)]
        species: String,
        /// One sensor object or an array of them.
        #[arg(long)]
        sensor: PathBuf,
    },
    /// Show stored readings, newest first.
    History {
        #[arg(long)]
        device: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Run the HTTP server.
    Serve(ServeArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ChaveArgs {
    /// Catalog species; conflicts with explicit dimensions.
    #[arg(long, conflicts_with_all = ["density", "dbh", "height"])]
    pub species: Option<String>,
    /// Wood density in g/cm³.
    #[arg(long, requires = "dbh")]
    pub density: Option<f64>,
    /// Diameter at breast height in cm.
    #[arg(long, requires = "density")]
    pub dbh: Option<f64>,
    /// Height in m; estimated from DBH if omitted.
    #[arg(long)]
    pub height: Option<f64>,
    #[arg(long, default_value_t = DEFAULT_CARBON_FRACTION)]
    pub carbon_fraction: f64,
    /// wet, moist, dry or temperate.
    #[arg(long, default_value = "wet")]
    pub forest_type: ForestType,
    /// Annual DBH growth as a fraction (0.02 = 2%).
    #[arg(long, default_value_t = DEFAULT_DBH_GROWTH_RATE)]
    pub growth_rate: f64,
}

#[derive(Debug, Clone, Args)]
pub struct ScoreArgs {
    #[arg(long)]
    pub species: String,
    /// Sensor JSON; missing fields fall back to the baseline snapshot.
    #[arg(long, conflicts_with = "simulate", required_unless_present = "simulate")]
    pub sensor: Option<PathBuf>,
    /// Use a simulated snapshot.
    #[arg(long)]
    pub simulate: bool,
    /// Seed for --simulate.
    #[arg(long, requires = "simulate")]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ServeArgs {
    #[arg(long)]
    pub host: Option<String>,
    #[arg(long)]
    pub port: Option<u16>,
    /// Key devices must present; also read from CANOPY_API_KEY.
    #[arg(long)]
    pub api_key: Option<String>,
    /// Active species.
    #[arg(long)]
    pub species: Option<String>,
    /// Seconds between simulated readings (0 disables).
    #[arg(long)]
    pub simulate_interval: Option<u64>,
    #[arg(long)]
    pub rate_limit: Option<u32>,
    /// Keep readings in memory only.
    #[arg(long)]
    pub no_store: bool,
}

impl From<&ServeArgs> for ServerOverrides {
    fn from(args: &ServeArgs) -> Self {
        Self {
            host: args.host.clone(),
            port: args.port,
            api_key: args.api_key.clone(),
            species: args.species.clone(),
            simulate_interval_secs: args.simulate_interval,
            rate_limit_per_sec: args.rate_limit,
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Load a catalog file, or the built-in catalog when `path` is `None`.
pub fn load_catalog(path: Option<&Path>) -> CliResult<SpeciesCatalog> {
    let Some(path) = path else {
        return Ok(SpeciesCatalog::builtin());
    };
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read catalog {}: {e}", path.display()))?;
    let records: BTreeMap<String, TreeSpecies> = serde_json::from_str(&content)
        .map_err(|e| format!("invalid catalog {}: {e}", path.display()))?;
    let catalog = SpeciesCatalog::from_records(records)?;
    if catalog.is_empty() {
        return Err(format!("catalog {} has no species", path.display()).into());
    }
    tracing::debug!(path = %path.display(), species = catalog.len(), "catalog loaded");
    Ok(catalog)
}

/// Read one update object or an array of them.
pub fn read_sensor_updates(path: &Path) -> CliResult<Vec<SensorUpdate>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read sensor file {}: {e}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| format!("invalid sensor JSON in {}: {e}", path.display()))?;
    let updates = match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<SensorUpdate>, _>>()?,
        other => vec![serde_json::from_value(other)?],
    };
    if updates.is_empty() {
        return Err(format!("sensor file {} holds no readings", path.display()).into());
    }
    Ok(updates)
}

fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_record(record: &ReadingRecord) {
    println!(
        "#{:<5} {}  {:<10} score {:>3} {:<2}  credits {:.4}  net {:+.2} ppm",
        record.sequence,
        record.sensor.timestamp.format("%Y-%m-%d %H:%M:%S"),
        record.species_key,
        record.score.total_score,
        record.score.grade.as_str(),
        record.score.credits_earned,
        record.score.net_carbon_balance,
    );
}

// =============================================================================
// COMMANDS
// =============================================================================

pub fn cmd_species(catalog: &SpeciesCatalog, json: bool) -> CliResult {
    if json {
        return print_json(catalog);
    }
    println!(
        "{:<12} {:<22} {:>7} {:>6} {:>6} {:>6}  growth",
        "key", "scientific name", "ρ", "cf", "dbh", "h"
    );
    for (key, species) in catalog.iter() {
        println!(
            "{:<12} {:<22} {:>7.2} {:>6.2} {:>6.1} {:>6.1}  {}",
            key,
            species.scientific_name,
            species.wood_density,
            species.carbon_fraction,
            species.avg_dbh,
            species.avg_height,
            species.growth_rate
        );
    }
    Ok(())
}

/// Build the tree described by `args`, from the catalog or from dimensions.
pub fn chave_subject(catalog: &SpeciesCatalog, args: &ChaveArgs) -> CliResult<(String, TreeSpecies)> {
    if let Some(key) = &args.species {
        let species = catalog.require(key)?.clone();
        return Ok((key.trim().to_lowercase(), species));
    }
    let (Some(wood_density), Some(dbh)) = (args.density, args.dbh) else {
        return Err("either --species or --density with --dbh is required".into());
    };
    let height = args.height.unwrap_or_else(|| estimate_height(dbh));
    let species = TreeSpecies {
        name: "Custom tree".to_string(),
        scientific_name: "unspecified".to_string(),
        wood_density,
        carbon_fraction: args.carbon_fraction,
        avg_dbh: dbh,
        avg_height: height,
        growth_rate: "unknown".to_string(),
        co2_absorption_rate: 0.0,
    };
    species.validate()?;
    Ok(("custom".to_string(), species))
}

pub fn cmd_chave(catalog: &SpeciesCatalog, args: &ChaveArgs, json: bool) -> CliResult {
    if !args.growth_rate.is_finite() || args.growth_rate < 0.0 {
        return Err(format!("growth rate must be a non-negative number, got {}", args.growth_rate).into());
    }
    let (key, species) = chave_subject(catalog, args)?;
    let report = ScoreReport::new(key, &species)
        .with_projection(annual_sequestration(&species, args.forest_type, args.growth_rate));
    if json {
        return print_json(&report);
    }
    print!("{}", report.to_text());
    Ok(())
}

/// Resolve the snapshot for `score`: a file merged onto the baseline, or a
/// simulated reading.
pub fn score_sensor(args: &ScoreArgs) -> CliResult<SensorData> {
    let sensor = match &args.sensor {
        Some(path) => {
            let mut sensor = SensorData::baseline(Utc::now());
            for update in read_sensor_updates(path)? {
                sensor = update.apply(&sensor, Utc::now());
            }
            sensor
        }
        None => match args.seed {
            Some(seed) => SimulatedSensor::seeded(seed).next_reading(),
            None => SimulatedSensor::from_os_rng().next_reading(),
        },
    };
    sensor.validate()?;
    Ok(sensor)
}

pub fn cmd_score(catalog: &SpeciesCatalog, args: &ScoreArgs, json: bool) -> CliResult {
    let species = catalog.require(&args.species)?;
    let sensor = score_sensor(args)?;
    let score = compute_carbon_credit_score(&sensor, species);
    let report = ScoreReport::new(args.species.trim().to_lowercase(), species).with_score(score);
    if json {
        return print_json(&serde_json::json!({ "sensor": sensor, "report": report }));
    }
    print!("{}", report.to_text());
    Ok(())
}

pub fn cmd_init(db_path: &Path, force: bool) -> CliResult {
    if db_path.exists() {
        if !force {
            return Err(format!(
                "database {} already exists (use --force to replace it)",
                db_path.display()
            )
            .into());
        }
        std::fs::remove_file(db_path)?;
        tracing::info!(path = %db_path.display(), "removed existing database");
    }
    ReadingStore::create(db_path)?;
    println!("Initialized reading database at {}", db_path.display());
    Ok(())
}

fn open_store(db_path: &Path) -> CliResult<ReadingStore> {
    if !db_path.exists() {
        return Err(format!(
            "database {} not found (run `canopy init` first)",
            db_path.display()
        )
        .into());
    }
    Ok(ReadingStore::open(db_path)?)
}

/// Score every reading in `sensor_file` and append it; returns how many
/// were stored.
pub fn cmd_ingest(
    db_path: &Path,
    catalog: &SpeciesCatalog,
    device: &str,
    species_key: &str,
    sensor_file: &Path,
    json: bool,
) -> CliResult<usize> {
    let species = catalog.require(species_key)?;
    let updates = read_sensor_updates(sensor_file)?;
    let store = open_store(db_path)?;

    let mut previous = match store.latest(device)? {
        Some(record) => record.sensor,
        None => SensorData::baseline(Utc::now()),
    };
    let mut stored = Vec::with_capacity(updates.len());
    for update in &updates {
        let sensor = update.apply(&previous, Utc::now());
        sensor.validate()?;
        let score = compute_carbon_credit_score(&sensor, species);
        let sequence = store.append(device, &species_key.trim().to_lowercase(), &sensor, &score)?;
        tracing::debug!(device, sequence, total_score = score.total_score, "reading stored");
        stored.push((sequence, score));
        previous = sensor;
    }

    if json {
        let rows: Vec<_> = stored
            .iter()
            .map(|(sequence, score)| serde_json::json!({ "sequence": sequence, "score": score }))
            .collect();
        print_json(&rows)?;
    } else {
        println!("Stored {} reading(s) for device '{}'", stored.len(), device);
    }
    Ok(stored.len())
}

pub fn cmd_history(db_path: &Path, device: &str, limit: usize, json: bool) -> CliResult {
    let store = open_store(db_path)?;
    let records = store.history(device, limit)?;
    if json {
        return print_json(&records);
    }
    if records.is_empty() {
        println!("No readings for device '{}'", device);
        return Ok(());
    }
    for record in &records {
        print_record(record);
    }
    Ok(())
}

pub async fn cmd_serve(db_path: &Path, catalog: SpeciesCatalog, args: &ServeArgs) -> CliResult {
    let config = ServerConfig::resolve(ServerOverrides::from(args))?;
    let store = if args.no_store {
        None
    } else {
        Some(ReadingStore::create(db_path)?)
    };
    let location = match &store {
        Some(_) => db_path.display().to_string(),
        None => "memory".to_string(),
    };
    tracing::info!(database = %location, "reading store ready");
    let state = AppState::new(&config, catalog, store)?;
    api::serve(config, state).await?;
    Ok(())
}
