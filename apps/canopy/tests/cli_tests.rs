//! Integration tests for Canopy CLI commands.
//!
//! Uses tempfile for testing file-based operations.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use canopy::cli::{
    ChaveArgs, ScoreArgs, chave_subject, cmd_chave, cmd_history, cmd_ingest, cmd_init, cmd_score,
    cmd_species, load_catalog, read_sensor_updates, score_sensor,
};
use canopy_core::{ForestType, ReadingStore, SpeciesCatalog};
use std::path::PathBuf;
use tempfile::TempDir;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Create a temporary directory for tests.
fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Create a sensor file holding a single object.
fn create_sensor_object(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("sensor.json");
    let content = r#"{"temperature": 25.0, "humidity": 60, "soilMoisture": 50, "light_intensity": 600}"#;
    std::fs::write(&path, content).unwrap();
    path
}

/// Create a sensor file holding an array of partial readings.
fn create_sensor_array(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("readings.json");
    let content = r#"[
        {"temperature": 24.0, "co2_absorbed": 390},
        {"temperature": 31.5},
        {"humidity": 85, "o2Released": 150}
    ]"#;
    std::fs::write(&path, content).unwrap();
    path
}

fn chave_args() -> ChaveArgs {
    ChaveArgs {
        species: None,
        density: None,
        dbh: None,
        height: None,
        carbon_fraction: 0.47,
        forest_type: ForestType::Wet,
        growth_rate: 0.02,
    }
}

// =============================================================================
// CATALOG TESTS
// =============================================================================

#[test]
fn test_builtin_catalog_when_no_file() {
    let catalog = load_catalog(None).unwrap();
    assert_eq!(catalog.len(), 8);
    assert!(cmd_species(&catalog, false).is_ok());
    assert!(cmd_species(&catalog, true).is_ok());
}

#[test]
fn test_load_custom_catalog() {
    let temp = create_temp_dir();
    let path = temp.path().join("catalog.json");
    let content = r#"{
        "Sal": {
            "name": "Sal", "scientificName": "Shorea robusta", "woodDensity": 0.72,
            "carbonFraction": 0.48, "avgDbh": 45, "avgHeight": 28,
            "growthRate": "Slow", "co2AbsorptionRate": 30
        }
    }"#;
    std::fs::write(&path, content).unwrap();

    let catalog = load_catalog(Some(&path)).unwrap();
    assert_eq!(catalog.len(), 1);
    assert!(catalog.contains("sal"));
}

#[test]
fn test_catalog_with_invalid_species_rejected() {
    let temp = create_temp_dir();
    let path = temp.path().join("catalog.json");
    let content = r#"{
        "ghost": {
            "name": "Ghost", "scientificName": "Nulla", "woodDensity": 0,
            "carbonFraction": 0.47, "avgDbh": 10, "avgHeight": 5,
            "growthRate": "None", "co2AbsorptionRate": 0
        }
    }"#;
    std::fs::write(&path, content).unwrap();
    assert!(load_catalog(Some(&path)).is_err());
}

#[test]
fn test_empty_catalog_rejected() {
    let temp = create_temp_dir();
    let path = temp.path().join("catalog.json");
    std::fs::write(&path, "{}").unwrap();
    assert!(load_catalog(Some(&path)).is_err());
}

// =============================================================================
// CHAVE COMMAND TESTS
// =============================================================================

#[test]
fn test_chave_for_catalog_species() {
    let catalog = SpeciesCatalog::builtin();
    let args = ChaveArgs {
        species: Some("Neem".into()),
        ..chave_args()
    };
    let (key, species) = chave_subject(&catalog, &args).unwrap();
    assert_eq!(key, "neem");
    assert_eq!(species.avg_dbh, 40.0);
    assert!(cmd_chave(&catalog, &args, false).is_ok());
    assert!(cmd_chave(&catalog, &args, true).is_ok());
}

#[test]
fn test_chave_custom_dimensions_estimate_height() {
    let catalog = SpeciesCatalog::builtin();
    let args = ChaveArgs {
        density: Some(0.6),
        dbh: Some(40.0),
        forest_type: ForestType::Moist,
        ..chave_args()
    };
    let (key, species) = chave_subject(&catalog, &args).unwrap();
    assert_eq!(key, "custom");
    assert!((species.avg_height - 89.44).abs() < 0.05);
    assert!(cmd_chave(&catalog, &args, false).is_ok());
}

#[test]
fn test_chave_requires_a_subject() {
    let catalog = SpeciesCatalog::builtin();
    assert!(cmd_chave(&catalog, &chave_args(), false).is_err());
}

#[test]
fn test_chave_rejects_invalid_dimensions() {
    let catalog = SpeciesCatalog::builtin();
    let args = ChaveArgs {
        density: Some(-1.0),
        dbh: Some(30.0),
        height: Some(10.0),
        ..chave_args()
    };
    assert!(cmd_chave(&catalog, &args, false).is_err());

    let args = ChaveArgs {
        species: Some("neem".into()),
        growth_rate: -0.5,
        ..chave_args()
    };
    assert!(cmd_chave(&catalog, &args, false).is_err());
}

#[test]
fn test_chave_unknown_species() {
    let catalog = SpeciesCatalog::builtin();
    let args = ChaveArgs {
        species: Some("baobab".into()),
        ..chave_args()
    };
    assert!(cmd_chave(&catalog, &args, false).is_err());
}

// =============================================================================
// SCORE COMMAND TESTS
// =============================================================================

#[test]
fn test_score_from_file_merges_onto_baseline() {
    let temp = create_temp_dir();
    let sensor_file = create_sensor_object(&temp);
    let args = ScoreArgs {
        species: "neem".into(),
        sensor: Some(sensor_file),
        simulate: false,
        seed: None,
    };

    let sensor = score_sensor(&args).unwrap();
    assert_eq!(sensor.temperature, 25.0);
    assert_eq!(sensor.soil_moisture, 50.0);
    // baseline values for the fields the file leaves out
    assert_eq!(sensor.ph, 6.8);
    assert_eq!(sensor.co2_emitted, 412.0);

    assert!(cmd_score(&SpeciesCatalog::builtin(), &args, false).is_ok());
}

#[test]
fn test_score_simulated_with_seed_is_repeatable() {
    let args = ScoreArgs {
        species: "teak".into(),
        sensor: None,
        simulate: true,
        seed: Some(11),
    };
    let a = score_sensor(&args).unwrap();
    let b = score_sensor(&args).unwrap();
    assert_eq!(a.fields(), b.fields());
    assert!(cmd_score(&SpeciesCatalog::builtin(), &args, true).is_ok());
}

#[test]
fn test_score_invalid_json() {
    let temp = create_temp_dir();
    let bad_file = temp.path().join("bad.json");
    std::fs::write(&bad_file, "not valid json").unwrap();
    let args = ScoreArgs {
        species: "neem".into(),
        sensor: Some(bad_file),
        simulate: false,
        seed: None,
    };
    assert!(cmd_score(&SpeciesCatalog::builtin(), &args, false).is_err());
}

// =============================================================================
// INIT COMMAND TESTS
// =============================================================================

#[test]
fn test_init_creates_database() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.redb");

    let result = cmd_init(&db_path, false);
    assert!(result.is_ok());
    assert!(db_path.exists());
}

#[test]
fn test_init_fails_if_exists_without_force() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.redb");

    // First init
    cmd_init(&db_path, false).unwrap();

    // Second init should fail
    let result = cmd_init(&db_path, false);
    assert!(result.is_err());
}

#[test]
fn test_init_with_force_clears_readings() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.redb");
    let sensor_file = create_sensor_array(&temp);
    let catalog = SpeciesCatalog::builtin();

    cmd_init(&db_path, false).unwrap();
    cmd_ingest(&db_path, &catalog, "esp32-01", "neem", &sensor_file, false).unwrap();

    let result = cmd_init(&db_path, true);
    assert!(result.is_ok());
    let store = ReadingStore::open(&db_path).unwrap();
    assert_eq!(store.count().unwrap(), 0);
}

// =============================================================================
// INGEST COMMAND TESTS
// =============================================================================

#[test]
fn test_read_sensor_updates_object_and_array() {
    let temp = create_temp_dir();
    assert_eq!(read_sensor_updates(&create_sensor_object(&temp)).unwrap().len(), 1);
    assert_eq!(read_sensor_updates(&create_sensor_array(&temp)).unwrap().len(), 3);

    let empty = temp.path().join("empty.json");
    std::fs::write(&empty, "[]").unwrap();
    assert!(read_sensor_updates(&empty).is_err());
}

#[test]
fn test_ingest_stores_merged_readings() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.redb");
    let sensor_file = create_sensor_array(&temp);
    let catalog = SpeciesCatalog::builtin();

    cmd_init(&db_path, false).unwrap();
    let stored = cmd_ingest(&db_path, &catalog, "esp32-01", "Neem", &sensor_file, false).unwrap();
    assert_eq!(stored, 3);

    // Verify data was ingested, newest first
    let store = ReadingStore::open(&db_path).unwrap();
    let history = store.history("esp32-01", 10).unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].sequence, 3);
    assert_eq!(history[0].species_key, "neem");
    // third update only sets humidity and o2, temperature carries over
    assert_eq!(history[0].sensor.temperature, 31.5);
    assert_eq!(history[0].sensor.humidity, 85.0);
    assert_eq!(history[2].sensor.co2_absorbed, 390.0);
}

#[test]
fn test_ingest_continues_from_latest_reading() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.redb");
    let catalog = SpeciesCatalog::builtin();
    cmd_init(&db_path, false).unwrap();

    cmd_ingest(&db_path, &catalog, "esp32-01", "neem", &create_sensor_array(&temp), false).unwrap();
    let single = temp.path().join("one.json");
    std::fs::write(&single, r#"{"ph": 7.2}"#).unwrap();
    cmd_ingest(&db_path, &catalog, "esp32-01", "neem", &single, true).unwrap();

    let store = ReadingStore::open(&db_path).unwrap();
    let latest = store.latest("esp32-01").unwrap().unwrap();
    assert_eq!(latest.sequence, 4);
    assert_eq!(latest.sensor.ph, 7.2);
    assert_eq!(latest.sensor.humidity, 85.0);
}

#[test]
fn test_ingest_requires_database() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("missing.redb");
    let sensor_file = create_sensor_object(&temp);
    let result = cmd_ingest(&db_path, &SpeciesCatalog::builtin(), "esp32-01", "neem", &sensor_file, false);
    assert!(result.is_err());
}

#[test]
fn test_ingest_unknown_species() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.redb");
    let sensor_file = create_sensor_object(&temp);
    cmd_init(&db_path, false).unwrap();
    let result = cmd_ingest(&db_path, &SpeciesCatalog::builtin(), "esp32-01", "baobab", &sensor_file, false);
    assert!(result.is_err());
}

// =============================================================================
// HISTORY COMMAND TESTS
// =============================================================================

#[test]
fn test_history_text_and_json() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.redb");
    let sensor_file = create_sensor_array(&temp);
    cmd_init(&db_path, false).unwrap();
    cmd_ingest(&db_path, &SpeciesCatalog::builtin(), "esp32-01", "oak", &sensor_file, false).unwrap();

    assert!(cmd_history(&db_path, "esp32-01", 2, false).is_ok());
    assert!(cmd_history(&db_path, "esp32-01", 2, true).is_ok());
    assert!(cmd_history(&db_path, "nobody", 2, false).is_ok());
}
