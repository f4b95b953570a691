//! Route handlers.

use super::auth;
use super::error::ApiError;
use super::state::{AppState, LatestReading, ReadingOrigin};
use crate::identify::IdentifyError;
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use canopy_core::{
    CarbonCreditScore, ChaveResult, DEFAULT_DBH_GROWTH_RATE, ForestType, ReadingRecord,
    ScoreReport, SensorData, SensorUpdate, SpeciesCatalog, annual_sequestration,
    compute_carbon_credit_score, compute_chave_result,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Device id used when a post carries none.
pub const DEFAULT_DEVICE_ID: &str = "default";

pub const DEFAULT_HISTORY_LIMIT: usize = 20;
pub const MAX_HISTORY_LIMIT: usize = 500;

// =============================================================================
// HEALTH & CATALOG
// =============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn list_species(State(state): State<AppState>) -> Json<SpeciesCatalog> {
    Json(state.catalog.as_ref().clone())
}

/// Species traits, Chave result and a one-year growth projection.
pub async fn get_species(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ScoreReport>, ApiError> {
    let species = state.catalog.require(&key)?;
    let report = ScoreReport::new(key.trim().to_lowercase(), species).with_projection(
        annual_sequestration(species, ForestType::Wet, DEFAULT_DBH_GROWTH_RATE),
    );
    Ok(Json(report))
}

// =============================================================================
// SENSOR DATA
// =============================================================================

pub async fn get_sensor_data(State(state): State<AppState>) -> Json<SensorData> {
    Json(state.latest.read().await.sensor.clone())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub success: bool,
    pub message: &'static str,
    pub timestamp: DateTime<Utc>,
    pub device_id: String,
    /// Present when the reading was persisted.
    pub sequence: Option<u64>,
    pub score: CarbonCreditScore,
}

/// Merge a device update into the latest snapshot, score and store it.
pub async fn post_sensor_data(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<IngestResponse>, ApiError> {
    auth::authorize(&headers, state.api_key.as_deref())?;

    let update: SensorUpdate = serde_json::from_slice(&body).map_err(|err| {
        tracing::debug!(error = %err, "rejected sensor body");
        ApiError::BadRequest("Invalid request body".to_string())
    })?;
    if update.is_empty() {
        return Err(ApiError::BadRequest("No sensor readings in body".to_string()));
    }
    let device_id = update
        .device_id
        .clone()
        .unwrap_or_else(|| DEFAULT_DEVICE_ID.to_string());

    let species = state.catalog.require(&state.species_key)?.clone();

    // Held across the merge so concurrent posts do not drop each other's fields.
    let mut latest = state.latest.write().await;
    let sensor = update.apply(&latest.sensor, Utc::now());
    if let Err(err) = sensor.validate() {
        tracing::warn!(device = %device_id, error = %err, "rejected sensor reading");
        return Err(err.into());
    }
    let score = compute_carbon_credit_score(&sensor, &species);

    let sequence = match &state.store {
        Some(store) => {
            let store = store.clone();
            let (device, key, reading) =
                (device_id.clone(), state.species_key.to_string(), sensor.clone());
            let stored = tokio::task::spawn_blocking(move || {
                store.append(&device, &key, &reading, &score)
            })
            .await
            .map_err(|err| ApiError::Internal(format!("storage task failed: {err}")))??;
            Some(stored)
        }
        None => None,
    };

    *latest = LatestReading::received_now(sensor.clone(), ReadingOrigin::Device);
    drop(latest);

    tracing::info!(
        device = %device_id,
        species = %state.species_key,
        total_score = score.total_score,
        grade = %score.grade,
        "sensor data received"
    );

    Ok(Json(IngestResponse {
        success: true,
        message: "Sensor data received",
        timestamp: sensor.timestamp,
        device_id,
        sequence,
        score,
    }))
}

// =============================================================================
// SCORE
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ScoreParams {
    pub species: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResponse {
    pub sensor: SensorData,
    pub origin: ReadingOrigin,
    #[serde(flatten)]
    pub report: ScoreReport,
}

/// Score the latest snapshot, for the active species unless one is given.
pub async fn get_score(
    State(state): State<AppState>,
    Query(params): Query<ScoreParams>,
) -> Result<Json<ScoreResponse>, ApiError> {
    let key = params
        .species
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_else(|| state.species_key.to_string());
    let species = state.catalog.require(&key)?;

    let (sensor, origin) = {
        let latest = state.latest.read().await;
        (latest.sensor.clone(), latest.origin)
    };
    let score = compute_carbon_credit_score(&sensor, species);
    tracing::debug!(species = %key, total_score = score.total_score, "score computed");

    Ok(Json(ScoreResponse {
        sensor,
        origin,
        report: ScoreReport::new(key, species).with_score(score),
    }))
}

// =============================================================================
// IDENTIFY
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct IdentifyRequest {
    /// Base64 image, optionally as a `data:` URL.
    pub image: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentificationView {
    pub species_key: String,
    pub species: String,
    pub scientific_name: String,
    pub confidence: f64,
    pub wood_density: f64,
    pub avg_dbh: f64,
    pub avg_height: f64,
    pub growth_rate: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyResponse {
    pub success: bool,
    pub identification: IdentificationView,
    pub chave_analysis: ChaveResult,
    pub co2_absorption_rate: f64,
}

/// Classify a bark image and return the species' Chave analysis.
pub async fn identify(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<IdentifyResponse>, ApiError> {
    let request: IdentifyRequest = serde_json::from_slice(&body)
        .map_err(|_| ApiError::BadRequest("No image provided".to_string()))?;

    let encoded = match request.image.split_once(";base64,") {
        Some((_, data)) => data,
        None => request.image.as_str(),
    };
    let image = STANDARD
        .decode(encoded.trim())
        .map_err(|_| ApiError::BadRequest("Image is not valid base64".to_string()))?;

    let verdict = state
        .classifier
        .identify(&image, &state.catalog)
        .map_err(|err| match err {
            IdentifyError::EmptyImage => ApiError::BadRequest(err.to_string()),
            IdentifyError::EmptyCatalog => ApiError::Internal(err.to_string()),
        })?;
    let species = state.catalog.require(&verdict.species_key)?;

    tracing::info!(
        species = %verdict.species_key,
        confidence = verdict.confidence,
        bytes = image.len(),
        "tree identified"
    );

    Ok(Json(IdentifyResponse {
        success: true,
        identification: IdentificationView {
            species_key: verdict.species_key.clone(),
            species: species.name.clone(),
            scientific_name: species.scientific_name.clone(),
            confidence: verdict.confidence,
            wood_density: species.wood_density,
            avg_dbh: species.avg_dbh,
            avg_height: species.avg_height,
            growth_rate: species.growth_rate.clone(),
        },
        chave_analysis: compute_chave_result(species),
        co2_absorption_rate: species.co2_absorption_rate,
    }))
}

// =============================================================================
// READINGS
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingsResponse {
    pub device_id: String,
    pub count: usize,
    pub readings: Vec<ReadingRecord>,
}

/// Stored readings of one device, newest first.
pub async fn get_readings(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<ReadingsResponse>, ApiError> {
    let Some(store) = state.store.clone() else {
        return Err(ApiError::Unavailable("No reading database configured".to_string()));
    };
    let limit = params
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);

    let device = device_id.clone();
    let readings = tokio::task::spawn_blocking(move || store.history(&device, limit))
        .await
        .map_err(|err| ApiError::Internal(format!("storage task failed: {err}")))??;

    Ok(Json(ReadingsResponse {
        device_id,
        count: readings.len(),
        readings,
    }))
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}
