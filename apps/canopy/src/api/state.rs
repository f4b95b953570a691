//! Shared state of the HTTP server.

use crate::config::ServerConfig;
use crate::identify::{SimulatedClassifier, SpeciesClassifier};
use canopy_core::{ReadingStore, SensorData, SpeciesCatalog};
use chrono::{DateTime, Utc};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Where the current snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingOrigin {
    /// Startup default; no device or simulator has reported yet.
    Baseline,
    Device,
    Simulated,
}

/// The snapshot served by `GET /sensor-data`.
#[derive(Debug, Clone, PartialEq)]
pub struct LatestReading {
    pub sensor: SensorData,
    pub origin: ReadingOrigin,
    /// Server clock when the snapshot was accepted. The simulator measures
    /// device silence against this, never against `sensor.timestamp`.
    pub received_at: DateTime<Utc>,
}

impl LatestReading {
    /// A snapshot accepted now.
    pub fn received_now(sensor: SensorData, origin: ReadingOrigin) -> Self {
        Self {
            sensor,
            origin,
            received_at: Utc::now(),
        }
    }
}

/// Application state shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<SpeciesCatalog>,
    /// Active species, guaranteed present in `catalog`.
    pub species_key: Arc<str>,
    pub latest: Arc<RwLock<LatestReading>>,
    /// `None` runs the server without persistence.
    pub store: Option<Arc<ReadingStore>>,
    pub api_key: Option<Arc<str>>,
    pub classifier: Arc<dyn SpeciesClassifier>,
    pub limiter: Arc<DefaultDirectRateLimiter>,
}

impl AppState {
    /// Build the state, checking that the configured species exists.
    pub fn new(
        config: &ServerConfig,
        catalog: SpeciesCatalog,
        store: Option<ReadingStore>,
    ) -> Result<Self, String> {
        if !catalog.contains(&config.species) {
            return Err(format!(
                "species '{}' is not in the catalog (known: {})",
                config.species,
                catalog.keys().collect::<Vec<_>>().join(", ")
            ));
        }

        Ok(Self {
            catalog: Arc::new(catalog),
            species_key: Arc::from(config.species.as_str()),
            latest: Arc::new(RwLock::new(LatestReading::received_now(
                SensorData::baseline(Utc::now()),
                ReadingOrigin::Baseline,
            ))),
            store: store.map(Arc::new),
            api_key: config.api_key.as_deref().map(Arc::from),
            classifier: Arc::new(SimulatedClassifier),
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(
                config.rate_limit_per_sec,
            ))),
        })
    }

    /// Swap the species classifier.
    #[must_use]
    pub fn with_classifier(mut self, classifier: Arc<dyn SpeciesClassifier>) -> Self {
        self.classifier = classifier;
        self
    }
}
