//! # HTTP API
//!
//! ```text
//! GET  /health               -> {status, version}
//! GET  /species              -> species catalog
//! GET  /species/{key}        -> traits + Chave result + growth projection
//! GET  /sensor-data          -> latest snapshot
//! POST /sensor-data          -> merge a device update, score, store
//! GET  /score?species=KEY    -> score of the latest snapshot
//! POST /identify             -> classify a base64 bark image
//! GET  /readings/{device}    -> stored history, newest first
//! ```
//!
//! Every route shares one rate limiter; CORS is permissive for the dashboard.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod state;

pub use error::ApiError;
pub use state::{AppState, LatestReading, ReadingOrigin};

use crate::config::ServerConfig;
use crate::simulator::SimulatedSensor;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use canopy_core::SensorSource;
use chrono::{TimeDelta, Utc};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Largest accepted `/identify` body.
pub const MAX_IMAGE_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Build the router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/species", get(handlers::list_species))
        .route("/species/{key}", get(handlers::get_species))
        .route(
            "/sensor-data",
            get(handlers::get_sensor_data).post(handlers::post_sensor_data),
        )
        .route("/score", get(handlers::get_score))
        .route(
            "/identify",
            post(handlers::identify).layer(DefaultBodyLimit::max(MAX_IMAGE_BODY_BYTES)),
        )
        .route("/readings/{device}", get(handlers::get_readings))
        .fallback(handlers::not_found)
        // Middleware (applied in reverse order)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::limit,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: ServerConfig, state: AppState) -> std::io::Result<()> {
    if let Some(period) = config.simulate_interval {
        tracing::info!(every_secs = period.as_secs(), "sensor simulator enabled");
        spawn_simulator(state.clone(), period, SimulatedSensor::from_os_rng());
    }

    let app = create_router(state);
    let listener = TcpListener::bind(config.bind_address()).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        species = %config.species,
        auth = config.api_key.is_some(),
        rate_limit = config.rate_limit_per_sec.get(),
        "Canopy server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

// =============================================================================
// SIMULATOR TASK
// =============================================================================

/// Refresh the latest snapshot from `source` every `period`.
pub fn spawn_simulator<S>(state: AppState, period: Duration, mut source: S) -> JoinHandle<()>
where
    S: SensorSource + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            simulate_tick(&state, period, &mut source).await;
        }
    })
}

/// One simulator step. A device whose last post arrived within two periods
/// keeps the snapshot; returns whether the snapshot was replaced.
///
/// Silence is measured from `received_at`, so device clocks cannot hold
/// the simulator off.
pub async fn simulate_tick<S: SensorSource>(state: &AppState, period: Duration, source: &mut S) -> bool {
    let mut latest = state.latest.write().await;
    if latest.origin == ReadingOrigin::Device {
        let quiet = TimeDelta::from_std(period.saturating_mul(2)).unwrap_or(TimeDelta::MAX);
        if Utc::now() - latest.received_at < quiet {
            tracing::debug!("device active, simulator idle");
            return false;
        }
    }
    *latest = LatestReading::received_now(source.next_reading(), ReadingOrigin::Simulated);
    tracing::debug!(temperature = latest.sensor.temperature, "simulated reading");
    true
}
