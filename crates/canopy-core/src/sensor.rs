//! # Sensor Module
//!
//! One environmental snapshot ([`SensorData`]) and the partial update
//! format devices post ([`SensorUpdate`]).

use crate::error::{CoreError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One sensor snapshot.
///
/// Values are assumed calibrated. The engine never range-checks them:
/// out-of-range readings lower the multiplier and score instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorData {
    /// Air temperature in °C.
    pub temperature: f64,
    /// Relative humidity in %.
    pub humidity: f64,
    /// Volumetric soil moisture in %.
    pub soil_moisture: f64,
    /// Photosynthetically active light in µmol·m⁻²·s⁻¹.
    pub light_intensity: f64,
    /// Soil pH.
    pub ph: f64,
    /// CO2 emitted nearby (traffic), ppm.
    pub co2_emitted: f64,
    /// CO2 absorbed by the tree, ppm.
    pub co2_absorbed: f64,
    /// O2 released by the tree, ppm.
    pub o2_released: f64,
    /// Capture time.
    pub timestamp: DateTime<Utc>,
}

impl SensorData {
    /// The snapshot shown before any device has reported.
    #[must_use]
    pub fn baseline(timestamp: DateTime<Utc>) -> Self {
        Self {
            temperature: 26.4,
            humidity: 62.5,
            soil_moisture: 47.2,
            light_intensity: 580.0,
            ph: 6.8,
            co2_emitted: 412.0,
            co2_absorbed: 385.0,
            o2_released: 210.0,
            timestamp,
        }
    }

    /// Named numeric fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> [(&'static str, f64); 8] {
        [
            ("temperature", self.temperature),
            ("humidity", self.humidity),
            ("soil_moisture", self.soil_moisture),
            ("light_intensity", self.light_intensity),
            ("ph", self.ph),
            ("co2_emitted", self.co2_emitted),
            ("co2_absorbed", self.co2_absorbed),
            ("o2_released", self.o2_released),
        ]
    }

    /// Reject snapshots carrying NaN or infinite values.
    pub fn validate(&self) -> Result<()> {
        match self.fields().into_iter().find(|(_, v)| !v.is_finite()) {
            Some((field, value)) => Err(CoreError::NonFiniteSensor { field, value }),
            None => Ok(()),
        }
    }
}

/// A partial snapshot as posted by a device.
///
/// Every reading is optional and accepted under both its snake_case and
/// camelCase name. Missing readings keep their previous value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorUpdate {
    #[serde(default, alias = "deviceId")]
    pub device_id: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default, alias = "soilMoisture")]
    pub soil_moisture: Option<f64>,
    #[serde(default, alias = "lightIntensity")]
    pub light_intensity: Option<f64>,
    #[serde(default)]
    pub ph: Option<f64>,
    #[serde(default, alias = "co2Emitted")]
    pub co2_emitted: Option<f64>,
    #[serde(default, alias = "co2Absorbed")]
    pub co2_absorbed: Option<f64>,
    #[serde(default, alias = "o2Released")]
    pub o2_released: Option<f64>,
}

impl SensorUpdate {
    /// Merge onto `previous`, stamping the result with `now`.
    #[must_use]
    pub fn apply(&self, previous: &SensorData, now: DateTime<Utc>) -> SensorData {
        SensorData {
            temperature: self.temperature.unwrap_or(previous.temperature),
            humidity: self.humidity.unwrap_or(previous.humidity),
            soil_moisture: self.soil_moisture.unwrap_or(previous.soil_moisture),
            light_intensity: self.light_intensity.unwrap_or(previous.light_intensity),
            ph: self.ph.unwrap_or(previous.ph),
            co2_emitted: self.co2_emitted.unwrap_or(previous.co2_emitted),
            co2_absorbed: self.co2_absorbed.unwrap_or(previous.co2_absorbed),
            o2_released: self.o2_released.unwrap_or(previous.o2_released),
            timestamp: now,
        }
    }

    /// Whether the update carries no reading at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none()
            && self.humidity.is_none()
            && self.soil_moisture.is_none()
            && self.light_intensity.is_none()
            && self.ph.is_none()
            && self.co2_emitted.is_none()
            && self.co2_absorbed.is_none()
            && self.o2_released.is_none()
    }
}
