//! # Sensor Simulator
//!
//! Bounded random snapshots for demos and for running the server without
//! a device attached.

use canopy_core::{SensorData, SensorSource};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::Range;

/// Value ranges of the simulated readings.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationRanges {
    pub temperature: Range<f64>,
    pub humidity: Range<f64>,
    pub soil_moisture: Range<f64>,
    pub light_intensity: Range<f64>,
    pub ph: Range<f64>,
    pub co2_emitted: Range<f64>,
    pub co2_absorbed: Range<f64>,
    pub o2_released: Range<f64>,
}

impl Default for SimulationRanges {
    fn default() -> Self {
        Self {
            temperature: 23.0..29.0,
            humidity: 52.0..72.0,
            soil_moisture: 30.0..60.0,
            light_intensity: 400.0..700.0,
            ph: 5.5..7.5,
            co2_emitted: 380.0..480.0,
            co2_absorbed: 350.0..500.0,
            o2_released: 180.0..260.0,
        }
    }
}

/// A [`SensorSource`] drawing uniformly from [`SimulationRanges`].
///
/// Readings are rounded to one decimal like a real device would report.
/// Timestamps come from the wall clock.
#[derive(Debug, Clone)]
pub struct SimulatedSensor {
    rng: StdRng,
    ranges: SimulationRanges,
}

impl SimulatedSensor {
    /// Seeded simulator; equal seeds give equal readings.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            ranges: SimulationRanges::default(),
        }
    }

    /// Simulator seeded from the operating system.
    pub fn from_os_rng() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            ranges: SimulationRanges::default(),
        }
    }

    /// Replace the value ranges.
    pub fn with_ranges(mut self, ranges: SimulationRanges) -> Self {
        self.ranges = ranges;
        self
    }

    fn draw(&mut self, range: Range<f64>) -> f64 {
        let value = self.rng.random_range(range);
        (value * 10.0).round() / 10.0
    }
}

impl SensorSource for SimulatedSensor {
    fn next_reading(&mut self) -> SensorData {
        let ranges = self.ranges.clone();
        SensorData {
            temperature: self.draw(ranges.temperature),
            humidity: self.draw(ranges.humidity),
            soil_moisture: self.draw(ranges.soil_moisture),
            light_intensity: self.draw(ranges.light_intensity),
            ph: self.draw(ranges.ph),
            co2_emitted: self.draw(ranges.co2_emitted),
            co2_absorbed: self.draw(ranges.co2_absorbed),
            o2_released: self.draw(ranges.o2_released),
            timestamp: Utc::now(),
        }
    }
}
