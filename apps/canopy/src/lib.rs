//! # Canopy Library
//!
//! This library exposes the Canopy modules for testing and integration.
//!
//! The main binary uses these modules through the `main.rs` entry point.

pub mod api;
pub mod cli;
pub mod config;
pub mod identify;
pub mod simulator;

// Re-export canopy_core for convenience
pub use canopy_core;
