//! # Species Module
//!
//! Static tree traits and the species catalog.
//!
//! The catalog is immutable configuration data: a deterministic
//! `BTreeMap` from a lowercase key to a [`TreeSpecies`] record.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Static traits of a tree species used by the allometric calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeSpecies {
    /// Display name.
    pub name: String,
    /// Binomial name.
    pub scientific_name: String,
    /// Wood density in g/cm³.
    pub wood_density: f64,
    /// Fraction of dry biomass that is carbon.
    pub carbon_fraction: f64,
    /// Diameter at breast height in cm.
    pub avg_dbh: f64,
    /// Tree height in m.
    pub avg_height: f64,
    /// Descriptive label, never used numerically.
    pub growth_rate: String,
    /// Informational annual uptake in kg CO2/year.
    pub co2_absorption_rate: f64,
}

impl TreeSpecies {
    #[allow(clippy::too_many_arguments)]
    fn builtin(
        name: &str,
        scientific_name: &str,
        wood_density: f64,
        carbon_fraction: f64,
        avg_dbh: f64,
        avg_height: f64,
        growth_rate: &str,
        co2_absorption_rate: f64,
    ) -> Self {
        Self {
            name: name.to_string(),
            scientific_name: scientific_name.to_string(),
            wood_density,
            carbon_fraction,
            avg_dbh,
            avg_height,
            growth_rate: growth_rate.to_string(),
            co2_absorption_rate,
        }
    }

    /// Check the numeric traits the biomass formula depends on.
    ///
    /// The scoring functions do not call this; it is meant for records
    /// entering from outside (catalog files, CLI flags).
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("wood_density", self.wood_density),
            ("carbon_fraction", self.carbon_fraction),
            ("avg_dbh", self.avg_dbh),
            ("avg_height", self.avg_height),
        ];
        for (field, value) in checks {
            if !value.is_finite() || value <= 0.0 {
                return Err(CoreError::InvalidSpecies {
                    species: self.name.clone(),
                    field,
                    value,
                });
            }
        }
        if !self.co2_absorption_rate.is_finite() {
            return Err(CoreError::InvalidSpecies {
                species: self.name.clone(),
                field: "co2_absorption_rate",
                value: self.co2_absorption_rate,
            });
        }
        Ok(())
    }
}

/// Mapping from species key to species record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeciesCatalog {
    species: BTreeMap<String, TreeSpecies>,
}

impl SpeciesCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in catalog of eight species.
    #[must_use]
    pub fn builtin() -> Self {
        let entries = [
            (
                "teak",
                TreeSpecies::builtin("Teak", "Tectona grandis", 0.55, 0.47, 35.0, 25.0, "Medium", 22.6),
            ),
            (
                "neem",
                TreeSpecies::builtin("Neem", "Azadirachta indica", 0.65, 0.47, 40.0, 20.0, "Fast", 48.0),
            ),
            (
                "banyan",
                TreeSpecies::builtin("Banyan", "Ficus benghalensis", 0.45, 0.47, 80.0, 25.0, "Slow", 21.8),
            ),
            (
                "mango",
                TreeSpecies::builtin("Mango", "Mangifera indica", 0.52, 0.47, 45.0, 18.0, "Medium", 35.0),
            ),
            (
                "peepal",
                TreeSpecies::builtin("Peepal", "Ficus religiosa", 0.46, 0.47, 60.0, 20.0, "Fast", 38.0),
            ),
            (
                "eucalyptus",
                TreeSpecies::builtin(
                    "Eucalyptus",
                    "Eucalyptus globulus",
                    0.56,
                    0.47,
                    30.0,
                    30.0,
                    "Very Fast",
                    25.0,
                ),
            ),
            (
                "oak",
                TreeSpecies::builtin("Oak", "Quercus robur", 0.60, 0.50, 50.0, 25.0, "Slow", 21.0),
            ),
            (
                "pine",
                TreeSpecies::builtin("Pine", "Pinus sylvestris", 0.42, 0.50, 35.0, 25.0, "Medium", 10.0),
            ),
        ];

        Self {
            species: entries
                .into_iter()
                .map(|(key, species)| (key.to_string(), species))
                .collect(),
        }
    }

    /// Parse a catalog from a JSON object of key -> species and validate
    /// every record.
    pub fn from_records(records: BTreeMap<String, TreeSpecies>) -> Result<Self> {
        let mut catalog = Self::new();
        for (key, species) in records {
            catalog.insert(&key, species)?;
        }
        Ok(catalog)
    }

    /// Add or replace a species after validating it.
    pub fn insert(&mut self, key: &str, species: TreeSpecies) -> Result<()> {
        species.validate()?;
        self.species.insert(normalize_key(key), species);
        Ok(())
    }

    /// Look up a species. Keys are case-insensitive.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&TreeSpecies> {
        self.species.get(&normalize_key(key))
    }

    /// Look up a species, failing with [`CoreError::UnknownSpecies`].
    pub fn require(&self, key: &str) -> Result<&TreeSpecies> {
        self.get(key)
            .ok_or_else(|| CoreError::UnknownSpecies(key.to_string()))
    }

    /// Check whether a key is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.species.contains_key(&normalize_key(key))
    }

    /// Keys in deterministic order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.species.keys().map(String::as_str)
    }

    /// Entries in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TreeSpecies)> {
        self.species.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of species.
    #[must_use]
    pub fn len(&self) -> usize {
        self.species.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}
