//! # Species Identification
//!
//! Bark-image classification behind a trait. The bundled classifier is a
//! deterministic stand-in: it picks a catalog species from a hash of the
//! image bytes, so the same photo always yields the same answer.

use canopy_core::SpeciesCatalog;
use serde::Serialize;

/// Lowest confidence the simulated classifier reports.
pub const MIN_CONFIDENCE: f64 = 0.75;

/// Highest confidence the simulated classifier reports.
pub const MAX_CONFIDENCE: f64 = 0.95;

/// A classifier verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identification {
    pub species_key: String,
    /// In `[0, 1]`, 2 dp.
    pub confidence: f64,
}

/// Why an image could not be classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifyError {
    EmptyImage,
    EmptyCatalog,
}

impl std::fmt::Display for IdentifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentifyError::EmptyImage => f.write_str("No image provided"),
            IdentifyError::EmptyCatalog => f.write_str("species catalog is empty"),
        }
    }
}

impl std::error::Error for IdentifyError {}

/// Identify a tree species from a bark image.
pub trait SpeciesClassifier: Send + Sync {
    fn identify(&self, image: &[u8], catalog: &SpeciesCatalog) -> Result<Identification, IdentifyError>;
}

/// Hash-based stand-in for a trained model.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedClassifier;

impl SpeciesClassifier for SimulatedClassifier {
    fn identify(&self, image: &[u8], catalog: &SpeciesCatalog) -> Result<Identification, IdentifyError> {
        if image.is_empty() {
            return Err(IdentifyError::EmptyImage);
        }
        let hash = fnv1a(image);
        let keys: Vec<&str> = catalog.keys().collect();
        if keys.is_empty() {
            return Err(IdentifyError::EmptyCatalog);
        }
        let index = (hash % keys.len() as u64) as usize;
        let species_key = keys.get(index).copied().unwrap_or_default().to_string();

        // 21 steps of 0.01 between the bounds
        let step = ((hash >> 32) % 21) as f64;
        let confidence = ((MIN_CONFIDENCE + step / 100.0) * 100.0).round() / 100.0;

        Ok(Identification {
            species_key,
            confidence,
        })
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;
    bytes
        .iter()
        .fold(OFFSET, |hash, &b| (hash ^ u64::from(b)).wrapping_mul(PRIME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_image_same_answer() {
        let catalog = SpeciesCatalog::builtin();
        let image = b"\xff\xd8\xff\xe0 bark pixels";
        let a = SimulatedClassifier.identify(image, &catalog).unwrap();
        let b = SimulatedClassifier.identify(image, &catalog).unwrap();
        assert_eq!(a, b);
        assert!(catalog.contains(&a.species_key));
    }

    #[test]
    fn confidence_within_bounds() {
        let catalog = SpeciesCatalog::builtin();
        for i in 0u32..500 {
            let image = i.to_le_bytes();
            let id = SimulatedClassifier.identify(&image, &catalog).unwrap();
            assert!(id.confidence >= MIN_CONFIDENCE && id.confidence <= MAX_CONFIDENCE);
            assert_eq!((id.confidence * 100.0).round() / 100.0, id.confidence);
        }
    }

    #[test]
    fn spreads_over_catalog() {
        let catalog = SpeciesCatalog::builtin();
        let mut seen = std::collections::BTreeSet::new();
        for i in 0u32..200 {
            let id = SimulatedClassifier.identify(&i.to_le_bytes(), &catalog).unwrap();
            seen.insert(id.species_key);
        }
        assert!(seen.len() > 4);
    }

    #[test]
    fn empty_inputs_rejected() {
        let catalog = SpeciesCatalog::builtin();
        assert_eq!(
            SimulatedClassifier.identify(&[], &catalog),
            Err(IdentifyError::EmptyImage)
        );
        assert_eq!(
            SimulatedClassifier.identify(b"img", &SpeciesCatalog::new()),
            Err(IdentifyError::EmptyCatalog)
        );
    }
}
