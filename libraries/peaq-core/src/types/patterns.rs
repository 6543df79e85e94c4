//! Plain per-channel outputs of the level adapter and modulation processor

use crate::traits::{LevelAdapter, ModulationSource};
use serde::{Deserialize, Serialize};

/// Spectrally adapted excitation patterns of one channel
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AdaptedExcitation {
    /// Adapted reference pattern
    pub reference: Vec<f64>,
    /// Adapted test pattern
    pub test: Vec<f64>,
}

impl AdaptedExcitation {
    pub fn new(reference: Vec<f64>, test: Vec<f64>) -> Self {
        debug_assert_eq!(reference.len(), test.len());
        Self { reference, test }
    }
}

impl LevelAdapter for AdaptedExcitation {
    fn adapted_ref(&self) -> &[f64] {
        &self.reference
    }

    fn adapted_test(&self) -> &[f64] {
        &self.test
    }
}

/// Modulation pattern and average loudness of one channel of one signal
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModulationPattern {
    /// Per-band modulation
    pub modulation: Vec<f64>,
    /// Per-band average loudness
    pub average_loudness: Vec<f64>,
}

impl ModulationPattern {
    pub fn new(modulation: Vec<f64>, average_loudness: Vec<f64>) -> Self {
        debug_assert_eq!(modulation.len(), average_loudness.len());
        Self {
            modulation,
            average_loudness,
        }
    }
}

impl ModulationSource for ModulationPattern {
    fn modulation(&self) -> &[f64] {
        &self.modulation
    }

    fn average_loudness(&self) -> &[f64] {
        &self.average_loudness
    }
}
