//! Typed per-channel ear model states

use serde::{Deserialize, Serialize};

/// State of the FFT based ear model after one frame
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FftEarState {
    /// Excitation pattern, one entry per band
    pub excitation: Vec<f64>,
    /// Power spectrum, `frame_size / 2 + 1` bins
    pub power_spectrum: Vec<f64>,
    /// Power spectrum after outer and middle ear weighting
    pub weighted_power_spectrum: Vec<f64>,
    /// Energy of the frame's second half reached the EHS threshold
    pub energy_threshold_reached: bool,
}

impl FftEarState {
    pub fn new(
        excitation: Vec<f64>,
        power_spectrum: Vec<f64>,
        weighted_power_spectrum: Vec<f64>,
        energy_threshold_reached: bool,
    ) -> Self {
        Self {
            excitation,
            power_spectrum,
            weighted_power_spectrum,
            energy_threshold_reached,
        }
    }
}

/// State of the filter bank based ear model after one frame
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterBankEarState {
    /// Excitation pattern, one entry per band
    pub excitation: Vec<f64>,
}

impl FilterBankEarState {
    pub fn new(excitation: Vec<f64>) -> Self {
        Self { excitation }
    }
}
