//! Filter bank based ear model tables

use super::bands::{hz_to_pitch, internal_noise, pitch_to_hz};
use crate::error::{PeaqError, Result};
use crate::traits::ExcitationSource;
use crate::types::FilterBankEarState;

/// Number of filters in the standard filter bank
pub const FILTER_BANK_BAND_COUNT: usize = 40;

/// Frame size (and hop) of the filter bank ear model in samples
pub const FILTER_BANK_FRAME_SIZE: usize = 192;

/// Static tables of the filter bank based ear model
///
/// Only implements [`ExcitationSource`]; spectral MOVs cannot be computed
/// from this model.
#[derive(Debug, Clone)]
pub struct FilterBankEarModel {
    frame_size: usize,
    band_centers: Vec<f64>,
    internal_noise: Vec<f64>,
}

impl Default for FilterBankEarModel {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterBankEarModel {
    /// The standard 40 band filter bank
    ///
    /// Centre frequencies are spaced uniformly in pitch from 50 Hz to 18 kHz.
    pub fn new() -> Self {
        let z_low = hz_to_pitch(50.0);
        let z_high = hz_to_pitch(18000.0);
        let step = (z_high - z_low) / (FILTER_BANK_BAND_COUNT - 1) as f64;

        let band_centers: Vec<f64> = (0..FILTER_BANK_BAND_COUNT)
            .map(|band| pitch_to_hz(z_low + band as f64 * step))
            .collect();
        let internal_noise = band_centers.iter().map(|&fc| internal_noise(fc)).collect();

        Self {
            frame_size: FILTER_BANK_FRAME_SIZE,
            band_centers,
            internal_noise,
        }
    }

    /// Build a model from an explicit internal noise table
    ///
    /// # Errors
    /// Returns an error if the table is empty.
    pub fn from_tables(frame_size: usize, internal_noise: Vec<f64>) -> Result<Self> {
        if internal_noise.is_empty() {
            return Err(PeaqError::InvalidBandCount(0));
        }
        Ok(Self {
            frame_size,
            band_centers: vec![0.0; internal_noise.len()],
            internal_noise,
        })
    }

    /// Centre frequency of each filter (Hz)
    pub fn band_centers(&self) -> &[f64] {
        &self.band_centers
    }
}

impl ExcitationSource for FilterBankEarModel {
    type State = FilterBankEarState;

    fn band_count(&self) -> usize {
        self.internal_noise.len()
    }

    fn frame_size(&self) -> usize {
        self.frame_size
    }

    fn internal_noise(&self, band: usize) -> f64 {
        self.internal_noise[band]
    }

    fn excitation<'a>(&self, state: &'a FilterBankEarState) -> &'a [f64] {
        &state.excitation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_filter_bank() {
        let model = FilterBankEarModel::new();
        assert_eq!(model.band_count(), 40);
        assert_eq!(model.frame_size(), 192);

        let centers = model.band_centers();
        assert!((centers[0] - 50.0).abs() < 1e-9);
        assert!((centers[39] - 18000.0).abs() < 1e-6);
    }

    #[test]
    fn test_internal_noise_follows_centers() {
        let model = FilterBankEarModel::new();
        for band in 0..model.band_count() {
            let expected = internal_noise(model.band_centers()[band]);
            assert_eq!(model.internal_noise(band), expected);
        }
    }

    #[test]
    fn test_from_tables() {
        let model = FilterBankEarModel::from_tables(192, vec![1.0, 2.0]).unwrap();
        assert_eq!(model.band_count(), 2);
        assert_eq!(model.internal_noise(1), 2.0);
        assert!(FilterBankEarModel::from_tables(192, vec![]).is_err());
    }
}
