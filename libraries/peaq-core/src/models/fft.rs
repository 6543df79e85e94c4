//! FFT based ear model tables

use super::bands::{hz_to_pitch, internal_noise, pitch_to_hz, SAMPLING_RATE};
use crate::error::{PeaqError, Result};
use crate::traits::{ExcitationSource, FftSpectrumSource};
use crate::types::FftEarState;

/// Frame size of the FFT ear model in samples
pub const FFT_FRAME_SIZE: usize = 2048;

/// Lower edge of the FFT model's band layout (Hz)
const LOWEST_FREQUENCY: f64 = 80.0;

/// Upper edge of the FFT model's band layout (Hz)
const HIGHEST_FREQUENCY: f64 = 18000.0;

/// Lower bound on grouped band power
const MIN_BAND_POWER: f64 = 1e-12;

/// Energy a frame's second half must carry for the EHS measure (8000 in 16 bit units)
const ENERGY_THRESHOLD: f64 = 8000.0 / (32768.0 * 32768.0);

/// Spectral bins covered by one band
///
/// The edge bins `lower_bin` and `upper_bin` contribute with fractional
/// weights, the bins strictly between them fully.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandSpan {
    pub lower_bin: usize,
    pub upper_bin: usize,
    pub lower_weight: f64,
    pub upper_weight: f64,
}

impl BandSpan {
    /// Span summing bins `lower_bin..=upper_bin` with unit weights
    pub fn full(lower_bin: usize, upper_bin: usize) -> Self {
        Self {
            lower_bin,
            upper_bin,
            lower_weight: 1.0,
            upper_weight: if upper_bin == lower_bin { 0.0 } else { 1.0 },
        }
    }

    fn group(&self, spectrum: &[f64]) -> f64 {
        let mut power = self.lower_weight * spectrum[self.lower_bin]
            + self.upper_weight * spectrum[self.upper_bin];
        if self.upper_bin > self.lower_bin + 1 {
            power += spectrum[self.lower_bin + 1..self.upper_bin].iter().sum::<f64>();
        }
        power.max(MIN_BAND_POWER)
    }
}

/// Static tables of the FFT based ear model
#[derive(Debug, Clone)]
pub struct FftEarModel {
    frame_size: usize,
    band_centers: Vec<f64>,
    internal_noise: Vec<f64>,
    masking_difference: Vec<f64>,
    spans: Vec<BandSpan>,
}

impl FftEarModel {
    /// Build the band layout for `band_count` bands at 48 kHz
    ///
    /// Bands are spaced uniformly in pitch between 80 Hz and 18 kHz with a
    /// resolution of `27 / (band_count - 1)`. Only band counts for which that
    /// resolution yields exactly `band_count` bands are accepted; the Basic
    /// version uses 109 and the Advanced version 55.
    ///
    /// # Errors
    /// Returns [`PeaqError::InvalidBandCount`] for band counts the layout
    /// cannot produce.
    pub fn new(band_count: usize) -> Result<Self> {
        if band_count < 2 {
            return Err(PeaqError::InvalidBandCount(band_count));
        }
        let delta_z = 27.0 / (band_count - 1) as f64;
        let z_low = hz_to_pitch(LOWEST_FREQUENCY);
        let z_high = hz_to_pitch(HIGHEST_FREQUENCY);
        if ((z_high - z_low) / delta_z).ceil() as usize != band_count {
            return Err(PeaqError::InvalidBandCount(band_count));
        }

        let bin_width = SAMPLING_RATE / FFT_FRAME_SIZE as f64;
        let mut band_centers = Vec::with_capacity(band_count);
        let mut masking_difference = Vec::with_capacity(band_count);
        let mut spans = Vec::with_capacity(band_count);

        for band in 0..band_count {
            let zl = z_low + band as f64 * delta_z;
            let zu = z_high.min(z_low + (band + 1) as f64 * delta_z);
            band_centers.push(pitch_to_hz((zu + zl) / 2.0));

            let fl = pitch_to_hz(zl);
            let fu = pitch_to_hz(zu);
            let lower_bin = (fl / bin_width).round() as usize;
            let upper_bin = (fu / bin_width).round() as usize;

            let upper_freq = ((2 * lower_bin + 1) as f64 / 2.0 * bin_width).min(fu);
            let lower_weight = (upper_freq - fl) / bin_width;
            let upper_weight = if lower_bin == upper_bin {
                0.0
            } else {
                let lower_freq = (2 * upper_bin - 1) as f64 / 2.0 * bin_width;
                (fu - lower_freq) / bin_width
            };
            spans.push(BandSpan {
                lower_bin,
                upper_bin,
                lower_weight,
                upper_weight,
            });

            let z = band as f64 * delta_z;
            let difference_db = if z <= 12.0 { 3.0 } else { 0.25 * z };
            masking_difference.push(10.0_f64.powf(difference_db / 10.0));
        }

        let internal_noise = band_centers.iter().map(|&fc| internal_noise(fc)).collect();

        Ok(Self {
            frame_size: FFT_FRAME_SIZE,
            band_centers,
            internal_noise,
            masking_difference,
            spans,
        })
    }

    /// Build a model from explicit tables
    ///
    /// Band centres are unknown in this case and reported as zero.
    ///
    /// # Errors
    /// Returns an error if the tables are empty or not parallel, or if a
    /// span reaches past the spectrum.
    pub fn from_tables(
        frame_size: usize,
        internal_noise: Vec<f64>,
        masking_difference: Vec<f64>,
        spans: Vec<BandSpan>,
    ) -> Result<Self> {
        let band_count = internal_noise.len();
        if band_count == 0 {
            return Err(PeaqError::InvalidBandCount(0));
        }
        if masking_difference.len() != band_count {
            return Err(PeaqError::length_mismatch(
                "masking difference",
                band_count,
                masking_difference.len(),
            ));
        }
        if spans.len() != band_count {
            return Err(PeaqError::length_mismatch(
                "band spans",
                band_count,
                spans.len(),
            ));
        }
        let bins = frame_size / 2 + 1;
        if let Some(span) = spans.iter().find(|s| s.upper_bin >= bins || s.lower_bin > s.upper_bin) {
            return Err(PeaqError::length_mismatch(
                "spectrum bins",
                bins,
                span.upper_bin + 1,
            ));
        }

        Ok(Self {
            frame_size,
            band_centers: vec![0.0; band_count],
            internal_noise,
            masking_difference,
            spans,
        })
    }

    /// Centre frequency of each band (Hz)
    pub fn band_centers(&self) -> &[f64] {
        &self.band_centers
    }

    /// Spectral grouping of each band
    pub fn band_spans(&self) -> &[BandSpan] {
        &self.spans
    }
}

impl ExcitationSource for FftEarModel {
    type State = FftEarState;

    fn band_count(&self) -> usize {
        self.internal_noise.len()
    }

    fn frame_size(&self) -> usize {
        self.frame_size
    }

    fn internal_noise(&self, band: usize) -> f64 {
        self.internal_noise[band]
    }

    fn excitation<'a>(&self, state: &'a FftEarState) -> &'a [f64] {
        &state.excitation
    }
}

impl FftSpectrumSource for FftEarModel {
    fn power_spectrum<'a>(&self, state: &'a FftEarState) -> &'a [f64] {
        &state.power_spectrum
    }

    fn weighted_power_spectrum<'a>(&self, state: &'a FftEarState) -> &'a [f64] {
        &state.weighted_power_spectrum
    }

    fn masking_difference(&self) -> &[f64] {
        &self.masking_difference
    }

    fn group_into_bands(&self, spectrum: &[f64], band_power: &mut [f64]) {
        debug_assert_eq!(band_power.len(), self.spans.len());
        for (power, span) in band_power.iter_mut().zip(&self.spans) {
            *power = span.group(spectrum);
        }
    }

    fn is_energy_threshold_reached(&self, state: &FftEarState) -> bool {
        state.energy_threshold_reached
    }
}

/// Whether a time domain frame carries enough energy for the EHS measure
///
/// Only the second half of the frame is considered; samples are normalised
/// to full scale 1.0.
pub fn frame_energy_reached(frame: &[f64]) -> bool {
    let energy: f64 = frame[frame.len() / 2..].iter().map(|x| x * x).sum();
    energy >= ENERGY_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_band_counts() {
        let basic = FftEarModel::new(109).unwrap();
        assert_eq!(basic.band_count(), 109);
        assert_eq!(basic.frame_size(), 2048);

        let advanced = FftEarModel::new(55).unwrap();
        assert_eq!(advanced.band_count(), 55);
    }

    #[test]
    fn test_invalid_band_counts() {
        assert!(matches!(
            FftEarModel::new(0),
            Err(PeaqError::InvalidBandCount(0))
        ));
        assert!(FftEarModel::new(1).is_err());
        assert!(FftEarModel::new(113).is_err());
        assert!(FftEarModel::new(112).is_ok());
    }

    #[test]
    fn test_band_layout() {
        let model = FftEarModel::new(109).unwrap();
        let centers = model.band_centers();

        assert!((centers[0] - 91.708).abs() < 1e-3);
        assert!((centers[108] - 17690.04).abs() < 1e-2);
        assert!(centers.windows(2).all(|w| w[1] > w[0]));

        let first = model.band_spans()[0];
        assert_eq!((first.lower_bin, first.upper_bin), (3, 4));
        let last = model.band_spans()[108];
        assert_eq!((last.lower_bin, last.upper_bin), (742, 768));
    }

    #[test]
    fn test_masking_difference() {
        let model = FftEarModel::new(109).unwrap();
        let md = model.masking_difference();
        // 3 dB up to pitch 12, then 0.25 dB per unit
        assert!((md[0] - 10.0_f64.powf(0.3)).abs() < 1e-12);
        assert!((md[48] - 10.0_f64.powf(0.3)).abs() < 1e-12);
        assert!((md[100] - 10.0_f64.powf(0.25 * 25.0 / 10.0)).abs() < 1e-12);
    }

    #[test]
    fn test_group_into_bands_flat_spectrum() {
        let model = FftEarModel::new(55).unwrap();
        let spectrum = vec![1.0; FFT_FRAME_SIZE / 2 + 1];
        let mut bands = vec![0.0; model.band_count()];
        model.group_into_bands(&spectrum, &mut bands);

        // each band collects roughly its bandwidth in bins
        for (band, span) in bands.iter().zip(model.band_spans()) {
            let expected = span.lower_weight
                + span.upper_weight
                + span.upper_bin.saturating_sub(span.lower_bin + 1) as f64;
            assert!((band - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_group_into_bands_floor() {
        let model = FftEarModel::new(109).unwrap();
        let spectrum = vec![0.0; FFT_FRAME_SIZE / 2 + 1];
        let mut bands = vec![1.0; model.band_count()];
        model.group_into_bands(&spectrum, &mut bands);
        assert!(bands.iter().all(|&b| b == 1e-12));
    }

    #[test]
    fn test_from_tables_validation() {
        let ok = FftEarModel::from_tables(
            2048,
            vec![1.0],
            vec![2.0],
            vec![BandSpan::full(0, 1024)],
        );
        assert!(ok.is_ok());

        let mismatch = FftEarModel::from_tables(2048, vec![1.0, 1.0], vec![2.0], vec![]);
        assert!(matches!(
            mismatch,
            Err(PeaqError::LengthMismatch { expected: 2, actual: 1, .. })
        ));

        let out_of_range =
            FftEarModel::from_tables(2048, vec![1.0], vec![2.0], vec![BandSpan::full(0, 1025)]);
        assert!(out_of_range.is_err());

        assert!(FftEarModel::from_tables(2048, vec![], vec![], vec![]).is_err());
    }

    #[test]
    fn test_frame_energy_threshold() {
        let mut frame = vec![0.0; FFT_FRAME_SIZE];
        assert!(!frame_energy_reached(&frame));

        // energy in the first half is ignored
        frame[0] = 1.0;
        assert!(!frame_energy_reached(&frame));

        frame[FFT_FRAME_SIZE - 1] = 0.01;
        assert!(frame_energy_reached(&frame));
    }
}
