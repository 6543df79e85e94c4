//! Shared critical band formulas

/// Sampling rate assumed by both ear models (Hz)
pub const SAMPLING_RATE: f64 = 48000.0;

/// Internal ear noise for a band centred at `fc` Hz
///
/// `10^(0.4 · 0.364 · (fc / 1000)^-0.8)`
pub fn internal_noise(fc: f64) -> f64 {
    10.0_f64.powf(0.4 * 0.364 * (fc / 1000.0).powf(-0.8))
}

/// Map a frequency in Hz to the pitch scale used for band spacing
pub(crate) fn hz_to_pitch(f: f64) -> f64 {
    7.0 * (f / 650.0).asinh()
}

/// Inverse of [`hz_to_pitch`]
pub(crate) fn pitch_to_hz(z: f64) -> f64 {
    650.0 * (z / 7.0).sinh()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_noise_at_1khz() {
        // 10^0.1456
        assert!((internal_noise(1000.0) - 1.398_298_848).abs() < 1e-8);
    }

    #[test]
    fn test_internal_noise_decreases_with_frequency() {
        assert!(internal_noise(100.0) > internal_noise(1000.0));
        assert!(internal_noise(1000.0) > internal_noise(10000.0));
    }

    #[test]
    fn test_pitch_roundtrip() {
        for f in [50.0, 80.0, 1000.0, 18000.0] {
            assert!((pitch_to_hz(hz_to_pitch(f)) - f).abs() < 1e-9 * f);
        }
    }
}
