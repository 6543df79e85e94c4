//! Shared fixtures for peaq-movs integration tests

#![allow(dead_code)]

use peaq_core::{AdaptedExcitation, FftEarState, ModulationPattern};
use std::f64::consts::PI;
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize test logging once per test binary
pub fn init_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// Number of bins in a 2048 sample FFT frame
pub const BINS: usize = 1025;

/// Power spectrum with `level` below bin 921 and `floor` above
pub fn band_limited_spectrum(level: f64, floor: f64) -> Vec<f64> {
    (0..BINS).map(|k| if k < 921 { level } else { floor }).collect()
}

/// Weighted spectrum rippling with a period of `period` bins
pub fn rippled_spectrum(depth: f64, period: f64) -> Vec<f64> {
    (0..BINS)
        .map(|k| (depth * (2.0 * PI * k as f64 / period).cos()).exp())
        .collect()
}

/// Reference and test FFT states of a clearly distorted frame
pub fn distorted_fft_pair(bands: usize) -> (FftEarState, FftEarState) {
    let reference = FftEarState::new(
        vec![1e4; bands],
        band_limited_spectrum(100.0, 1.0),
        vec![1.0; BINS],
        true,
    );
    let test = FftEarState::new(
        vec![1e3; bands],
        band_limited_spectrum(100.0, 1.0),
        rippled_spectrum(0.5, 16.0),
        true,
    );
    (reference, test)
}

/// Reference and test modulation with level adapter output of a distorted frame
pub fn distorted_modulation(
    bands: usize,
) -> (ModulationPattern, ModulationPattern, AdaptedExcitation) {
    (
        ModulationPattern::new(vec![0.5; bands], vec![1.0; bands]),
        ModulationPattern::new(vec![1.0; bands], vec![1.0; bands]),
        AdaptedExcitation::new(vec![1e3; bands], vec![4e3; bands]),
    )
}

/// Relative closeness check
pub fn approx_eq(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance * a.abs().max(b.abs()).max(1.0)
}
