//! FFT based correlation for the error harmonic structure
//!
//! The EHS measure correlates the first 256 samples of a 512 sample
//! log-spectral difference with every shift of itself:
//!
//! ```text
//! c[i] = Σ_{k<256} d[k] · d[k + i]      for i in 0..256
//! ```
//!
//! Computed directly this costs 256² multiplications per channel and frame.
//! Here both operands are transformed with a 512 point FFT (the second one
//! zero padded), multiplied by the conjugate and transformed back. Because
//! the padded operand is zero beyond 256, the circular correlation does not
//! wrap for the lags of interest.
//!
//! [`CorrelationContext`] owns the FFT plans, the scratch buffers and the lag
//! window, so repeated calls do not allocate. It is created once per
//! evaluation and borrowed mutably, which keeps concurrent evaluations apart.

use peaq_core::EhsWindow;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Number of correlation lags
pub const CORRELATION_LAGS: usize = 256;

/// Length of the correlated sequence
pub const CORRELATION_INPUT_LEN: usize = 2 * CORRELATION_LAGS;

/// Gain of the lag window, `√(8/3) / 2`
const WINDOW_GAIN: f64 = 0.81649658092773;

/// Reusable FFT plans, scratch space and lag window
pub struct CorrelationContext {
    /// 512 point forward transform
    forward: Arc<dyn Fft<f64>>,
    /// 512 point inverse transform
    inverse: Arc<dyn Fft<f64>>,
    /// 256 point forward transform of the windowed correlation
    lag_forward: Arc<dyn Fft<f64>>,
    window_shape: EhsWindow,
    window: Vec<f64>,
    full: Vec<Complex<f64>>,
    head: Vec<Complex<f64>>,
    lag_spectrum: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
}

impl CorrelationContext {
    /// Plan the transforms and build the lag window
    pub fn new(window_shape: EhsWindow) -> Self {
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(CORRELATION_INPUT_LEN);
        let inverse = planner.plan_fft_inverse(CORRELATION_INPUT_LEN);
        let lag_forward = planner.plan_fft_forward(CORRELATION_LAGS);

        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len())
            .max(lag_forward.get_inplace_scratch_len());

        debug!(
            window = window_shape.as_str(),
            lags = CORRELATION_LAGS,
            "Created correlation context"
        );

        Self {
            forward,
            inverse,
            lag_forward,
            window_shape,
            window: lag_window(window_shape),
            full: vec![Complex::new(0.0, 0.0); CORRELATION_INPUT_LEN],
            head: vec![Complex::new(0.0, 0.0); CORRELATION_INPUT_LEN],
            lag_spectrum: vec![Complex::new(0.0, 0.0); CORRELATION_LAGS],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
        }
    }

    /// Shape of the lag window
    pub fn window_shape(&self) -> EhsWindow {
        self.window_shape
    }

    /// Lag window, [`CORRELATION_LAGS`] entries
    pub fn window(&self) -> &[f64] {
        &self.window
    }

    /// Correlate the first half of `input` with all shifts of `input`
    ///
    /// `input` must hold at least [`CORRELATION_INPUT_LEN`] samples; only
    /// that many are read.
    pub fn correlate(&mut self, input: &[f64]) -> [f64; CORRELATION_LAGS] {
        debug_assert!(input.len() >= CORRELATION_INPUT_LEN);
        let input = &input[..CORRELATION_INPUT_LEN];

        for (k, (full, head)) in self.full.iter_mut().zip(&mut self.head).enumerate() {
            *full = Complex::new(input[k], 0.0);
            *head = if k < CORRELATION_LAGS {
                *full
            } else {
                Complex::new(0.0, 0.0)
            };
        }

        self.forward
            .process_with_scratch(&mut self.full, &mut self.scratch);
        self.forward
            .process_with_scratch(&mut self.head, &mut self.scratch);

        // inverse transform is unnormalised
        let scale = 1.0 / CORRELATION_INPUT_LEN as f64;
        for (full, head) in self.full.iter_mut().zip(&self.head) {
            *full = *full * head.conj() * scale;
        }
        self.inverse
            .process_with_scratch(&mut self.full, &mut self.scratch);

        let mut lags = [0.0; CORRELATION_LAGS];
        for (lag, value) in lags.iter_mut().zip(&self.full) {
            *lag = value.re;
        }
        lags
    }

    /// Transform a real lag sequence of [`CORRELATION_LAGS`] samples
    ///
    /// Returns the full complex spectrum, valid until the next call.
    pub fn lag_spectrum(&mut self, sequence: &[f64]) -> &[Complex<f64>] {
        debug_assert_eq!(sequence.len(), CORRELATION_LAGS);
        for (bin, &x) in self.lag_spectrum.iter_mut().zip(sequence) {
            *bin = Complex::new(x, 0.0);
        }
        self.lag_forward
            .process_with_scratch(&mut self.lag_spectrum, &mut self.scratch);
        &self.lag_spectrum
    }
}

impl fmt::Debug for CorrelationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CorrelationContext")
            .field("window_shape", &self.window_shape)
            .field("lags", &CORRELATION_LAGS)
            .finish_non_exhaustive()
    }
}

/// Raised cosine window over the correlation lags
fn lag_window(shape: EhsWindow) -> Vec<f64> {
    let n = CORRELATION_LAGS as f64;
    (0..CORRELATION_LAGS)
        .map(|i| {
            let i = i as f64;
            let raised = match shape {
                EhsWindow::ClipCentered => 1.0 - (2.0 * PI * i / (n - 1.0)).cos(),
                EhsWindow::LagZeroCentered => 1.0 + (2.0 * PI * i / (2.0 * n - 1.0)).cos(),
            };
            WINDOW_GAIN * raised / n
        })
        .collect()
}

/// Direct evaluation of the correlation, used to check the FFT path
#[cfg(test)]
pub(crate) fn correlate_direct(input: &[f64]) -> [f64; CORRELATION_LAGS] {
    let mut lags = [0.0; CORRELATION_LAGS];
    for (i, lag) in lags.iter_mut().enumerate() {
        *lag = input[..CORRELATION_LAGS]
            .iter()
            .zip(&input[i..])
            .map(|(a, b)| a * b)
            .sum();
    }
    lags
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Vec<f64> {
        (0..CORRELATION_INPUT_LEN)
            .map(|k| ((k as f64) * 0.37).sin() + 0.01 * k as f64)
            .collect()
    }

    #[test]
    fn test_matches_direct_sum() {
        let input = ramp();
        let mut ctx = CorrelationContext::new(EhsWindow::ClipCentered);
        let fast = ctx.correlate(&input);
        let direct = correlate_direct(&input);

        for (a, b) in fast.iter().zip(&direct) {
            assert!((a - b).abs() <= 1e-9 * b.abs().max(1.0), "{a} vs {b}");
        }
    }

    #[test]
    fn test_lag_zero_is_energy() {
        let input = ramp();
        let mut ctx = CorrelationContext::new(EhsWindow::ClipCentered);
        let lags = ctx.correlate(&input);
        let energy: f64 = input[..CORRELATION_LAGS].iter().map(|x| x * x).sum();
        assert!((lags[0] - energy).abs() < 1e-9 * energy);
    }

    #[test]
    fn test_context_reuse() {
        let mut ctx = CorrelationContext::new(EhsWindow::ClipCentered);
        let first = ctx.correlate(&ramp());
        ctx.correlate(&[1.0; CORRELATION_INPUT_LEN]);
        let again = ctx.correlate(&ramp());
        assert_eq!(first, again);
    }

    #[test]
    fn test_extra_input_ignored() {
        let mut long = ramp();
        long.push(1e6);
        let mut ctx = CorrelationContext::new(EhsWindow::ClipCentered);
        assert_eq!(ctx.correlate(&long), ctx.correlate(&ramp()));
    }

    #[test]
    fn test_clip_centered_window() {
        let ctx = CorrelationContext::new(EhsWindow::ClipCentered);
        let w = ctx.window();
        assert_eq!(w.len(), CORRELATION_LAGS);
        assert!(w[0].abs() < 1e-15);
        assert!(w[255].abs() < 1e-15);
        // symmetric around the middle of the lag range
        assert!((w[100] - w[155]).abs() < 1e-15);
    }

    #[test]
    fn test_lag_zero_centered_window() {
        let ctx = CorrelationContext::new(EhsWindow::LagZeroCentered);
        let w = ctx.window();
        assert!((w[0] - 2.0 * WINDOW_GAIN / 256.0).abs() < 1e-15);
        assert!(w.windows(2).all(|pair| pair[1] < pair[0]));
    }

    #[test]
    fn test_lag_spectrum_of_constant() {
        let mut ctx = CorrelationContext::new(EhsWindow::ClipCentered);
        let spectrum = ctx.lag_spectrum(&[1.0; CORRELATION_LAGS]);
        assert!((spectrum[0].re - 256.0).abs() < 1e-9);
        assert!(spectrum[1..].iter().all(|bin| bin.norm() < 1e-9));
    }
}
