//! Error harmonic structure (EHSB)

use crate::accumulator::Accumulator;
use crate::correlation::{CorrelationContext, CORRELATION_INPUT_LEN, CORRELATION_LAGS};
use peaq_core::{EhsDcRemoval, FftSpectrumSource};
use rustfft::num_complex::Complex;
use tracing::trace;

/// Accumulate the error harmonic structure of one frame
///
/// Skips the frame entirely unless at least one channel of either signal
/// reached the energy threshold. Otherwise every channel receives
/// `1000 · peak`, where the peak is the largest rising power in the
/// spectrum of the normalised, windowed autocorrelation of the log ratio
/// of the weighted power spectra.
pub fn error_harmonic_structure<E>(
    ear_model: &E,
    ref_states: &[E::State],
    test_states: &[E::State],
    dc_removal: EhsDcRemoval,
    ctx: &mut CorrelationContext,
    acc: &mut Accumulator,
) where
    E: FftSpectrumSource + ?Sized,
{
    let channels = acc.channels();
    let reached = (0..channels).any(|c| {
        ear_model.is_energy_threshold_reached(&ref_states[c])
            || ear_model.is_energy_threshold_reached(&test_states[c])
    });
    if !reached {
        trace!("Energy threshold not reached, EHS frame skipped");
        return;
    }

    let mut log_ratio = [0.0; CORRELATION_INPUT_LEN];
    for channel in 0..channels {
        let reference = ear_model.weighted_power_spectrum(&ref_states[channel]);
        let test = ear_model.weighted_power_spectrum(&test_states[channel]);
        debug_assert!(reference.len() >= CORRELATION_INPUT_LEN);
        debug_assert!(test.len() >= CORRELATION_INPUT_LEN);

        for ((d, &r), &t) in log_ratio.iter_mut().zip(reference).zip(test) {
            *d = if r == 0.0 && t == 0.0 { 0.0 } else { (t / r).ln() };
        }

        let mut lags = ctx.correlate(&log_ratio);
        let peak = if normalise(&mut lags, &log_ratio, ctx.window(), dc_removal) {
            rising_peak(ctx.lag_spectrum(&lags), dc_removal)
        } else {
            trace!(channel, "Degenerate EHS correlation");
            0.0
        };
        acc.accumulate(channel, 1000.0 * peak, 1.0);
    }
}

/// Normalise the correlation by the energies of both operands and window it
///
/// Returns false if a normalisation energy is not positive.
fn normalise(
    lags: &mut [f64; CORRELATION_LAGS],
    log_ratio: &[f64],
    window: &[f64],
    dc_removal: EhsDcRemoval,
) -> bool {
    let d0 = lags[0];
    let mut dk = d0;
    let mut sum = 0.0;

    for (i, (lag, &w)) in lags.iter_mut().zip(window).enumerate() {
        let energy = d0 * dk;
        if energy.is_nan() || energy <= 0.0 {
            return false;
        }
        let norm = energy.sqrt();
        match dc_removal {
            EhsDcRemoval::BeforeWindow => {
                *lag /= norm;
                sum += *lag;
            }
            EhsDcRemoval::AfterWindow => *lag *= w / norm,
        }
        let incoming = log_ratio[i + CORRELATION_LAGS];
        let outgoing = log_ratio[i];
        dk += incoming * incoming - outgoing * outgoing;
    }

    if dc_removal == EhsDcRemoval::BeforeWindow {
        let mean = sum / CORRELATION_LAGS as f64;
        for (lag, &w) in lags.iter_mut().zip(window) {
            *lag = (*lag - mean) * w;
        }
    }
    true
}

/// Largest power among bins 1 to 128 that exceeds the power of the bin before
fn rising_peak(spectrum: &[Complex<f64>], dc_removal: EhsDcRemoval) -> f64 {
    let mut previous = match dc_removal {
        EhsDcRemoval::BeforeWindow => spectrum[0].norm_sqr(),
        // the mean is removed by zeroing the real part of the DC bin
        EhsDcRemoval::AfterWindow => spectrum[0].im * spectrum[0].im,
    };
    let mut peak = 0.0;
    for bin in &spectrum[1..=CORRELATION_LAGS / 2] {
        let power = bin.norm_sqr();
        if power > previous && power > peak {
            peak = power;
        }
        previous = power;
    }
    peak
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::AccumulatorMode;
    use peaq_core::{EhsWindow, FftEarModel, FftEarState};
    use std::f64::consts::PI;

    fn state(weighted: Vec<f64>, reached: bool) -> FftEarState {
        FftEarState::new(vec![1.0; 109], vec![0.0; 1025], weighted, reached)
    }

    /// Test spectrum whose log ratio to a flat reference has period 16 bins
    fn harmonic_pair(reached: bool) -> (FftEarState, FftEarState) {
        let reference = vec![1.0; 1025];
        let test = (0..1025)
            .map(|k| (0.5 * (2.0 * PI * k as f64 / 16.0).cos()).exp())
            .collect();
        (state(reference, reached), state(test, reached))
    }

    fn run(
        reference: FftEarState,
        test: FftEarState,
        window: EhsWindow,
        dc_removal: EhsDcRemoval,
    ) -> Accumulator {
        let ear = FftEarModel::new(109).unwrap();
        let mut ctx = CorrelationContext::new(window);
        let mut acc = Accumulator::new(1, AccumulatorMode::Avg).unwrap();
        error_harmonic_structure(&ear, &[reference], &[test], dc_removal, &mut ctx, &mut acc);
        acc
    }

    #[test]
    fn test_below_energy_threshold_skipped() {
        let (reference, test) = harmonic_pair(false);
        let acc = run(reference, test, EhsWindow::ClipCentered, EhsDcRemoval::BeforeWindow);
        assert_eq!(acc.count(0), 0);
    }

    #[test]
    fn test_one_signal_reaching_threshold_is_enough() {
        let (reference, mut test) = harmonic_pair(false);
        test.energy_threshold_reached = true;
        let acc = run(reference, test, EhsWindow::ClipCentered, EhsDcRemoval::BeforeWindow);
        assert_eq!(acc.count(0), 1);
    }

    #[test]
    fn test_identical_spectra_give_zero() {
        let reference = state(vec![2.0; 1025], true);
        let acc = run(
            reference.clone(),
            reference,
            EhsWindow::ClipCentered,
            EhsDcRemoval::BeforeWindow,
        );
        assert_eq!(acc.count(0), 1);
        assert_eq!(acc.value(), 0.0);
    }

    #[test]
    fn test_silent_bins_give_zero() {
        let silent = state(vec![0.0; 1025], true);
        let acc = run(silent.clone(), silent, EhsWindow::LagZeroCentered, EhsDcRemoval::AfterWindow);
        assert_eq!(acc.value(), 0.0);
    }

    #[test]
    fn test_harmonic_error_detected() {
        for window in [EhsWindow::ClipCentered, EhsWindow::LagZeroCentered] {
            for dc_removal in [EhsDcRemoval::BeforeWindow, EhsDcRemoval::AfterWindow] {
                let (reference, test) = harmonic_pair(true);
                let acc = run(reference, test, window, dc_removal);
                assert!(acc.value() > 0.0, "{window:?} {dc_removal:?}");
                assert!(acc.value().is_finite());
            }
        }
    }

    #[test]
    fn test_rising_peak_ignores_falling_edge() {
        let mut spectrum = vec![Complex::new(0.0, 0.0); CORRELATION_LAGS];
        spectrum[0] = Complex::new(10.0, 0.0);
        spectrum[1] = Complex::new(5.0, 0.0);
        spectrum[3] = Complex::new(2.0, 0.0);

        // bin 1 falls from the DC bin, bin 3 rises from bin 2
        assert_eq!(rising_peak(&spectrum, EhsDcRemoval::BeforeWindow), 4.0);
        // with the DC bin zeroed, bin 1 rises
        assert_eq!(rising_peak(&spectrum, EhsDcRemoval::AfterWindow), 25.0);
    }
}
