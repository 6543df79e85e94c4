//! Bandwidth (BandwidthRefB, BandwidthTestB)

use crate::accumulator::Accumulator;
use peaq_core::FftSpectrumSource;
use tracing::trace;

/// First bin of the range the zero threshold is taken from
const THRESHOLD_FIRST_BIN: usize = 921;

/// One past the last bin of the zero threshold range
const THRESHOLD_END_BIN: usize = 1024;

/// 10 dB above the zero threshold
const TEN_DB_POWER_FACTOR: f64 = 10.0;

/// 5 dB above the zero threshold
const FIVE_DB_POWER_FACTOR: f64 = 3.16227766016838;

/// Frames with a reference bandwidth at or below this are not accumulated
pub const BANDWIDTH_MIN_REF: usize = 346;

/// Accumulate the reference and test bandwidth of one frame
///
/// The zero threshold is the largest test power in bins 921 to 1023. The
/// reference bandwidth is the largest `k ≤ 921` whose bin `k - 1` lies more
/// than 10 dB above it; the test bandwidth the largest `k` up to the
/// reference bandwidth whose bin `k - 1` lies at least 5 dB above it.
/// Nothing is accumulated unless the reference bandwidth exceeds
/// [`BANDWIDTH_MIN_REF`].
pub fn bandwidth<E>(
    ear_model: &E,
    ref_states: &[E::State],
    test_states: &[E::State],
    acc_ref: &mut Accumulator,
    acc_test: &mut Accumulator,
) where
    E: FftSpectrumSource + ?Sized,
{
    for channel in 0..acc_ref.channels() {
        let reference = ear_model.power_spectrum(&ref_states[channel]);
        let test = ear_model.power_spectrum(&test_states[channel]);
        debug_assert!(reference.len() >= THRESHOLD_END_BIN);
        debug_assert!(test.len() >= THRESHOLD_END_BIN);

        let zero_threshold = test[THRESHOLD_FIRST_BIN..THRESHOLD_END_BIN]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);

        let bw_ref = last_bin_above(&reference[..THRESHOLD_FIRST_BIN], |p| {
            p > TEN_DB_POWER_FACTOR * zero_threshold
        });
        if bw_ref <= BANDWIDTH_MIN_REF {
            trace!(channel, bw_ref, "Reference bandwidth too small, frame skipped");
            continue;
        }
        let bw_test = last_bin_above(&test[..bw_ref], |p| {
            p >= FIVE_DB_POWER_FACTOR * zero_threshold
        });

        acc_ref.accumulate(channel, bw_ref as f64, 1.0);
        acc_test.accumulate(channel, bw_test as f64, 1.0);
    }
}

/// One plus the index of the last bin satisfying `above`, or zero
fn last_bin_above(spectrum: &[f64], above: impl Fn(f64) -> bool) -> usize {
    spectrum
        .iter()
        .rposition(|&p| above(p))
        .map_or(0, |bin| bin + 1)
}
