//! Modulation difference (AvgModDiff1B, AvgModDiff2B, WinModDiff1B, RmsModDiffA)

use crate::accumulator::{Accumulator, AccumulatorMode};
use peaq_core::{ExcitationSource, ModulationSource};

/// Level weighting when only one accumulator is supplied
const SINGLE_LEVEL_WEIGHT: f64 = 1.0;

/// Level weighting when a second accumulator is supplied
const DUAL_LEVEL_WEIGHT: f64 = 100.0;

/// Accumulate the modulation difference of one frame
///
/// Per band the absolute modulation difference is normalised by the
/// reference modulation, once with offset 1 (`d1`) and once with offset
/// 0.01, weighting decreases by 0.1 (`d2`). The temporal weight grows with
/// the reference loudness relative to the internal noise.
///
/// # Arguments
/// * `ear_model` - Ear model the modulation patterns were computed on
/// * `reference` / `test` - Modulation patterns, one per channel
/// * `acc1` - Receives `d1` weighted by the temporal weight
/// * `acc2` - Receives `d2` weighted by the temporal weight, if present
/// * `acc_win` - Receives `d1` with unit weight, if present
pub fn modulation_difference<E, M>(
    ear_model: &E,
    reference: &[M],
    test: &[M],
    acc1: &mut Accumulator,
    mut acc2: Option<&mut Accumulator>,
    mut acc_win: Option<&mut Accumulator>,
) where
    E: ExcitationSource + ?Sized,
    M: ModulationSource,
{
    let band_count = ear_model.band_count();
    let level_weight = if acc2.is_some() {
        DUAL_LEVEL_WEIGHT
    } else {
        SINGLE_LEVEL_WEIGHT
    };
    let d1_scale = if acc1.mode() == AccumulatorMode::Rms {
        100.0 / (band_count as f64).sqrt()
    } else {
        100.0 / band_count as f64
    };
    let d2_scale = 100.0 / band_count as f64;

    for channel in 0..acc1.channels() {
        let mod_ref = reference[channel].modulation();
        let mod_test = test[channel].modulation();
        let loudness_ref = reference[channel].average_loudness();
        debug_assert_eq!(mod_ref.len(), band_count);
        debug_assert_eq!(mod_test.len(), band_count);
        debug_assert_eq!(loudness_ref.len(), band_count);

        let mut d1 = 0.0;
        let mut d2 = 0.0;
        let mut temporal_weight = 0.0;
        for (band, ((&r, &t), &loudness)) in
            mod_ref.iter().zip(mod_test).zip(loudness_ref).enumerate()
        {
            let diff = (t - r).abs();
            d1 += diff / (1.0 + r);
            let w = if t >= r { 1.0 } else { 0.1 };
            d2 += w * diff / (0.01 + r);
            temporal_weight += loudness
                / (loudness + level_weight * ear_model.internal_noise(band).powf(0.3));
        }
        d1 *= d1_scale;
        d2 *= d2_scale;

        acc1.accumulate(channel, d1, temporal_weight);
        if let Some(acc) = acc2.as_deref_mut() {
            acc.accumulate(channel, d2, temporal_weight);
        }
        if let Some(acc) = acc_win.as_deref_mut() {
            acc.accumulate(channel, d1, 1.0);
        }
    }
}
