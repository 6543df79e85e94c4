//! Noise to mask ratio (Total NMRB, Segmental NMRB, RelDistFramesB)

use crate::accumulator::{Accumulator, AccumulatorMode};
use peaq_core::FftSpectrumSource;

/// Per-band noise to mask ratio above which a frame counts as disturbed (1.5 dB)
pub const REL_DIST_THRESHOLD: f64 = 1.41253754462275;

/// Accumulate the noise to mask ratio of one frame
///
/// The noise spectrum is the power of the difference of the weighted
/// magnitude spectra, grouped into bands and divided by the masking
/// threshold of the reference. An [`AccumulatorMode::AvgLog`] accumulator
/// receives the linear band average (Total NMRB), any other mode receives
/// it in dB (Segmental NMRB). `acc_rel_dist` receives 1 for frames whose
/// largest band ratio exceeds [`REL_DIST_THRESHOLD`] and 0 otherwise.
pub fn noise_to_mask_ratio<E>(
    ear_model: &E,
    ref_states: &[E::State],
    test_states: &[E::State],
    acc_nmr: &mut Accumulator,
    mut acc_rel_dist: Option<&mut Accumulator>,
) where
    E: FftSpectrumSource + ?Sized,
{
    let band_count = ear_model.band_count();
    let bins = ear_model.frame_size() / 2 + 1;
    let masking_difference = ear_model.masking_difference();
    let mut noise_spectrum = vec![0.0; bins];
    let mut noise_bands = vec![0.0; band_count];

    for channel in 0..acc_nmr.channels() {
        let reference = ear_model.weighted_power_spectrum(&ref_states[channel]);
        let test = ear_model.weighted_power_spectrum(&test_states[channel]);
        let excitation = ear_model.excitation(&ref_states[channel]);
        debug_assert!(reference.len() >= bins && test.len() >= bins);
        debug_assert_eq!(excitation.len(), band_count);

        for ((noise, &r), &t) in noise_spectrum.iter_mut().zip(reference).zip(test) {
            *noise = r - 2.0 * (r * t).sqrt() + t;
        }
        ear_model.group_into_bands(&noise_spectrum, &mut noise_bands);

        let mut nmr = 0.0;
        let mut nmr_max = 0.0_f64;
        for ((&noise, &e), &md) in noise_bands.iter().zip(excitation).zip(masking_difference) {
            let mask = e / md;
            let ratio = noise / mask;
            nmr += ratio;
            nmr_max = nmr_max.max(ratio);
        }
        nmr /= band_count as f64;

        let value = if acc_nmr.mode() == AccumulatorMode::AvgLog {
            nmr
        } else {
            10.0 * nmr.log10()
        };
        acc_nmr.accumulate(channel, value, 1.0);

        if let Some(acc) = acc_rel_dist.as_deref_mut() {
            let disturbed = if nmr_max > REL_DIST_THRESHOLD { 1.0 } else { 0.0 };
            acc.accumulate(channel, disturbed, 1.0);
        }
    }
}
