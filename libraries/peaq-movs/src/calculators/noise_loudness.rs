//! Partial noise loudness (RmsNoiseLoudB, RmsNoiseLoudAsymA, AvgLinDistA)

use crate::accumulator::Accumulator;
use peaq_core::{ExcitationSource, LevelAdapter, ModulationSource};

/// Constants of the partial noise loudness formula
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseLoudnessParams {
    /// Steepness of the masking reduction `β`
    pub alpha: f64,
    /// Weight of the modulation in the threshold factor
    pub threshold_factor: f64,
    /// Offset of the threshold factor
    pub s0: f64,
    /// Results below this are reported as zero
    pub min_loudness: f64,
}

impl NoiseLoudnessParams {
    /// RmsNoiseLoudB
    pub const NOISE: Self = Self {
        alpha: 1.5,
        threshold_factor: 0.15,
        s0: 0.5,
        min_loudness: 0.0,
    };

    /// Audible noise part of RmsNoiseLoudAsymA
    pub const ASYM_NOISE: Self = Self {
        alpha: 2.5,
        threshold_factor: 0.3,
        s0: 1.0,
        min_loudness: 0.1,
    };

    /// Missing components part of RmsNoiseLoudAsymA
    pub const ASYM_MISSING: Self = Self {
        alpha: 1.5,
        threshold_factor: 0.15,
        s0: 1.0,
        min_loudness: 0.0,
    };

    /// AvgLinDistA
    pub const LINEAR_DISTORTION: Self = Self::ASYM_MISSING;
}

/// Partial loudness of the part of `test_excitation` not masked by `ref_excitation`
///
/// Summed over bands and scaled by `24 / Z`; zero if the result falls
/// below [`NoiseLoudnessParams::min_loudness`]. All slices must have
/// `band_count()` entries.
pub fn noise_loudness_of<E>(
    ear_model: &E,
    params: NoiseLoudnessParams,
    ref_modulation: &[f64],
    test_modulation: &[f64],
    ref_excitation: &[f64],
    test_excitation: &[f64],
) -> f64
where
    E: ExcitationSource + ?Sized,
{
    let band_count = ear_model.band_count();
    debug_assert_eq!(ref_modulation.len(), band_count);
    debug_assert_eq!(test_modulation.len(), band_count);
    debug_assert_eq!(ref_excitation.len(), band_count);
    debug_assert_eq!(test_excitation.len(), band_count);

    let bands = ref_modulation
        .iter()
        .zip(test_modulation)
        .zip(ref_excitation.iter().zip(test_excitation));
    let mut loudness = 0.0;
    for (band, ((&m_ref, &m_test), (&e_ref, &e_test))) in bands.enumerate() {
        let s_ref = params.threshold_factor * m_ref + params.s0;
        let s_test = params.threshold_factor * m_test + params.s0;
        let threshold = ear_model.internal_noise(band);

        let beta = (-params.alpha * (e_test - e_ref) / e_ref).exp();
        let audible = (s_test * e_test - s_ref * e_ref).max(0.0);
        loudness += (threshold / s_test).powf(0.23)
            * ((1.0 + audible / (threshold + s_ref * e_ref * beta)).powf(0.23) - 1.0);
    }
    loudness *= 24.0 / band_count as f64;

    if loudness < params.min_loudness {
        0.0
    } else {
        loudness
    }
}

/// Accumulate the noise loudness of one frame with unit weight
///
/// Uses the level adapted excitation patterns.
pub fn noise_loudness<E, M, L>(
    ear_model: &E,
    reference: &[M],
    test: &[M],
    levels: &[L],
    acc: &mut Accumulator,
) where
    E: ExcitationSource + ?Sized,
    M: ModulationSource,
    L: LevelAdapter,
{
    for channel in 0..acc.channels() {
        let level = &levels[channel];
        let value = noise_loudness_of(
            ear_model,
            NoiseLoudnessParams::NOISE,
            reference[channel].modulation(),
            test[channel].modulation(),
            level.adapted_ref(),
            level.adapted_test(),
        );
        acc.accumulate(channel, value, 1.0);
    }
}

/// Accumulate the asymmetric noise loudness of one frame
///
/// The audible noise goes into the value slot and the loudness of missing
/// components (reference and test excitation exchanged) into the weight
/// slot, for an [`RmsAsym`](crate::AccumulatorMode::RmsAsym) accumulator.
/// With `swap_modulation` the modulation patterns are exchanged along with
/// the excitation for the missing components.
pub fn noise_loudness_asymmetry<E, M, L>(
    ear_model: &E,
    reference: &[M],
    test: &[M],
    levels: &[L],
    swap_modulation: bool,
    acc: &mut Accumulator,
) where
    E: ExcitationSource + ?Sized,
    M: ModulationSource,
    L: LevelAdapter,
{
    for channel in 0..acc.channels() {
        let level = &levels[channel];
        let mod_ref = reference[channel].modulation();
        let mod_test = test[channel].modulation();

        let audible = noise_loudness_of(
            ear_model,
            NoiseLoudnessParams::ASYM_NOISE,
            mod_ref,
            mod_test,
            level.adapted_ref(),
            level.adapted_test(),
        );
        let (missing_ref_mod, missing_test_mod) = if swap_modulation {
            (mod_test, mod_ref)
        } else {
            (mod_ref, mod_test)
        };
        let missing = noise_loudness_of(
            ear_model,
            NoiseLoudnessParams::ASYM_MISSING,
            missing_ref_mod,
            missing_test_mod,
            level.adapted_test(),
            level.adapted_ref(),
        );
        acc.accumulate(channel, audible, missing);
    }
}

/// Accumulate the linear distortion of one frame with unit weight
///
/// Measures the loudness of the raw reference excitation that the level
/// adapted reference excitation does not cover. With `swap_modulation` the
/// reference modulation is used for both roles, otherwise the test
/// modulation fills the test role.
pub fn linear_distortion<E, M, L>(
    ear_model: &E,
    reference: &[M],
    test: &[M],
    levels: &[L],
    ref_states: &[E::State],
    swap_modulation: bool,
    acc: &mut Accumulator,
) where
    E: ExcitationSource + ?Sized,
    M: ModulationSource,
    L: LevelAdapter,
{
    for channel in 0..acc.channels() {
        let mod_ref = reference[channel].modulation();
        let mod_test = if swap_modulation {
            mod_ref
        } else {
            test[channel].modulation()
        };
        let value = noise_loudness_of(
            ear_model,
            NoiseLoudnessParams::LINEAR_DISTORTION,
            mod_ref,
            mod_test,
            levels[channel].adapted_ref(),
            ear_model.excitation(&ref_states[channel]),
        );
        acc.accumulate(channel, value, 1.0);
    }
}
