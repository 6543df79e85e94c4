//! Probability of detection (ADBB, MFPDB)

use crate::accumulator::Accumulator;
use peaq_core::{ExcitationSource, StepRounding};
use tracing::trace;

/// Binaural probability above which a frame counts as a distorted block
const DISTORTED_BLOCK_PROBABILITY: f64 = 0.5;

/// Step size for a detection threshold `level` in dB
fn step_size(level: f64) -> f64 {
    if level > 0.0 {
        5.95072 * (6.39468 / level).powf(1.71332) + 9.01033e-11 * level.powi(4)
            + 5.05622e-6 * level.powi(3)
            - 0.00102438 * level * level
            + 0.0550197 * level
            - 0.198719
    } else {
        1e30
    }
}

/// Accumulate the binaural detection probability and steps of one frame
///
/// Per band and channel, the detection probability and the number of steps
/// above threshold are derived from the excitation difference in dB. Over
/// channels the band maxima are kept; over bands probabilities combine as
/// independent events and steps add up. Both accumulators are single
/// channel: `acc_mfpd` always receives the probability, `acc_adb` receives
/// the steps only when the probability exceeds 0.5.
pub fn probability_of_detection<E>(
    ear_model: &E,
    ref_states: &[E::State],
    test_states: &[E::State],
    rounding: StepRounding,
    acc_adb: &mut Accumulator,
    acc_mfpd: &mut Accumulator,
) where
    E: ExcitationSource + ?Sized,
{
    debug_assert_eq!(ref_states.len(), test_states.len());
    let band_count = ear_model.band_count();
    let channels: Vec<(&[f64], &[f64])> = ref_states
        .iter()
        .zip(test_states)
        .map(|(r, t)| (ear_model.excitation(r), ear_model.excitation(t)))
        .collect();

    let mut undetected = 1.0;
    let mut steps = 0.0;
    for band in 0..band_count {
        let mut band_probability = 0.0_f64;
        let mut band_steps = 0.0;
        for (channel, (reference, test)) in channels.iter().enumerate() {
            let e_ref = 10.0 * reference[band].log10();
            let e_test = 10.0 * test[band].log10();
            let level = 0.3 * e_ref.max(e_test) + 0.7 * e_test;
            let s = step_size(level);

            let e = e_ref - e_test;
            let b = if e_ref > e_test { 4 } else { 6 };
            let probability = 1.0 - 0.5_f64.powf((e / s).powi(b));
            let channel_steps = rounding.apply(e).abs() / s;

            band_probability = band_probability.max(probability);
            if channel == 0 || channel_steps > band_steps {
                band_steps = channel_steps;
            }
        }
        undetected *= 1.0 - band_probability;
        steps += band_steps;
    }
    let probability = 1.0 - undetected;

    if probability > DISTORTED_BLOCK_PROBABILITY {
        acc_adb.accumulate(0, steps, 1.0);
    } else {
        trace!(probability, "Detection probability too low, no distorted block");
    }
    acc_mfpd.accumulate(0, probability, 1.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::AccumulatorMode;
    use peaq_core::{FilterBankEarModel, FilterBankEarState};

    fn accumulators() -> (Accumulator, Accumulator) {
        (
            Accumulator::new(1, AccumulatorMode::Adb).unwrap(),
            Accumulator::new(1, AccumulatorMode::FilteredMax).unwrap(),
        )
    }

    #[test]
    fn test_step_size() {
        assert_eq!(step_size(0.0), 1e30);
        assert_eq!(step_size(-3.0), 1e30);
        // below one dB per step at 60 dB
        let s = step_size(60.0);
        assert!(s > 0.5 && s < 2.0, "{s}");
    }

    #[test]
    fn test_identical_excitation() {
        let ear = FilterBankEarModel::new();
        let state = FilterBankEarState::new(vec![1e4; 40]);
        let (mut adb, mut mfpd) = accumulators();

        probability_of_detection(
            &ear,
            &[state.clone(), state.clone()],
            &[state.clone(), state],
            StepRounding::Truncate,
            &mut adb,
            &mut mfpd,
        );
        assert_eq!(adb.count(0), 0);
        assert_eq!(mfpd.count(0), 1);
        assert_eq!(mfpd.value(), 0.0);
    }

    #[test]
    fn test_large_difference_is_distorted_block() {
        let ear = FilterBankEarModel::new();
        let reference = FilterBankEarState::new(vec![1e6; 40]);
        let test = FilterBankEarState::new(vec![1e3; 40]);
        let (mut adb, mut mfpd) = accumulators();

        probability_of_detection(
            &ear,
            &[reference],
            &[test],
            StepRounding::Truncate,
            &mut adb,
            &mut mfpd,
        );
        assert_eq!(adb.count(0), 1);
        assert!((mfpd.value() - 1.0).abs() < 1e-12);
        assert!(adb.value() > 0.0);
    }

    #[test]
    fn test_rounding_policy() {
        let ear = FilterBankEarModel::from_tables(192, vec![1.0]).unwrap();
        // test 2.5 dB above a 60 dB reference
        let reference = FilterBankEarState::new(vec![1e6]);
        let test = FilterBankEarState::new(vec![1e6 * 10.0_f64.powf(0.25)]);

        let run = |rounding| {
            let (mut adb, mut mfpd) = accumulators();
            probability_of_detection(
                &ear,
                &[reference.clone()],
                &[test.clone()],
                rounding,
                &mut adb,
                &mut mfpd,
            );
            assert_eq!(adb.count(0), 1);
            adb.value()
        };
        let truncated = run(StepRounding::Truncate);
        let floored = run(StepRounding::Floor);

        // |trunc(-2.5)| = 2 against |floor(-2.5)| = 3 steps
        assert!((floored - truncated - 1.5_f64.log10()).abs() < 1e-9);
    }
}
