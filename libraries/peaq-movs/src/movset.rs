//! MOV sets of the Basic and Advanced PEAQ versions
//!
//! A MOV set owns one accumulator per MOV, configured with the averaging law
//! BS.1387 prescribes, plus the correlation context for the EHS measure.
//! The caller runs the ear models, level adapter and modulation processor and
//! hands their per-channel output to the set one frame at a time.
//!
//! # Example
//!
//! ```rust
//! use peaq_core::{AdaptedExcitation, ConformanceSettings, FftEarState, ModulationPattern};
//! use peaq_movs::{BasicMovSet, FftFrame, ModulationFrame};
//!
//! let mut set = BasicMovSet::new(1, ConformanceSettings::default()).unwrap();
//!
//! let state = FftEarState::new(vec![1.0; 109], vec![1.0; 1025], vec![1.0; 1025], true);
//! let pattern = ModulationPattern::new(vec![0.0; 109], vec![1.0; 109]);
//! let level = AdaptedExcitation::new(vec![1.0; 109], vec![1.0; 109]);
//!
//! set.process_frame(
//!     &FftFrame { reference: &[state.clone()], test: &[state] },
//!     &ModulationFrame {
//!         reference: &[pattern.clone()],
//!         test: &[pattern],
//!         levels: &[level],
//!     },
//! );
//!
//! let movs = set.values();
//! assert_eq!(movs.avg_mod_diff1, 0.0);
//! assert_eq!(movs.mfpd, 0.0);
//! ```

use crate::accumulator::Accumulator;
use crate::calculators::{
    bandwidth, error_harmonic_structure, linear_distortion, modulation_difference,
    noise_loudness, noise_loudness_asymmetry, noise_to_mask_ratio, probability_of_detection,
};
use crate::correlation::CorrelationContext;
use crate::mov::Mov;
use peaq_core::{
    AdaptedExcitation, ConformanceSettings, ExcitationSource, FftEarModel, FftEarState,
    FilterBankEarModel, FilterBankEarState, LevelAdapter, ModulationPattern, ModulationSource,
    Result,
};
use tracing::{debug, warn};

/// Band count of the FFT ear model in the Basic version
pub const BASIC_BAND_COUNT: usize = 109;

/// Band count of the FFT ear model in the Advanced version
pub const ADVANCED_BAND_COUNT: usize = 55;

/// FFT ear model output for one frame, one state per channel
#[derive(Debug, Clone, Copy)]
pub struct FftFrame<'a> {
    pub reference: &'a [FftEarState],
    pub test: &'a [FftEarState],
}

/// Modulation processor and level adapter output for one frame
#[derive(Debug, Clone, Copy)]
pub struct ModulationFrame<'a, M = ModulationPattern, L = AdaptedExcitation> {
    /// Modulation of the reference signal, one per channel
    pub reference: &'a [M],
    /// Modulation of the test signal, one per channel
    pub test: &'a [M],
    /// Level adapter output, one per channel
    pub levels: &'a [L],
}

fn new_accumulator(mov: Mov, channels: usize) -> Result<Accumulator> {
    Accumulator::new(mov.accumulator_channels(channels), mov.accumulator_mode())
}

fn finalize(mov: Mov, acc: &Accumulator) -> f64 {
    let value = acc.value();
    if !value.is_finite() {
        warn!(mov = mov.as_str(), value, "MOV is not finite");
    }
    value
}

/// Final MOVs of the Basic version
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasicMovs {
    pub bandwidth_ref: f64,
    pub bandwidth_test: f64,
    pub total_nmr: f64,
    pub win_mod_diff1: f64,
    pub adb: f64,
    pub ehs: f64,
    pub avg_mod_diff1: f64,
    pub avg_mod_diff2: f64,
    pub rms_noise_loud: f64,
    pub mfpd: f64,
    pub rel_dist_frames: f64,
}

impl BasicMovs {
    /// Values in the order of [`Mov::BASIC`]
    pub fn to_array(&self) -> [f64; 11] {
        [
            self.bandwidth_ref,
            self.bandwidth_test,
            self.total_nmr,
            self.win_mod_diff1,
            self.adb,
            self.ehs,
            self.avg_mod_diff1,
            self.avg_mod_diff2,
            self.rms_noise_loud,
            self.mfpd,
            self.rel_dist_frames,
        ]
    }

    /// Value of one MOV, `None` if it is not part of the Basic version
    pub fn get(&self, mov: Mov) -> Option<f64> {
        Mov::BASIC
            .iter()
            .position(|&m| m == mov)
            .map(|index| self.to_array()[index])
    }
}

/// Accumulators of the Basic version
#[derive(Debug)]
pub struct BasicMovSet {
    channels: usize,
    settings: ConformanceSettings,
    ear_model: FftEarModel,
    correlation: CorrelationContext,
    bandwidth_ref: Accumulator,
    bandwidth_test: Accumulator,
    total_nmr: Accumulator,
    win_mod_diff1: Accumulator,
    adb: Accumulator,
    ehs: Accumulator,
    avg_mod_diff1: Accumulator,
    avg_mod_diff2: Accumulator,
    rms_noise_loud: Accumulator,
    mfpd: Accumulator,
    rel_dist_frames: Accumulator,
}

impl BasicMovSet {
    /// Create the Basic set with the standard 109 band FFT ear model
    ///
    /// # Errors
    /// Returns error if the channel count is zero
    pub fn new(channels: usize, settings: ConformanceSettings) -> Result<Self> {
        Self::with_ear_model(FftEarModel::new(BASIC_BAND_COUNT)?, channels, settings)
    }

    /// Create the Basic set on an explicit FFT ear model
    ///
    /// # Errors
    /// Returns error if the channel count is zero
    pub fn with_ear_model(
        ear_model: FftEarModel,
        channels: usize,
        settings: ConformanceSettings,
    ) -> Result<Self> {
        let set = Self {
            channels,
            settings,
            correlation: CorrelationContext::new(settings.ehs_window),
            bandwidth_ref: new_accumulator(Mov::BandwidthRefB, channels)?,
            bandwidth_test: new_accumulator(Mov::BandwidthTestB, channels)?,
            total_nmr: new_accumulator(Mov::TotalNmrB, channels)?,
            win_mod_diff1: new_accumulator(Mov::WinModDiff1B, channels)?,
            adb: new_accumulator(Mov::AdbB, channels)?,
            ehs: new_accumulator(Mov::EhsB, channels)?,
            avg_mod_diff1: new_accumulator(Mov::AvgModDiff1B, channels)?,
            avg_mod_diff2: new_accumulator(Mov::AvgModDiff2B, channels)?,
            rms_noise_loud: new_accumulator(Mov::RmsNoiseLoudB, channels)?,
            mfpd: new_accumulator(Mov::MfpdB, channels)?,
            rel_dist_frames: new_accumulator(Mov::RelDistFramesB, channels)?,
            ear_model,
        };
        debug!(
            channels,
            bands = set.ear_model.band_count(),
            ?settings,
            "Created basic MOV set"
        );
        Ok(set)
    }

    /// Number of audio channels
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Conformance settings in effect
    pub fn settings(&self) -> &ConformanceSettings {
        &self.settings
    }

    /// FFT ear model the frames must come from
    pub fn ear_model(&self) -> &FftEarModel {
        &self.ear_model
    }

    /// Run every Basic calculator on one frame
    ///
    /// The modulation patterns and level adapter output must be computed on
    /// the same FFT ear model.
    pub fn process_frame<M, L>(
        &mut self,
        fft: &FftFrame<'_>,
        modulation: &ModulationFrame<'_, M, L>,
    ) where
        M: ModulationSource,
        L: LevelAdapter,
    {
        debug_assert_eq!(fft.reference.len(), self.channels);
        debug_assert_eq!(fft.test.len(), self.channels);
        debug_assert_eq!(modulation.reference.len(), self.channels);
        debug_assert_eq!(modulation.test.len(), self.channels);
        debug_assert_eq!(modulation.levels.len(), self.channels);

        let ear = &self.ear_model;
        bandwidth(
            ear,
            fft.reference,
            fft.test,
            &mut self.bandwidth_ref,
            &mut self.bandwidth_test,
        );
        noise_to_mask_ratio(
            ear,
            fft.reference,
            fft.test,
            &mut self.total_nmr,
            Some(&mut self.rel_dist_frames),
        );
        modulation_difference(
            ear,
            modulation.reference,
            modulation.test,
            &mut self.avg_mod_diff1,
            Some(&mut self.avg_mod_diff2),
            Some(&mut self.win_mod_diff1),
        );
        noise_loudness(
            ear,
            modulation.reference,
            modulation.test,
            modulation.levels,
            &mut self.rms_noise_loud,
        );
        probability_of_detection(
            ear,
            fft.reference,
            fft.test,
            self.settings.step_rounding,
            &mut self.adb,
            &mut self.mfpd,
        );
        error_harmonic_structure(
            ear,
            fft.reference,
            fft.test,
            self.settings.ehs_dc_removal,
            &mut self.correlation,
            &mut self.ehs,
        );
    }

    fn accumulators_mut(&mut self) -> [&mut Accumulator; 11] {
        [
            &mut self.bandwidth_ref,
            &mut self.bandwidth_test,
            &mut self.total_nmr,
            &mut self.win_mod_diff1,
            &mut self.adb,
            &mut self.ehs,
            &mut self.avg_mod_diff1,
            &mut self.avg_mod_diff2,
            &mut self.rms_noise_loud,
            &mut self.mfpd,
            &mut self.rel_dist_frames,
        ]
    }

    /// Enter or leave tentative state on every accumulator
    ///
    /// See [`Accumulator::set_tentative`].
    pub fn set_tentative(&mut self, tentative: bool) {
        debug!(tentative, "Basic MOV set tentative state");
        for acc in self.accumulators_mut() {
            acc.set_tentative(tentative);
        }
    }

    /// Whether tentative samples are pending
    pub fn is_tentative(&self) -> bool {
        self.bandwidth_ref.is_tentative()
    }

    /// Discard all tentative samples
    pub fn rollback(&mut self) {
        debug!("Basic MOV set rolled back");
        for acc in self.accumulators_mut() {
            acc.rollback();
        }
    }

    /// Accumulator of one MOV, `None` if it is not part of the Basic version
    pub fn accumulator(&self, mov: Mov) -> Option<&Accumulator> {
        let acc = match mov {
            Mov::BandwidthRefB => &self.bandwidth_ref,
            Mov::BandwidthTestB => &self.bandwidth_test,
            Mov::TotalNmrB => &self.total_nmr,
            Mov::WinModDiff1B => &self.win_mod_diff1,
            Mov::AdbB => &self.adb,
            Mov::EhsB => &self.ehs,
            Mov::AvgModDiff1B => &self.avg_mod_diff1,
            Mov::AvgModDiff2B => &self.avg_mod_diff2,
            Mov::RmsNoiseLoudB => &self.rms_noise_loud,
            Mov::MfpdB => &self.mfpd,
            Mov::RelDistFramesB => &self.rel_dist_frames,
            _ => return None,
        };
        Some(acc)
    }

    /// Current MOV values
    pub fn values(&self) -> BasicMovs {
        BasicMovs {
            bandwidth_ref: finalize(Mov::BandwidthRefB, &self.bandwidth_ref),
            bandwidth_test: finalize(Mov::BandwidthTestB, &self.bandwidth_test),
            total_nmr: finalize(Mov::TotalNmrB, &self.total_nmr),
            win_mod_diff1: finalize(Mov::WinModDiff1B, &self.win_mod_diff1),
            adb: finalize(Mov::AdbB, &self.adb),
            ehs: finalize(Mov::EhsB, &self.ehs),
            avg_mod_diff1: finalize(Mov::AvgModDiff1B, &self.avg_mod_diff1),
            avg_mod_diff2: finalize(Mov::AvgModDiff2B, &self.avg_mod_diff2),
            rms_noise_loud: finalize(Mov::RmsNoiseLoudB, &self.rms_noise_loud),
            mfpd: finalize(Mov::MfpdB, &self.mfpd),
            rel_dist_frames: finalize(Mov::RelDistFramesB, &self.rel_dist_frames),
        }
    }
}

/// Final MOVs of the Advanced version
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdvancedMovs {
    pub rms_mod_diff: f64,
    pub rms_noise_loud_asym: f64,
    pub segmental_nmr: f64,
    pub ehs: f64,
    pub avg_lin_dist: f64,
}

impl AdvancedMovs {
    /// Values in the order of [`Mov::ADVANCED`]
    pub fn to_array(&self) -> [f64; 5] {
        [
            self.rms_mod_diff,
            self.rms_noise_loud_asym,
            self.segmental_nmr,
            self.ehs,
            self.avg_lin_dist,
        ]
    }

    /// Value of one MOV, `None` if it is not part of the Advanced version
    pub fn get(&self, mov: Mov) -> Option<f64> {
        Mov::ADVANCED
            .iter()
            .position(|&m| m == mov)
            .map(|index| self.to_array()[index])
    }
}

/// Accumulators of the Advanced version
///
/// The Advanced version runs two ear models at different frame rates: the
/// FFT model feeds the NMR and EHS measures, the filter bank model feeds the
/// modulation and loudness measures. Each model's frames go through their
/// own method.
#[derive(Debug)]
pub struct AdvancedMovSet {
    channels: usize,
    settings: ConformanceSettings,
    fft_model: FftEarModel,
    filter_bank_model: FilterBankEarModel,
    correlation: CorrelationContext,
    rms_mod_diff: Accumulator,
    rms_noise_loud_asym: Accumulator,
    segmental_nmr: Accumulator,
    ehs: Accumulator,
    avg_lin_dist: Accumulator,
}

impl AdvancedMovSet {
    /// Create the Advanced set with the 55 band FFT model and 40 band filter bank
    ///
    /// # Errors
    /// Returns error if the channel count is zero
    pub fn new(channels: usize, settings: ConformanceSettings) -> Result<Self> {
        Self::with_ear_models(
            FftEarModel::new(ADVANCED_BAND_COUNT)?,
            FilterBankEarModel::new(),
            channels,
            settings,
        )
    }

    /// Create the Advanced set on explicit ear models
    ///
    /// # Errors
    /// Returns error if the channel count is zero
    pub fn with_ear_models(
        fft_model: FftEarModel,
        filter_bank_model: FilterBankEarModel,
        channels: usize,
        settings: ConformanceSettings,
    ) -> Result<Self> {
        let set = Self {
            channels,
            settings,
            correlation: CorrelationContext::new(settings.ehs_window),
            rms_mod_diff: new_accumulator(Mov::RmsModDiffA, channels)?,
            rms_noise_loud_asym: new_accumulator(Mov::RmsNoiseLoudAsymA, channels)?,
            segmental_nmr: new_accumulator(Mov::SegmentalNmrB, channels)?,
            ehs: new_accumulator(Mov::EhsB, channels)?,
            avg_lin_dist: new_accumulator(Mov::AvgLinDistA, channels)?,
            fft_model,
            filter_bank_model,
        };
        debug!(
            channels,
            fft_bands = set.fft_model.band_count(),
            filter_bank_bands = set.filter_bank_model.band_count(),
            ?settings,
            "Created advanced MOV set"
        );
        Ok(set)
    }

    /// Number of audio channels
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Conformance settings in effect
    pub fn settings(&self) -> &ConformanceSettings {
        &self.settings
    }

    /// FFT ear model the FFT frames must come from
    pub fn fft_model(&self) -> &FftEarModel {
        &self.fft_model
    }

    /// Filter bank ear model the filter bank frames must come from
    pub fn filter_bank_model(&self) -> &FilterBankEarModel {
        &self.filter_bank_model
    }

    /// Run the NMR and EHS calculators on one FFT model frame
    pub fn process_fft_frame(&mut self, fft: &FftFrame<'_>) {
        debug_assert_eq!(fft.reference.len(), self.channels);
        debug_assert_eq!(fft.test.len(), self.channels);

        noise_to_mask_ratio(
            &self.fft_model,
            fft.reference,
            fft.test,
            &mut self.segmental_nmr,
            None,
        );
        error_harmonic_structure(
            &self.fft_model,
            fft.reference,
            fft.test,
            self.settings.ehs_dc_removal,
            &mut self.correlation,
            &mut self.ehs,
        );
    }

    /// Run the modulation and loudness calculators on one filter bank frame
    ///
    /// `reference` holds the filter bank states of the reference signal, one
    /// per channel; the modulation frame must be computed on the same model.
    pub fn process_filter_bank_frame<M, L>(
        &mut self,
        reference: &[FilterBankEarState],
        modulation: &ModulationFrame<'_, M, L>,
    ) where
        M: ModulationSource,
        L: LevelAdapter,
    {
        debug_assert_eq!(reference.len(), self.channels);
        debug_assert_eq!(modulation.reference.len(), self.channels);
        debug_assert_eq!(modulation.test.len(), self.channels);
        debug_assert_eq!(modulation.levels.len(), self.channels);

        let ear = &self.filter_bank_model;
        let swap = self.settings.swap_modulation_patterns;
        modulation_difference(
            ear,
            modulation.reference,
            modulation.test,
            &mut self.rms_mod_diff,
            None,
            None,
        );
        noise_loudness_asymmetry(
            ear,
            modulation.reference,
            modulation.test,
            modulation.levels,
            swap,
            &mut self.rms_noise_loud_asym,
        );
        linear_distortion(
            ear,
            modulation.reference,
            modulation.test,
            modulation.levels,
            reference,
            swap,
            &mut self.avg_lin_dist,
        );
    }

    fn accumulators_mut(&mut self) -> [&mut Accumulator; 5] {
        [
            &mut self.rms_mod_diff,
            &mut self.rms_noise_loud_asym,
            &mut self.segmental_nmr,
            &mut self.ehs,
            &mut self.avg_lin_dist,
        ]
    }

    /// Enter or leave tentative state on every accumulator
    ///
    /// See [`Accumulator::set_tentative`].
    pub fn set_tentative(&mut self, tentative: bool) {
        debug!(tentative, "Advanced MOV set tentative state");
        for acc in self.accumulators_mut() {
            acc.set_tentative(tentative);
        }
    }

    /// Whether tentative samples are pending
    pub fn is_tentative(&self) -> bool {
        self.rms_mod_diff.is_tentative()
    }

    /// Discard all tentative samples
    pub fn rollback(&mut self) {
        debug!("Advanced MOV set rolled back");
        for acc in self.accumulators_mut() {
            acc.rollback();
        }
    }

    /// Accumulator of one MOV, `None` if it is not part of the Advanced version
    pub fn accumulator(&self, mov: Mov) -> Option<&Accumulator> {
        let acc = match mov {
            Mov::RmsModDiffA => &self.rms_mod_diff,
            Mov::RmsNoiseLoudAsymA => &self.rms_noise_loud_asym,
            Mov::SegmentalNmrB => &self.segmental_nmr,
            Mov::EhsB => &self.ehs,
            Mov::AvgLinDistA => &self.avg_lin_dist,
            _ => return None,
        };
        Some(acc)
    }

    /// Current MOV values
    pub fn values(&self) -> AdvancedMovs {
        AdvancedMovs {
            rms_mod_diff: finalize(Mov::RmsModDiffA, &self.rms_mod_diff),
            rms_noise_loud_asym: finalize(Mov::RmsNoiseLoudAsymA, &self.rms_noise_loud_asym),
            segmental_nmr: finalize(Mov::SegmentalNmrB, &self.segmental_nmr),
            ehs: finalize(Mov::EhsB, &self.ehs),
            avg_lin_dist: finalize(Mov::AvgLinDistA, &self.avg_lin_dist),
        }
    }
}
