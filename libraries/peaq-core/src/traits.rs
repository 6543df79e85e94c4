//! Collaborator interfaces consumed by the MOV calculators
//!
//! The ear models, the level adapter and the modulation processor live
//! outside this workspace. The calculators only read the arrays exposed
//! through these traits, one frame at a time.

/// Ear model producing excitation patterns
///
/// Implemented by both the FFT based and the filter bank based ear model.
/// Per-channel processing state is typed through `State`, so the calculators
/// can only be handed states that belong to the model they are given.
pub trait ExcitationSource {
    /// Per-channel state of the ear model after processing one frame
    type State;

    /// Number of perceptual bands (Z)
    fn band_count(&self) -> usize;

    /// Number of time domain samples per frame
    fn frame_size(&self) -> usize;

    /// Internal ear noise of the given band
    fn internal_noise(&self, band: usize) -> f64;

    /// Excitation pattern of the given state, `band_count()` entries
    fn excitation<'a>(&self, state: &'a Self::State) -> &'a [f64];
}

/// Operations only available on the FFT based ear model
pub trait FftSpectrumSource: ExcitationSource {
    /// Power spectrum, `frame_size() / 2 + 1` bins
    fn power_spectrum<'a>(&self, state: &'a Self::State) -> &'a [f64];

    /// Power spectrum weighted by the outer and middle ear transfer function
    fn weighted_power_spectrum<'a>(&self, state: &'a Self::State) -> &'a [f64];

    /// Per-band factor converting excitation into masking threshold
    fn masking_difference(&self) -> &[f64];

    /// Group a spectrum of `frame_size() / 2 + 1` bins into bands
    ///
    /// `band_power` must have `band_count()` entries.
    fn group_into_bands(&self, spectrum: &[f64], band_power: &mut [f64]);

    /// Whether the frame carried enough energy for the EHS measure
    fn is_energy_threshold_reached(&self, state: &Self::State) -> bool;
}

/// Level and pattern adaptation for one channel
pub trait LevelAdapter {
    /// Spectrally adapted excitation of the reference signal
    fn adapted_ref(&self) -> &[f64];

    /// Spectrally adapted excitation of the test signal
    fn adapted_test(&self) -> &[f64];
}

/// Modulation pattern tracker for one channel of one signal
pub trait ModulationSource {
    /// Per-band modulation of the current frame
    fn modulation(&self) -> &[f64];

    /// Per-band average loudness of the current frame
    fn average_loudness(&self) -> &[f64];
}
