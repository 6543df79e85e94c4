//! Tabulated ear models
//!
//! These carry the static, per-band tables of the two BS.1387 ear models
//! (band layout, internal noise, masking difference, spectral grouping) and
//! implement the collaborator traits over precomputed per-frame states.
//! Turning audio into excitation patterns happens upstream.

mod bands;
mod fft;
mod filter_bank;

pub use bands::{internal_noise, SAMPLING_RATE};
pub use fft::{frame_energy_reached, BandSpan, FftEarModel, FFT_FRAME_SIZE};
pub use filter_bank::{FilterBankEarModel, FILTER_BANK_BAND_COUNT, FILTER_BANK_FRAME_SIZE};
