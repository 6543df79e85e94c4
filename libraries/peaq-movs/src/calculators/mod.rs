//! Per-frame MOV calculators
//!
//! Each calculator reads one frame of collaborator output for every channel
//! and pushes zero or more samples into accumulators. Calculators never fail;
//! arrays of the wrong length are caller errors caught by debug assertions.
//! The ear model is passed explicitly and provides the band count and the
//! internal noise.
//!
//! Per-channel inputs are slices indexed by channel. The channel count is
//! taken from the (first) accumulator, except for the binaural detection
//! measure, which reads every state it is given.

mod bandwidth;
mod detection;
mod ehs;
mod modulation;
mod nmr;
mod noise_loudness;

pub use bandwidth::{bandwidth, BANDWIDTH_MIN_REF};
pub use detection::probability_of_detection;
pub use ehs::error_harmonic_structure;
pub use modulation::modulation_difference;
pub use nmr::{noise_to_mask_ratio, REL_DIST_THRESHOLD};
pub use noise_loudness::{
    linear_distortion, noise_loudness, noise_loudness_asymmetry, noise_loudness_of,
    NoiseLoudnessParams,
};
