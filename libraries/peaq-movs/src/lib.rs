//! Model output variables for PEAQ (ITU-R BS.1387)
//!
//! This crate provides:
//! - Accumulators implementing the averaging laws of the standard, with
//!   tentative accumulation for the data boundary gating
//! - Per-frame calculators for every MOV of the Basic and Advanced versions
//! - An FFT based autocorrelation for the error harmonic structure
//! - `BasicMovSet` and `AdvancedMovSet` wiring calculators to accumulators
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌───────────────┐
//! │ Ear Models  │ ──► │ Calculators  │ ──► │ Accumulators  │
//! └─────────────┘     └──────────────┘     └───────────────┘
//!        │                   ▲                     │
//!        ▼                   │                     ▼
//! ┌─────────────┐            │             ┌───────────────┐
//! │ Level Adapt │ ───────────┘             │  MOV values   │
//! │ Modulation  │                          └───────────────┘
//! └─────────────┘
//! ```
//!
//! The ear models, level adapter and modulation processor live outside this
//! crate; their output reaches the calculators through the traits of
//! `peaq-core`.
//!
//! # Example
//!
//! ```rust
//! use peaq_movs::{Accumulator, AccumulatorMode};
//!
//! let mut acc = Accumulator::new(2, AccumulatorMode::Rms).unwrap();
//! acc.accumulate(0, 3.0, 1.0);
//! acc.accumulate(1, 4.0, 1.0);
//!
//! // mean over channels of each channel's RMS
//! assert_eq!(acc.value(), 3.5);
//! ```

#![deny(unsafe_code)]

mod accumulator;
pub mod calculators;
mod correlation;
mod mov;
mod movset;

pub use accumulator::{Accumulator, AccumulatorMode};
pub use correlation::{CorrelationContext, CORRELATION_INPUT_LEN, CORRELATION_LAGS};
pub use mov::Mov;
pub use movset::{
    AdvancedMovSet, AdvancedMovs, BasicMovSet, BasicMovs, FftFrame, ModulationFrame,
    ADVANCED_BAND_COUNT, BASIC_BAND_COUNT,
};
