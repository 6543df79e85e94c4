//! PEAQ Core
//!
//! Collaborator interfaces, ear model tables and settings shared by the PEAQ
//! (ITU-R BS.1387) model output variable engine.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Collaborator Traits**: `ExcitationSource`, `FftSpectrumSource`,
//!   `LevelAdapter`, `ModulationSource`
//! - **Ear Model Tables**: `FftEarModel`, `FilterBankEarModel` with typed
//!   per-channel states
//! - **Settings**: `ConformanceSettings` selecting between standard variants
//! - **Error Handling**: Unified `PeaqError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use peaq_core::{ExcitationSource, FftEarModel, FilterBankEarModel};
//!
//! let basic = FftEarModel::new(109).unwrap();
//! let filter_bank = FilterBankEarModel::new();
//!
//! assert_eq!(basic.band_count(), 109);
//! assert_eq!(filter_bank.band_count(), 40);
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod models;
pub mod settings;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{PeaqError, Result};
pub use models::{frame_energy_reached, BandSpan, FftEarModel, FilterBankEarModel};
pub use settings::{ConformanceSettings, EhsDcRemoval, EhsWindow, StepRounding};
pub use traits::{ExcitationSource, FftSpectrumSource, LevelAdapter, ModulationSource};
pub use types::{AdaptedExcitation, FftEarState, FilterBankEarState, ModulationPattern};
