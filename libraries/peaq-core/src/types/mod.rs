mod patterns;
mod state;

pub use patterns::{AdaptedExcitation, ModulationPattern};
pub use state::{FftEarState, FilterBankEarState};
