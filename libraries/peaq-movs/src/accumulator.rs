//! Temporal accumulation of per-frame MOV samples
//!
//! Every MOV is the average over time of a per-frame value, but BS.1387 uses
//! seven different averaging laws. An [`Accumulator`] owns the running state
//! for one MOV over one clip, one slot per channel, and yields the channel
//! mean of the finalised per-channel values.
//!
//! Quiet frames at the end of a clip can be excluded with the tentative
//! state: once enabled, [`Accumulator::value`] keeps reporting the value from
//! before, until the tentative samples are committed or rolled back.

use peaq_core::{PeaqError, Result};
use std::fmt;

/// Leaky integrator coefficient of [`AccumulatorMode::FilteredMax`]
const FILTER_DECAY: f64 = 0.9;

/// Number of samples averaged by [`AccumulatorMode::AvgWindow`]
const WINDOW_LENGTH: usize = 4;

/// Averaging law of an [`Accumulator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccumulatorMode {
    /// Weighted mean `Σwx / Σw`
    Avg,
    /// Weighted mean in dB, `10·log10(Σwx / Σw)`
    AvgLog,
    /// Weighted RMS `√(Σw²x² / Σw²)`
    Rms,
    /// `√(Σx² / N) + 0.5·√(Σw² / N)`, the weight carries a second value
    RmsAsym,
    /// RMS of fourth powers of a 4 sample moving average of `√x`, weight ignored
    AvgWindow,
    /// Maximum of `y = 0.9·y + 0.1·x`, weight ignored
    FilteredMax,
    /// `log10(Σwx / Σw)` with zero guards for distorted block counting
    Adb,
}

impl AccumulatorMode {
    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Avg => "avg",
            Self::AvgLog => "avg_log",
            Self::Rms => "rms",
            Self::RmsAsym => "rms_asym",
            Self::AvgWindow => "avg_window",
            Self::FilteredMax => "filtered_max",
            Self::Adb => "adb",
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "avg" => Some(Self::Avg),
            "avg_log" => Some(Self::AvgLog),
            "rms" => Some(Self::Rms),
            "rms_asym" => Some(Self::RmsAsym),
            "avg_window" => Some(Self::AvgWindow),
            "filtered_max" => Some(Self::FilteredMax),
            "adb" => Some(Self::Adb),
            _ => None,
        }
    }
}

impl fmt::Display for AccumulatorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Running statistics of one channel
#[derive(Debug, Clone, PartialEq)]
enum ChannelState {
    /// Avg, AvgLog, Rms and Adb
    Fraction { num: f64, den: f64 },
    /// RmsAsym
    TwinFraction { num1: f64, num2: f64, den: f64 },
    /// AvgWindow; `past` holds the square roots of the latest values, oldest first
    Window {
        num: f64,
        den: f64,
        past: [f64; WINDOW_LENGTH - 1],
        filled: usize,
    },
    /// FilteredMax; `None` until the first sample seeds the filter
    FilteredMax { filter: Option<(f64, f64)> },
}

impl ChannelState {
    fn new(mode: AccumulatorMode) -> Self {
        match mode {
            AccumulatorMode::Avg
            | AccumulatorMode::AvgLog
            | AccumulatorMode::Rms
            | AccumulatorMode::Adb => Self::Fraction { num: 0.0, den: 0.0 },
            AccumulatorMode::RmsAsym => Self::TwinFraction {
                num1: 0.0,
                num2: 0.0,
                den: 0.0,
            },
            AccumulatorMode::AvgWindow => Self::Window {
                num: 0.0,
                den: 0.0,
                past: [0.0; WINDOW_LENGTH - 1],
                filled: 0,
            },
            AccumulatorMode::FilteredMax => Self::FilteredMax { filter: None },
        }
    }

    fn accumulate(&mut self, mode: AccumulatorMode, value: f64, weight: f64) {
        match self {
            Self::Fraction { num, den } => {
                if mode == AccumulatorMode::Rms {
                    let w2 = weight * weight;
                    *num += w2 * value * value;
                    *den += w2;
                } else {
                    *num += weight * value;
                    *den += weight;
                }
            }
            Self::TwinFraction { num1, num2, den } => {
                *num1 += value * value;
                *num2 += weight * weight;
                *den += 1.0;
            }
            Self::Window {
                num,
                den,
                past,
                filled,
            } => {
                let root = value.sqrt();
                if *filled == past.len() {
                    let mean = (past.iter().sum::<f64>() + root) / WINDOW_LENGTH as f64;
                    *num += mean.powi(4);
                    *den += 1.0;
                    past.rotate_left(1);
                    past[past.len() - 1] = root;
                } else {
                    past[*filled] = root;
                    *filled += 1;
                }
            }
            Self::FilteredMax { filter } => {
                *filter = Some(match *filter {
                    None => (value, value),
                    Some((state, max)) => {
                        let state = FILTER_DECAY * state + (1.0 - FILTER_DECAY) * value;
                        (state, max.max(state))
                    }
                });
            }
        }
    }

    fn value(&self, mode: AccumulatorMode) -> f64 {
        match *self {
            Self::Fraction { num, den } => match mode {
                AccumulatorMode::AvgLog => 10.0 * (num / den).log10(),
                AccumulatorMode::Rms => (num / den).sqrt(),
                AccumulatorMode::Adb => {
                    if den == 0.0 {
                        0.0
                    } else if num == 0.0 {
                        -0.5
                    } else {
                        (num / den).log10()
                    }
                }
                _ => num / den,
            },
            Self::TwinFraction { num1, num2, den } => {
                (num1 / den).sqrt() + 0.5 * (num2 / den).sqrt()
            }
            Self::Window { num, den, .. } => (num / den).sqrt(),
            Self::FilteredMax { filter } => filter.map_or(0.0, |(_, max)| max),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Channel {
    state: ChannelState,
    calls: usize,
}

/// Per-MOV temporal reducer
///
/// # Example
///
/// ```rust
/// use peaq_movs::{Accumulator, AccumulatorMode};
///
/// let mut acc = Accumulator::new(2, AccumulatorMode::Avg).unwrap();
/// acc.accumulate(0, 1.0, 1.0);
/// acc.accumulate(0, 3.0, 1.0);
/// acc.accumulate(1, 4.0, 1.0);
///
/// // channel means 2 and 4, averaged over channels
/// assert_eq!(acc.value(), 3.0);
/// ```
#[derive(Debug, Clone)]
pub struct Accumulator {
    mode: AccumulatorMode,
    channels: Vec<Channel>,
    /// Committed state, present while tentative
    saved: Option<Vec<Channel>>,
}

impl Accumulator {
    /// Create an accumulator
    ///
    /// # Arguments
    /// * `channels` - Number of channels (at least 1)
    /// * `mode` - Averaging law, fixed for the lifetime of the accumulator
    ///
    /// # Errors
    /// Returns error if the channel count is zero
    pub fn new(channels: usize, mode: AccumulatorMode) -> Result<Self> {
        if channels == 0 {
            return Err(PeaqError::InvalidChannelCount(channels));
        }
        let channel = Channel {
            state: ChannelState::new(mode),
            calls: 0,
        };
        Ok(Self {
            mode,
            channels: vec![channel; channels],
            saved: None,
        })
    }

    /// Averaging law of this accumulator
    pub fn mode(&self) -> AccumulatorMode {
        self.mode
    }

    /// Number of channels
    pub fn channels(&self) -> usize {
        self.channels.len()
    }

    /// Add one sample to a channel
    ///
    /// Samples of one channel must arrive in chronological order. The weight
    /// must not be negative; [`AccumulatorMode::AvgWindow`] and
    /// [`AccumulatorMode::FilteredMax`] ignore it.
    pub fn accumulate(&mut self, channel: usize, value: f64, weight: f64) {
        debug_assert!(channel < self.channels.len(), "channel {channel} out of range");
        debug_assert!(weight >= 0.0 || weight.is_nan(), "negative weight {weight}");
        let slot = &mut self.channels[channel];
        slot.state.accumulate(self.mode, value, weight);
        slot.calls += 1;
    }

    /// Number of samples passed to a channel so far, tentative ones included
    pub fn count(&self, channel: usize) -> usize {
        self.channels[channel].calls
    }

    /// Finalised value of one channel
    ///
    /// While tentative, this is the value at the time tentative state was
    /// entered.
    pub fn channel_value(&self, channel: usize) -> f64 {
        self.visible()[channel].state.value(self.mode)
    }

    /// Finalised value, averaged over channels
    ///
    /// Only the AVG family is exact before the whole clip has been fed.
    /// An AVG channel that never received a sample yields NaN.
    pub fn value(&self) -> f64 {
        let visible = self.visible();
        let sum: f64 = visible.iter().map(|c| c.state.value(self.mode)).sum();
        sum / visible.len() as f64
    }

    /// Enter or leave tentative state
    ///
    /// Entering snapshots the committed state; samples accumulated from then
    /// on do not show in [`value`](Self::value). Leaving commits them.
    /// Entering twice keeps the first snapshot.
    pub fn set_tentative(&mut self, tentative: bool) {
        if tentative {
            if self.saved.is_none() {
                self.saved = Some(self.channels.clone());
            }
        } else {
            self.saved = None;
        }
    }

    /// Whether tentative samples are pending
    pub fn is_tentative(&self) -> bool {
        self.saved.is_some()
    }

    /// Discard all samples accumulated since entering tentative state
    ///
    /// Leaves tentative state. Does nothing if not tentative.
    pub fn rollback(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.channels = saved;
        }
    }

    fn visible(&self) -> &[Channel] {
        self.saved.as_deref().unwrap_or(&self.channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-12 * b.abs().max(1.0)
    }

    #[test]
    fn test_zero_channels_rejected() {
        let result = Accumulator::new(0, AccumulatorMode::Avg);
        assert!(matches!(result, Err(PeaqError::InvalidChannelCount(0))));
    }

    #[test]
    fn test_avg() {
        let mut acc = Accumulator::new(1, AccumulatorMode::Avg).unwrap();
        acc.accumulate(0, 2.0, 1.0);
        acc.accumulate(0, 5.0, 3.0);
        assert!(approx(acc.value(), 17.0 / 4.0));
    }

    #[test]
    fn test_avg_empty_is_nan() {
        let acc = Accumulator::new(1, AccumulatorMode::Avg).unwrap();
        assert!(acc.value().is_nan());
    }

    #[test]
    fn test_avg_log() {
        let mut acc = Accumulator::new(1, AccumulatorMode::AvgLog).unwrap();
        acc.accumulate(0, 10.0, 1.0);
        acc.accumulate(0, 190.0, 1.0);
        assert!(approx(acc.value(), 20.0));
    }

    #[test]
    fn test_rms_squares_weights() {
        let mut acc = Accumulator::new(1, AccumulatorMode::Rms).unwrap();
        acc.accumulate(0, 3.0, 1.0);
        acc.accumulate(0, 1.0, 2.0);
        // (1·9 + 4·1) / (1 + 4)
        assert!(approx(acc.value(), (13.0_f64 / 5.0).sqrt()));
    }

    #[test]
    fn test_rms_asym() {
        let mut acc = Accumulator::new(1, AccumulatorMode::RmsAsym).unwrap();
        acc.accumulate(0, 1.0, 2.0);
        acc.accumulate(0, 3.0, 0.0);
        let expected = (10.0_f64 / 2.0).sqrt() + 0.5 * (4.0_f64 / 2.0).sqrt();
        assert!(approx(acc.value(), expected));
    }

    #[test]
    fn test_avg_window_needs_four_values() {
        let mut acc = Accumulator::new(1, AccumulatorMode::AvgWindow).unwrap();
        for _ in 0..3 {
            acc.accumulate(0, 4.0, 0.0);
        }
        // no complete window yet
        assert!(acc.value().is_nan());

        acc.accumulate(0, 4.0, 0.0);
        // window of √4 = 2, (2)^4 = 16, √16 = 4
        assert!(approx(acc.value(), 4.0));
    }

    #[test]
    fn test_avg_window_slides() {
        let mut acc = Accumulator::new(1, AccumulatorMode::AvgWindow).unwrap();
        for x in [0.0, 0.0, 0.0, 16.0, 16.0] {
            acc.accumulate(0, x, 1.0);
        }
        // windows: mean √ = 1 then 2, fourth powers 1 and 16
        assert!(approx(acc.value(), (17.0_f64 / 2.0).sqrt()));
    }

    #[test]
    fn test_filtered_max_seeded_with_first_value() {
        let mut acc = Accumulator::new(1, AccumulatorMode::FilteredMax).unwrap();
        acc.accumulate(0, 0.5, 1.0);
        assert_eq!(acc.value(), 0.5);

        acc.accumulate(0, 1.0, 1.0);
        assert!(approx(acc.value(), 0.55));

        acc.accumulate(0, 0.0, 1.0);
        // filter decays, maximum stays
        assert!(approx(acc.value(), 0.55));
    }

    #[test]
    fn test_filtered_max_empty_is_zero() {
        let acc = Accumulator::new(1, AccumulatorMode::FilteredMax).unwrap();
        assert_eq!(acc.value(), 0.0);
    }

    #[test]
    fn test_adb_boundaries() {
        let empty = Accumulator::new(1, AccumulatorMode::Adb).unwrap();
        assert_eq!(empty.value(), 0.0);

        let mut zero = Accumulator::new(1, AccumulatorMode::Adb).unwrap();
        zero.accumulate(0, 0.0, 1.0);
        assert_eq!(zero.value(), -0.5);

        let mut ratio = Accumulator::new(1, AccumulatorMode::Adb).unwrap();
        ratio.accumulate(0, 100.0, 1.0);
        ratio.accumulate(0, 0.0, 1.0);
        assert!(approx(ratio.value(), 50.0_f64.log10()));
    }

    #[test]
    fn test_channel_mean() {
        let mut acc = Accumulator::new(2, AccumulatorMode::Avg).unwrap();
        acc.accumulate(1, 6.0, 1.0);
        acc.accumulate(0, 2.0, 1.0);
        assert_eq!(acc.channel_value(0), 2.0);
        assert_eq!(acc.channel_value(1), 6.0);
        assert_eq!(acc.value(), 4.0);
    }

    #[test]
    fn test_call_counts() {
        let mut acc = Accumulator::new(2, AccumulatorMode::Rms).unwrap();
        acc.accumulate(0, 1.0, 1.0);
        acc.accumulate(0, 1.0, 1.0);
        acc.accumulate(1, 1.0, 1.0);
        assert_eq!(acc.count(0), 2);
        assert_eq!(acc.count(1), 1);
    }

    #[test]
    fn test_tentative_commit() {
        let mut acc = Accumulator::new(1, AccumulatorMode::Avg).unwrap();
        acc.accumulate(0, 1.0, 1.0);

        acc.set_tentative(true);
        assert!(acc.is_tentative());
        acc.accumulate(0, 3.0, 1.0);
        assert_eq!(acc.value(), 1.0);

        acc.set_tentative(false);
        assert!(!acc.is_tentative());
        assert_eq!(acc.value(), 2.0);
    }

    #[test]
    fn test_tentative_rollback() {
        let mut acc = Accumulator::new(1, AccumulatorMode::FilteredMax).unwrap();
        acc.accumulate(0, 0.2, 1.0);

        acc.set_tentative(true);
        acc.accumulate(0, 10.0, 1.0);
        acc.set_tentative(true);
        acc.accumulate(0, 10.0, 1.0);
        assert_eq!(acc.count(0), 3);

        acc.rollback();
        assert!(!acc.is_tentative());
        assert_eq!(acc.count(0), 1);
        assert_eq!(acc.value(), 0.2);
    }

    #[test]
    fn test_rollback_without_tentative_is_noop() {
        let mut acc = Accumulator::new(1, AccumulatorMode::Avg).unwrap();
        acc.accumulate(0, 5.0, 1.0);
        acc.rollback();
        assert_eq!(acc.value(), 5.0);
    }

    #[test]
    fn test_mode_string_roundtrip() {
        for mode in [
            AccumulatorMode::Avg,
            AccumulatorMode::AvgLog,
            AccumulatorMode::Rms,
            AccumulatorMode::RmsAsym,
            AccumulatorMode::AvgWindow,
            AccumulatorMode::FilteredMax,
            AccumulatorMode::Adb,
        ] {
            assert_eq!(AccumulatorMode::from_str(mode.as_str()), Some(mode));
        }
        assert_eq!(AccumulatorMode::from_str("median"), None);
    }
}
