//! Conformance settings
//!
//! BS.1387 leaves a few details open, and published implementations disagree
//! on them. Each such choice is a field here so both variants can be selected
//! and tested at runtime.
//!
//! # Example
//!
//! ```rust
//! use peaq_core::{ConformanceSettings, EhsWindow};
//!
//! let settings = ConformanceSettings::from_toml_str(r#"
//!     ehs_window = "lag_zero_centered"
//!     swap_modulation_patterns = false
//! "#).unwrap();
//!
//! assert_eq!(settings.ehs_window, EhsWindow::LagZeroCentered);
//! assert!(!settings.swap_modulation_patterns);
//! ```

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Shape of the raised-cosine window applied to the EHS correlation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EhsWindow {
    /// Hann window over the 256 lags, peaking in the middle of the range
    #[default]
    ClipCentered,
    /// Half of a 511-point Hann window, peaking at lag zero
    LagZeroCentered,
}

impl EhsWindow {
    /// Convert to string for settings persistence
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClipCentered => "clip_centered",
            Self::LagZeroCentered => "lag_zero_centered",
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "clip_centered" | "clip" | "standard" => Some(Self::ClipCentered),
            "lag_zero_centered" | "lag_zero" | "kabal" => Some(Self::LagZeroCentered),
            _ => None,
        }
    }
}

/// When the mean of the normalised EHS correlation is removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EhsDcRemoval {
    /// Subtract the mean before windowing (closer to the reference data)
    #[default]
    BeforeWindow,
    /// Window first, then zero the DC bin of the spectrum
    AfterWindow,
}

impl EhsDcRemoval {
    /// Convert to string for settings persistence
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BeforeWindow => "before_window",
            Self::AfterWindow => "after_window",
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "before_window" | "before" => Some(Self::BeforeWindow),
            "after_window" | "after" => Some(Self::AfterWindow),
            _ => None,
        }
    }
}

/// Rounding of the level difference when counting detection steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepRounding {
    /// Round toward zero
    #[default]
    Truncate,
    /// Round toward negative infinity
    Floor,
}

impl StepRounding {
    /// Apply the rounding to a level difference in dB
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            Self::Truncate => value.trunc(),
            Self::Floor => value.floor(),
        }
    }

    /// Convert to string for settings persistence
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Truncate => "truncate",
            Self::Floor => "floor",
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "truncate" | "trunc" => Some(Self::Truncate),
            "floor" => Some(Self::Floor),
            _ => None,
        }
    }
}

/// Runtime selection of the conformance variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConformanceSettings {
    /// Window applied to the EHS correlation
    pub ehs_window: EhsWindow,

    /// Whether the EHS mean is removed before or after windowing
    pub ehs_dc_removal: EhsDcRemoval,

    /// Use the test modulation pattern in the reference role for the missing
    /// components term of RmsNoiseLoudAsymA, and the reference modulation
    /// pattern in both roles for AvgLinDistA
    pub swap_modulation_patterns: bool,

    /// Rounding used for the number of steps above threshold (ADBB)
    pub step_rounding: StepRounding,
}

impl Default for ConformanceSettings {
    fn default() -> Self {
        Self {
            ehs_window: EhsWindow::ClipCentered,
            ehs_dc_removal: EhsDcRemoval::BeforeWindow,
            swap_modulation_patterns: true,
            step_rounding: StepRounding::Truncate,
        }
    }
}

impl ConformanceSettings {
    /// Variant following Kabal's reading of the standard
    ///
    /// The EHS window peaks at lag zero and the DC component is removed after
    /// windowing.
    pub fn kabal() -> Self {
        Self {
            ehs_window: EhsWindow::LagZeroCentered,
            ehs_dc_removal: EhsDcRemoval::AfterWindow,
            ..Self::default()
        }
    }

    /// Parse settings from a TOML document
    ///
    /// Missing keys keep their default value.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let settings: Self = toml::from_str(s)?;
        Ok(settings)
    }

    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let settings = Self::from_toml_str(&contents)?;
        debug!("Loaded conformance settings from {:?}: {:?}", path, settings);
        Ok(settings)
    }

    /// Serialize settings to a TOML document
    pub fn to_toml_string(&self) -> String {
        // cannot fail: all fields are unit enums or bools
        toml::to_string(self).unwrap_or_default()
    }
}
