//! Names of the model output variables

use crate::accumulator::AccumulatorMode;
use std::fmt;

/// A model output variable of the Basic or Advanced PEAQ version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mov {
    BandwidthRefB,
    BandwidthTestB,
    TotalNmrB,
    SegmentalNmrB,
    WinModDiff1B,
    AvgModDiff1B,
    AvgModDiff2B,
    RmsModDiffA,
    RmsNoiseLoudB,
    RmsNoiseLoudAsymA,
    AvgLinDistA,
    RelDistFramesB,
    AdbB,
    MfpdB,
    EhsB,
}

impl Mov {
    /// MOVs of the Basic version in regression input order
    pub const BASIC: [Mov; 11] = [
        Mov::BandwidthRefB,
        Mov::BandwidthTestB,
        Mov::TotalNmrB,
        Mov::WinModDiff1B,
        Mov::AdbB,
        Mov::EhsB,
        Mov::AvgModDiff1B,
        Mov::AvgModDiff2B,
        Mov::RmsNoiseLoudB,
        Mov::MfpdB,
        Mov::RelDistFramesB,
    ];

    /// MOVs of the Advanced version in regression input order
    pub const ADVANCED: [Mov; 5] = [
        Mov::RmsModDiffA,
        Mov::RmsNoiseLoudAsymA,
        Mov::SegmentalNmrB,
        Mov::EhsB,
        Mov::AvgLinDistA,
    ];

    /// Name as used in BS.1387
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BandwidthRefB => "BandwidthRefB",
            Self::BandwidthTestB => "BandwidthTestB",
            Self::TotalNmrB => "Total NMRB",
            Self::SegmentalNmrB => "Segmental NMRB",
            Self::WinModDiff1B => "WinModDiff1B",
            Self::AvgModDiff1B => "AvgModDiff1B",
            Self::AvgModDiff2B => "AvgModDiff2B",
            Self::RmsModDiffA => "RmsModDiffA",
            Self::RmsNoiseLoudB => "RmsNoiseLoudB",
            Self::RmsNoiseLoudAsymA => "RmsNoiseLoudAsymA",
            Self::AvgLinDistA => "AvgLinDistA",
            Self::RelDistFramesB => "RelDistFramesB",
            Self::AdbB => "ADBB",
            Self::MfpdB => "MFPDB",
            Self::EhsB => "EHSB",
        }
    }

    /// Parse from string, ignoring case and spaces
    pub fn from_str(s: &str) -> Option<Self> {
        let key: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "bandwidthrefb" => Some(Self::BandwidthRefB),
            "bandwidthtestb" => Some(Self::BandwidthTestB),
            "totalnmrb" => Some(Self::TotalNmrB),
            "segmentalnmrb" => Some(Self::SegmentalNmrB),
            "winmoddiff1b" => Some(Self::WinModDiff1B),
            "avgmoddiff1b" => Some(Self::AvgModDiff1B),
            "avgmoddiff2b" => Some(Self::AvgModDiff2B),
            "rmsmoddiffa" => Some(Self::RmsModDiffA),
            "rmsnoiseloudb" => Some(Self::RmsNoiseLoudB),
            "rmsnoiseloudasyma" => Some(Self::RmsNoiseLoudAsymA),
            "avglindista" => Some(Self::AvgLinDistA),
            "reldistframesb" => Some(Self::RelDistFramesB),
            "adbb" => Some(Self::AdbB),
            "mfpdb" => Some(Self::MfpdB),
            "ehsb" => Some(Self::EhsB),
            _ => None,
        }
    }

    /// Averaging law used for this MOV
    pub fn accumulator_mode(&self) -> AccumulatorMode {
        match self {
            Self::BandwidthRefB
            | Self::BandwidthTestB
            | Self::SegmentalNmrB
            | Self::AvgModDiff1B
            | Self::AvgModDiff2B
            | Self::AvgLinDistA
            | Self::RelDistFramesB
            | Self::EhsB => AccumulatorMode::Avg,
            Self::TotalNmrB => AccumulatorMode::AvgLog,
            Self::WinModDiff1B => AccumulatorMode::AvgWindow,
            Self::RmsModDiffA | Self::RmsNoiseLoudB => AccumulatorMode::Rms,
            Self::RmsNoiseLoudAsymA => AccumulatorMode::RmsAsym,
            Self::AdbB => AccumulatorMode::Adb,
            Self::MfpdB => AccumulatorMode::FilteredMax,
        }
    }

    /// Whether the MOV combines all channels into a single value per frame
    pub fn is_binaural(&self) -> bool {
        matches!(self, Self::AdbB | Self::MfpdB)
    }

    /// Accumulator channel count for an evaluation of `channels` channels
    pub fn accumulator_channels(&self, channels: usize) -> usize {
        if self.is_binaural() {
            1
        } else {
            channels
        }
    }
}

impl fmt::Display for Mov {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
