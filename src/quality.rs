use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, str::FromStr};

/// Discrete video resolution bucket used to pick an emission rate.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QualityTier {
    #[serde(rename = "360p")]
    P360,
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "1440p")]
    P1440,
    #[serde(rename = "2160p")]
    P2160,
}

impl Default for QualityTier {
    fn default() -> Self {
        QualityTier::P480
    }
}

impl QualityTier {
    pub const ALL: [QualityTier; 6] = [
        QualityTier::P360,
        QualityTier::P480,
        QualityTier::P720,
        QualityTier::P1080,
        QualityTier::P1440,
        QualityTier::P2160,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::P360 => "360p",
            QualityTier::P480 => "480p",
            QualityTier::P720 => "720p",
            QualityTier::P1080 => "1080p",
            QualityTier::P1440 => "1440p",
            QualityTier::P2160 => "2160p",
        }
    }

    /// Parses a wire label, falling back to the default tier for anything unrecognised.
    pub fn from_label(label: &str) -> Self {
        label.parse().unwrap_or_default()
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTier(pub String);

impl fmt::Display for UnknownTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown quality tier '{}'", self.0)
    }
}

impl std::error::Error for UnknownTier {}

impl FromStr for QualityTier {
    type Err = UnknownTier;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        QualityTier::ALL
            .into_iter()
            .find(|tier| tier.as_str() == value.trim())
            .ok_or_else(|| UnknownTier(value.to_string()))
    }
}

// Reporters in the wild send arbitrary labels, or none at all; either is billed at the default rate.
impl<'de> Deserialize<'de> for QualityTier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let label = Option::<String>::deserialize(deserializer)?;
        Ok(label
            .as_deref()
            .map(QualityTier::from_label)
            .unwrap_or_default())
    }
}

/// Maps a decoded frame height to its tier. Missing or zero height
/// (metadata not loaded yet) maps to the default tier.
pub fn classify(pixel_height: Option<u32>) -> QualityTier {
    match pixel_height {
        None | Some(0) => QualityTier::default(),
        Some(h) if h <= 360 => QualityTier::P360,
        Some(h) if h <= 480 => QualityTier::P480,
        Some(h) if h <= 720 => QualityTier::P720,
        Some(h) if h <= 1080 => QualityTier::P1080,
        Some(h) if h <= 1440 => QualityTier::P1440,
        Some(_) => QualityTier::P2160,
    }
}
