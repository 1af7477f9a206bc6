//! Quality tiers and their fixed (resolution, preset) table.

use std::fmt;
use std::str::FromStr;

use crate::tool::Preset;

/// Lowest resolution the search is allowed to reach.
pub const MIN_RESOLUTION: u32 = 72;

/// Named compression profile chosen by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QualityTier {
    #[default]
    High,
    Medium,
    Low,
}

impl QualityTier {
    /// Starting (and maximum) resolution for this tier.
    pub fn start_resolution(&self) -> u32 {
        match self {
            QualityTier::High => 300,
            QualityTier::Medium => 200,
            QualityTier::Low => 150,
        }
    }

    /// Ghostscript preset paired with this tier.
    pub fn preset(&self) -> Preset {
        match self {
            QualityTier::High => Preset::Prepress,
            QualityTier::Medium => Preset::Printer,
            QualityTier::Low => Preset::Ebook,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            QualityTier::High => "high",
            QualityTier::Medium => "medium",
            QualityTier::Low => "low",
        }
    }

    /// Interpret a form value, falling back to [`QualityTier::High`] when the
    /// value is absent or unrecognized.
    pub fn from_form_value(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QualityTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(QualityTier::High),
            "medium" => Ok(QualityTier::Medium),
            "low" => Ok(QualityTier::Low),
            other => Err(format!("unknown quality tier: {}", other)),
        }
    }
}
