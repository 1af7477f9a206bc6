//! External compression tool layer.
//!
//! The controller never talks to Ghostscript directly. It goes through the
//! [`Compressor`] trait so that search logic can be exercised against a
//! deterministic fake.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          CompressionService             │
//! └────────────────────┬────────────────────┘
//!                      │ compress(in, out, dpi, preset, timeout)
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │           Compressor Trait              │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │  GhostscriptTool (child process + kill  │
//! │  on timeout)                            │
//! └─────────────────────────────────────────┘
//! ```

mod ghostscript;
mod locate;

use std::fmt;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::InvokeError;

pub use ghostscript::{ghostscript_args, GhostscriptTool};
pub use locate::{find_in_dirs, locate_ghostscript, GS_BINARY_CANDIDATES};

// =============================================================================
// Presets
// =============================================================================

/// Ghostscript `PDFSETTINGS` profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    Prepress,
    Printer,
    Ebook,
}

impl Preset {
    /// Short name of the preset (e.g. "printer").
    pub fn name(&self) -> &'static str {
        match self {
            Preset::Prepress => "prepress",
            Preset::Printer => "printer",
            Preset::Ebook => "ebook",
        }
    }

    /// Value as passed to `-dPDFSETTINGS`.
    pub fn pdf_settings(&self) -> &'static str {
        match self {
            Preset::Prepress => "/prepress",
            Preset::Printer => "/printer",
            Preset::Ebook => "/ebook",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Truncate a (possibly fractional) resolution to the integer knob value the
/// tool receives.
pub fn knob_value(resolution: f64) -> u32 {
    if resolution.is_finite() && resolution > 0.0 {
        resolution.trunc() as u32
    } else {
        0
    }
}

// =============================================================================
// Compressor Trait
// =============================================================================

/// A single, synchronous-from-the-caller's-view run of a compression tool.
///
/// On `Ok(())` a readable file exists at `output`. Implementations must not
/// retry; the caller owns retry and search policy.
#[async_trait]
pub trait Compressor: Send + Sync {
    async fn compress(
        &self,
        input: &Path,
        output: &Path,
        resolution: f64,
        preset: Preset,
        timeout: Duration,
    ) -> Result<(), InvokeError>;

    /// Human-readable description of the tool, for logs.
    fn describe(&self) -> String {
        "compressor".to_string()
    }
}
