//! Size-targeting compression controller.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     CompressionService                          │
//! │  ┌─────────────────────────────────────────────────────────┐    │
//! │  │                    compress()                           │    │
//! │  │  1. Check tool        3. Single pass or bisection       │    │
//! │  │  2. Scratch dir       4. Fallback at MIN_RESOLUTION     │    │
//! │  └─────────────────────────────────────────────────────────┘    │
//! │           │                    │                                │
//! │           ▼                    ▼                                │
//! │    ┌─────────────┐     ┌──────────────┐                         │
//! │    │ SearchState │     │  Compressor  │                         │
//! │    └─────────────┘     └──────────────┘                         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, info, warn};

use super::search::{Candidate, SearchState, SearchStep};
use super::tier::{QualityTier, MIN_RESOLUTION};
use crate::error::{CompressError, InvokeError, ValidationError};
use crate::tool::{knob_value, Compressor, Preset};

/// Default cap on bisection steps per request.
pub const DEFAULT_MAX_ITERATIONS: u32 = 8;

/// Default "close enough" distance to the target (10 KiB).
pub const DEFAULT_TOLERANCE_BYTES: u64 = 10 * 1024;

/// Default wall-clock limit for one tool run.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(60);

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

const INPUT_FILE_NAME: &str = "input.pdf";

// =============================================================================
// Search Settings
// =============================================================================

/// Tunables for the controller. All requests served by one service share them.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    /// Lower bound of the resolution bracket and the fallback resolution
    pub min_resolution: u32,

    /// Maximum number of bisection steps
    pub max_iterations: u32,

    /// Candidates this close to the target end the search
    pub tolerance_bytes: u64,

    /// Timeout for each tool run
    pub timeout: Duration,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            min_resolution: MIN_RESOLUTION,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance_bytes: DEFAULT_TOLERANCE_BYTES,
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }
}

impl SearchSettings {
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_tolerance_bytes(mut self, tolerance_bytes: u64) -> Self {
        self.tolerance_bytes = tolerance_bytes;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// =============================================================================
// Request / Result
// =============================================================================

/// An uploaded document and how to compress it.
#[derive(Debug, Clone)]
pub struct CompressionRequest {
    /// Raw document bytes
    pub data: Bytes,

    /// Size of `data` in bytes
    pub original_size: u64,

    /// Requested quality tier
    pub quality: QualityTier,

    /// Desired output size in bytes
    pub target_size: Option<u64>,
}

impl CompressionRequest {
    pub fn new(data: impl Into<Bytes>, quality: QualityTier) -> Self {
        let data = data.into();
        Self {
            original_size: data.len() as u64,
            data,
            quality,
            target_size: None,
        }
    }

    pub fn with_target_size(mut self, target_size: u64) -> Self {
        self.target_size = Some(target_size);
        self
    }

    /// Set the target from a megabyte value (1 MB = 1024 * 1024 bytes).
    pub fn with_target_megabytes(self, megabytes: f64) -> Self {
        self.with_target_size(megabytes_to_bytes(megabytes))
    }

    /// The target to search for, or `None` when a single pass suffices.
    pub fn search_target(&self) -> Option<u64> {
        self.target_size
            .filter(|&target| target < self.original_size)
    }
}

/// Convert megabytes to whole bytes, truncating.
pub fn megabytes_to_bytes(megabytes: f64) -> u64 {
    (megabytes * BYTES_PER_MB) as u64
}

/// The compressed document and what it took to produce it.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionResult {
    pub data: Bytes,
    pub original_size: u64,
    pub compressed_size: u64,

    /// `compressed_size / original_size`
    pub ratio: f64,

    pub quality: QualityTier,

    /// Integer resolution the returned document was produced at
    pub resolution: u32,

    /// Target size in bytes, echoed when one was supplied
    pub target_size: Option<u64>,
}

impl CompressionResult {
    fn from_candidate(request: &CompressionRequest, candidate: Candidate) -> Self {
        let compressed_size = candidate.size();
        let ratio = if request.original_size == 0 {
            0.0
        } else {
            compressed_size as f64 / request.original_size as f64
        };

        Self {
            data: candidate.data,
            original_size: request.original_size,
            compressed_size,
            ratio,
            quality: request.quality,
            resolution: candidate.resolution,
            target_size: request.target_size,
        }
    }

    /// Ratio formatted to four decimal places.
    pub fn ratio_display(&self) -> String {
        format!("{:.4}", self.ratio)
    }
}

// =============================================================================
// Compression Service
// =============================================================================

/// Drives a [`Compressor`] toward a target output size.
///
/// The service is constructed once at startup. When the tool could not be
/// found it is built with [`CompressionService::unavailable`] and every
/// request fails fast with [`CompressError::ServiceUnavailable`].
///
/// # Example
///
/// ```ignore
/// use pdf_squeezer::compress::{CompressionRequest, CompressionService, QualityTier};
/// use pdf_squeezer::tool::GhostscriptTool;
///
/// let service = CompressionService::new(GhostscriptTool::new("/usr/bin/gs"));
/// let request = CompressionRequest::new(pdf_bytes, QualityTier::Medium)
///     .with_target_megabytes(5.0);
/// let result = service.compress(request).await?;
/// println!("{} -> {} bytes at {} dpi", result.original_size, result.compressed_size, result.resolution);
/// ```
pub struct CompressionService<C: Compressor> {
    compressor: Option<C>,
    settings: SearchSettings,
}

impl<C: Compressor> CompressionService<C> {
    /// Create a service around an available tool with default settings.
    pub fn new(compressor: C) -> Self {
        Self {
            compressor: Some(compressor),
            settings: SearchSettings::default(),
        }
    }

    /// Create a service whose tool was not found.
    pub fn unavailable() -> Self {
        Self {
            compressor: None,
            settings: SearchSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: SearchSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn is_available(&self) -> bool {
        self.compressor.is_some()
    }

    pub fn compressor(&self) -> Option<&C> {
        self.compressor.as_ref()
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Compress a document, searching for the target size if one applies.
    ///
    /// Scratch files live in a temporary directory that is removed when this
    /// call returns, whatever the outcome.
    ///
    /// # Errors
    ///
    /// - [`CompressError::ServiceUnavailable`] if no tool was found at startup
    /// - [`CompressError::Validation`] if the document is empty
    /// - [`CompressError::CompressionFailed`] if the single pass or the
    ///   fallback pass fails
    /// - [`CompressError::Io`] if scratch files cannot be written
    pub async fn compress(
        &self,
        request: CompressionRequest,
    ) -> Result<CompressionResult, CompressError> {
        let compressor = self
            .compressor
            .as_ref()
            .ok_or(CompressError::ServiceUnavailable)?;

        if request.data.is_empty() {
            return Err(ValidationError::EmptyFile.into());
        }

        let workspace = tempfile::Builder::new()
            .prefix("pdf-squeezer-")
            .tempdir()?;
        let input = workspace.path().join(INPUT_FILE_NAME);
        tokio::fs::write(&input, &request.data).await?;

        let start = request.quality.start_resolution();
        let preset = request.quality.preset();

        let candidate = match request.search_target() {
            None => {
                let output = workspace.path().join("compressed.pdf");
                self.attempt(compressor, &input, &output, f64::from(start), preset)
                    .await?
            }
            Some(target) => {
                self.search(compressor, &input, workspace.path(), target, start, preset)
                    .await?
            }
        };

        let result = CompressionResult::from_candidate(&request, candidate);

        info!(
            quality = result.quality.name(),
            dpi = result.resolution,
            original = result.original_size,
            compressed = result.compressed_size,
            ratio = %result.ratio_display(),
            "Compressed document"
        );

        Ok(result)
    }

    /// Bisect the resolution knob toward `target`, then fall back to the
    /// minimum resolution if nothing was produced.
    async fn search(
        &self,
        compressor: &C,
        input: &Path,
        scratch: &Path,
        target: u64,
        start: u32,
        preset: Preset,
    ) -> Result<Candidate, CompressError> {
        let mut state = SearchState::new(
            self.settings.min_resolution,
            start,
            target,
            self.settings.tolerance_bytes,
        );

        for iteration in 0..self.settings.max_iterations {
            let mid = state.midpoint();
            let output = scratch.join(format!("candidate_{}.pdf", iteration));

            let candidate = match self.attempt(compressor, input, &output, mid, preset).await {
                Ok(candidate) => candidate,
                Err(err) => {
                    warn!(
                        iteration,
                        dpi = knob_value(mid),
                        "Compression attempt failed, ending search: {}",
                        err
                    );
                    break;
                }
            };

            let size = candidate.size();
            let step = state.record(mid, candidate);
            let (low, high) = state.bounds();

            debug!(
                iteration,
                dpi = knob_value(mid),
                size,
                target,
                low,
                high,
                step = ?step,
                "Search step"
            );

            if step != SearchStep::Continue {
                break;
            }
        }

        let iterations = state.iterations();
        let best_distance = state.best_distance();

        match state.into_best() {
            Some(best) => {
                debug!(
                    iterations,
                    dpi = best.resolution,
                    distance = best_distance,
                    "Search finished"
                );
                Ok(best)
            }
            None => {
                let min = self.settings.min_resolution;
                warn!(dpi = min, "Search produced no candidate, running fallback pass");
                let output = scratch.join("fallback.pdf");
                let candidate = self
                    .attempt(compressor, input, &output, f64::from(min), preset)
                    .await?;
                Ok(candidate)
            }
        }
    }

    /// Run the tool once and load its output.
    async fn attempt(
        &self,
        compressor: &C,
        input: &Path,
        output: &Path,
        resolution: f64,
        preset: Preset,
    ) -> Result<Candidate, InvokeError> {
        compressor
            .compress(input, output, resolution, preset, self.settings.timeout)
            .await?;

        let data = tokio::fs::read(output)
            .await
            .map_err(|e| InvokeError::MissingOutput {
                path: output.display().to_string(),
                reason: e.to_string(),
            })?;

        Ok(Candidate::new(Bytes::from(data), knob_value(resolution)))
    }
}

// =============================================================================
// Tests
// =============================================================================
