//! Ghostscript-backed compressor.
//!
//! Each call spawns one `gs` child process with a fixed `pdfwrite` flag set.
//! The child is killed if it outlives the timeout.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{knob_value, Compressor, Preset};
use crate::error::InvokeError;

/// Maximum number of stderr bytes kept in an error message.
const STDERR_LIMIT: usize = 512;

/// Build the Ghostscript argument list (without the binary itself).
///
/// Output and input paths are the last two arguments, in that order.
pub fn ghostscript_args(
    input: &Path,
    output: &Path,
    resolution: f64,
    preset: Preset,
) -> Vec<OsString> {
    let dpi = knob_value(resolution);

    let mut args: Vec<OsString> = [
        "-dNOPAUSE".to_string(),
        "-dBATCH".to_string(),
        "-dQUIET".to_string(),
        "-sDEVICE=pdfwrite".to_string(),
        "-dCompatibilityLevel=1.4".to_string(),
        format!("-dPDFSETTINGS={}", preset.pdf_settings()),
        "-dAutoRotatePages=/None".to_string(),
        "-dDownsampleColorImages=true".to_string(),
        "-dDownsampleGrayImages=true".to_string(),
        "-dDownsampleMonoImages=true".to_string(),
        "-dColorImageDownsampleType=/Bicubic".to_string(),
        "-dGrayImageDownsampleType=/Bicubic".to_string(),
        "-dMonoImageDownsampleType=/Subsample".to_string(),
        format!("-dColorImageResolution={}", dpi),
        format!("-dGrayImageResolution={}", dpi),
        format!("-dMonoImageResolution={}", dpi),
        "-dDetectDuplicateImages=true".to_string(),
        "-dEmbedAllFonts=true".to_string(),
        "-dSubsetFonts=true".to_string(),
    ]
    .into_iter()
    .map(OsString::from)
    .collect();

    let mut output_flag = OsString::from("-sOutputFile=");
    output_flag.push(output.as_os_str());
    args.push(output_flag);
    args.push(input.as_os_str().to_os_string());

    args
}

/// Compressor that shells out to a Ghostscript binary.
#[derive(Debug, Clone)]
pub struct GhostscriptTool {
    binary: PathBuf,
}

impl GhostscriptTool {
    /// Create a tool around an already-resolved binary path.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Path to the Ghostscript binary.
    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

#[async_trait]
impl Compressor for GhostscriptTool {
    async fn compress(
        &self,
        input: &Path,
        output: &Path,
        resolution: f64,
        preset: Preset,
        timeout: Duration,
    ) -> Result<(), InvokeError> {
        debug!(
            binary = %self.binary.display(),
            dpi = knob_value(resolution),
            preset = preset.name(),
            "Running Ghostscript"
        );

        let child = Command::new(&self.binary)
            .args(ghostscript_args(input, output, resolution, preset))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| InvokeError::Spawn(e.to_string()))?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let result = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| InvokeError::Timeout(timeout))?
            .map_err(|e| InvokeError::Spawn(e.to_string()))?;

        if !result.status.success() {
            let mut stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
            if stderr.len() > STDERR_LIMIT {
                let mut cut = STDERR_LIMIT;
                while !stderr.is_char_boundary(cut) {
                    cut -= 1;
                }
                stderr.truncate(cut);
            }
            return Err(InvokeError::ExitStatus {
                status: result.status.to_string(),
                stderr,
            });
        }

        tokio::fs::metadata(output)
            .await
            .map_err(|e| InvokeError::MissingOutput {
                path: output.display().to_string(),
                reason: e.to_string(),
            })?;

        Ok(())
    }

    fn describe(&self) -> String {
        format!("Ghostscript ({})", self.binary.display())
    }
}
