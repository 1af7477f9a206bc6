//! Configuration management for PDF Squeezer.
//!
//! Configuration comes from command-line arguments via clap, with
//! environment variable fallbacks using the `PDF_SQUEEZER_` prefix:
//!
//! - `PDF_SQUEEZER_HOST` - Server bind address (default: 0.0.0.0)
//! - `PDF_SQUEEZER_PORT` - Server port (default: 5000)
//! - `PDF_SQUEEZER_GS_BINARY` - Explicit Ghostscript path (default: search PATH)
//! - `PDF_SQUEEZER_TIMEOUT_SECS` - Per-run Ghostscript timeout (default: 60)
//! - `PDF_SQUEEZER_MAX_ITERATIONS` - Bisection steps per request (default: 8)
//! - `PDF_SQUEEZER_MAX_UPLOAD_MB` - Upload ceiling in MB (default: 200)
//! - `PDF_SQUEEZER_CORS_ORIGINS` - Allowed CORS origins, comma-separated

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::compress::{SearchSettings, DEFAULT_MAX_ITERATIONS};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 5000;

/// Default Ghostscript timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default upload ceiling in megabytes.
pub const DEFAULT_MAX_UPLOAD_MB: u64 = 200;

/// Upper bound accepted for `--max-iterations`.
pub const MAX_ITERATIONS_LIMIT: u32 = 32;

// =============================================================================
// CLI Arguments
// =============================================================================

/// PDF Squeezer - shrink PDFs toward a target size with Ghostscript.
#[derive(Parser, Debug, Clone)]
#[command(name = "pdf-squeezer")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "PDF_SQUEEZER_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "PDF_SQUEEZER_PORT")]
    pub port: u16,

    /// Maximum accepted upload size in megabytes.
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_MB, env = "PDF_SQUEEZER_MAX_UPLOAD_MB")]
    pub max_upload_mb: u64,

    // =========================================================================
    // Ghostscript Configuration
    // =========================================================================
    /// Path to the Ghostscript binary.
    ///
    /// If not specified, `gs`, `gswin64c` and `gswin32c` are looked up on PATH.
    #[arg(long, env = "PDF_SQUEEZER_GS_BINARY")]
    pub gs_binary: Option<PathBuf>,

    /// Timeout for a single Ghostscript run, in seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS, env = "PDF_SQUEEZER_TIMEOUT_SECS")]
    pub timeout_secs: u64,

    /// Maximum bisection steps when searching for a target size.
    #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS, env = "PDF_SQUEEZER_MAX_ITERATIONS")]
    pub max_iterations: u32,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "PDF_SQUEEZER_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }

        if self.max_iterations == 0 || self.max_iterations > MAX_ITERATIONS_LIMIT {
            return Err(format!(
                "max_iterations must be between 1 and {}",
                MAX_ITERATIONS_LIMIT
            ));
        }

        if self.max_upload_mb == 0 {
            return Err("max_upload_mb must be greater than 0".to_string());
        }

        if let Some(ref path) = self.gs_binary {
            if !path.is_file() {
                return Err(format!(
                    "Ghostscript binary not found at {}. \
                     Fix --gs-binary or PDF_SQUEEZER_GS_BINARY, or unset it to search PATH",
                    path.display()
                ));
            }
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Upload ceiling in bytes.
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }

    /// Controller settings derived from the CLI.
    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings::default()
            .with_max_iterations(self.max_iterations)
            .with_timeout(Duration::from_secs(self.timeout_secs))
    }
}

// =============================================================================
// Tests
// =============================================================================
