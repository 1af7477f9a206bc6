use std::time::Duration;

use thiserror::Error;

/// Errors from a single run of the external compression tool.
#[derive(Debug, Clone, Error)]
pub enum InvokeError {
    /// The tool could not be started
    #[error("Failed to start compression tool: {0}")]
    Spawn(String),

    /// The tool ran but exited unsuccessfully
    #[error("Compression tool exited with {status}: {stderr}")]
    ExitStatus { status: String, stderr: String },

    /// The tool did not finish within the allotted time
    #[error("Compression tool timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The tool reported success but left no readable output
    #[error("Compression tool produced no output at {path}: {reason}")]
    MissingOutput { path: String, reason: String },
}

/// Problems with the uploaded form, reported before any work starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// No `file` field in the form
    #[error("No file part")]
    MissingFile,

    /// The `file` field carried no filename
    #[error("No selected file")]
    EmptyFilename,

    /// The uploaded document has zero bytes
    #[error("Uploaded file is empty")]
    EmptyFile,

    /// The filename does not end in an allowed extension
    #[error("Invalid file type; PDF required")]
    InvalidExtension { filename: String },

    /// `targetSizeMB` was present but not a positive number
    #[error("Invalid targetSizeMB: {value:?}")]
    InvalidTargetSize { value: String },

    /// The multipart body could not be read
    #[error("Malformed upload: {0}")]
    MalformedUpload(String),
}

/// Errors surfaced to callers of the compression service.
#[derive(Debug, Clone, Error)]
pub enum CompressError {
    /// The compression tool was not found at startup
    #[error("Ghostscript not available on server")]
    ServiceUnavailable,

    /// The request was rejected before processing
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The upload exceeds the configured ceiling (should map to HTTP 413)
    #[error("File too large. Max allowed {} MB", .limit / (1024 * 1024))]
    SizeLimitExceeded { limit: u64 },

    /// No usable output could be produced
    #[error("Compression failed: {0}")]
    CompressionFailed(#[from] InvokeError),

    /// Scratch file handling failed
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for CompressError {
    fn from(err: std::io::Error) -> Self {
        CompressError::Io(err.to_string())
    }
}
