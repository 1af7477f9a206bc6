//! HTTP request handlers for the PDF Squeezer API.
//!
//! # Endpoints
//!
//! - `POST /compress` - Compress an uploaded PDF
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::compress::{CompressionRequest, CompressionResult, CompressionService, QualityTier};
use crate::error::{CompressError, ValidationError};
use crate::tool::Compressor;

/// File extensions accepted for upload.
pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf"];

/// Metadata headers attached to a successful response.
pub const HEADER_ORIGINAL_SIZE: &str = "x-original-size";
pub const HEADER_COMPRESSED_SIZE: &str = "x-compressed-size";
pub const HEADER_COMPRESSION_RATIO: &str = "x-compression-ratio";
pub const HEADER_QUALITY_USED: &str = "x-quality-used";
pub const HEADER_TARGET_SIZE: &str = "x-target-size";
pub const HEADER_RESOLUTION_USED: &str = "x-resolution-used";

/// All metadata headers, for CORS exposure.
pub const METADATA_HEADERS: &[&str] = &[
    HEADER_ORIGINAL_SIZE,
    HEADER_COMPRESSED_SIZE,
    HEADER_COMPRESSION_RATIO,
    HEADER_QUALITY_USED,
    HEADER_TARGET_SIZE,
    HEADER_RESOLUTION_USED,
];

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the compression service.
pub struct AppState<C: Compressor> {
    /// The controller for compression requests
    pub service: Arc<CompressionService<C>>,

    /// Upload ceiling in bytes
    pub max_upload_bytes: u64,
}

impl<C: Compressor> AppState<C> {
    pub fn new(service: CompressionService<C>, max_upload_bytes: u64) -> Self {
        Self {
            service: Arc::new(service),
            max_upload_bytes,
        }
    }
}

impl<C: Compressor> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            max_upload_bytes: self.max_upload_bytes,
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "validation_error", "compression_failed")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,

    /// Whether the compression tool was found at startup
    pub compressor_available: bool,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert CompressError to HTTP response.
///
/// 4xx errors are logged at WARN level, 5xx errors at ERROR level.
impl IntoResponse for CompressError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            CompressError::ServiceUnavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable")
            }
            CompressError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            CompressError::SizeLimitExceeded { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, "size_limit_exceeded")
            }
            CompressError::CompressionFailed(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "compression_failed")
            }
            CompressError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
        };
        let message = self.to_string();

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);

        (status, Json(error_response)).into_response()
    }
}

/// Map a multipart read failure, treating body-limit hits as oversize uploads.
fn multipart_error(err: MultipartError, limit: u64) -> CompressError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        CompressError::SizeLimitExceeded { limit }
    } else {
        ValidationError::MalformedUpload(err.body_text()).into()
    }
}

// =============================================================================
// Form Parsing
// =============================================================================

/// The fields of a `/compress` form after reading the body.
#[derive(Debug, Default)]
pub struct CompressForm {
    pub filename: Option<String>,
    pub data: Option<Bytes>,
    pub quality: Option<String>,
    pub target_size_mb: Option<String>,
}

impl CompressForm {
    async fn read(mut multipart: Multipart, limit: u64) -> Result<Self, CompressError> {
        let mut form = CompressForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(e, limit))?
        {
            let name = field.name().map(str::to_owned);
            match name.as_deref() {
                Some("file") => {
                    form.filename = Some(field.file_name().unwrap_or_default().to_string());
                    form.data = Some(field.bytes().await.map_err(|e| multipart_error(e, limit))?);
                }
                Some("quality") => {
                    form.quality = Some(field.text().await.map_err(|e| multipart_error(e, limit))?);
                }
                Some("targetSizeMB") => {
                    form.target_size_mb =
                        Some(field.text().await.map_err(|e| multipart_error(e, limit))?);
                }
                other => {
                    debug!(field = ?other, "Ignoring unknown form field");
                }
            }
        }

        Ok(form)
    }
}

/// Whether the filename ends in an allowed extension (case-insensitive).
pub fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Reduce a client-supplied filename to a safe ASCII name.
///
/// Path components are stripped, whitespace becomes `_`, and anything other
/// than ASCII alphanumerics, `.`, `-` and `_` is dropped.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();

    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        "document.pdf".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Parse `targetSizeMB`. Empty means "no target"; anything else must be a
/// finite positive number.
pub fn parse_target_size_mb(value: Option<&str>) -> Result<Option<f64>, ValidationError> {
    let raw = match value.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(raw) => raw,
    };

    match raw.parse::<f64>() {
        Ok(mb) if mb.is_finite() && mb > 0.0 => Ok(Some(mb)),
        _ => Err(ValidationError::InvalidTargetSize {
            value: raw.to_string(),
        }),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle compression requests.
///
/// # Endpoint
///
/// `POST /compress` (multipart/form-data)
///
/// # Form Fields
///
/// - `file`: PDF document (required)
/// - `quality`: `high`, `medium` or `low` (default: high; unknown values fall back to high)
/// - `targetSizeMB`: Desired output size in megabytes (optional, positive)
///
/// # Response
///
/// - `200 OK`: Compressed PDF as an attachment
/// - `400 Bad Request`: Missing file, wrong extension, invalid target size
/// - `413 Payload Too Large`: Upload above the configured ceiling
/// - `500 Internal Server Error`: Ghostscript failed
/// - `503 Service Unavailable`: Ghostscript was not found at startup
///
/// # Headers
///
/// - `X-Original-Size`, `X-Compressed-Size`: sizes in bytes
/// - `X-Compression-Ratio`: compressed / original, 4 decimals
/// - `X-Quality-Used`: tier used
/// - `X-Target-Size`: requested target in MB, when supplied
/// - `X-Resolution-Used`: resolution of the returned document
pub async fn compress_handler<C: Compressor + 'static>(
    State(state): State<AppState<C>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, CompressError> {
    // Fail fast, before touching the body.
    if !state.service.is_available() {
        return Err(CompressError::ServiceUnavailable);
    }

    let multipart =
        multipart.map_err(|e| ValidationError::MalformedUpload(e.body_text()))?;
    let form = CompressForm::read(multipart, state.max_upload_bytes).await?;

    let data = form.data.ok_or(ValidationError::MissingFile)?;
    let filename = form.filename.unwrap_or_default();
    if filename.is_empty() {
        return Err(ValidationError::EmptyFilename.into());
    }
    if !allowed_file(&filename) {
        return Err(ValidationError::InvalidExtension { filename }.into());
    }

    let size = data.len() as u64;
    if size > state.max_upload_bytes {
        return Err(CompressError::SizeLimitExceeded {
            limit: state.max_upload_bytes,
        });
    }
    if size == 0 {
        return Err(ValidationError::EmptyFile.into());
    }

    let quality = QualityTier::from_form_value(form.quality.as_deref());
    let target_mb = parse_target_size_mb(form.target_size_mb.as_deref())?;

    let mut request = CompressionRequest::new(data, quality);
    if let Some(mb) = target_mb {
        request = request.with_target_megabytes(mb);
    }

    debug!(
        filename = %filename,
        size,
        quality = quality.name(),
        target_mb = ?target_mb,
        "Compression request"
    );

    let result = state.service.compress(request).await?;
    let download_name = format!("compressed_{}", sanitize_filename(&filename));

    Ok(build_pdf_response(result, &download_name, target_mb))
}

fn build_pdf_response(result: CompressionResult, download_name: &str, target_mb: Option<f64>) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", download_name);

    let mut response = (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        result.data.clone(),
    )
        .into_response();

    let headers = response.headers_mut();
    let mut set = |name: &'static str, value: String| {
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(name, value);
        }
    };

    set(HEADER_ORIGINAL_SIZE, result.original_size.to_string());
    set(HEADER_COMPRESSED_SIZE, result.compressed_size.to_string());
    set(HEADER_COMPRESSION_RATIO, result.ratio_display());
    set(HEADER_QUALITY_USED, result.quality.name().to_string());
    set(HEADER_RESOLUTION_USED, result.resolution.to_string());
    // Echoed with a decimal point, e.g. "5.0".
    if let Some(mb) = target_mb {
        set(HEADER_TARGET_SIZE, format!("{:?}", mb));
    }

    response
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "compressor_available": true
/// }
/// ```
pub async fn health_handler<C: Compressor + 'static>(
    State(state): State<AppState<C>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        compressor_available: state.service.is_available(),
    })
}

// =============================================================================
// Tests
// =============================================================================
