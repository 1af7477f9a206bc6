//! Router configuration for PDF Squeezer.
//!
//! # Route Structure
//!
//! ```text
//! /health     - Health check (GET)
//! /compress   - Compress an uploaded PDF (POST, multipart/form-data)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use pdf_squeezer::compress::CompressionService;
//! use pdf_squeezer::server::{create_router, RouterConfig};
//! use pdf_squeezer::tool::GhostscriptTool;
//!
//! let service = CompressionService::new(GhostscriptTool::new("/usr/bin/gs"));
//! let config = RouterConfig::new()
//!     .with_cors_origins(vec!["https://example.com".to_string()]);
//!
//! let router = create_router(service, config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use http::header::{HeaderName, CONTENT_DISPOSITION, CONTENT_TYPE};
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{compress_handler, health_handler, AppState, METADATA_HEADERS};
use crate::compress::CompressionService;
use crate::tool::Compressor;

/// Default upload ceiling (200 MB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 200 * 1024 * 1024;

/// Extra body allowance for multipart boundaries and the small text fields.
const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Clone, Debug)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Largest document accepted, in bytes
    pub max_upload_bytes: u64,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterConfig {
    /// Create a router configuration with defaults.
    ///
    /// By default:
    /// - CORS allows any origin
    /// - Uploads up to 200 MB are accepted
    /// - Tracing is enabled
    pub fn new() -> Self {
        Self {
            cors_origins: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            enable_tracing: true,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Allow any CORS origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    /// Set the upload ceiling in bytes.
    pub fn with_max_upload_bytes(mut self, bytes: u64) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }

    /// Body limit handed to axum: the upload ceiling plus multipart framing.
    fn body_limit(&self) -> usize {
        let limit = self.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES);
        usize::try_from(limit).unwrap_or(usize::MAX)
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// # Arguments
///
/// * `service` - The compression controller, available or not
/// * `config` - Router configuration
pub fn create_router<C>(service: CompressionService<C>, config: RouterConfig) -> Router
where
    C: Compressor + 'static,
{
    let app_state = AppState::new(service, config.max_upload_bytes);
    let cors = build_cors_layer(&config);

    let router = Router::new()
        .route("/health", get(health_handler::<C>))
        .route("/compress", post(compress_handler::<C>))
        .with_state(app_state)
        .layer(DefaultBodyLimit::max(config.body_limit()))
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let exposed: Vec<HeaderName> = METADATA_HEADERS
        .iter()
        .copied()
        .map(HeaderName::from_static)
        .chain([CONTENT_DISPOSITION])
        .collect();

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .expose_headers(exposed)
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => {
            // No origins allowed - this effectively disables CORS
            cors
        }
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
