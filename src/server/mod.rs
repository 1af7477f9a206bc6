//! HTTP server layer for PDF Squeezer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │              POST /compress        GET /health                  │
//! │                                                                 │
//! │  ┌───────────────────────────┐  ┌───────────────────────────┐   │
//! │  │         handlers          │  │          routes           │   │
//! │  │ (multipart, validation,   │  │ (CORS, body limit,        │   │
//! │  │  metadata headers)        │  │  tracing)                 │   │
//! │  └───────────────────────────┘  └───────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    allowed_file, compress_handler, health_handler, parse_target_size_mb, sanitize_filename,
    AppState, CompressForm, ErrorResponse, HealthResponse, ALLOWED_EXTENSIONS, METADATA_HEADERS,
};
pub use routes::{create_router, RouterConfig, DEFAULT_MAX_UPLOAD_BYTES};
