//! # PDF Squeezer
//!
//! An HTTP service that shrinks PDF documents with Ghostscript.
//!
//! Clients upload a PDF with a quality tier and, optionally, a target size.
//! Without a target the document is rewritten once at the tier's resolution.
//! With a target below the original size, a bounded bisection over the image
//! resolution steers Ghostscript's output toward the requested size, keeping
//! the closest result it sees.
//!
//! ## Architecture
//!
//! - [`tool`] - The [`Compressor`](tool::Compressor) trait, the Ghostscript
//!   implementation and binary discovery
//! - [`compress`] - Quality tiers, bisection state and the controller
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//! - [`error`] - Error types shared across layers
//!
//! ## Example
//!
//! ```rust,no_run
//! use pdf_squeezer::{create_router, locate_ghostscript, CompressionService, GhostscriptTool, RouterConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let service = match locate_ghostscript(None) {
//!         Some(path) => CompressionService::new(GhostscriptTool::new(path)),
//!         None => CompressionService::unavailable(),
//!     };
//!
//!     let router = create_router(service, RouterConfig::new());
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod compress;
pub mod config;
pub mod error;
pub mod server;
pub mod tool;

// Re-export commonly used types
pub use compress::{
    Candidate, CompressionRequest, CompressionResult, CompressionService, QualityTier,
    SearchSettings, SearchState, SearchStep, MIN_RESOLUTION,
};
pub use config::Config;
pub use error::{CompressError, InvokeError, ValidationError};
pub use server::{create_router, AppState, ErrorResponse, HealthResponse, RouterConfig};
pub use tool::{locate_ghostscript, Compressor, GhostscriptTool, Preset};
