//! PDF Squeezer - shrink PDFs toward a target size with Ghostscript.
//!
//! This binary resolves the Ghostscript binary once, then starts the HTTP
//! server.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pdf_squeezer::{
    config::Config,
    server::{create_router, RouterConfig},
    tool::{locate_ghostscript, Compressor, GhostscriptTool, GS_BINARY_CANDIDATES},
    CompressionService,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("PDF Squeezer v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Max upload: {} MB", config.max_upload_mb);
    info!("  Ghostscript timeout: {}s", config.timeout_secs);
    info!("  Max search iterations: {}", config.max_iterations);
    match config.cors_origins {
        Some(ref origins) => info!("  CORS origins: {}", origins.join(", ")),
        None => info!("  CORS origins: any"),
    }

    // Resolved once; every request reuses this decision.
    let service = match locate_ghostscript(config.gs_binary.as_deref()) {
        Some(path) => {
            let tool = GhostscriptTool::new(path);
            info!("  Compressor: {}", tool.describe());
            CompressionService::new(tool)
        }
        None => {
            warn!("  Ghostscript: NOT FOUND - /compress will return 503");
            warn!(
                "        Install Ghostscript so one of {:?} is on PATH, or set --gs-binary",
                GS_BINARY_CANDIDATES
            );
            CompressionService::unavailable()
        }
    }
    .with_settings(config.search_settings());

    let router = create_router(service, build_router_config(&config));

    let addr = config.bind_address();

    info!("");
    info!("  Server listening on: http://{}", addr);
    info!("    curl http://{}/health", addr);
    info!(
        "    curl -F file=@doc.pdf -F quality=medium -F targetSizeMB=2 http://{}/compress -o out.pdf",
        addr
    );
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "pdf_squeezer=debug,tower_http=debug"
    } else {
        "pdf_squeezer=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application Config.
fn build_router_config(config: &Config) -> RouterConfig {
    let mut router_config = RouterConfig::new()
        .with_max_upload_bytes(config.max_upload_bytes())
        .with_tracing(!config.no_tracing);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config
}
