//! API integration tests for `/compress` and `/health`.
//!
//! Tests verify:
//! - Successful single-pass and targeted compression with metadata headers
//! - Validation errors and their status codes
//! - Fast failure when Ghostscript is unavailable

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use pdf_squeezer::compress::CompressionService;
use pdf_squeezer::{create_router, RouterConfig};

use super::test_utils::{fake_pdf, FakeCompressor, MultipartBuilder, MB};

fn router_with(fake: &FakeCompressor) -> Router {
    create_router(
        CompressionService::new(fake.clone()),
        RouterConfig::new().with_tracing(false),
    )
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_reports_availability() {
    let fake = FakeCompressor::linear(1_000);
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = router_with(&fake).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["compressor_available"], true);
}

// =============================================================================
// Successful Compression
// =============================================================================

#[tokio::test]
async fn test_single_pass_default_quality() {
    // Scenario A: 10 MB, no target, default tier.
    let fake = FakeCompressor::linear(20_000);
    let request = MultipartBuilder::new()
        .file("file", "report.pdf", &fake_pdf(10 * MB))
        .into_request();

    let response = router_with(&fake).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers().clone();
    assert_eq!(headers["content-type"], "application/pdf");
    assert_eq!(
        headers["content-disposition"],
        "attachment; filename=\"compressed_report.pdf\""
    );
    assert_eq!(headers["x-original-size"], (10 * MB).to_string().as_str());
    assert_eq!(headers["x-compressed-size"], "6000000");
    assert_eq!(headers["x-quality-used"], "high");
    assert_eq!(headers["x-resolution-used"], "300");
    assert!(headers.get("x-target-size").is_none());

    let ratio: f64 = headers["x-compression-ratio"].to_str().unwrap().parse().unwrap();
    assert!(ratio < 1.0);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(body.len(), 6_000_000);
    assert!(body.starts_with(b"%PDF"));

    let calls = fake.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].dpi, 300);
}

#[tokio::test]
async fn test_quality_is_case_insensitive_and_falls_back() {
    let fake = FakeCompressor::linear(100);
    let request = MultipartBuilder::new()
        .file("file", "a.pdf", &fake_pdf(50_000))
        .text("quality", "LOW")
        .into_request();
    let response = router_with(&fake).oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-quality-used"], "low");
    assert_eq!(response.headers()["x-resolution-used"], "150");

    let fake = FakeCompressor::linear(100);
    let request = MultipartBuilder::new()
        .file("file", "a.pdf", &fake_pdf(50_000))
        .text("quality", "extreme")
        .into_request();
    let response = router_with(&fake).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-quality-used"], "high");
}

#[tokio::test]
async fn test_target_above_original_is_single_pass() {
    // Scenario C: target >= original behaves like no target, but is echoed.
    let fake = FakeCompressor::linear(1_000);
    let request = MultipartBuilder::new()
        .file("file", "small.pdf", &fake_pdf(MB))
        .text("quality", "medium")
        .text("targetSizeMB", "2")
        .into_request();

    let response = router_with(&fake).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-target-size"], "2.0");
    assert_eq!(response.headers()["x-resolution-used"], "200");
    assert_eq!(fake.call_count(), 1);
}

#[tokio::test]
async fn test_targeted_compression_headers() {
    // Scenario B: 10 MB original, 5 MB target, medium tier.
    let fake = FakeCompressor::linear(40_000);
    let request = MultipartBuilder::new()
        .file("file", "scan.PDF", &fake_pdf(10 * MB))
        .text("quality", "medium")
        .text("targetSizeMB", "5")
        .into_request();

    let response = router_with(&fake).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(headers["x-target-size"], "5.0");
    assert_eq!(headers["x-quality-used"], "medium");

    let dpi: u32 = headers["x-resolution-used"].to_str().unwrap().parse().unwrap();
    assert!((72..=200).contains(&dpi));

    let compressed: u64 = headers["x-compressed-size"].to_str().unwrap().parse().unwrap();
    let original: u64 = headers["x-original-size"].to_str().unwrap().parse().unwrap();
    let expected_ratio = format!("{:.4}", compressed as f64 / original as f64);
    assert_eq!(headers["x-compression-ratio"], expected_ratio.as_str());

    assert!(fake.call_count() <= 8);
    assert_eq!(fake.calls()[0].dpi, 136);
}

#[tokio::test]
async fn test_empty_target_means_no_target() {
    let fake = FakeCompressor::linear(100);
    let request = MultipartBuilder::new()
        .file("file", "a.pdf", &fake_pdf(100_000))
        .text("targetSizeMB", "")
        .into_request();

    let response = router_with(&fake).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("x-target-size").is_none());
    assert_eq!(fake.call_count(), 1);
}

#[tokio::test]
async fn test_download_name_is_sanitized() {
    let fake = FakeCompressor::linear(100);
    let request = MultipartBuilder::new()
        .file("file", "../My Report.pdf", &fake_pdf(10_000))
        .into_request();

    let response = router_with(&fake).oneshot(request).await.unwrap();
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"compressed_My_Report.pdf\""
    );
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_missing_file_part() {
    let fake = FakeCompressor::linear(100);
    let request = MultipartBuilder::new()
        .text("quality", "high")
        .into_request();

    let response = router_with(&fake).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert_eq!(json["error"], "validation_error");
    assert_eq!(json["message"], "No file part");
    assert_eq!(fake.call_count(), 0);
}

#[tokio::test]
async fn test_empty_filename() {
    let fake = FakeCompressor::linear(100);
    let request = MultipartBuilder::new()
        .file("file", "", &fake_pdf(100))
        .into_request();

    let response = router_with(&fake).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["message"], "No selected file");
}

#[tokio::test]
async fn test_wrong_extension() {
    let fake = FakeCompressor::linear(100);
    let request = MultipartBuilder::new()
        .file("file", "notes.docx", &fake_pdf(100))
        .into_request();

    let response = router_with(&fake).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["message"],
        "Invalid file type; PDF required"
    );
    assert_eq!(fake.call_count(), 0);
}

#[tokio::test]
async fn test_empty_file() {
    let fake = FakeCompressor::linear(100);
    let request = MultipartBuilder::new()
        .file("file", "empty.pdf", b"")
        .into_request();

    let response = router_with(&fake).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(fake.call_count(), 0);
}

#[tokio::test]
async fn test_malformed_target_size() {
    // Scenario E: non-numeric target, nothing is compressed.
    let fake = FakeCompressor::linear(100);
    let request = MultipartBuilder::new()
        .file("file", "a.pdf", &fake_pdf(10_000))
        .text("targetSizeMB", "five")
        .into_request();

    let response = router_with(&fake).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert_eq!(json["error"], "validation_error");
    assert!(json["message"].as_str().unwrap().contains("targetSizeMB"));
    assert_eq!(fake.call_count(), 0);
}

#[tokio::test]
async fn test_non_positive_target_size() {
    let fake = FakeCompressor::linear(100);
    let request = MultipartBuilder::new()
        .file("file", "a.pdf", &fake_pdf(10_000))
        .text("targetSizeMB", "-2")
        .into_request();

    let response = router_with(&fake).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(fake.call_count(), 0);
}

#[tokio::test]
async fn test_upload_over_limit() {
    let fake = FakeCompressor::linear(100);
    let router = create_router(
        CompressionService::new(fake.clone()),
        RouterConfig::new()
            .with_tracing(false)
            .with_max_upload_bytes(1_000),
    );
    let request = MultipartBuilder::new()
        .file("file", "big.pdf", &fake_pdf(5_000))
        .into_request();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json_body(response).await["error"], "size_limit_exceeded");
    assert_eq!(fake.call_count(), 0);
}

#[tokio::test]
async fn test_body_over_router_limit() {
    // Past the ceiling plus multipart allowance, the body limit trips while
    // the form is being read.
    let fake = FakeCompressor::linear(100);
    let router = create_router(
        CompressionService::new(fake.clone()),
        RouterConfig::new()
            .with_tracing(false)
            .with_max_upload_bytes(10),
    );
    let request = MultipartBuilder::new()
        .file("file", "big.pdf", &fake_pdf(3 * MB))
        .into_request();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let json = json_body(response).await;
    assert_eq!(json["error"], "size_limit_exceeded");
    assert_eq!(fake.call_count(), 0);
}

#[tokio::test]
async fn test_not_multipart() {
    let fake = FakeCompressor::linear(100);
    let request = Request::builder()
        .method("POST")
        .uri("/compress")
        .header("content-type", "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let response = router_with(&fake).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "validation_error");
}

// =============================================================================
// Tool Failures
// =============================================================================

#[tokio::test]
async fn test_ghostscript_unavailable() {
    // Scenario D: the tool was not found at startup.
    let router = create_router(
        CompressionService::<FakeCompressor>::unavailable(),
        RouterConfig::new().with_tracing(false),
    );
    let request = MultipartBuilder::new()
        .file("file", "a.pdf", &fake_pdf(10_000))
        .into_request();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let json = json_body(response).await;
    assert_eq!(json["error"], "service_unavailable");
    assert_eq!(json["message"], "Ghostscript not available on server");
}

#[tokio::test]
async fn test_unavailable_checked_before_validation() {
    let router = create_router(
        CompressionService::<FakeCompressor>::unavailable(),
        RouterConfig::new().with_tracing(false),
    );
    // Not even multipart; availability wins.
    let request = Request::builder()
        .method("POST")
        .uri("/compress")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_single_pass_failure_returns_500() {
    let fake = FakeCompressor::linear(100).failing_when(|_| true);
    let request = MultipartBuilder::new()
        .file("file", "a.pdf", &fake_pdf(10_000))
        .into_request();

    let response = router_with(&fake).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = json_body(response).await;
    assert_eq!(json["error"], "compression_failed");
    assert!(json["message"]
        .as_str()
        .unwrap()
        .contains("simulated Ghostscript failure"));
}
