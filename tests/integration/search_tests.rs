//! Controller tests driving `CompressionService` with a deterministic tool.
//!
//! Tests verify:
//! - The number of tool runs stays within the iteration bound
//! - The returned candidate is the closest seen to the target
//! - The minimum-resolution fallback runs exactly once when the search
//!   produced nothing

use bytes::Bytes;

use pdf_squeezer::compress::{
    CompressionRequest, CompressionService, QualityTier, SearchSettings, DEFAULT_MAX_ITERATIONS,
    MIN_RESOLUTION,
};
use pdf_squeezer::error::CompressError;
use pdf_squeezer::tool::Preset;

use super::test_utils::{fake_pdf, FakeCompressor, MB};

fn document(size: usize) -> Bytes {
    Bytes::from(fake_pdf(size))
}

#[tokio::test]
async fn test_medium_tier_toward_five_megabytes() {
    let fake = FakeCompressor::linear(40_000);
    let service = CompressionService::new(fake.clone());
    let target = 5 * MB as u64;

    let request = CompressionRequest::new(document(10 * MB), QualityTier::Medium)
        .with_target_size(target);
    let result = service.compress(request).await.unwrap();

    let calls = fake.calls();
    assert!(!calls.is_empty());
    assert!(calls.len() <= DEFAULT_MAX_ITERATIONS as usize);
    assert!(calls.iter().all(|c| c.preset == Preset::Printer));
    assert!(calls.iter().all(|c| (72..=200).contains(&c.dpi)));

    let distance = result.compressed_size.abs_diff(target);
    let closest = calls
        .iter()
        .filter_map(|c| c.produced)
        .map(|size| size.abs_diff(target))
        .min()
        .unwrap();
    assert_eq!(distance, closest);
    assert_eq!(result.quality, QualityTier::Medium);
    assert_eq!(result.target_size, Some(target));
}

#[tokio::test]
async fn test_stops_early_within_tolerance() {
    // 136 dpi * 38_550 = 5_242_800, 80 bytes off a 5 MiB target.
    let fake = FakeCompressor::linear(38_550);
    let service = CompressionService::new(fake.clone());

    let request = CompressionRequest::new(document(10 * MB), QualityTier::Medium)
        .with_target_megabytes(5.0);
    let result = service.compress(request).await.unwrap();

    assert_eq!(fake.call_count(), 1);
    assert_eq!(result.resolution, 136);
}

#[tokio::test]
async fn test_iteration_cap_from_settings() {
    // Always too big: the search can only run out of steps.
    let fake = FakeCompressor::new(|dpi| 4 * MB + dpi as usize);
    let service = CompressionService::new(fake.clone())
        .with_settings(SearchSettings::default().with_max_iterations(3));

    let request =
        CompressionRequest::new(document(10 * MB), QualityTier::High).with_target_size(MB as u64);
    let result = service.compress(request).await.unwrap();

    let calls = fake.calls();
    assert_eq!(calls.len(), 3);
    // 186, 129, 100
    assert_eq!(
        calls.iter().map(|c| c.dpi).collect::<Vec<_>>(),
        vec![186, 129, 100]
    );
    assert_eq!(result.resolution, 100);
}

#[tokio::test]
async fn test_runs_never_exceed_iterations_plus_fallback() {
    for failing_from in [0usize, 1, 2, 5] {
        let seen = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = seen.clone();
        let fake = FakeCompressor::linear(40_000).failing_when(move |dpi| {
            let n = counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            n >= failing_from && dpi != MIN_RESOLUTION
        });
        let service = CompressionService::new(fake.clone());

        let request = CompressionRequest::new(document(10 * MB), QualityTier::High)
            .with_target_size(MB as u64);
        let result = service.compress(request).await;

        // Either a search candidate or the fallback at the minimum survives.
        assert!(result.is_ok(), "failing_from={}: {:?}", failing_from, result);
        assert!(fake.call_count() <= DEFAULT_MAX_ITERATIONS as usize + 1);
    }
}

#[tokio::test]
async fn test_fallback_runs_once_at_minimum() {
    let fake = FakeCompressor::linear(40_000).failing_when(|dpi| dpi != MIN_RESOLUTION);
    let service = CompressionService::new(fake.clone());

    let request =
        CompressionRequest::new(document(10 * MB), QualityTier::Low).with_target_size(MB as u64);
    let result = service.compress(request).await.unwrap();

    let calls = fake.calls();
    let fallbacks = calls.iter().filter(|c| c.dpi == MIN_RESOLUTION).count();
    assert_eq!(fallbacks, 1);
    assert_eq!(calls.last().unwrap().dpi, MIN_RESOLUTION);
    assert_eq!(calls.last().unwrap().preset, Preset::Ebook);
    assert_eq!(result.resolution, MIN_RESOLUTION);
    assert_eq!(result.compressed_size, 72 * 40_000);
}

#[tokio::test]
async fn test_fallback_failure_returns_error() {
    let fake = FakeCompressor::linear(40_000).failing_when(|_| true);
    let service = CompressionService::new(fake.clone());

    let request =
        CompressionRequest::new(document(10 * MB), QualityTier::High).with_target_size(MB as u64);
    let result = service.compress(request).await;

    assert!(matches!(result, Err(CompressError::CompressionFailed(_))));
    assert_eq!(fake.call_count(), 2);
}

#[tokio::test]
async fn test_same_input_same_output() {
    let fake = FakeCompressor::linear(40_000);
    let service = CompressionService::new(fake.clone());
    let make = || {
        CompressionRequest::new(document(8 * MB), QualityTier::High).with_target_megabytes(2.0)
    };

    let first = service.compress(make()).await.unwrap();
    let second = service.compress(make()).await.unwrap();

    assert_eq!(first.resolution, second.resolution);
    assert_eq!(first.data, second.data);

    let calls = fake.calls();
    let (a, b) = calls.split_at(calls.len() / 2);
    assert_eq!(
        a.iter().map(|c| c.dpi).collect::<Vec<_>>(),
        b.iter().map(|c| c.dpi).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_ratio_matches_sizes() {
    let fake = FakeCompressor::linear(10_000);
    let service = CompressionService::new(fake);

    let request = CompressionRequest::new(document(9_000_000), QualityTier::High);
    let result = service.compress(request).await.unwrap();

    assert_eq!(result.compressed_size, 3_000_000);
    assert_eq!(result.ratio_display(), "0.3333");
}

#[tokio::test]
async fn test_concurrent_requests_use_separate_scratch_dirs() {
    let fake = FakeCompressor::linear(1_000);
    let service = std::sync::Arc::new(CompressionService::new(fake.clone()));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .compress(CompressionRequest::new(document(1_000_000), QualityTier::Low))
                    .await
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }

    let mut inputs: Vec<_> = fake.calls().into_iter().map(|c| c.input).collect();
    inputs.sort();
    inputs.dedup();
    assert_eq!(inputs.len(), 4);
}
