// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! End-to-end tests for the application context

use super::mock_backend::{styles, tiny_png, ScriptedBackend};
use portrait_banana::entitlement::{
    DownloadDecision, EntitlementViolation, ToggleOutcome, REDEMPTION_CODE,
};
use portrait_banana::generation::{GenerationError, InputImage};
use portrait_banana::storage::{GenerationStatus, InMemoryStore, KeyValueStore};
use portrait_banana::{Studio, StudioConfig};
use std::sync::Arc;
use std::time::Duration;

fn config() -> StudioConfig {
    StudioConfig {
        rate_limit_capacity: 100,
        download_stagger_ms: 0,
        ..StudioConfig::default()
    }
}

fn studio_with(config: StudioConfig, backend: ScriptedBackend) -> Studio {
    let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
    Studio::with_backend(config, Arc::new(backend), store).unwrap()
}

fn input() -> InputImage {
    InputImage::from_bytes(tiny_png())
}

#[tokio::test]
async fn test_generation_fills_gallery_and_history() {
    let studio = studio_with(config(), ScriptedBackend::new().failing("prompt-4"));

    let report = studio
        .start_generation(&input(), &styles(6, &[5]))
        .await
        .unwrap();

    assert_eq!(report.succeeded, 5);
    assert_eq!(studio.images().len(), 5);
    assert!(!studio.gallery().is_in_flight());

    let history = studio.generation_history().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, GenerationStatus::Success);
    assert_eq!(history[0].style_count, 6);
    assert_eq!(history[0].succeeded, 5);
}

#[tokio::test]
async fn test_missing_credential_blocks_generation() {
    let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
    let studio = Studio::new(config(), store).unwrap();

    let result = studio.start_generation(&input(), &styles(2, &[])).await;
    let err = result.unwrap_err();
    assert!(matches!(err, GenerationError::Configuration(_)));
    assert!(err.user_message().contains("API_KEY"));
    assert_eq!(studio.usage().used_today(), 0);
    assert!(studio.generation_history().unwrap().is_empty());
}

#[tokio::test]
async fn test_rapid_runs_are_rate_limited() {
    let studio = studio_with(
        StudioConfig {
            rate_limit_capacity: 3,
            ..config()
        },
        ScriptedBackend::new(),
    );

    for _ in 0..3 {
        studio.start_generation(&input(), &styles(1, &[])).await.unwrap();
    }
    let err = studio
        .start_generation(&input(), &styles(1, &[]))
        .await
        .unwrap_err();
    match err {
        GenerationError::RateLimited { cooldown_ms } => assert!(cooldown_ms <= 2000),
        other => panic!("Expected rate limit, got {:?}", other),
    }
    // Rejected run leaves the previous gallery in place
    assert_eq!(studio.images().len(), 1);
}

#[tokio::test]
async fn test_unusable_request_charges_nothing() {
    let studio = studio_with(config(), ScriptedBackend::new());
    studio
        .start_generation(&input(), &styles(2, &[]))
        .await
        .unwrap();
    let first = studio.images()[0].id;
    assert!(matches!(studio.toggle_select(first), ToggleOutcome::Added));

    let tokens = studio.limiter().tokens();
    let garbage = InputImage::from_bytes(b"garbage".to_vec());
    let err = studio
        .start_generation(&garbage, &styles(2, &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::Encoding(_)));

    let err = studio.start_generation(&input(), &[]).await.unwrap_err();
    assert!(matches!(err, GenerationError::EmptyCatalog));

    assert_eq!(studio.usage().used_today(), 1);
    assert_eq!(studio.limiter().tokens(), tokens);
    assert_eq!(studio.images().len(), 2);
    assert_eq!(studio.selection().ids(), &[first]);
    assert_eq!(studio.generation_history().unwrap().len(), 1);
}

#[tokio::test]
async fn test_daily_quota_blocks_sixth_free_run() {
    let studio = studio_with(config(), ScriptedBackend::new());

    for _ in 0..5 {
        studio.start_generation(&input(), &styles(1, &[])).await.unwrap();
    }
    let err = studio
        .start_generation(&input(), &styles(1, &[]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GenerationError::QuotaExhausted { used: 5, quota: 5 }
    ));

    studio.redeem_code(REDEMPTION_CODE).unwrap();
    assert!(studio.start_generation(&input(), &styles(1, &[])).await.is_ok());
}

#[tokio::test]
async fn test_selection_and_download_gate() {
    let studio = studio_with(config(), ScriptedBackend::new());
    studio
        .start_generation(&input(), &styles(5, &[4]))
        .await
        .unwrap();

    let images = studio.images();
    let free: Vec<_> = images.iter().filter(|i| !i.is_premium).collect();
    let premium = images.iter().find(|i| i.is_premium).unwrap();

    for img in &free[..3] {
        assert_eq!(studio.toggle_select(img.id), ToggleOutcome::Added);
    }
    assert_eq!(
        studio.toggle_select(free[3].id),
        ToggleOutcome::Rejected(EntitlementViolation::FreeSelectionLimit { limit: 3 })
    );
    assert_eq!(studio.authorize_download(), DownloadDecision::Allow);
    assert_eq!(studio.download_plan().unwrap().len(), 3);

    assert_eq!(studio.toggle_select(premium.id), ToggleOutcome::Added);
    assert_eq!(studio.authorize_download(), DownloadDecision::RequireUpgrade);
    assert_eq!(
        studio.download_plan().unwrap_err(),
        EntitlementViolation::PremiumRequiresUpgrade
    );

    studio.redeem_code(REDEMPTION_CODE).unwrap();
    assert_eq!(studio.authorize_download(), DownloadDecision::Allow);
    assert_eq!(studio.toggle_select(free[3].id), ToggleOutcome::Added);
    assert_eq!(studio.download_plan().unwrap().len(), 5);
}

#[tokio::test]
async fn test_new_run_clears_selection() {
    let studio = studio_with(config(), ScriptedBackend::new());
    studio.start_generation(&input(), &styles(2, &[])).await.unwrap();
    let first = studio.images()[0].id;
    studio.toggle_select(first);
    assert_eq!(studio.selection().len(), 1);

    studio.start_generation(&input(), &styles(2, &[])).await.unwrap();
    assert!(studio.selection().is_empty());
    assert!(studio.images().iter().all(|i| i.id != first));
}

#[tokio::test]
async fn test_superseded_run_is_discarded() {
    let studio = studio_with(
        config(),
        ScriptedBackend::new().with_delay(Duration::from_millis(100)),
    );
    let catalog = styles(2, &[]);
    let photo = input();

    let (first, second) = tokio::join!(studio.start_generation(&photo, &catalog), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        studio.start_generation(&photo, &catalog).await
    });

    let first = first.unwrap();
    let second = second.unwrap();
    assert!(first.cancelled);
    assert_eq!(first.succeeded, 0);
    assert_eq!(second.succeeded, 2);
    assert_eq!(studio.images().len(), 2);
}

#[tokio::test]
async fn test_contact_and_orders() {
    let studio = studio_with(config(), ScriptedBackend::new());
    studio.submit_contact("me@example.com", "Love it").unwrap();

    assert!(studio.orders().unwrap().is_empty());
    studio.redeem_code(REDEMPTION_CODE).unwrap();
    assert_eq!(studio.orders().unwrap().len(), 1);
}
