// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tests for selection limits and download gating

use super::mock_backend::TINY_PNG_BASE64;
use async_trait::async_trait;
use portrait_banana::catalog::StyleDescriptor;
use portrait_banana::entitlement::{
    authorize_download, plan_downloads, ArtifactSink, DirectorySink, DownloadDecision,
    DownloadError, EntitlementViolation, SelectionSet, ToggleOutcome, FREE_SELECTION_LIMIT,
};
use portrait_banana::generation::{GeneratedImage, InlineImage};
use std::sync::Mutex;
use std::time::{Duration, Instant};

fn image(name: &str, is_premium: bool) -> GeneratedImage {
    GeneratedImage::from_style(
        &StyleDescriptor::new(name, "prompt", is_premium),
        &InlineImage {
            mime_type: "image/png".to_string(),
            data: TINY_PNG_BASE64.to_string(),
        },
    )
}

fn select_all(selection: &mut SelectionSet, images: &[GeneratedImage], subscribed: bool) {
    for img in images {
        selection.toggle(img.id, images, subscribed, FREE_SELECTION_LIMIT);
    }
}

#[test]
fn test_fourth_free_selection_rejected() {
    let images: Vec<_> = (0..4).map(|i| image(&format!("free-{}", i), false)).collect();
    let mut selection = SelectionSet::new();
    for img in &images[..3] {
        selection.toggle(img.id, &images, false, FREE_SELECTION_LIMIT);
    }

    let outcome = selection.toggle(images[3].id, &images, false, FREE_SELECTION_LIMIT);
    assert_eq!(
        outcome,
        ToggleOutcome::Rejected(EntitlementViolation::FreeSelectionLimit { limit: 3 })
    );
    assert_eq!(selection.len(), 3);
}

#[test]
fn test_premium_in_selection_requires_upgrade() {
    let images = vec![image("Free", false), image("Pro", true)];
    let mut selection = SelectionSet::new();
    select_all(&mut selection, &images, false);

    assert_eq!(
        authorize_download(&selection, &images, false),
        DownloadDecision::RequireUpgrade
    );
    assert_eq!(
        authorize_download(&selection, &images, true),
        DownloadDecision::Allow
    );
    assert_eq!(
        plan_downloads(&selection, &images, false, Duration::ZERO),
        Err(EntitlementViolation::PremiumRequiresUpgrade)
    );
}

#[test]
fn test_free_only_selection_allowed() {
    let images = vec![image("A", false), image("B", false), image("Pro", true)];
    let mut selection = SelectionSet::new();
    select_all(&mut selection, &images[..2], false);
    assert_eq!(
        authorize_download(&selection, &images, false),
        DownloadDecision::Allow
    );
}

#[test]
fn test_plan_names_and_staggers_artifacts() {
    let images = vec![
        image("Corporate Headshot", false),
        image("Dramatic Black & White", false),
        image("Golden Hour Glow", false),
    ];
    let mut selection = SelectionSet::new();
    select_all(&mut selection, &images, false);

    let plan = plan_downloads(&selection, &images, false, Duration::from_millis(300)).unwrap();
    let names: Vec<_> = plan.artifacts.iter().map(|a| a.file_name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "portrait-banana-corporate-headshot.png",
            "portrait-banana-dramatic-black---white.png",
            "portrait-banana-golden-hour-glow.png",
        ]
    );
    let delays: Vec<_> = plan.artifacts.iter().map(|a| a.delay.as_millis()).collect();
    assert_eq!(delays, vec![0, 300, 600]);
}

struct RecordingSink {
    started: Instant,
    released: Mutex<Vec<(String, Duration, usize)>>,
}

#[async_trait]
impl ArtifactSink for RecordingSink {
    async fn release(
        &self,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), DownloadError> {
        assert_eq!(mime_type, "image/png");
        self.released
            .lock()
            .unwrap()
            .push((file_name.to_string(), self.started.elapsed(), bytes.len()));
        Ok(())
    }
}

#[tokio::test]
async fn test_release_respects_stagger() {
    let images = vec![image("One", false), image("Two", false)];
    let mut selection = SelectionSet::new();
    select_all(&mut selection, &images, false);
    let plan = plan_downloads(&selection, &images, false, Duration::from_millis(40)).unwrap();

    let sink = RecordingSink {
        started: Instant::now(),
        released: Mutex::new(Vec::new()),
    };
    let count = plan.release(&sink).await.unwrap();
    assert_eq!(count, 2);

    let released = sink.released.lock().unwrap();
    assert_eq!(released[0].0, "portrait-banana-one.png");
    assert!(released[0].2 > 0);
    assert!(released[1].1 >= Duration::from_millis(40));
}

#[tokio::test]
async fn test_directory_sink_writes_files() {
    let dir = tempfile::tempdir().unwrap();
    let images = vec![image("Vintage Film Look", false)];
    let mut selection = SelectionSet::new();
    select_all(&mut selection, &images, false);
    let plan = plan_downloads(&selection, &images, false, Duration::ZERO).unwrap();

    let out = dir.path().join("out");
    plan.release(&DirectorySink::new(&out)).await.unwrap();

    let written = std::fs::read(out.join("portrait-banana-vintage-film-look.png")).unwrap();
    assert_eq!(&written[..4], &[0x89, 0x50, 0x4E, 0x47]);
}
