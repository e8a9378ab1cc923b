// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Download authorization and staggered artifact release

use async_trait::async_trait;
use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use super::selection::SelectionSet;
use super::EntitlementViolation;
use crate::generation::{GeneratedImage, ImageError};

const FILE_PREFIX: &str = "portrait-banana";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadDecision {
    Allow,
    RequireUpgrade,
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Invalid image payload for {file_name}: {source}")]
    Payload {
        file_name: String,
        source: ImageError,
    },

    #[error("Failed to write {file_name}: {source}")]
    Io {
        file_name: String,
        source: std::io::Error,
    },
}

/// Decide whether the selection may be downloaded.
///
/// `RequireUpgrade` iff at least one selected image is premium and the
/// user is not subscribed.
pub fn authorize_download(
    selection: &SelectionSet,
    images: &[GeneratedImage],
    is_subscribed: bool,
) -> DownloadDecision {
    if !is_subscribed && selection.has_premium(images) {
        DownloadDecision::RequireUpgrade
    } else {
        DownloadDecision::Allow
    }
}

/// Lowercase the style name and replace anything outside `[a-z0-9]` with `-`
pub fn sanitize_file_name(name: &str) -> String {
    static NON_ALNUM: OnceLock<Regex> = OnceLock::new();
    let re = NON_ALNUM.get_or_init(|| Regex::new(r"[^a-z0-9]").expect("valid regex"));
    re.replace_all(&name.to_lowercase(), "-").into_owned()
}

/// One file to hand to the host, released `delay` after the plan starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadArtifact {
    pub image_id: Uuid,
    pub file_name: String,
    pub delay: Duration,
    pub src: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadPlan {
    pub artifacts: Vec<DownloadArtifact>,
}

/// Build the release schedule for an authorized selection.
///
/// Artifacts follow selection order; the first is immediate and each
/// subsequent one waits another `stagger`. Ids with no backing image
/// are skipped.
pub fn plan_downloads(
    selection: &SelectionSet,
    images: &[GeneratedImage],
    is_subscribed: bool,
    stagger: Duration,
) -> Result<DownloadPlan, EntitlementViolation> {
    if authorize_download(selection, images, is_subscribed) == DownloadDecision::RequireUpgrade {
        return Err(EntitlementViolation::PremiumRequiresUpgrade);
    }

    let artifacts = selection
        .ids()
        .iter()
        .enumerate()
        .filter_map(|(index, id)| {
            images.iter().find(|img| img.id == *id).map(|img| DownloadArtifact {
                image_id: img.id,
                file_name: format!("{}-{}.png", FILE_PREFIX, sanitize_file_name(&img.name)),
                delay: stagger * index as u32,
                src: img.src.clone(),
            })
        })
        .collect();

    Ok(DownloadPlan { artifacts })
}

/// Destination for released artifacts
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    async fn release(
        &self,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), DownloadError>;
}

impl DownloadPlan {
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Release every artifact into `sink` on its schedule. Returns the count released.
    pub async fn release(&self, sink: &dyn ArtifactSink) -> Result<usize, DownloadError> {
        let start = Instant::now();
        for artifact in &self.artifacts {
            tokio::time::sleep_until(start + artifact.delay).await;
            let (mime_type, bytes) =
                crate::generation::encode::decode_data_uri(&artifact.src).map_err(|source| {
                    DownloadError::Payload {
                        file_name: artifact.file_name.clone(),
                        source,
                    }
                })?;
            debug!(file = %artifact.file_name, bytes = bytes.len(), "Releasing artifact");
            sink.release(&artifact.file_name, &mime_type, bytes).await?;
        }
        info!(count = self.artifacts.len(), "Download complete");
        Ok(self.artifacts.len())
    }
}

/// Writes artifacts into a directory on disk
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ArtifactSink for DirectorySink {
    async fn release(
        &self,
        file_name: &str,
        _mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), DownloadError> {
        let io_err = |source| DownloadError::Io {
            file_name: file_name.to_string(),
            source,
        };
        tokio::fs::create_dir_all(&self.dir).await.map_err(io_err)?;
        tokio::fs::write(self.dir.join(file_name), bytes)
            .await
            .map_err(io_err)
    }
}
