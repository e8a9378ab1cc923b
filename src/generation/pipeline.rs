// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Batched portrait generation
//!
//! Pipeline:
//! 1. Encode the input photo once; every style request shares it
//! 2. Split the styles into consecutive batches of `batch_size`, in catalog order
//! 3. Fan out one request per style in the batch
//! 4. Deliver each success to `on_progress` as it completes; drop failures
//! 5. Start the next batch only after the current one has fully settled

use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::backend::ImageBackend;
use super::encode::{EncodedImage, InputImage};
use super::errors::{BackendError, GenerationError};
use super::types::GeneratedImage;
use crate::catalog::StyleDescriptor;
use crate::config::StudioConfig;

/// Outcome counts for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Styles in the run
    pub requested: usize,
    /// Images delivered to the progress sink
    pub succeeded: usize,
    /// Styles dropped after a backend failure or timeout
    pub failed: usize,
    /// Batches started
    pub batches: usize,
    /// Run stopped early by its cancellation token
    pub cancelled: bool,
    pub elapsed_ms: u64,
}

pub struct GenerationPipeline {
    backend: Arc<dyn ImageBackend>,
    batch_size: usize,
    request_timeout: Duration,
}

impl GenerationPipeline {
    pub fn new(
        backend: Arc<dyn ImageBackend>,
        batch_size: usize,
        request_timeout: Duration,
    ) -> Result<Self, GenerationError> {
        if batch_size == 0 {
            return Err(GenerationError::InvalidBatchSize(batch_size));
        }
        Ok(Self {
            backend,
            batch_size,
            request_timeout,
        })
    }

    pub fn from_config(
        backend: Arc<dyn ImageBackend>,
        config: &StudioConfig,
    ) -> Result<Self, GenerationError> {
        Self::new(backend, config.batch_size, config.request_timeout())
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Render every style, streaming successes to `on_progress`.
    ///
    /// Resolves `Ok` once all batches have settled, however many styles
    /// failed. Fails only on an empty style list or an unencodable input.
    pub async fn generate<F>(
        &self,
        input: &InputImage,
        styles: &[StyleDescriptor],
        on_progress: F,
    ) -> Result<GenerationReport, GenerationError>
    where
        F: FnMut(GeneratedImage),
    {
        self.generate_with_cancel(input, styles, &CancellationToken::new(), on_progress)
            .await
    }

    /// Same as [`generate`](Self::generate), stopping when `cancel` fires.
    ///
    /// After cancellation no further batch starts, the in-flight batch is
    /// dropped, and nothing more reaches `on_progress`.
    pub async fn generate_with_cancel<F>(
        &self,
        input: &InputImage,
        styles: &[StyleDescriptor],
        cancel: &CancellationToken,
        on_progress: F,
    ) -> Result<GenerationReport, GenerationError>
    where
        F: FnMut(GeneratedImage),
    {
        if styles.is_empty() {
            return Err(GenerationError::EmptyCatalog);
        }
        let encoded = input.encode()?;
        self.generate_encoded(&encoded, styles, cancel, on_progress)
            .await
    }

    /// Same as [`generate_with_cancel`](Self::generate_with_cancel) for a
    /// photo the caller has already encoded
    pub async fn generate_encoded<F>(
        &self,
        encoded: &EncodedImage,
        styles: &[StyleDescriptor],
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> Result<GenerationReport, GenerationError>
    where
        F: FnMut(GeneratedImage),
    {
        if styles.is_empty() {
            return Err(GenerationError::EmptyCatalog);
        }

        let start = Instant::now();
        let mut report = GenerationReport {
            requested: styles.len(),
            ..GenerationReport::default()
        };

        info!(
            styles = styles.len(),
            batch_size = self.batch_size,
            backend = self.backend.name(),
            "Starting portrait generation"
        );

        for (index, batch) in styles.chunks(self.batch_size).enumerate() {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            report.batches += 1;
            debug!(batch = index, size = batch.len(), "Dispatching batch");

            let mut pending: FuturesUnordered<_> = batch
                .iter()
                .map(|style| self.render_style(encoded, style))
                .collect();

            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        report.cancelled = true;
                        break;
                    }
                    next = pending.next() => match next {
                        Some(Some(image)) => {
                            report.succeeded += 1;
                            on_progress(image);
                        }
                        Some(None) => report.failed += 1,
                        None => break,
                    }
                }
            }

            if report.cancelled {
                break;
            }
        }

        report.elapsed_ms = start.elapsed().as_millis() as u64;
        if report.cancelled {
            info!(
                succeeded = report.succeeded,
                batches = report.batches,
                "Portrait generation cancelled"
            );
        } else {
            info!(
                succeeded = report.succeeded,
                failed = report.failed,
                elapsed_ms = report.elapsed_ms,
                "Portrait generation finished"
            );
        }
        Ok(report)
    }

    /// One style request. Failures are logged and yield `None`.
    async fn render_style(
        &self,
        encoded: &EncodedImage,
        style: &StyleDescriptor,
    ) -> Option<GeneratedImage> {
        let result = match timeout(
            self.request_timeout,
            self.backend.generate(encoded, &style.prompt),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout {
                timeout_ms: self.request_timeout.as_millis() as u64,
            }),
        };

        match result {
            Ok(inline) => Some(GeneratedImage::from_style(style, &inline)),
            Err(e) => {
                warn!(style = %style.name, "Error generating style: {}", e);
                None
            }
        }
    }
}
