// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Hand-written image backends for driving the pipeline in tests

use async_trait::async_trait;
use portrait_banana::catalog::StyleDescriptor;
use portrait_banana::generation::{BackendError, EncodedImage, ImageBackend, InlineImage};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

// 1x1 red PNG image (base64)
pub const TINY_PNG_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

pub fn tiny_png() -> Vec<u8> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(TINY_PNG_BASE64)
        .unwrap()
}

/// `count` styles named `style-<i>` with prompt `prompt-<i>`; the listed indices are premium
pub fn styles(count: usize, premium: &[usize]) -> Vec<StyleDescriptor> {
    (0..count)
        .map(|i| {
            StyleDescriptor::new(
                format!("style-{}", i),
                format!("prompt-{}", i),
                premium.contains(&i),
            )
        })
        .collect()
}

/// Succeeds for every prompt except the configured failures.
///
/// Records call order and the number of completed calls observed when
/// each call started, plus the peak number of concurrent calls.
pub struct ScriptedBackend {
    failing: HashSet<String>,
    hanging: HashSet<String>,
    delay: Duration,
    in_flight: AtomicUsize,
    pub peak_in_flight: AtomicUsize,
    completed: AtomicUsize,
    pub calls: Mutex<Vec<(String, usize)>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            failing: HashSet::new(),
            hanging: HashSet::new(),
            delay: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(mut self, prompt: &str) -> Self {
        self.failing.insert(prompt.to_string());
        self
    }

    /// The prompt never resolves
    pub fn hanging(mut self, prompt: &str) -> Self {
        self.hanging.insert(prompt.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn peak(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageBackend for ScriptedBackend {
    async fn generate(
        &self,
        _image: &EncodedImage,
        prompt: &str,
    ) -> Result<InlineImage, BackendError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), self.completed.load(Ordering::SeqCst)));

        if self.hanging.contains(prompt) {
            std::future::pending::<()>().await;
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);

        if self.failing.contains(prompt) {
            return Err(BackendError::Api {
                status: 429,
                message: "Resource exhausted".to_string(),
            });
        }
        Ok(InlineImage {
            mime_type: "image/png".to_string(),
            data: TINY_PNG_BASE64.to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
