// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Current-run gallery with stale delivery protection
//!
//! Starting a run supersedes the previous one: its cancellation token
//! fires and any image it still delivers is discarded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use super::types::GeneratedImage;

pub type RunId = u64;

/// Handle held by the code driving one run
#[derive(Debug, Clone)]
pub struct RunTicket {
    pub id: RunId,
    pub cancel: CancellationToken,
}

#[derive(Debug)]
struct GalleryState {
    run_id: RunId,
    images: Vec<GeneratedImage>,
    in_flight: bool,
    cancel: CancellationToken,
}

/// Images produced by the current run
#[derive(Debug)]
pub struct Gallery {
    next_id: AtomicU64,
    state: RwLock<GalleryState>,
}

impl Default for Gallery {
    fn default() -> Self {
        Self::new()
    }
}

impl Gallery {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            state: RwLock::new(GalleryState {
                run_id: 0,
                images: Vec::new(),
                in_flight: false,
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Supersede the current run, clear the gallery and hand out a new ticket
    pub fn begin_run(&self) -> RunTicket {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let cancel = CancellationToken::new();
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.cancel.cancel();
        state.run_id = id;
        state.images.clear();
        state.in_flight = true;
        state.cancel = cancel.clone();
        debug!(run_id = id, "Generation run started");
        RunTicket { id, cancel }
    }

    /// Append an image if `run_id` is still current. Returns false when discarded.
    pub fn deliver(&self, run_id: RunId, image: GeneratedImage) -> bool {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if state.run_id != run_id {
            debug!(
                run_id,
                current = state.run_id,
                style = %image.name,
                "Discarding image from superseded run"
            );
            return false;
        }
        state.images.push(image);
        true
    }

    /// Mark `run_id` settled; ignored for superseded runs
    pub fn finish(&self, run_id: RunId) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if state.run_id == run_id {
            state.in_flight = false;
        }
    }

    /// Cancel the current run without starting another
    pub fn cancel_current(&self) {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.cancel.cancel();
    }

    pub fn current_run(&self) -> RunId {
        self.state.read().unwrap_or_else(|e| e.into_inner()).run_id
    }

    pub fn is_in_flight(&self) -> bool {
        self.state.read().unwrap_or_else(|e| e.into_inner()).in_flight
    }

    pub fn images(&self) -> Vec<GeneratedImage> {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .images
            .clone()
    }

    pub fn find(&self, id: Uuid) -> Option<GeneratedImage> {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .images
            .iter()
            .find(|img| img.id == id)
            .cloned()
    }

    pub fn find_by_name(&self, name: &str) -> Option<GeneratedImage> {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .images
            .iter()
            .find(|img| img.name == name)
            .cloned()
    }
}
