// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Gallery selection with the free-image limit

use uuid::Uuid;

use super::EntitlementViolation;
use crate::generation::GeneratedImage;

/// Free images selectable without a subscription
pub const FREE_SELECTION_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// No state change; the caller should prompt an upgrade
    Rejected(EntitlementViolation),
}

/// Selected image ids for one run, in selection order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: Vec<Uuid>,
}

fn is_premium(images: &[GeneratedImage], id: &Uuid) -> bool {
    // Unknown ids count as free
    images
        .iter()
        .find(|img| img.id == *id)
        .map(|img| img.is_premium)
        .unwrap_or(false)
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove `image_id` if selected, otherwise try to add it.
    ///
    /// Removal is always allowed. A free image cannot be added once
    /// `free_limit` free images are selected, unless subscribed. Premium
    /// images are always addable; their download is gated separately.
    pub fn toggle(
        &mut self,
        image_id: Uuid,
        images: &[GeneratedImage],
        is_subscribed: bool,
        free_limit: usize,
    ) -> ToggleOutcome {
        if let Some(pos) = self.ids.iter().position(|id| *id == image_id) {
            self.ids.remove(pos);
            return ToggleOutcome::Removed;
        }

        if !is_premium(images, &image_id)
            && !is_subscribed
            && self.free_count(images) >= free_limit
        {
            return ToggleOutcome::Rejected(EntitlementViolation::FreeSelectionLimit {
                limit: free_limit,
            });
        }

        self.ids.push(image_id);
        ToggleOutcome::Added
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.ids.contains(id)
    }

    pub fn ids(&self) -> &[Uuid] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Selected ids whose image is not premium
    pub fn free_count(&self, images: &[GeneratedImage]) -> usize {
        self.ids.iter().filter(|id| !is_premium(images, id)).count()
    }

    pub fn has_premium(&self, images: &[GeneratedImage]) -> bool {
        self.ids.iter().any(|id| is_premium(images, id))
    }
}
