// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Selection limits, download gating and the mock subscription flow

pub mod download;
pub mod selection;
pub mod subscription;

use thiserror::Error;

use crate::storage::StoreError;

pub use download::{
    authorize_download, plan_downloads, sanitize_file_name, ArtifactSink, DirectorySink,
    DownloadArtifact, DownloadDecision, DownloadError, DownloadPlan,
};
pub use selection::{SelectionSet, ToggleOutcome, FREE_SELECTION_LIMIT};
pub use subscription::{
    SubscriptionManager, SubscriptionState, UpgradePhase, PRO_CURRENCY, PRO_PRICE,
    REDEMPTION_CODE,
};

/// A selection, download or upgrade attempt rejected by policy.
///
/// Never a hard failure: the state change is refused and the user is
/// prompted to upgrade (or to re-enter the code).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntitlementViolation {
    #[error("Free selection limit of {limit} reached")]
    FreeSelectionLimit { limit: usize },

    #[error("Premium images require a Pro subscription")]
    PremiumRequiresUpgrade,

    #[error("Invalid redemption code")]
    InvalidRedemptionCode,
}

impl EntitlementViolation {
    pub fn user_message(&self) -> String {
        match self {
            EntitlementViolation::FreeSelectionLimit { limit } => format!(
                "You can only select up to {} free images. Upgrade to Pro for unlimited selections.",
                limit
            ),
            EntitlementViolation::PremiumRequiresUpgrade => {
                "Your selection includes Pro styles. Upgrade to Pro to download them.".to_string()
            }
            EntitlementViolation::InvalidRedemptionCode => {
                "Invalid code. Please try again.".to_string()
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum UpgradeError {
    #[error(transparent)]
    Rejected(#[from] EntitlementViolation),

    #[error("An upgrade is already in progress")]
    InProgress,

    #[error("Failed to persist subscription: {0}")]
    Storage(#[from] StoreError),
}
