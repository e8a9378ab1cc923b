// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod catalog;
pub mod cli;
pub mod config;
pub mod entitlement;
pub mod generation;
pub mod quota;
pub mod storage;
pub mod studio;

pub use catalog::{StyleCatalog, StyleDescriptor};
pub use config::StudioConfig;
pub use entitlement::{DownloadDecision, EntitlementViolation, SelectionSet, ToggleOutcome};
pub use generation::{
    GeneratedImage, GenerationError, GenerationPipeline, GenerationReport, ImageBackend,
    InputImage,
};
pub use quota::{GenerationRateLimiter, TokenBucket};
pub use storage::{InMemoryStore, JsonFileStore, KeyValueStore};
pub use studio::Studio;
