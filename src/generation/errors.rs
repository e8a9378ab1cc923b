// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error types for portrait generation
//!
//! Two levels:
//! - `BackendError`: one style request failed. Recovered by the pipeline
//!   (the style is dropped) and never surfaced to the caller.
//! - `GenerationError`: the run could not start or could not encode its
//!   input. Surfaced once, as a single generic message.

use thiserror::Error;

use super::encode::ImageError;

/// Failure of a single style request against the generation service
#[derive(Debug, Error)]
pub enum BackendError {
    /// Transport-level failure
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status from the service
    #[error("Generation API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Service answered but the body could not be parsed
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// No candidates or no content parts
    #[error("Empty response from generation service")]
    EmptyResponse,

    /// Content parts present but none carried inline image data
    #[error("No image payload in response")]
    NoImagePayload,

    /// Request exceeded the per-request timeout
    #[error("Generation request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

/// Run-level failures of a generation request
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Required credential or other configuration absent or invalid
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Input photo could not be read or encoded
    #[error("Failed to encode input image: {0}")]
    Encoding(#[from] ImageError),

    /// No styles to render
    #[error("Style catalog is empty")]
    EmptyCatalog,

    #[error("Invalid batch size: {0}")]
    InvalidBatchSize(usize),

    /// Token bucket empty
    #[error("Too many generation requests, retry in {cooldown_ms}ms")]
    RateLimited { cooldown_ms: u64 },

    /// Free daily quota spent
    #[error("Daily generation quota reached: {used}/{quota}")]
    QuotaExhausted { used: u32, quota: u32 },

    /// Persisting run bookkeeping failed
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<crate::storage::StoreError> for GenerationError {
    fn from(err: crate::storage::StoreError) -> Self {
        GenerationError::Storage(err.to_string())
    }
}

impl GenerationError {
    /// Message shown to the user. Run failures collapse into one generic banner.
    pub fn user_message(&self) -> String {
        match self {
            GenerationError::Configuration(_) => {
                "The generation service API key is missing. Set API_KEY to enable portrait generation."
                    .to_string()
            }
            GenerationError::RateLimited { cooldown_ms } => {
                format!(
                    "You're going a little fast. Please wait {:.1}s and try again.",
                    *cooldown_ms as f64 / 1000.0
                )
            }
            GenerationError::QuotaExhausted { quota, .. } => {
                format!(
                    "You've used all {} free generations for today. Upgrade to Pro for unlimited runs.",
                    quota
                )
            }
            _ => "An error occurred while generating portraits. This might be due to API rate limits or a network issue. Please try again later."
                .to_string(),
        }
    }

    /// Error code for logging
    pub fn error_code(&self) -> &'static str {
        match self {
            GenerationError::Configuration(_) => "CONFIGURATION_ERROR",
            GenerationError::Encoding(_) => "ENCODING_FAILED",
            GenerationError::EmptyCatalog => "EMPTY_CATALOG",
            GenerationError::InvalidBatchSize(_) => "INVALID_BATCH_SIZE",
            GenerationError::RateLimited { .. } => "RATE_LIMITED",
            GenerationError::QuotaExhausted { .. } => "QUOTA_EXHAUSTED",
            GenerationError::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Whether the same request may succeed later without any change by the user
    pub fn is_transient(&self) -> bool {
        matches!(self, GenerationError::RateLimited { .. })
    }
}
