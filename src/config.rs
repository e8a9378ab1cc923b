// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Configuration for the portrait studio

use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-image-preview";
pub const DEFAULT_STORE_PATH: &str = "./portrait-banana.json";

/// Configuration for generation, throttling and entitlement policy
#[derive(Debug, Clone)]
pub struct StudioConfig {
    /// Generation service credential. `None` disables generation entirely.
    pub api_key: Option<String>,
    /// Base URL of the generation service
    pub endpoint: String,
    /// Model used for every style request
    pub model: String,
    /// Number of styles requested concurrently
    pub batch_size: usize,
    /// Upper bound on a single style request
    pub request_timeout_secs: u64,
    /// Token bucket capacity
    pub rate_limit_capacity: u32,
    /// Milliseconds per refilled token
    pub rate_limit_refill_ms: u64,
    /// Background refill tick
    pub rate_limit_tick_ms: u64,
    /// Generation runs per day for free users
    pub daily_free_quota: u32,
    /// Free images selectable without a subscription
    pub free_selection_limit: usize,
    /// Delay between consecutive downloads
    pub download_stagger_ms: u64,
    /// Backing file for the JSON store
    pub store_path: PathBuf,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            batch_size: 4,
            request_timeout_secs: 60,
            rate_limit_capacity: 3,
            rate_limit_refill_ms: 2000,
            rate_limit_tick_ms: 500,
            daily_free_quota: 5,
            free_selection_limit: 3,
            download_stagger_ms: 300,
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
        }
    }
}

impl StudioConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: api_key_from(|key| env::var(key).ok()),
            endpoint: env::var("GEMINI_ENDPOINT").unwrap_or(defaults.endpoint),
            model: env::var("GEMINI_MODEL").unwrap_or(defaults.model),
            batch_size: parse_env("GENERATION_BATCH_SIZE").unwrap_or(defaults.batch_size),
            request_timeout_secs: parse_env("GENERATION_REQUEST_TIMEOUT_SECS")
                .unwrap_or(defaults.request_timeout_secs),
            rate_limit_capacity: parse_env("RATE_LIMIT_CAPACITY")
                .unwrap_or(defaults.rate_limit_capacity),
            rate_limit_refill_ms: parse_env("RATE_LIMIT_REFILL_MS")
                .unwrap_or(defaults.rate_limit_refill_ms),
            rate_limit_tick_ms: parse_env("RATE_LIMIT_TICK_MS")
                .unwrap_or(defaults.rate_limit_tick_ms),
            daily_free_quota: parse_env("DAILY_FREE_QUOTA").unwrap_or(defaults.daily_free_quota),
            free_selection_limit: parse_env("FREE_SELECTION_LIMIT")
                .unwrap_or(defaults.free_selection_limit),
            download_stagger_ms: parse_env("DOWNLOAD_STAGGER_MS")
                .unwrap_or(defaults.download_stagger_ms),
            store_path: env::var("PB_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.store_path),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 {
            return Err("Batch size must be greater than 0".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("Request timeout must be greater than 0".to_string());
        }
        if self.rate_limit_capacity == 0 {
            return Err("Rate limit capacity must be greater than 0".to_string());
        }
        if self.rate_limit_refill_ms == 0 {
            return Err("Rate limit refill interval must be greater than 0".to_string());
        }
        if self.endpoint.trim().is_empty() {
            return Err("Generation endpoint must not be empty".to_string());
        }
        Ok(())
    }

    /// Whether the generation credential is present
    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn refill_interval(&self) -> Duration {
        Duration::from_millis(self.rate_limit_refill_ms)
    }

    pub fn download_stagger(&self) -> Duration {
        Duration::from_millis(self.download_stagger_ms)
    }
}

/// `API_KEY`, else `GEMINI_API_KEY`; blank values count as unset
fn api_key_from(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    ["API_KEY", "GEMINI_API_KEY"]
        .into_iter()
        .filter_map(|key| lookup(key))
        .find(|value| !value.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
