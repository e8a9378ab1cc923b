// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Gemini image model client (generateContent with inline image parts)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::backend::{ImageBackend, InlineImage};
use super::encode::EncodedImage;
use super::errors::{BackendError, GenerationError};
use crate::config::StudioConfig;

/// Client for the Gemini `generateContent` endpoint
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    timeout: Duration,
}

// --- Wire types ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Content,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

// --- Implementations ---

impl GenerateContentRequest {
    /// Photo part first, then the style prompt
    pub fn new(image: &EncodedImage, prompt: &str) -> Self {
        Self {
            contents: Content {
                parts: vec![
                    Part {
                        text: None,
                        inline_data: Some(InlineData {
                            mime_type: image.mime_type.clone(),
                            data: image.data.clone(),
                        }),
                    },
                    Part {
                        text: Some(prompt.to_string()),
                        inline_data: None,
                    },
                ],
            },
            generation_config: GenerationConfig {
                response_modalities: vec!["IMAGE".to_string(), "TEXT".to_string()],
            },
        }
    }
}

/// Take the first inline image part of the first candidate
pub fn extract_inline_image(response: GenerateContentResponse) -> Result<InlineImage, BackendError> {
    let parts = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts)
        .filter(|parts| !parts.is_empty())
        .ok_or(BackendError::EmptyResponse)?;

    parts
        .into_iter()
        .filter_map(|p| p.inline_data)
        .find(|d| !d.data.is_empty())
        .map(|d| InlineImage {
            mime_type: d.mime_type,
            data: d.data,
        })
        .ok_or(BackendError::NoImagePayload)
}

impl GeminiClient {
    /// Create a new client. An absent or blank key is a configuration error.
    pub fn new(
        api_key: &str,
        endpoint: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        if api_key.trim().is_empty() {
            return Err(GenerationError::Configuration(
                "API_KEY environment variable not set".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::Configuration(format!("HTTP client: {}", e)))?;

        let endpoint = endpoint.trim_end_matches('/').to_string();
        info!(
            "Gemini client configured: endpoint={}, model={}",
            endpoint, model
        );

        Ok(Self {
            client,
            endpoint,
            model: model.to_string(),
            api_key: api_key.to_string(),
            timeout,
        })
    }

    pub fn from_config(config: &StudioConfig) -> Result<Self, GenerationError> {
        let api_key = config.api_key.as_deref().ok_or_else(|| {
            GenerationError::Configuration("API_KEY environment variable not set".to_string())
        })?;
        Self::new(
            api_key,
            &config.endpoint,
            &config.model,
            config.request_timeout(),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn request_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model
        )
    }
}

#[async_trait]
impl ImageBackend for GeminiClient {
    async fn generate(
        &self,
        image: &EncodedImage,
        prompt: &str,
    ) -> Result<InlineImage, BackendError> {
        let url = self.request_url();
        debug!("Gemini generateContent POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&GenerateContentRequest::new(image, prompt))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout {
                        timeout_ms: self.timeout.as_millis() as u64,
                    }
                } else {
                    BackendError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| BackendError::MalformedResponse(e.to_string()))?;
        extract_inline_image(body)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}
