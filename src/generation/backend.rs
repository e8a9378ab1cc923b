// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Generation backend trait definition

use async_trait::async_trait;

use super::encode::EncodedImage;
use super::errors::BackendError;

/// Inline image returned by a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    /// Standard base64 payload
    pub data: String,
}

/// Trait for image-to-image generation services
///
/// One call renders one style: the shared encoded photo plus the style's
/// free-text prompt. Any backend with this request/response shape can be
/// substituted for the default Gemini client.
#[async_trait]
pub trait ImageBackend: Send + Sync {
    async fn generate(
        &self,
        image: &EncodedImage,
        prompt: &str,
    ) -> Result<InlineImage, BackendError>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}
