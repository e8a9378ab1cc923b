// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Generated portrait type

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::backend::InlineImage;
use super::encode::{decode_data_uri, to_data_uri, ImageError};
use crate::catalog::StyleDescriptor;

/// One rendered style variant. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub id: Uuid,
    /// `data:<mime>;base64,<payload>`
    pub src: String,
    pub prompt: String,
    pub name: String,
    pub is_premium: bool,
}

impl GeneratedImage {
    /// Wrap a backend payload with a fresh id and the style's metadata
    pub fn from_style(style: &StyleDescriptor, image: &InlineImage) -> Self {
        Self {
            id: Uuid::new_v4(),
            src: to_data_uri(&image.mime_type, &image.data),
            prompt: style.prompt.clone(),
            name: style.name.clone(),
            is_premium: style.is_premium,
        }
    }

    /// Decoded MIME type and bytes of the image
    pub fn payload(&self) -> Result<(String, Vec<u8>), ImageError> {
        decode_data_uri(&self.src)
    }
}
