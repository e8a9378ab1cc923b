// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Input photo loading and encoding for the generation service

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::ImageFormat;
use std::path::Path;
use thiserror::Error;

/// Maximum input image size (20MB, the inline payload ceiling upstream)
pub const MAX_IMAGE_SIZE: usize = 20 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image data is too large: {0} bytes (max: {1} bytes)")]
    TooLarge(usize, usize),

    #[error("Invalid base64 encoding: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Image data is empty")]
    EmptyData,

    #[error("Malformed data URI")]
    MalformedDataUri,

    #[error("Failed to read image: {0}")]
    Io(#[from] std::io::Error),
}

/// The user's photo as uploaded
#[derive(Debug, Clone)]
pub struct InputImage {
    bytes: Vec<u8>,
}

/// Input photo in the service's inline representation, shared by every style request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub mime_type: String,
    /// Standard base64, no data-URI prefix
    pub data: String,
}

impl InputImage {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ImageError> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        Ok(Self { bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Validate and base64-encode the photo
    pub fn encode(&self) -> Result<EncodedImage, ImageError> {
        if self.bytes.is_empty() {
            return Err(ImageError::EmptyData);
        }
        if self.bytes.len() > MAX_IMAGE_SIZE {
            return Err(ImageError::TooLarge(self.bytes.len(), MAX_IMAGE_SIZE));
        }
        let format = detect_format(&self.bytes)?;
        Ok(EncodedImage {
            mime_type: format.to_mime_type().to_string(),
            data: STANDARD.encode(&self.bytes),
        })
    }
}

/// Detect image format from magic bytes
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, ImageError> {
    if bytes.len() < 4 {
        return Err(ImageError::UnsupportedFormat);
    }

    match bytes {
        // PNG: 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => Ok(ImageFormat::Png),

        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Ok(ImageFormat::Jpeg),

        // WebP: RIFF .... WEBP
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Ok(ImageFormat::WebP),

        // GIF87a / GIF89a
        [0x47, 0x49, 0x46, 0x38, x, ..] if *x == 0x37 || *x == 0x39 => Ok(ImageFormat::Gif),

        // BMP: BM
        [0x42, 0x4D, ..] => Ok(ImageFormat::Bmp),

        // TIFF: II or MM
        [0x49, 0x49, 0x2A, 0x00, ..] | [0x4D, 0x4D, 0x00, 0x2A, ..] => Ok(ImageFormat::Tiff),

        _ => Err(ImageError::UnsupportedFormat),
    }
}

/// Build a `data:` URI from a MIME type and base64 payload
pub fn to_data_uri(mime_type: &str, base64_data: &str) -> String {
    format!("data:{};base64,{}", mime_type, base64_data)
}

/// Split a base64 `data:` URI into its MIME type and decoded bytes
pub fn decode_data_uri(uri: &str) -> Result<(String, Vec<u8>), ImageError> {
    let rest = uri.strip_prefix("data:").ok_or(ImageError::MalformedDataUri)?;
    let (header, payload) = rest.split_once(',').ok_or(ImageError::MalformedDataUri)?;
    let mime_type = header
        .strip_suffix(";base64")
        .ok_or(ImageError::MalformedDataUri)?;
    let bytes = STANDARD.decode(payload)?;
    if bytes.is_empty() {
        return Err(ImageError::EmptyData);
    }
    Ok((mime_type.to_string(), bytes))
}
