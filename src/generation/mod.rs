// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Stylized portrait generation against a pluggable image backend

pub mod backend;
pub mod encode;
pub mod errors;
pub mod gemini;
pub mod pipeline;
pub mod run;
pub mod types;

pub use backend::{ImageBackend, InlineImage};
pub use encode::{EncodedImage, ImageError, InputImage};
pub use errors::{BackendError, GenerationError};
pub use gemini::GeminiClient;
pub use pipeline::{GenerationPipeline, GenerationReport};
pub use run::{Gallery, RunId, RunTicket};
pub use types::GeneratedImage;
