// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Portrait style catalog
//!
//! A catalog is an ordered, immutable list of styles. Order matters: the
//! generation pipeline batches styles in catalog order.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One named prompt template applied to the input photo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleDescriptor {
    pub name: String,
    pub prompt: String,
    pub is_premium: bool,
}

impl StyleDescriptor {
    pub fn new(name: impl Into<String>, prompt: impl Into<String>, is_premium: bool) -> Self {
        Self {
            name: name.into(),
            prompt: prompt.into(),
            is_premium,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Style catalog must contain at least one style")]
    Empty,

    #[error("Duplicate style name in catalog: {0}")]
    DuplicateName(String),

    #[error("Style '{0}' has an empty prompt")]
    EmptyPrompt(String),
}

/// Ordered list of styles, unique by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleCatalog {
    styles: Vec<StyleDescriptor>,
}

impl StyleCatalog {
    /// Build a catalog, rejecting empty lists, blank prompts and duplicate names
    pub fn new(styles: Vec<StyleDescriptor>) -> Result<Self, CatalogError> {
        if styles.is_empty() {
            return Err(CatalogError::Empty);
        }
        for (i, style) in styles.iter().enumerate() {
            if style.prompt.trim().is_empty() {
                return Err(CatalogError::EmptyPrompt(style.name.clone()));
            }
            if styles[..i].iter().any(|s| s.name == style.name) {
                return Err(CatalogError::DuplicateName(style.name.clone()));
            }
        }
        Ok(Self { styles })
    }

    /// The built-in portrait catalog
    pub fn portraits() -> Self {
        Self {
            styles: PORTRAIT_STYLES
                .iter()
                .map(|&(name, prompt, is_premium)| StyleDescriptor::new(name, prompt, is_premium))
                .collect(),
        }
    }

    pub fn styles(&self) -> &[StyleDescriptor] {
        &self.styles
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&StyleDescriptor> {
        self.styles.iter().find(|s| s.name == name)
    }

    pub fn premium_count(&self) -> usize {
        self.styles.iter().filter(|s| s.is_premium).count()
    }
}

/// (name, prompt, is_premium)
const PORTRAIT_STYLES: &[(&str, &str, bool)] = &[
    (
        "Corporate Headshot",
        "Generate a professional corporate headshot. The subject should be wearing business attire, with a clean, blurred office background. The lighting should be soft and flattering, creating a confident and approachable look.",
        false,
    ),
    (
        "Dramatic Black & White",
        "Create a dramatic, high-contrast black and white portrait. Emphasize shadows and highlights to create a moody and artistic feel, inspired by classic film noir cinematography.",
        false,
    ),
    (
        "Golden Hour Glow",
        "Reimagine this portrait as if it were taken during the golden hour. The lighting should be warm, soft, and coming from the side, creating long shadows and a beautiful, gentle glow on the subject.",
        false,
    ),
    (
        "Futuristic Neon",
        "Transform this into a futuristic portrait with neon lighting. The subject should be bathed in vibrant pink, blue, and purple light, with a dark, cyberpunk-inspired background.",
        true,
    ),
    (
        "Vintage Film Look",
        "Give this photo a vintage film look, reminiscent of a 1970s photograph. Add a subtle grain, slightly faded colors, and a warm tint to evoke a sense of nostalgia.",
        false,
    ),
    (
        "Fantasy Art Style",
        "Turn this portrait into a fantasy-style digital painting. The subject should have ethereal features, perhaps with pointed ears or glowing eyes, set against a magical, enchanted forest background.",
        true,
    ),
    (
        "Van Gogh Style Portrait",
        "Redraw this image in the style of a Vincent van Gogh oil painting. Use thick, swirling brushstrokes throughout, especially in the background. Make the colors intense and the lighting dramatic for an emotional, post-impressionist feel.",
        true,
    ),
    (
        "Surreal 70s Photo Collage",
        "Recreate this image as a surreal 1970s photo collage. Use a grainy, faded color palette and place the subject in an uncanny, dreamlike landscape. The final image should have a vintage, analog feel.",
        true,
    ),
    (
        "Pop Art Stencil Graffiti",
        "Transform this portrait into a bold pop art and stencil graffiti piece. Use thick, high-contrast black outlines like a stencil, with a chaotic, vibrant spray-painted background in multiple colors.",
        true,
    ),
    (
        "Hyper-Realistic Studio Portrait",
        "Generate a hyper-realistic, modern studio portrait. The image should be incredibly sharp and detailed, with clean, soft studio lighting against a plain, neutral background. The final result should look like a high-end professional headshot.",
        true,
    ),
    (
        "Psychedelic Visionary Art",
        "Convert this image into a piece of psychedelic visionary art. The portrait should be at the center of a symmetrical, kaleidoscopic explosion of intricate patterns and mystical symbols, rendered in an intensely vibrant, otherworldly color palette.",
        true,
    ),
    (
        "Warhol Pop Art",
        "Transform this photo into an Andy Warhol-style pop art screenprint. Use a vibrant, high-contrast color palette with flat areas of color, like a silkscreen print. The final image should have the iconic, bold, and slightly off-register look of his celebrity portraits.",
        true,
    ),
    (
        "Minimalist Pop Art",
        "Recreate this portrait in a minimalist pop art style. Use bold, flat blocks of solid color with minimal shading. The subject should be stylized with abstracted features against a vibrant, single-color background, creating a cool and graphic look.",
        true,
    ),
    (
        "Vintage Cartoon Illustration",
        "Reimagine this image in the style of a vintage cartoon illustration, similar to classic European comics. Use clean, bold black outlines and a palette of flat, simple colors with no shading. Place the subject against a solid, vibrant background to create a whimsical and nostalgic feel.",
        true,
    ),
    (
        "Modern Oil Portrait",
        "Recreate this image as a modern oil portrait with a sense of expressive realism. Use visible, textured brushstrokes, especially in the dark, moody background. The lighting on the subject should be soft but dramatic, capturing a contemplative mood. Maintain realism in the face while rendering the rest of the scene with a looser, painterly quality.",
        true,
    ),
    (
        "Mixed-Media Pop Art Collage",
        "Recreate this portrait as a raw, mixed-media pop art piece inspired by Andy Warhol's multi-panel works. The image should be divided into a four-panel grid. Each panel should feature a high-contrast, screen-printed version of the portrait on a uniquely textured and colored background (e.g., crumpled green paper, distressed gold leaf, rough silver, and matte black). The entire piece should be set against a heavily textured, abstract painted background with a raw, grungy feel.",
        true,
    ),
    (
        "Satirical Social Realism",
        "Recreate this portrait in a satirical social realist painting style. The subject and any surrounding figures should be rendered with rounded, exaggerated, almost clay-like features. Place the subject in a surreal, allegorical scene, surrounded by a crowd of onlookers. Use a muted, earthy color palette and expressive, visible brushstrokes to give the piece a textured, painterly quality.",
        true,
    ),
    (
        "Conceptual Realism Portrait",
        "Recreate this image as a conceptual realism painting. The scene should be staged like a formal, slightly melancholic family portrait from a past era. Use a muted and slightly desaturated color palette to evoke a sense of memory and stillness. The lighting should be soft and even, and the figures rendered realistically but with a quiet, emotionally detached presence.",
        true,
    ),
    (
        "Cinematic Crowd Scene",
        "Recreate this image as a cinematic, staged narrative photograph. The scene should be viewed from a high-angle, looking down on the subject who is surrounded by a dense crowd. Use dramatic, high-contrast lighting with deep shadows to create a sense of mystery and narrative, as if it were a still from a film. The colors should be rich and saturated.",
        true,
    ),
    (
        "Taped Stencil Portrait",
        "Recreate this image as a raw, two-tone stencil artwork. The portrait should be high-contrast and graphic, as if made with a stencil and screen-printed. Frame the artwork with pieces of torn, bright yellow masking tape for a DIY, street-art feel. The background should be a simple, off-white surface, giving the piece a rough, work-in-progress look.",
        true,
    ),
];
