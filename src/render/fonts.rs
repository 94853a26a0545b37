// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Caption typeface shared by the on-screen overlay and the exporter.
//!
//! The same font bytes are registered with egui for the preview and parsed
//! by fontdue for export, so both draw the same glyph shapes.

use anyhow::{anyhow, Context, Result};
use std::path::Path;

/// egui font family the canvas uses for captions.
pub const CAPTION_FAMILY: &str = "caption";

/// Name of the proportional face egui ships with.
const BUILTIN_FONT: &str = "Ubuntu-Light";

/// A parsed caption font and the bytes it came from.
pub struct CaptionFont {
    name: String,
    bytes: Vec<u8>,
    font: fontdue::Font,
    synthetic_bold: bool,
}

impl std::fmt::Debug for CaptionFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptionFont")
            .field("name", &self.name)
            .field("bytes", &self.bytes.len())
            .field("synthetic_bold", &self.synthetic_bold)
            .finish()
    }
}

impl CaptionFont {
    fn from_bytes(name: String, bytes: Vec<u8>, synthetic_bold: bool) -> Result<Self> {
        let font = fontdue::Font::from_bytes(bytes.as_slice(), fontdue::FontSettings::default())
            .map_err(|e| anyhow!("Failed to parse font {}: {}", name, e))?;
        Ok(Self {
            name,
            bytes,
            font,
            synthetic_bold,
        })
    }

    /// The proportional face bundled with egui. It is a light weight, so it
    /// is always emboldened.
    pub fn builtin() -> Result<Self> {
        let data = egui::FontDefinitions::default()
            .font_data
            .remove(BUILTIN_FONT)
            .ok_or_else(|| anyhow!("egui has no bundled font named {}", BUILTIN_FONT))?;
        Self::from_bytes(BUILTIN_FONT.to_string(), data.font.into_owned(), true)
    }

    /// Load a TrueType/OpenType file.
    pub fn from_file(path: &Path, synthetic_bold: bool) -> Result<Self> {
        let bytes = std::fs::read(path).with_context(|| format!("Failed to read font {}", path.display()))?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "custom".to_string());
        Self::from_bytes(name, bytes, synthetic_bold)
    }

    /// Load the configured font, falling back to the bundled face.
    ///
    /// Export output diverges from the preview only if neither loads, which
    /// cannot happen while egui bundles its default fonts.
    pub fn load(path: Option<&Path>, synthetic_bold: bool) -> Result<Self> {
        if let Some(path) = path {
            match Self::from_file(path, synthetic_bold) {
                Ok(font) => {
                    log::info!("Using caption font {}", path.display());
                    return Ok(font);
                }
                Err(e) => log::warn!("{:#}; falling back to {}", e, BUILTIN_FONT),
            }
        }
        Self::builtin()
    }

    pub fn font(&self) -> &fontdue::Font {
        &self.font
    }

    pub fn synthetic_bold(&self) -> bool {
        self.synthetic_bold
    }

    /// Register this face with egui under [`CAPTION_FAMILY`].
    pub fn install(&self, ctx: &egui::Context) {
        let mut fonts = egui::FontDefinitions::default();
        fonts
            .font_data
            .insert(self.name.clone(), egui::FontData::from_owned(self.bytes.clone()));

        let mut family = vec![self.name.clone()];
        if let Some(fallbacks) = fonts.families.get(&egui::FontFamily::Proportional) {
            family.extend(fallbacks.iter().filter(|f| **f != self.name).cloned());
        }
        fonts
            .families
            .insert(egui::FontFamily::Name(CAPTION_FAMILY.into()), family);
        ctx.set_fonts(fonts);
    }
}

/// Font id the canvas uses for a caption of `size` display pixels.
pub fn caption_font_id(size: f32) -> egui::FontId {
    egui::FontId::new(size, egui::FontFamily::Name(CAPTION_FAMILY.into()))
}
