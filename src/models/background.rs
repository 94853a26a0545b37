// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! The background image a meme is composed on.

use image::RgbaImage;
use std::sync::Arc;

/// Where the current background came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Embedded image, `data:<mime>;base64,<payload>`.
    DataUrl(String),
    /// Remote image fetched over HTTP(S).
    Remote(String),
}

impl ImageSource {
    /// Short form for log lines; data URLs are not printed in full.
    pub fn describe(&self) -> String {
        match self {
            ImageSource::DataUrl(url) => {
                let header = url.split(',').next().unwrap_or_default();
                format!("{header},… ({} bytes)", url.len())
            }
            ImageSource::Remote(url) => url.clone(),
        }
    }
}

/// Whether the decoded pixels may be read back for export or re-encoding.
///
/// A remote image served without permissive cross-origin headers can still
/// be displayed, but its pixels are off limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelAccess {
    Readable,
    Tainted,
}

/// A decoded background image at its natural resolution.
#[derive(Debug, Clone)]
pub struct BackgroundImage {
    pub source: ImageSource,
    pub pixels: Arc<RgbaImage>,
    pub access: PixelAccess,
}

impl BackgroundImage {
    pub fn new(source: ImageSource, pixels: RgbaImage, access: PixelAccess) -> Self {
        Self {
            source,
            pixels: Arc::new(pixels),
            access,
        }
    }

    pub fn natural_width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn natural_height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn is_readable(&self) -> bool {
        self.access == PixelAccess::Readable
    }
}
