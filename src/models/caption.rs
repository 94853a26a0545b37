// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Caption data structures.
//!
//! A caption is one positioned, styled text overlay. Positions are kept in
//! display space: pixels relative to the top-left corner of the overlay
//! container, with `(x, y)` marking the visual center of the text.

use std::fmt;
use std::ops::RangeInclusive;

/// Text given to a caption created with the "add caption" action.
pub const DEFAULT_TEXT: &str = "NEW TEXT";

/// Anchor of a freshly added caption, in display pixels.
pub const DEFAULT_POSITION: (f32, f32) = (300.0, 50.0);

/// Default caption fill color.
pub const DEFAULT_COLOR: CaptionColor = CaptionColor::WHITE;

/// Default caption size in display pixels.
pub const DEFAULT_FONT_SIZE: f32 = 32.0;

/// Font sizes offered by the size slider. Not enforced by the model.
pub const FONT_SIZE_RANGE: RangeInclusive<f32> = 12.0..=120.0;

/// Opaque identifier of a caption, unique within a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CaptionId(u64);

impl CaptionId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for CaptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "caption-{}", self.0)
    }
}

/// Straight-alpha RGBA color of a caption's fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptionColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl CaptionColor {
    pub const WHITE: CaptionColor = CaptionColor::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for CaptionColor {
    fn default() -> Self {
        DEFAULT_COLOR
    }
}

/// Printed as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
impl fmt::Display for CaptionColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

/// One text overlay on the background image.
#[derive(Debug, Clone, PartialEq)]
pub struct Caption {
    pub id: CaptionId,
    pub text: String,
    /// Horizontal anchor (text center) in display pixels.
    pub x: f32,
    /// Vertical anchor (text center) in display pixels.
    pub y: f32,
    pub color: CaptionColor,
    /// Text size in display pixels.
    pub font_size: f32,
}

impl Caption {
    /// Create a caption with the default position and appearance.
    pub fn new(id: CaptionId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            x: DEFAULT_POSITION.0,
            y: DEFAULT_POSITION.1,
            color: DEFAULT_COLOR,
            font_size: DEFAULT_FONT_SIZE,
        }
    }

    /// Whether there is anything to draw.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_caption_uses_defaults() {
        let caption = Caption::new(CaptionId::new(7), "hello");
        assert_eq!(caption.text, "hello");
        assert_eq!((caption.x, caption.y), (300.0, 50.0));
        assert_eq!(caption.color, CaptionColor::WHITE);
        assert_eq!(caption.font_size, 32.0);
    }

    #[test]
    fn test_color_display() {
        assert_eq!(CaptionColor::WHITE.to_string(), "#FFFFFF");
        assert_eq!(CaptionColor::rgba(1, 2, 3, 4).to_string(), "#01020304");
    }

    #[test]
    fn test_blank_text() {
        let mut caption = Caption::new(CaptionId::new(1), "   ");
        assert!(caption.is_blank());
        caption.text = "x".into();
        assert!(!caption.is_blank());
    }
}
