// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Export engine.
//!
//! Flattens the background and every caption into one RGBA image at the
//! background's natural resolution and encodes it as PNG. Caption styling
//! reproduces the on-screen treatment: bold face, black outline, and a soft
//! drop shadow under the outline only.

use super::fonts::CaptionFont;
use super::text::{self, ClipRect, TextTreatment};
use crate::models::background::BackgroundImage;
use crate::models::caption::Caption;
use crate::util::geometry::{DisplayMapping, Point};
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use std::sync::Arc;
use thiserror::Error;

/// Outline width in display pixels.
pub const STROKE_WIDTH: f32 = 4.0;
/// Shadow blur radius in display pixels.
pub const SHADOW_BLUR: f32 = 4.0;
/// Shadow offset (right, down) in display pixels.
pub const SHADOW_OFFSET: (f32, f32) = (0.0, 2.0);
/// Shadow color: black at half opacity.
pub const SHADOW_COLOR: [u8; 4] = [0, 0, 0, 128];
const STROKE_COLOR: [u8; 4] = [0, 0, 0, 255];
/// Synthetic bold thickness as a fraction of the font size.
const EMBOLDEN_RATIO: f32 = 0.035;

/// Errors that stop an export.
#[derive(Error, Debug)]
pub enum ExportError {
    /// No background has been loaded
    #[error("There is no image to export")]
    NoImage,

    /// Background not yet laid out on screen
    #[error("The image is not ready for export yet")]
    NotLaidOut,

    /// Background has no pixels
    #[error("Cannot export an empty {0}x{1} image")]
    EmptySurface(u32, u32),

    /// Pixel readback blocked by cross-origin policy
    #[error("The image was loaded from another origin without permission to read its pixels")]
    CrossOriginTainted,

    /// PNG encoding failed
    #[error("Failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),
}

/// The capability the application uses to obtain the flattened meme.
pub trait ImageExporter {
    fn export_as_image(&self) -> Result<Vec<u8>, ExportError>;
}

/// Immutable snapshot of everything an export needs.
///
/// Built on the UI thread, rendered on a worker.
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub background: BackgroundImage,
    pub captions: Vec<Caption>,
    pub mapping: DisplayMapping,
    pub font: Arc<CaptionFont>,
}

impl ExportJob {
    /// Render the flattened image without encoding it.
    pub fn compose(&self) -> Result<RgbaImage, ExportError> {
        let (width, height) = self.background.pixels.dimensions();
        if width == 0 || height == 0 {
            return Err(ExportError::EmptySurface(width, height));
        }
        if !self.background.is_readable() {
            return Err(ExportError::CrossOriginTainted);
        }

        let mut canvas = RgbaImage::clone(&self.background.pixels);
        for caption in &self.captions {
            draw_caption(&mut canvas, caption, &self.mapping, &self.font);
        }
        Ok(canvas)
    }
}

impl ImageExporter for ExportJob {
    fn export_as_image(&self) -> Result<Vec<u8>, ExportError> {
        let canvas = self.compose()?;
        let png = encode_png(&canvas)?;
        log::info!(
            "Exported {}x{} image with {} captions ({} bytes)",
            canvas.width(),
            canvas.height(),
            self.captions.len(),
            png.len()
        );
        Ok(png)
    }
}

/// Encode an RGBA image as PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Meme treatment for text of `font_size` display pixels drawn at `scale`
/// target pixels per display pixel. The canvas preview uses scale 1.
pub fn caption_treatment(font_size: f32, scale: f32, synthetic_bold: bool) -> TextTreatment {
    let font_px = font_size * scale;
    TextTreatment {
        font_px,
        embolden: if synthetic_bold { font_px * EMBOLDEN_RATIO } else { 0.0 },
        stroke_width: STROKE_WIDTH * scale,
        shadow_blur: SHADOW_BLUR * scale,
        shadow_offset: (SHADOW_OFFSET.0 * scale, SHADOW_OFFSET.1 * scale),
    }
}

/// Natural-space treatment for a caption under `mapping`.
fn treatment_for(caption: &Caption, mapping: &DisplayMapping, font: &CaptionFont) -> TextTreatment {
    caption_treatment(caption.font_size, mapping.scale, font.synthetic_bold())
}

/// Shadowed stroke pass, then the fill pass on top.
fn draw_caption(canvas: &mut RgbaImage, caption: &Caption, mapping: &DisplayMapping, font: &CaptionFont) {
    let treatment = treatment_for(caption, mapping, font);
    let anchor = mapping.to_natural(Point::new(caption.x, caption.y));
    let (anchor_x, anchor_y) = (anchor.x.round() as i32, anchor.y.round() as i32);
    let visible = ClipRect {
        left: -anchor_x,
        top: -anchor_y,
        right: canvas.width() as i32 - anchor_x,
        bottom: canvas.height() as i32 - anchor_y,
    };
    let Some(masks) = text::rasterize(font.font(), &caption.text, &treatment, Some(visible)) else {
        return;
    };

    let left = anchor_x + masks.left;
    let top = anchor_y + masks.top;
    let shadow_left = left + treatment.shadow_offset.0.round() as i32;
    let shadow_top = top + treatment.shadow_offset.1.round() as i32;

    text::blend_mask(canvas, &masks.shadow, shadow_left, shadow_top, SHADOW_COLOR);
    text::blend_mask(canvas, &masks.stroke, left, top, STROKE_COLOR);
    text::blend_mask(canvas, &masks.fill, left, top, caption.color.to_array());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::background::{ImageSource, PixelAccess};
    use crate::models::caption::{CaptionColor, CaptionId};
    use crate::util::geometry::{fit_contain, ScreenBox};
    use image::Rgba;

    const GRAY: Rgba<u8> = Rgba([90, 120, 150, 255]);

    fn background(width: u32, height: u32, access: PixelAccess) -> BackgroundImage {
        BackgroundImage::new(
            ImageSource::DataUrl("data:image/png;base64,".into()),
            RgbaImage::from_pixel(width, height, GRAY),
            access,
        )
    }

    fn job(bg: BackgroundImage, captions: Vec<Caption>, container: ScreenBox) -> ExportJob {
        let image_box = fit_contain(bg.natural_width(), bg.natural_height(), container);
        ExportJob {
            mapping: DisplayMapping::from_layout(bg.natural_width(), image_box, container).unwrap(),
            background: bg,
            captions,
            font: Arc::new(CaptionFont::builtin().unwrap()),
        }
    }

    fn caption(id: u64, text: &str, x: f32, y: f32) -> Caption {
        let mut c = Caption::new(CaptionId::new(id), text);
        c.x = x;
        c.y = y;
        c
    }

    #[test]
    fn test_no_captions_reproduces_background() {
        let bg = background(64, 48, PixelAccess::Readable);
        let original = RgbaImage::clone(&bg.pixels);
        let png = job(bg, vec![], ScreenBox::new(0.0, 0.0, 32.0, 24.0))
            .export_as_image()
            .unwrap();

        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_output_is_natural_size_for_any_display_size() {
        for display in [50.0, 200.0, 1000.0] {
            let bg = background(120, 90, PixelAccess::Readable);
            let captions = vec![caption(1, "TOP TEXT", display / 2.0, 10.0)];
            let out = job(bg, captions, ScreenBox::new(0.0, 0.0, display, display)).compose().unwrap();
            assert_eq!(out.dimensions(), (120, 90));
        }
    }

    #[test]
    fn test_caption_drawn_at_mapped_anchor() {
        // 200x100 image shown at 100x50 in a 100x100 container: scale 2, offset (0, 25).
        let bg = background(200, 100, PixelAccess::Readable);
        let mut c = caption(1, "I", 50.0, 50.0);
        c.color = CaptionColor::rgb(255, 0, 0);
        c.font_size = 20.0;
        let out = job(bg, vec![c], ScreenBox::new(0.0, 0.0, 100.0, 100.0)).compose().unwrap();

        // Anchor maps to natural (100, 50): the stem of the I is filled red there.
        let center = out.get_pixel(100, 50);
        assert!(center[0] > 200 && center[1] < 60, "center {:?}", center);
        // Far corners are untouched.
        assert_eq!(*out.get_pixel(0, 0), GRAY);
        assert_eq!(*out.get_pixel(199, 99), GRAY);
    }

    #[test]
    fn test_outline_is_black_around_fill() {
        let bg = background(300, 120, PixelAccess::Readable);
        let mut c = caption(1, "I", 150.0, 60.0);
        c.font_size = 60.0;
        let out = job(bg, vec![c], ScreenBox::new(0.0, 0.0, 300.0, 120.0)).compose().unwrap();

        // Walk right from the stem until the fill ends; the next pixels are outline.
        let row = 60;
        let mut x = 150;
        while out.get_pixel(x, row)[0] > 200 {
            x += 1;
        }
        let darkest = (x..x + 4).map(|x| out.get_pixel(x, row)[0]).min().unwrap();
        assert!(darkest < 40, "no outline beside fill, darkest={darkest}");
    }

    #[test]
    fn test_later_captions_paint_over_earlier() {
        let bg = background(100, 100, PixelAccess::Readable);
        let mut under = caption(1, "I", 50.0, 50.0);
        under.color = CaptionColor::rgb(255, 0, 0);
        under.font_size = 40.0;
        let mut over = under.clone();
        over.id = CaptionId::new(2);
        over.color = CaptionColor::rgb(0, 255, 0);

        let out = job(bg, vec![under, over], ScreenBox::new(0.0, 0.0, 100.0, 100.0))
            .compose()
            .unwrap();
        let center = out.get_pixel(50, 50);
        assert!(center[1] > 200 && center[0] < 60, "center {:?}", center);
    }

    #[test]
    fn test_blank_captions_are_skipped() {
        let bg = background(40, 40, PixelAccess::Readable);
        let original = RgbaImage::clone(&bg.pixels);
        let out = job(bg, vec![caption(1, "", 20.0, 20.0)], ScreenBox::new(0.0, 0.0, 40.0, 40.0))
            .compose()
            .unwrap();
        assert_eq!(out, original);
    }

    #[test]
    fn test_tainted_background_fails_cleanly() {
        let bg = background(40, 40, PixelAccess::Tainted);
        let result = job(bg, vec![caption(1, "hi", 20.0, 20.0)], ScreenBox::new(0.0, 0.0, 40.0, 40.0))
            .export_as_image();
        assert!(matches!(result, Err(ExportError::CrossOriginTainted)));
    }

    #[test]
    fn test_treatment_scales_with_mapping() {
        let font = CaptionFont::builtin().unwrap();
        let mapping = DisplayMapping {
            scale: 2.5,
            offset_x: 0.0,
            offset_y: 0.0,
        };
        let t = treatment_for(&caption(1, "x", 0.0, 0.0), &mapping, &font);
        assert_eq!(t.font_px, 80.0);
        assert_eq!(t.stroke_width, 10.0);
        assert_eq!(t.shadow_blur, 10.0);
        assert_eq!(t.shadow_offset, (0.0, 5.0));
        assert!(t.embolden > 0.0);
    }
}
