// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Raster text primitives for the export compositor.
//!
//! Text is rasterized once into a coverage mask positioned relative to its
//! anchor. Bold, outline and shadow passes are derived from that mask by
//! dilation and blur, then blended into the target with source-over.
//! Dilation runs on a distance transform and the blur is a box
//! approximation, so both stay linear in mask size whatever the radius.

use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};
use fontdue::Font;
use image::{imageops, GrayImage, Luma, Rgba, RgbaImage};

/// Sizes of one caption's meme treatment, in target pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextTreatment {
    pub font_px: f32,
    /// Extra thickness added to glyph edges for synthetic bold.
    pub embolden: f32,
    /// Full outline width; half of it extends beyond the fill.
    pub stroke_width: f32,
    pub shadow_blur: f32,
    pub shadow_offset: (f32, f32),
}

/// Coverage masks for one line of text.
///
/// All masks share one size. `(left, top)` is the mask's top-left corner
/// relative to the text anchor.
#[derive(Debug)]
pub struct TextMasks {
    pub left: i32,
    pub top: i32,
    pub fill: GrayImage,
    pub stroke: GrayImage,
    pub shadow: GrayImage,
}

/// Anchor-relative region of the target that can receive ink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// Rasterize `text` centered on the origin and derive its pass masks.
///
/// With a `clip`, masks only cover that region plus the margin the passes
/// need, so text running far past the image costs nothing extra.
///
/// Returns `None` when nothing would be visible (empty or whitespace text,
/// zero size, or text entirely outside `clip`).
pub fn rasterize(font: &Font, text: &str, treatment: &TextTreatment, clip: Option<ClipRect>) -> Option<TextMasks> {
    let px = treatment.font_px;
    if px.is_nan() || px <= 0.0 || text.trim().is_empty() {
        return None;
    }
    // Canvas text is single-line.
    let text = text.replace(['\n', '\r'], " ");

    let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
    layout.reset(&LayoutSettings::default());
    layout.append(&[font], &TextStyle::new(&text, px, 0));
    let glyphs = layout.glyphs();

    // Horizontal center uses the advance width, vertical center the line box.
    let advance = glyphs
        .last()
        .map(|g| {
            let m = font.metrics_indexed(g.key.glyph_index, px);
            g.x - m.xmin as f32 + m.advance_width
        })
        .unwrap_or(0.0);
    let (ascent, descent) = font
        .horizontal_line_metrics(px)
        .map(|m| (m.ascent, m.descent))
        .unwrap_or((px * 0.8, -px * 0.2));
    let shift_x = -advance / 2.0;
    let shift_y = -(ascent - descent) / 2.0;

    let mut min_x = i32::MAX;
    let mut min_y = i32::MAX;
    let mut max_x = i32::MIN;
    let mut max_y = i32::MIN;
    for g in glyphs.iter().filter(|g| g.width > 0 && g.height > 0) {
        let x = (g.x + shift_x).floor() as i32;
        let y = (g.y + shift_y).floor() as i32;
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x + g.width as i32);
        max_y = max_y.max(y + g.height as i32);
    }
    if min_x > max_x {
        return None;
    }

    let sigma = treatment.shadow_blur / 2.0;
    let (off_x, off_y) = treatment.shadow_offset;
    let pad = (treatment.embolden + treatment.stroke_width / 2.0 + 3.0 * sigma + off_x.abs().max(off_y.abs()))
        .ceil() as i32
        + 2;
    let mut left = min_x - pad;
    let mut top = min_y - pad;
    let mut right = max_x + pad;
    let mut bottom = max_y + pad;
    if let Some(clip) = clip {
        left = left.max(clip.left - pad);
        top = top.max(clip.top - pad);
        right = right.min(clip.right + pad);
        bottom = bottom.min(clip.bottom + pad);
    }
    if left >= right || top >= bottom {
        return None;
    }
    let width = (right - left) as u32;
    let height = (bottom - top) as u32;

    let mut glyph_mask = GrayImage::new(width, height);
    for g in glyphs.iter().filter(|g| g.width > 0 && g.height > 0) {
        let (metrics, bitmap) = font.rasterize_indexed(g.key.glyph_index, g.key.px);
        let gx = (g.x + shift_x).floor() as i32 - left;
        let gy = (g.y + shift_y).floor() as i32 - top;
        for row in 0..metrics.height {
            for col in 0..metrics.width {
                let coverage = bitmap[row * metrics.width + col];
                if coverage == 0 {
                    continue;
                }
                let tx = gx + col as i32;
                let ty = gy + row as i32;
                if tx >= 0 && ty >= 0 && (tx as u32) < width && (ty as u32) < height {
                    let cell = glyph_mask.get_pixel_mut(tx as u32, ty as u32);
                    cell[0] = cell[0].max(coverage);
                }
            }
        }
    }

    let fill = dilate(&glyph_mask, treatment.embolden);
    let stroke = dilate(&fill, treatment.stroke_width / 2.0);
    let shadow = if sigma > 0.0 {
        imageops::fast_blur(&stroke, sigma)
    } else {
        stroke.clone()
    };

    Some(TextMasks {
        left,
        top,
        fill,
        stroke,
        shadow,
    })
}

/// Grow mask coverage outward by `radius` pixels with an anti-aliased edge.
///
/// Pixels at least half covered count as ink; every pixel within `radius`
/// of ink becomes opaque, fading out over the next pixel.
pub fn dilate(mask: &GrayImage, radius: f32) -> GrayImage {
    if radius.is_nan() || radius <= 0.0 {
        return mask.clone();
    }
    // Faint-only masks (hairlines at tiny sizes) still need a source.
    let threshold = if mask.pixels().any(|p| p[0] >= 128) { 128 } else { 1 };
    let squared = squared_distance_to_ink(mask, threshold);

    let mut out = mask.clone();
    for (cell, distance_sq) in out.pixels_mut().zip(squared) {
        let weight = (radius + 0.5 - distance_sq.sqrt()).clamp(0.0, 1.0);
        let value = (weight * 255.0).round() as u8;
        if value > cell[0] {
            *cell = Luma([value]);
        }
    }
    out
}

const FAR: f32 = 1e20;

/// Squared Euclidean distance from each pixel to the nearest pixel with
/// coverage `>= threshold`, row-major.
///
/// Two separable passes of the lower-envelope transform from Felzenszwalb
/// and Huttenlocher, "Distance Transforms of Sampled Functions".
fn squared_distance_to_ink(mask: &GrayImage, threshold: u8) -> Vec<f32> {
    let (width, height) = (mask.width() as usize, mask.height() as usize);
    let mut grid: Vec<f32> = mask
        .pixels()
        .map(|p| if p[0] >= threshold { 0.0 } else { FAR })
        .collect();

    let longest = width.max(height);
    let mut line = vec![0.0f64; longest];
    let mut result = vec![0.0f64; longest];
    let mut envelope = Envelope::with_capacity(longest);

    for x in 0..width {
        for y in 0..height {
            line[y] = f64::from(grid[y * width + x]);
        }
        envelope.transform(&line[..height], &mut result[..height]);
        for y in 0..height {
            grid[y * width + x] = result[y] as f32;
        }
    }
    for row in grid.chunks_exact_mut(width.max(1)) {
        for (dst, &src) in line.iter_mut().zip(row.iter()) {
            *dst = f64::from(src);
        }
        envelope.transform(&line[..width], &mut result[..width]);
        for (dst, &src) in row.iter_mut().zip(result.iter()) {
            *dst = src as f32;
        }
    }
    grid
}

/// Scratch space for the 1-D distance transform.
struct Envelope {
    vertices: Vec<usize>,
    bounds: Vec<f64>,
}

impl Envelope {
    fn with_capacity(n: usize) -> Self {
        Self {
            vertices: vec![0; n.max(1)],
            bounds: vec![0.0; n + 1],
        }
    }

    /// `out[q] = min over p of (q - p)^2 + f[p]`.
    fn transform(&mut self, f: &[f64], out: &mut [f64]) {
        let n = f.len();
        if n == 0 {
            return;
        }
        let v = &mut self.vertices;
        let z = &mut self.bounds;
        let parabola_cross = |q: usize, p: usize| {
            let (qf, pf) = (q as f64, p as f64);
            ((f[q] + qf * qf) - (f[p] + pf * pf)) / (2.0 * (qf - pf))
        };

        let mut k = 0;
        v[0] = 0;
        z[0] = f64::NEG_INFINITY;
        z[1] = f64::INFINITY;
        for q in 1..n {
            let mut s = parabola_cross(q, v[k]);
            while s <= z[k] {
                k -= 1;
                s = parabola_cross(q, v[k]);
            }
            k += 1;
            v[k] = q;
            z[k] = s;
            z[k + 1] = f64::INFINITY;
        }

        k = 0;
        for (q, slot) in out.iter_mut().enumerate() {
            while z[k + 1] < q as f64 {
                k += 1;
            }
            let offset = q as f64 - v[k] as f64;
            *slot = offset * offset + f[v[k]];
        }
    }
}

/// Paint `color` through `mask` onto `target`, mask top-left at `(left, top)`.
pub fn blend_mask(target: &mut RgbaImage, mask: &GrayImage, left: i32, top: i32, color: [u8; 4]) {
    let (width, height) = target.dimensions();
    for (mx, my, coverage) in mask.enumerate_pixels() {
        if coverage[0] == 0 {
            continue;
        }
        let x = left + mx as i32;
        let y = top + my as i32;
        if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
            continue;
        }
        let alpha = (color[3] as u32 * coverage[0] as u32 / 255) as u8;
        let dst = target.get_pixel_mut(x as u32, y as u32);
        *dst = blend_pixel(*dst, Rgba([color[0], color[1], color[2], alpha]));
    }
}

/// Source-over composite of straight-alpha pixels.
fn blend_pixel(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let sa = f32::from(src[3]) / 255.0;
    if sa <= 0.0 {
        return dst;
    }
    let da = f32::from(dst[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);
    let channel = |i: usize| {
        let value = (f32::from(src[i]) * sa + f32::from(dst[i]) * da * (1.0 - sa)) / out_a;
        value.round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        channel(0),
        channel(1),
        channel(2),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::fonts::CaptionFont;

    fn treatment(px: f32) -> TextTreatment {
        TextTreatment {
            font_px: px,
            embolden: 0.0,
            stroke_width: 4.0,
            shadow_blur: 4.0,
            shadow_offset: (0.0, 2.0),
        }
    }

    fn coverage_sum(mask: &GrayImage) -> u64 {
        mask.pixels().map(|p| p[0] as u64).sum()
    }

    #[test]
    fn test_blank_text_has_no_masks() {
        let font = CaptionFont::builtin().unwrap();
        assert!(rasterize(font.font(), "", &treatment(32.0), None).is_none());
        assert!(rasterize(font.font(), "   ", &treatment(32.0), None).is_none());
        assert!(rasterize(font.font(), "HI", &treatment(0.0), None).is_none());
    }

    #[test]
    fn test_masks_are_centered_on_anchor() {
        let font = CaptionFont::builtin().unwrap();
        let masks = rasterize(font.font(), "HHHH", &treatment(40.0), None).unwrap();

        let (w, h) = masks.fill.dimensions();
        let mut sum_x = 0.0f64;
        let mut sum_y = 0.0f64;
        let mut total = 0.0f64;
        for (x, y, p) in masks.fill.enumerate_pixels() {
            let v = p[0] as f64;
            sum_x += v * (x as f64 + masks.left as f64);
            sum_y += v * (y as f64 + masks.top as f64);
            total += v;
        }
        assert!(w > 0 && h > 0);
        // Ink centroid of a symmetric string sits near the anchor.
        assert!((sum_x / total).abs() < 4.0, "cx={}", sum_x / total);
        assert!((sum_y / total).abs() < 10.0, "cy={}", sum_y / total);
    }

    #[test]
    fn test_stroke_encloses_fill() {
        let font = CaptionFont::builtin().unwrap();
        let masks = rasterize(font.font(), "Meme", &treatment(32.0), None).unwrap();
        for (fill, stroke) in masks.fill.pixels().zip(masks.stroke.pixels()) {
            assert!(stroke[0] >= fill[0]);
        }
        assert!(coverage_sum(&masks.stroke) > coverage_sum(&masks.fill));
    }

    #[test]
    fn test_dilate_grows_a_dot() {
        let mut mask = GrayImage::new(9, 9);
        mask.put_pixel(4, 4, Luma([255]));
        let grown = dilate(&mask, 2.0);
        assert_eq!(grown.get_pixel(4, 4)[0], 255);
        assert_eq!(grown.get_pixel(5, 4)[0], 255);
        assert_eq!(grown.get_pixel(4, 3)[0], 255);
        // Soft edge at the radius, nothing beyond it.
        let edge = grown.get_pixel(6, 4)[0];
        assert!(edge > 0 && edge < 255);
        assert_eq!(grown.get_pixel(7, 4)[0], 0);
        assert_eq!(grown.get_pixel(0, 0)[0], 0);
        assert_eq!(dilate(&mask, 0.0), mask);
    }

    /// Direct evaluation of the dilation rule for binary masks.
    fn dilate_by_search(mask: &GrayImage, radius: f32) -> GrayImage {
        let ink: Vec<(i32, i32)> = mask
            .enumerate_pixels()
            .filter(|(_, _, p)| p[0] >= 128)
            .map(|(x, y, _)| (x as i32, y as i32))
            .collect();
        GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
            let nearest = ink
                .iter()
                .map(|&(ix, iy)| (((ix - x as i32).pow(2) + (iy - y as i32).pow(2)) as f32).sqrt())
                .fold(f32::INFINITY, f32::min);
            let grown = ((radius + 0.5 - nearest).clamp(0.0, 1.0) * 255.0).round() as u8;
            Luma([grown.max(mask.get_pixel(x, y)[0])])
        })
    }

    #[test]
    fn test_dilate_matches_direct_search() {
        let mut mask = GrayImage::new(40, 30);
        for (x, y) in [(3, 4), (20, 15), (21, 15), (22, 16), (35, 28), (10, 25)] {
            mask.put_pixel(x, y, Luma([255]));
        }
        for x in 5..15 {
            mask.put_pixel(x, 10, Luma([255]));
        }
        for radius in [0.7, 2.0, 3.5, 9.0] {
            assert_eq!(dilate(&mask, radius), dilate_by_search(&mask, radius), "radius {radius}");
        }
    }

    #[test]
    fn test_dilate_uses_faint_ink_when_nothing_is_solid() {
        let mut mask = GrayImage::new(7, 7);
        mask.put_pixel(3, 3, Luma([40]));
        let grown = dilate(&mask, 1.0);
        assert_eq!(grown.get_pixel(3, 3)[0], 255);
        assert_eq!(grown.get_pixel(4, 3)[0], 128);
        assert_eq!(grown.get_pixel(5, 3)[0], 0);
    }

    #[test]
    fn test_dilate_cost_does_not_grow_with_radius() {
        // Large, dense mask with a radius typical of a high-resolution export.
        let mask = GrayImage::from_fn(2400, 600, |x, y| Luma([if (x / 40 + y / 40) % 2 == 0 { 255 } else { 0 }]));
        let started = std::time::Instant::now();
        let grown = dilate(&mask, 28.0);
        assert!(started.elapsed().as_secs_f32() < 10.0, "took {:?}", started.elapsed());
        assert!(grown.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_masks_are_clipped_to_visible_region() {
        let font = CaptionFont::builtin().unwrap();
        let mut big = treatment(300.0);
        big.embolden = 20.0;
        let full = rasterize(font.font(), "WHEN THE BUILD IS GREEN", &big, None).unwrap();
        let clip = ClipRect {
            left: -150,
            top: -100,
            right: 150,
            bottom: 100,
        };
        let clipped = rasterize(font.font(), "WHEN THE BUILD IS GREEN", &big, Some(clip)).unwrap();

        assert!(full.fill.width() > 2500);
        let margin = clipped.left + 150;
        assert!(margin <= 0);
        assert!(clipped.fill.width() <= 300 + 2 * (-margin) as u32);
        assert!(clipped.fill.height() < full.fill.height() + 1);
        // The clipped masks agree with the full ones at the anchor.
        let at = |m: &TextMasks, x: i32, y: i32| m.stroke.get_pixel((x - m.left) as u32, (y - m.top) as u32)[0];
        assert_eq!(at(&clipped, 0, 0), at(&full, 0, 0));

        let away = ClipRect {
            left: 100_000,
            top: 100_000,
            right: 100_100,
            bottom: 100_100,
        };
        assert!(rasterize(font.font(), "HI", &treatment(32.0), Some(away)).is_none());
    }

    #[test]
    fn test_blend_mask_clips_to_target() {
        let mut target = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255]));
        let mask = GrayImage::from_pixel(4, 4, Luma([255]));
        blend_mask(&mut target, &mask, 2, -2, [255, 0, 0, 255]);

        assert_eq!(*target.get_pixel(3, 0), Rgba([255, 0, 0, 255]));
        assert_eq!(*target.get_pixel(2, 1), Rgba([255, 0, 0, 255]));
        assert_eq!(*target.get_pixel(1, 1), Rgba([0, 0, 255, 255]));
        assert_eq!(*target.get_pixel(3, 2), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_blend_half_alpha_over_opaque() {
        let out = blend_pixel(Rgba([0, 0, 0, 255]), Rgba([255, 255, 255, 128]));
        assert_eq!(out[3], 255);
        assert!((out[0] as i32 - 128).abs() <= 1);
    }
}
