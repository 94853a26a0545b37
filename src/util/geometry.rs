// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module provides the coordinate transformation between display space
//! (pixels relative to the overlay container, where captions live) and
//! natural space (pixels of the full-resolution background image).

/// A 2D point in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned on-screen rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenBox {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl ScreenBox {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

impl From<egui::Rect> for ScreenBox {
    fn from(rect: egui::Rect) -> Self {
        Self::new(rect.min.x, rect.min.y, rect.width(), rect.height())
    }
}

impl From<ScreenBox> for egui::Rect {
    fn from(b: ScreenBox) -> Self {
        egui::Rect::from_min_size(egui::pos2(b.left, b.top), egui::vec2(b.width, b.height))
    }
}

/// Fit an image of the given natural size inside `container`, preserving its
/// aspect ratio and centering it (object-contain letterboxing).
pub fn fit_contain(natural_width: u32, natural_height: u32, container: ScreenBox) -> ScreenBox {
    if natural_width == 0 || natural_height == 0 || container.width <= 0.0 || container.height <= 0.0 {
        return ScreenBox::new(container.left, container.top, 0.0, 0.0);
    }

    let img_aspect = natural_width as f32 / natural_height as f32;
    let container_aspect = container.width / container.height;

    let (width, height) = if img_aspect > container_aspect {
        // Image is wider - fit to width
        (container.width, container.width / img_aspect)
    } else {
        // Image is taller - fit to height
        (container.height * img_aspect, container.height)
    };

    ScreenBox::new(
        container.left + (container.width - width) / 2.0,
        container.top + (container.height - height) / 2.0,
        width,
        height,
    )
}

/// Display-to-natural transform for one rendered layout of the background.
///
/// Scaling is uniform; the image must be displayed without distortion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayMapping {
    /// Natural pixels per display pixel.
    pub scale: f32,
    /// Image left edge relative to the container left edge, display pixels.
    pub offset_x: f32,
    /// Image top edge relative to the container top edge, display pixels.
    pub offset_y: f32,
}

impl DisplayMapping {
    /// Build the mapping from the rendered image box and the container box.
    ///
    /// Returns `None` while the image has no rendered width yet.
    pub fn from_layout(natural_width: u32, image_box: ScreenBox, container_box: ScreenBox) -> Option<Self> {
        if image_box.width <= 0.0 || natural_width == 0 {
            return None;
        }
        Some(Self {
            scale: natural_width as f32 / image_box.width,
            offset_x: image_box.left - container_box.left,
            offset_y: image_box.top - container_box.top,
        })
    }

    /// Map a container-relative display point into natural image pixels.
    pub fn to_natural(&self, display: Point) -> Point {
        Point::new(
            (display.x - self.offset_x) * self.scale,
            (display.y - self.offset_y) * self.scale,
        )
    }

    /// Map a natural image pixel back into container-relative display space.
    pub fn to_display(&self, natural: Point) -> Point {
        Point::new(
            natural.x / self.scale + self.offset_x,
            natural.y / self.scale + self.offset_y,
        )
    }
}
