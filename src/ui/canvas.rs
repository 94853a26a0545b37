// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drawing canvas for the background image and caption overlay.
//!
//! This module paints the letterboxed image and the styled captions, and
//! translates raw pointer input into [`PointerEvent`]s for the interaction
//! controller. It never changes captions itself.

use crate::interaction::PointerEvent;
use crate::models::caption::{Caption, CaptionId};
use crate::render::compositor::{caption_treatment, SHADOW_COLOR};
use crate::render::fonts::caption_font_id;
use crate::util::geometry::{fit_contain, Point, ScreenBox};

/// Where the container and the image ended up this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasLayout {
    pub container: ScreenBox,
    pub image: ScreenBox,
}

/// What the canvas needs to draw a frame.
pub struct CanvasView<'a> {
    pub texture: Option<&'a egui::TextureHandle>,
    pub natural_size: Option<(u32, u32)>,
    pub captions: &'a [Caption],
    pub selected: Option<CaptionId>,
    pub dragging: Option<CaptionId>,
    /// Whether export thickens glyphs; the preview follows suit.
    pub synthetic_bold: bool,
}

/// Result of canvas interaction.
#[derive(Debug, Default)]
pub struct CanvasOutput {
    pub layout: Option<CanvasLayout>,
    /// Pointer events in the order they happened.
    pub events: Vec<PointerEvent>,
}

/// Display the canvas and collect pointer events.
pub fn show(ui: &mut egui::Ui, view: &CanvasView<'_>) -> CanvasOutput {
    let mut output = CanvasOutput::default();
    ui.style_mut().visuals.extreme_bg_color = egui::Color32::from_gray(40);

    let available_size = ui.available_size();
    egui::Frame::canvas(ui.style()).show(ui, |ui| {
        ui.set_min_size(available_size);
        let container_rect = egui::Rect::from_min_size(ui.min_rect().min, ui.available_size());

        let (Some(texture), Some((width, height))) = (view.texture, view.natural_size) else {
            show_welcome(ui);
            return;
        };

        let container = ScreenBox::from(container_rect);
        let image = fit_contain(width, height, container);
        output.layout = Some(CanvasLayout { container, image });

        let response = ui.allocate_rect(container_rect, egui::Sense::click_and_drag());
        let painter = ui.painter_at(container_rect);
        painter.image(
            texture.id(),
            image.into(),
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );

        let mut hit_boxes = Vec::with_capacity(view.captions.len());
        for caption in view.captions {
            let rect = draw_caption(&painter, caption, container_rect.min, view.synthetic_bold);
            if view.selected == Some(caption.id) {
                painter.rect_stroke(
                    rect.expand(4.0),
                    2.0,
                    egui::Stroke::new(1.5, egui::Color32::from_rgb(80, 160, 255)),
                );
            }
            hit_boxes.push((caption.id, rect));
        }

        output.events = collect_events(ui, &response, &hit_boxes);

        if view.dragging.is_some() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::Grabbing);
        } else if response.hovered() && hit_test(&hit_boxes, response.hover_pos()).is_some() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::Grab);
        }
    });

    output
}

/// Translate this frame's pointer input into controller events.
///
/// Presses count only when egui routed them to the canvas, so clicks on a
/// menu or popup above it are ignored. Release is read from global input so
/// a drag that ends outside the canvas still terminates.
fn collect_events(
    ui: &egui::Ui,
    response: &egui::Response,
    hit_boxes: &[(CaptionId, egui::Rect)],
) -> Vec<PointerEvent> {
    let mut events = Vec::new();
    let (pressed, released, moved, pos) = ui.input(|i| {
        (
            i.pointer.primary_pressed(),
            i.pointer.primary_released(),
            i.pointer.delta() != egui::Vec2::ZERO,
            i.pointer.interact_pos(),
        )
    });

    if pressed && response.is_pointer_button_down_on() {
        if let Some(pos) = pos {
            events.push(PointerEvent::Pressed {
                hit: hit_test(hit_boxes, Some(pos)),
            });
        }
    }
    if moved || pressed {
        if let Some(pos) = pos {
            events.push(PointerEvent::Moved {
                pointer: Point::new(pos.x, pos.y),
            });
        }
    }
    if released {
        events.push(PointerEvent::Released);
    }
    events
}

/// Topmost caption under `pos`. Later captions are drawn on top.
fn hit_test(hit_boxes: &[(CaptionId, egui::Rect)], pos: Option<egui::Pos2>) -> Option<CaptionId> {
    let pos = pos?;
    hit_boxes
        .iter()
        .rev()
        .find(|(_, rect)| rect.expand(2.0).contains(pos))
        .map(|(id, _)| *id)
}

/// Screen-space form of the export treatment at display scale.
///
/// Reaches are measured from the glyph edge. The stroke and bold passes are
/// dilations in export; here they are stacks of offset copies filling a disc
/// of the same radius.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PreviewStyle {
    fill_reach: f32,
    outline_reach: f32,
    /// Outline reach plus the blur's standard deviation
    shadow_reach: f32,
    shadow_offset: egui::Vec2,
}

impl PreviewStyle {
    fn new(font_size: f32, synthetic_bold: bool) -> Self {
        let treatment = caption_treatment(font_size, 1.0, synthetic_bold);
        let outline_reach = treatment.embolden + treatment.stroke_width / 2.0;
        Self {
            fill_reach: treatment.embolden,
            outline_reach,
            shadow_reach: outline_reach + treatment.shadow_blur / 2.0,
            shadow_offset: egui::vec2(treatment.shadow_offset.0, treatment.shadow_offset.1),
        }
    }
}

/// Paint one caption with the meme treatment. Returns its text bounds.
fn draw_caption(painter: &egui::Painter, caption: &Caption, origin: egui::Pos2, synthetic_bold: bool) -> egui::Rect {
    let anchor = origin + egui::vec2(caption.x, caption.y);
    let font = caption_font_id(caption.font_size.max(1.0));
    let galley = painter.layout_no_wrap(caption.text.clone(), font, egui::Color32::PLACEHOLDER);
    let rect = egui::Align2::CENTER_CENTER.anchor_size(anchor, galley.size());
    if caption.is_blank() {
        return rect;
    }

    let style = PreviewStyle::new(caption.font_size, synthetic_bold);
    let [r, g, b, a] = caption.color.to_array();
    let fill = egui::Color32::from_rgba_unmultiplied(r, g, b, a);

    // Shadow under the outline only, then the outline, then the fill.
    let shadow = disc_offsets(style.shadow_reach, (style.shadow_reach / 3.0).max(1.0));
    let [sr, sg, sb, sa] = SHADOW_COLOR;
    let shadow_color = egui::Color32::from_rgba_unmultiplied(sr, sg, sb, copy_alpha(sa, shadow.len()));
    for offset in shadow {
        painter.galley(rect.min + style.shadow_offset + offset, galley.clone(), shadow_color);
    }
    for offset in disc_offsets(style.outline_reach, 1.0) {
        painter.galley(rect.min + offset, galley.clone(), egui::Color32::BLACK);
    }
    for offset in disc_offsets(style.fill_reach, 1.0) {
        painter.galley(rect.min + offset, galley.clone(), fill);
    }
    rect.expand(style.outline_reach)
}

/// Offsets covering a disc of `radius`: the center, then rings no more than
/// `spacing` apart with points no more than about `spacing` apart.
fn disc_offsets(radius: f32, spacing: f32) -> Vec<egui::Vec2> {
    let mut offsets = vec![egui::Vec2::ZERO];
    if radius.is_nan() || radius <= 0.0 {
        return offsets;
    }
    let rings = (radius / spacing).ceil().max(1.0) as usize;
    for ring in 1..=rings {
        let r = radius * ring as f32 / rings as f32;
        let count = ((std::f32::consts::TAU * r / spacing).ceil() as usize).max(8);
        offsets.extend((0..count).map(|i| {
            let angle = std::f32::consts::TAU * i as f32 / count as f32;
            egui::vec2(r * angle.cos(), r * angle.sin())
        }));
    }
    offsets
}

/// Per-copy alpha so that `copies` stacked copies reach `target` alpha.
fn copy_alpha(target: u8, copies: usize) -> u8 {
    let target = f32::from(target) / 255.0;
    let per_copy = 1.0 - (1.0 - target).powf(1.0 / copies.max(1) as f32);
    (per_copy * 255.0).round().clamp(1.0, 255.0) as u8
}

/// Placeholder shown before an image is loaded.
fn show_welcome(ui: &mut egui::Ui) {
    ui.centered_and_justified(|ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(20.0);
            ui.heading(
                egui::RichText::new("memecraft")
                    .size(32.0)
                    .color(egui::Color32::from_gray(200)),
            );
            ui.add_space(20.0);
            ui.label(
                egui::RichText::new("Open or drop an image to start captioning")
                    .color(egui::Color32::from_gray(180)),
            );
            ui.add_space(10.0);
            ui.label(
                egui::RichText::new("File → Open Image...")
                    .weak()
                    .color(egui::Color32::from_gray(130)),
            );
        });
    });
}
