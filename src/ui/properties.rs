// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Caption properties panel.
//!
//! This module lists the captions and edits the selected one: text, color,
//! size and deletion.

use crate::models::caption::{Caption, CaptionColor, CaptionId, FONT_SIZE_RANGE};

/// Action requested from the properties panel.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertiesAction {
    None,
    Select(CaptionId),
    SetText(CaptionId, String),
    SetColor(CaptionId, CaptionColor),
    SetFontSize(CaptionId, f32),
    Delete(CaptionId),
}

/// Display the caption list and editor for the selection.
pub fn show(ui: &mut egui::Ui, captions: &[Caption], selected: Option<CaptionId>) -> PropertiesAction {
    let mut action = PropertiesAction::None;

    ui.heading("Captions");
    ui.separator();

    if captions.is_empty() {
        ui.label(egui::RichText::new("No captions yet").weak());
        return action;
    }

    for caption in captions {
        let is_selected = selected == Some(caption.id);
        let label = if caption.is_blank() {
            "(empty)".to_string()
        } else {
            caption.text.clone()
        };
        if ui.selectable_label(is_selected, label).clicked() {
            action = PropertiesAction::Select(caption.id);
        }
    }

    let Some(caption) = selected.and_then(|id| captions.iter().find(|c| c.id == id)) else {
        return action;
    };

    ui.add_space(12.0);
    ui.separator();
    ui.label(egui::RichText::new("Selected caption").strong());

    let mut text = caption.text.clone();
    if ui
        .add(egui::TextEdit::singleline(&mut text).desired_width(f32::INFINITY))
        .changed()
    {
        action = PropertiesAction::SetText(caption.id, text);
    }

    ui.horizontal(|ui| {
        ui.label("Color");
        let [r, g, b, a] = caption.color.to_array();
        let mut color = egui::Color32::from_rgba_unmultiplied(r, g, b, a);
        if egui::color_picker::color_edit_button_srgba(ui, &mut color, egui::color_picker::Alpha::Opaque).changed() {
            let [r, g, b, a] = color.to_srgba_unmultiplied();
            action = PropertiesAction::SetColor(caption.id, CaptionColor::rgba(r, g, b, a));
        }
        ui.label(egui::RichText::new(caption.color.to_string()).monospace().weak());
    });

    ui.horizontal(|ui| {
        ui.label("Size");
        let mut size = caption.font_size;
        if ui
            .add(egui::Slider::new(&mut size, FONT_SIZE_RANGE).suffix(" px"))
            .changed()
        {
            action = PropertiesAction::SetFontSize(caption.id, size);
        }
    });

    ui.add_space(8.0);
    if ui.button("🗑 Delete caption").clicked() {
        action = PropertiesAction::Delete(caption.id);
    }

    action
}
