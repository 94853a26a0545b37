// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! AI caption suggestions list.

use crate::services::{Category, SuggestedCaption};

fn category_color(category: Category) -> egui::Color32 {
    match category {
        Category::Funny => egui::Color32::from_rgb(250, 200, 60),
        Category::Sarcastic => egui::Color32::from_rgb(120, 190, 255),
        Category::Dark => egui::Color32::from_rgb(170, 130, 200),
        Category::Wholesome => egui::Color32::from_rgb(130, 210, 130),
        Category::Relatable => egui::Color32::from_rgb(240, 140, 120),
    }
}

/// Display the suggestions. Returns the index of a clicked suggestion.
pub fn show(ui: &mut egui::Ui, suggestions: &[SuggestedCaption], analyzing: bool) -> Option<usize> {
    let mut accepted = None;

    ui.heading("Suggestions");
    ui.separator();

    if analyzing {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label("Analyzing image...");
        });
        return None;
    }
    if suggestions.is_empty() {
        ui.label(egui::RichText::new("Ask for suggestions from the toolbar").weak());
        return None;
    }

    for (index, suggestion) in suggestions.iter().enumerate() {
        ui.horizontal_wrapped(|ui| {
            ui.label(
                egui::RichText::new(suggestion.category.name())
                    .small()
                    .color(category_color(suggestion.category)),
            );
            if ui
                .link(suggestion.text.as_str())
                .on_hover_text("Add as caption")
                .clicked()
            {
                accepted = Some(index);
            }
        });
    }

    accepted
}
