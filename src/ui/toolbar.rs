// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar with the main actions.
//!
//! This module provides the toolbar for adding captions, asking for AI
//! suggestions and edits, and exporting the result.

/// Which toolbar controls are usable this frame.
#[derive(Debug, Clone, Copy)]
pub struct ToolbarState {
    pub has_image: bool,
    /// A suggestion or edit request is outstanding.
    pub busy: bool,
    pub exporting: bool,
}

/// Action requested from the toolbar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolbarAction {
    None,
    AddCaption,
    SuggestCaptions,
    EditImage,
    Download,
    Share,
}

/// Display the toolbar. `edit_instruction` is the edit prompt text field.
pub fn show(ui: &mut egui::Ui, state: ToolbarState, edit_instruction: &mut String) -> ToolbarAction {
    let mut action = ToolbarAction::None;

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        if ui
            .add_enabled(state.has_image, egui::Button::new("➕ Add Caption"))
            .clicked()
        {
            action = ToolbarAction::AddCaption;
        }

        ui.separator();

        let can_request = state.has_image && !state.busy;
        if ui
            .add_enabled(can_request, egui::Button::new("✨ Suggest Captions"))
            .clicked()
        {
            action = ToolbarAction::SuggestCaptions;
        }

        let prompt = ui.add_enabled(
            can_request,
            egui::TextEdit::singleline(edit_instruction)
                .hint_text("Describe an edit, e.g. \"add sunglasses\"")
                .desired_width(260.0),
        );
        let submitted = prompt.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        let has_prompt = !edit_instruction.trim().is_empty();
        let clicked = ui
            .add_enabled(can_request && has_prompt, egui::Button::new("🎨 Edit Image"))
            .clicked();
        if (clicked || submitted) && can_request && has_prompt {
            action = ToolbarAction::EditImage;
        }

        ui.separator();

        let can_export = state.has_image && !state.exporting;
        if ui
            .add_enabled(can_export, egui::Button::new("💾 Download"))
            .clicked()
        {
            action = ToolbarAction::Download;
        }
        if ui.add_enabled(can_export, egui::Button::new("📤 Share")).clicked() {
            action = ToolbarAction::Share;
        }

        if state.busy || state.exporting {
            ui.spinner();
        }
    });

    action
}
