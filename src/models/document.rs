// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Document state management.
//!
//! This module owns the canonical editing state: the background image, the
//! ordered caption collection and the current selection. Every mutation of
//! captions goes through here.

use super::background::BackgroundImage;
use super::caption::{Caption, CaptionColor, CaptionId, DEFAULT_TEXT};

/// Background, captions and selection of the meme being composed.
#[derive(Debug, Default)]
pub struct MemeDocument {
    background: Option<BackgroundImage>,
    /// Captions in paint order; later entries are drawn on top.
    captions: Vec<Caption>,
    selected: Option<CaptionId>,
    next_id: u64,
}

impl MemeDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn background(&self) -> Option<&BackgroundImage> {
        self.background.as_ref()
    }

    /// Replace the background wholesale. Captions are kept.
    pub fn set_background(&mut self, background: BackgroundImage) {
        log::info!(
            "Background set to {} ({}x{})",
            background.source.describe(),
            background.natural_width(),
            background.natural_height()
        );
        self.background = Some(background);
    }

    pub fn captions(&self) -> &[Caption] {
        &self.captions
    }

    pub fn caption(&self, id: CaptionId) -> Option<&Caption> {
        self.captions.iter().find(|c| c.id == id)
    }

    fn caption_mut(&mut self, id: CaptionId) -> Option<&mut Caption> {
        self.captions.iter_mut().find(|c| c.id == id)
    }

    fn allocate_id(&mut self) -> CaptionId {
        self.next_id += 1;
        CaptionId::new(self.next_id)
    }

    /// Append a caption with default appearance and select it.
    pub fn add_caption(&mut self, text: impl Into<String>) -> CaptionId {
        let id = self.allocate_id();
        self.captions.push(Caption::new(id, text));
        self.selected = Some(id);
        log::info!("Added {}, total: {}", id, self.captions.len());
        id
    }

    /// Append a caption with the default text.
    pub fn add_default_caption(&mut self) -> CaptionId {
        self.add_caption(DEFAULT_TEXT)
    }

    /// Remove a caption. Returns false if no caption has this id.
    pub fn delete_caption(&mut self, id: CaptionId) -> bool {
        let before = self.captions.len();
        self.captions.retain(|c| c.id != id);
        if self.captions.len() == before {
            return false;
        }
        if self.selected == Some(id) {
            self.selected = None;
        }
        log::info!("Deleted {}, total: {}", id, self.captions.len());
        true
    }

    pub fn set_text(&mut self, id: CaptionId, text: impl Into<String>) {
        if let Some(caption) = self.caption_mut(id) {
            caption.text = text.into();
        }
    }

    pub fn set_color(&mut self, id: CaptionId, color: CaptionColor) {
        if let Some(caption) = self.caption_mut(id) {
            caption.color = color;
        }
    }

    pub fn set_font_size(&mut self, id: CaptionId, font_size: f32) {
        if let Some(caption) = self.caption_mut(id) {
            caption.font_size = font_size;
        }
    }

    /// Move a caption's anchor. Clamping is the caller's business.
    pub fn move_caption(&mut self, id: CaptionId, x: f32, y: f32) {
        if let Some(caption) = self.caption_mut(id) {
            caption.x = x;
            caption.y = y;
        }
    }

    pub fn selected(&self) -> Option<CaptionId> {
        self.selected
    }

    /// Select a caption. Unknown ids are ignored.
    pub fn select(&mut self, id: CaptionId) {
        if self.caption(id).is_some() {
            self.selected = Some(id);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }
}
