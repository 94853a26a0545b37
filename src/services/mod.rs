// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Remote AI collaborators: caption suggestions and image edits.
//!
//! The application only sees the [`CaptionSuggester`] and [`ImageEditor`]
//! traits. Calls block, so the application runs them on worker threads.

pub mod gemini;
pub mod image_source;
pub mod transport;

use crate::models::background::BackgroundImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tone of a suggested caption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Funny,
    Sarcastic,
    Dark,
    Wholesome,
    Relatable,
}

impl Category {
    pub fn all() -> &'static [Category] {
        &[
            Category::Funny,
            Category::Sarcastic,
            Category::Dark,
            Category::Wholesome,
            Category::Relatable,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Category::Funny => "Funny",
            Category::Sarcastic => "Sarcastic",
            Category::Dark => "Dark",
            Category::Wholesome => "Wholesome",
            Category::Relatable => "Relatable",
        }
    }
}

/// One caption proposed for the current image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedCaption {
    pub text: String,
    pub category: Category,
}

/// Errors from the remote services.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// No API key in the environment
    #[error("No API key found; set the {0} environment variable")]
    MissingApiKey(String),

    /// Request could not be sent or completed
    #[error("Network error: {0}")]
    Transport(String),

    /// Server answered with a non-success status
    #[error("Service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response did not have the expected shape
    #[error("Unexpected response from the model: {0}")]
    Malformed(String),

    /// Edit response carried no image
    #[error("The model did not return an image")]
    NoImageReturned,

    /// Image bytes could not be obtained for upload
    #[error("Could not access the image: {0}")]
    BlockedResource(String),
}

/// Proposes captions for an image.
pub trait CaptionSuggester: Send + Sync {
    fn suggest_captions(&self, image: &BackgroundImage) -> Result<Vec<SuggestedCaption>, ServiceError>;
}

/// Applies a free-text edit instruction to an image.
pub trait ImageEditor: Send + Sync {
    /// Returns the edited image as a data URL.
    fn edit_image(&self, image: &BackgroundImage, instruction: &str) -> Result<String, ServiceError>;
}
