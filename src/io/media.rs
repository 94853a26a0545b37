// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Background image loading.
//!
//! This module turns files, dropped bytes, data URLs and remote URLs into
//! decoded [`BackgroundImage`]s. Local images are carried as data URLs from
//! here on.

use super::data_url::{self, DataUrl, DataUrlError};
use crate::models::background::{BackgroundImage, ImageSource, PixelAccess};
use crate::services::transport::HttpTransport;
use crate::services::ServiceError;
use std::path::Path;
use thiserror::Error;

/// Extensions offered by the file picker.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];

/// Errors from loading a background image.
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Not a supported image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Invalid image data: {0}")]
    DataUrl(#[from] DataUrlError),

    #[error("Failed to download image: {0}")]
    Fetch(#[from] ServiceError),
}

/// Decode raw image file contents into a data URL backed background.
pub fn load_image_bytes(bytes: &[u8]) -> Result<BackgroundImage, MediaError> {
    let format = image::guess_format(bytes)?;
    let pixels = image::load_from_memory_with_format(bytes, format)?.to_rgba8();
    let url = data_url::encode(format.to_mime_type(), bytes);
    Ok(BackgroundImage::new(ImageSource::DataUrl(url), pixels, PixelAccess::Readable))
}

/// Load an image file from disk.
pub fn load_image_file(path: &Path) -> Result<BackgroundImage, MediaError> {
    let bytes = std::fs::read(path).map_err(|source| MediaError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let image = load_image_bytes(&bytes)?;
    log::info!(
        "Loaded image: {} ({}x{})",
        path.display(),
        image.natural_width(),
        image.natural_height()
    );
    Ok(image)
}

/// Decode a data URL, such as one returned by the image editor.
pub fn load_data_url(url: &str) -> Result<BackgroundImage, MediaError> {
    let bytes = DataUrl::parse(url)?.decode()?;
    let pixels = image::load_from_memory(&bytes)?.to_rgba8();
    Ok(BackgroundImage::new(
        ImageSource::DataUrl(url.to_string()),
        pixels,
        PixelAccess::Readable,
    ))
}

/// Fetch and decode a remote image.
///
/// The request is anonymous. When `strict_cross_origin` is set, a response
/// without an `Access-Control-Allow-Origin` header yields a tainted image.
pub fn load_remote_image(
    url: &str,
    transport: &dyn HttpTransport,
    strict_cross_origin: bool,
) -> Result<BackgroundImage, MediaError> {
    let response = transport.get(url)?.error_for_status()?;
    let pixels = image::load_from_memory(&response.body)?.to_rgba8();

    let cors_allowed = response.header("access-control-allow-origin").is_some();
    let access = if strict_cross_origin && !cors_allowed {
        log::warn!("{} has no cross-origin permission; it can be shown but not exported", url);
        PixelAccess::Tainted
    } else {
        PixelAccess::Readable
    };

    log::info!("Loaded remote image: {} ({}x{})", url, pixels.width(), pixels.height());
    Ok(BackgroundImage::new(ImageSource::Remote(url.to_string()), pixels, access))
}
