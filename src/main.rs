// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! MemeCraft - meme composer
//!
//! A cross-platform desktop application for placing draggable, styled
//! captions over an image, asking a generative model for caption ideas or
//! image edits, and exporting the result at the image's native resolution.

mod app;
mod config;
mod interaction;
mod io;
mod models;
mod render;
mod services;
mod ui;
mod util;

use anyhow::Result;
use app::MemeApp;
use config::AppConfig;

fn main() -> Result<()> {
    // Configuration decides the log level, so load it before logging starts
    let (config, config_error) = match AppConfig::locate() {
        Some(path) => match AppConfig::from_file(&path) {
            Ok(config) => (config, None),
            Err(e) => (AppConfig::default(), Some(format!("{}: {}", path.display(), e))),
        },
        None => (AppConfig::default(), None),
    };

    // Initialize logging; RUST_LOG still overrides the configured level
    env_logger::Builder::new()
        .filter_level(config.log_level.to_level_filter())
        .parse_default_env()
        .init();

    if let Some(error) = config_error {
        log::error!("Ignoring configuration {}", error);
    }

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 600.0])
            .with_drag_and_drop(true)
            .with_title("MemeCraft"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "MemeCraft",
        options,
        Box::new(move |cc| Ok(Box::new(MemeApp::new(cc, config)?))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
