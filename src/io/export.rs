// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Delivery of exported images: saving to disk and sharing.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

/// What happened to a share request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareOutcome {
    Shared,
    /// No share mechanism on this platform; callers fall back to download.
    Unsupported,
}

/// Destinations for the exported PNG.
pub trait ExportSink {
    /// Save the image where the user chooses. Returns `None` if cancelled.
    fn download(&self, png: &[u8], file_name: &str) -> Result<Option<PathBuf>>;

    /// Offer the image to the platform's share mechanism.
    fn share(&self, png: &[u8], file_name: &str) -> Result<ShareOutcome>;
}

/// Native save dialog for downloads; the OS default image handler for sharing.
#[derive(Debug, Default)]
pub struct DesktopSink;

impl ExportSink for DesktopSink {
    fn download(&self, png: &[u8], file_name: &str) -> Result<Option<PathBuf>> {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG image", &["png"])
            .set_file_name(file_name)
            .save_file()
        else {
            return Ok(None);
        };
        save_png(&path, png)?;
        Ok(Some(path))
    }

    fn share(&self, png: &[u8], file_name: &str) -> Result<ShareOutcome> {
        let path = write_share_file(&std::env::temp_dir(), png, file_name)?;
        if open_with_system(&path) {
            log::info!("Shared {}", path.display());
            Ok(ShareOutcome::Shared)
        } else {
            Ok(ShareOutcome::Unsupported)
        }
    }
}

/// Write PNG bytes to `path`.
pub fn save_png(path: &Path, png: &[u8]) -> Result<()> {
    std::fs::write(path, png).with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Saved {} ({} bytes)", path.display(), png.len());
    Ok(())
}

/// Write PNG bytes to a new, uniquely named file in `dir` and keep it.
///
/// The file is created exclusively, so nothing already at a guessable path
/// is followed or overwritten. It outlives this process for the viewer.
pub fn write_share_file(dir: &Path, png: &[u8], file_name: &str) -> Result<PathBuf> {
    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "meme".to_string());
    let mut file = tempfile::Builder::new()
        .prefix(&format!("{stem}-"))
        .suffix(".png")
        .tempfile_in(dir)
        .with_context(|| format!("Failed to create a share file in {}", dir.display()))?;
    file.write_all(png).context("Failed to write share file")?;
    let (_, path) = file.keep().context("Failed to keep share file")?;
    log::debug!("Staged {} for sharing", path.display());
    Ok(path)
}

#[cfg(target_os = "windows")]
fn open_with_system(path: &Path) -> bool {
    std::process::Command::new("cmd")
        .args(["/C", "start", ""])
        .arg(path)
        .spawn()
        .is_ok()
}

#[cfg(target_os = "macos")]
fn open_with_system(path: &Path) -> bool {
    std::process::Command::new("open").arg(path).spawn().is_ok()
}

#[cfg(all(unix, not(target_os = "macos")))]
fn open_with_system(path: &Path) -> bool {
    std::process::Command::new("xdg-open").arg(path).spawn().is_ok()
}

#[cfg(not(any(windows, unix)))]
fn open_with_system(_path: &Path) -> bool {
    false
}
