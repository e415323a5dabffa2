// SPDX-License-Identifier: GPL-3.0-only

//! Output locations and frame snapshots

use crate::constants::EXPORT_FILE_NAME;
use crate::errors::{AppError, AppResult};
use crate::frame_loop::RenderedFrame;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory exports are delivered to: downloads, else home, else cwd
pub fn default_output_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
}

/// Default export file (`picture3D.stl` in the output directory)
pub fn default_export_path() -> PathBuf {
    default_output_dir().join(EXPORT_FILE_NAME)
}

/// Resolve a user-supplied export target
///
/// A directory receives the default file name; `None` means the default path.
pub fn resolve_export_path(output: Option<PathBuf>) -> PathBuf {
    match output {
        Some(path) if path.is_dir() => path.join(EXPORT_FILE_NAME),
        Some(path) => path,
        None => default_export_path(),
    }
}

/// Timestamped snapshot file name inside `dir`
pub fn snapshot_path(dir: &Path) -> PathBuf {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    dir.join(format!("relief_{}.png", timestamp))
}

/// Encode a rendered frame as PNG
pub fn save_frame_png(frame: &RenderedFrame, path: &Path) -> AppResult<()> {
    let image = image::RgbaImage::from_raw(frame.width, frame.height, frame.rgba.clone())
        .ok_or_else(|| {
            AppError::Storage(format!(
                "Frame buffer of {} bytes does not match {}x{}",
                frame.rgba.len(),
                frame.width,
                frame.height
            ))
        })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    image.save(path)?;

    debug!(path = %path.display(), "Saved frame snapshot");
    Ok(())
}
