// SPDX-License-Identifier: GPL-3.0-only

//! Rasters loaded from image files
//!
//! Any format the `image` crate decodes is accepted; pixels are converted to
//! RGBA8. The depth image must be stored losslessly (PNG) for the encoded
//! channels to survive.

use super::RasterSource;
use crate::depth::Raster;
use crate::errors::{AppResult, RasterError};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info};

/// Decode an image file into an RGBA8 raster
pub fn load_raster(path: &Path) -> Result<Raster, RasterError> {
    debug!(path = %path.display(), "Loading raster");

    let img = image::open(path).map_err(|e| RasterError::Unavailable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let raster = Raster::from(img.to_rgba8());
    debug!(
        width = raster.width(),
        height = raster.height(),
        "Raster loaded"
    );
    Ok(raster)
}

/// Depth and color rasters read from two files, re-read on every request
#[derive(Debug, Clone)]
pub struct ImageRasterSource {
    depth_path: PathBuf,
    color_path: PathBuf,
}

impl ImageRasterSource {
    pub fn new(depth_path: impl Into<PathBuf>, color_path: impl Into<PathBuf>) -> Self {
        let source = Self {
            depth_path: depth_path.into(),
            color_path: color_path.into(),
        };
        info!(
            depth = %source.depth_path.display(),
            color = %source.color_path.display(),
            "Using image file rasters"
        );
        source
    }

    pub fn depth_path(&self) -> &Path {
        &self.depth_path
    }

    pub fn color_path(&self) -> &Path {
        &self.color_path
    }

    /// Latest modification time of the two files, if readable
    pub fn modified(&self) -> Option<SystemTime> {
        let mtime = |path: &Path| std::fs::metadata(path).and_then(|m| m.modified()).ok();
        match (mtime(&self.depth_path), mtime(&self.color_path)) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        }
    }
}

impl RasterSource for ImageRasterSource {
    fn depth(&mut self) -> AppResult<Raster> {
        Ok(load_raster(&self.depth_path)?)
    }

    fn color(&mut self) -> AppResult<Raster> {
        Ok(load_raster(&self.color_path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;

    #[test]
    fn test_missing_file_is_unavailable() {
        let mut source = ImageRasterSource::new("/nonexistent/depth.png", "/nonexistent/color.png");
        let err = source.depth().unwrap_err();
        assert!(matches!(err, AppError::Raster(RasterError::Unavailable { .. })));
        assert!(source.modified().is_none());
    }

    #[test]
    fn test_png_round_trip_keeps_channels() {
        let dir = std::env::temp_dir().join(format!("tactile-picture-raster-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("depth.png");

        let img = image::RgbaImage::from_fn(3, 2, |x, y| image::Rgba([x as u8 * 80, y as u8, 7, 255]));
        img.save(&path).unwrap();

        let raster = load_raster(&path).unwrap();
        assert_eq!(raster.dimensions(), (3, 2));
        assert_eq!(raster.channels(4), Some([80, 1, 7]));

        std::fs::remove_dir_all(&dir).ok();
    }
}
