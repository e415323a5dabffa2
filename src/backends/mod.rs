// SPDX-License-Identifier: GPL-3.0-only

//! Raster acquisition
//!
//! The frame loop pulls a fresh depth/color pair from a [`RasterSource`]
//! whenever a depth refresh is requested.
//!
//! - [`image_file`]: rasters decoded from image files on disk
//! - [`MemoryRasterSource`]: a fixed in-memory pair

pub mod image_file;

pub use image_file::{ImageRasterSource, load_raster};

use crate::depth::Raster;
use crate::errors::AppResult;

/// Provider of the current depth and color rasters
pub trait RasterSource: Send {
    /// Current depth-encoded raster
    fn depth(&mut self) -> AppResult<Raster>;

    /// Current color raster
    fn color(&mut self) -> AppResult<Raster>;

    /// Both rasters; depth is read first
    fn pair(&mut self) -> AppResult<(Raster, Raster)> {
        let depth = self.depth()?;
        let color = self.color()?;
        Ok((depth, color))
    }
}

/// Raster pair held in memory
#[derive(Debug, Clone)]
pub struct MemoryRasterSource {
    pub depth: Raster,
    pub color: Raster,
}

impl MemoryRasterSource {
    pub fn new(depth: Raster, color: Raster) -> Self {
        Self { depth, color }
    }
}

impl RasterSource for MemoryRasterSource {
    fn depth(&mut self) -> AppResult<Raster> {
        Ok(self.depth.clone())
    }

    fn color(&mut self) -> AppResult<Raster> {
        Ok(self.color.clone())
    }
}
