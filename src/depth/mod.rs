// SPDX-License-Identifier: GPL-3.0-only

//! Input rasters and depth decoding
//!
//! Both inputs (the depth-encoded image and the color image) are RGBA8
//! rasters of the same size. Depth is packed into the first three channels
//! as a big-endian base-255 fraction; see [`decoder`].

pub mod decoder;

pub use decoder::{DepthDecoder, decode_channels, is_valid_depth};

use crate::errors::RasterError;

/// Bytes per raster sample (RGBA)
pub const BYTES_PER_SAMPLE: usize = 4;

/// A `width × height` RGBA8 raster, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Raster {
    /// Wrap an RGBA8 buffer, checking its length against the dimensions
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, RasterError> {
        let expected = width as usize * height as usize * BYTES_PER_SAMPLE;
        if data.len() != expected {
            return Err(RasterError::BufferSize {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build a raster by evaluating `f(x, y)` for every sample
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [u8; 4]) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * BYTES_PER_SAMPLE);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }

        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Raw RGBA bytes, for texture upload
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// First three channels of the sample at flat `index`
    ///
    /// Returns `None` past the end of the raster.
    pub fn channels(&self, index: usize) -> Option<[u8; 3]> {
        let start = index.checked_mul(BYTES_PER_SAMPLE)?;
        let sample = self.data.get(start..start + 3)?;
        Some([sample[0], sample[1], sample[2]])
    }

    /// Fail unless `self` has the given dimensions
    pub fn expect_dimensions(&self, width: u32, height: u32) -> Result<(), RasterError> {
        if self.dimensions() != (width, height) {
            return Err(RasterError::DimensionMismatch {
                expected_width: width,
                expected_height: height,
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

impl From<image::RgbaImage> for Raster {
    fn from(image: image::RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: image.into_raw(),
        }
    }
}
