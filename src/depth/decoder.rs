// SPDX-License-Identifier: GPL-3.0-only

//! Fixed-point depth decoding
//!
//! A sample stores depth as `(c0 * 255² + c1 * 255 + c2) / 255³`. Decoded
//! values at or below the validity threshold are replaced with
//! [`INVALID_DEPTH`], which is larger than any decodable depth.

use super::Raster;
use crate::constants::{DEPTH_CHANNEL_MAX, INVALID_DEPTH, INVALID_DEPTH_THRESHOLD};

/// Decode three channel values with the given validity threshold
///
/// Never fails: a non-numeric result decodes as 0, which then falls below
/// any positive threshold.
pub fn decode_channels(c0: f64, c1: f64, c2: f64, threshold: f32) -> f32 {
    let scale = DEPTH_CHANNEL_MAX;
    let mut depth = c0 * scale * scale + c1 * scale + c2;
    depth = depth / scale / scale / scale;

    if depth.is_nan() {
        depth = 0.0;
    }

    if depth <= threshold as f64 {
        return INVALID_DEPTH;
    }

    depth as f32
}

/// Whether a decoded depth carries geometry
#[inline]
pub fn is_valid_depth(depth: f32) -> bool {
    depth != INVALID_DEPTH
}

/// Depth decoder bound to a validity threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthDecoder {
    threshold: f32,
}

impl Default for DepthDecoder {
    fn default() -> Self {
        Self::new(INVALID_DEPTH_THRESHOLD)
    }
}

impl DepthDecoder {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Decode one RGB triple
    pub fn decode(&self, channels: [u8; 3]) -> f32 {
        let [c0, c1, c2] = channels;
        decode_channels(c0 as f64, c1 as f64, c2 as f64, self.threshold)
    }

    /// Decode the sample at flat `index`
    ///
    /// An index past the end of the raster reads as a garbage sample and
    /// decodes as invalid. Grid vertices on the outer boundary rely on this.
    pub fn depth_at(&self, raster: &Raster, index: usize) -> f32 {
        match raster.channels(index) {
            Some(channels) => self.decode(channels),
            None => decode_channels(f64::NAN, f64::NAN, f64::NAN, self.threshold),
        }
    }
}
