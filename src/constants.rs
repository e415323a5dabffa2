// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Reference raster width (pixels)
pub const IMAGE_WIDTH: u32 = 192;
/// Reference raster height (pixels)
pub const IMAGE_HEIGHT: u32 = 256;

/// Output surface width (pixels)
pub const RENDERER_WIDTH: u32 = 192;
/// Output surface height (pixels)
pub const RENDERER_HEIGHT: u32 = 256;

/// Decoded depths at or below this value carry no geometry
pub const INVALID_DEPTH_THRESHOLD: f32 = 0.1;
/// Sentinel depth for "no data", larger than any decodable depth
pub const INVALID_DEPTH: f32 = 10000.0;

/// Largest value of one encoded depth channel
pub const DEPTH_CHANNEL_MAX: f64 = 255.0;

/// Camera parameters
pub mod camera {
    /// Vertical field of view (degrees)
    pub const FOV_DEGREES: f32 = 27.0;
    /// Near clipping plane
    pub const NEAR: f32 = 0.001;
    /// Far clipping plane
    pub const FAR: f32 = 3500.0;
    /// Distance of the camera from the image plane along +Z
    pub const DISTANCE: f32 = 7.0;
}

/// Background quad parameters
pub mod background {
    /// World size of one raster pixel on the background plane
    pub const PLANE_SIZE: f32 = 0.025;
    /// Segments along each plane axis
    pub const SEGMENTS: u32 = 10;
}

/// Resolution reported to the shader for the depth channel
pub const CHANNEL_RESOLUTION: f32 = 512.0 * 2.0;

/// File name the STL export is delivered under
pub const EXPORT_FILE_NAME: &str = "picture3D.stl";

/// Solid name written into exported STL files
pub const STL_SOLID_NAME: &str = "exported";

/// Default frame cadence of the display loop (~60 Hz)
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_micros(16_667);

/// How often the file watcher polls input files for changes
pub const WATCH_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Aspect ratio of the fixed output surface
pub fn renderer_aspect() -> f32 {
    RENDERER_WIDTH as f32 / RENDERER_HEIGHT as f32
}

/// Largest index count the mesh builder can produce for a raster
///
/// Two triangles of three indices per cell.
pub fn max_index_count(width: u32, height: u32) -> usize {
    6 * width as usize * height as usize
}

/// Vertex count of the grid built over a raster (one vertex per pixel corner)
pub fn grid_vertex_count(width: u32, height: u32) -> usize {
    (width as usize + 1) * (height as usize + 1)
}
