// SPDX-License-Identifier: GPL-3.0-only

//! Uniform block shared by the relief and background draws

use crate::constants::CHANNEL_RESOLUTION;
use crate::scene::PerspectiveCamera;
use glam::Mat4;

/// Per-draw shader uniforms
///
/// Layout matches `Params` in `relief.wgsl`; every member is 16-byte aligned.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ReliefParams {
    /// Camera projection × view
    pub view_projection: [[f32; 4]; 4],
    /// Projection used to map textures onto the surface
    pub texture_projection: [[f32; 4]; 4],
    /// Object transform of the draw
    pub model: [[f32; 4]; 4],
    /// Raster size (w, h, 0, 0)
    pub resolution: [f32; 4],
    /// Nominal resolution of the depth channel
    pub channel_resolution: [f32; 4],
    /// Pointer position (unused by the relief, kept for shader parity)
    pub mouse: [f32; 4],
}

impl ReliefParams {
    pub fn new(camera: &PerspectiveCamera, model: Mat4, width: u32, height: u32) -> Self {
        Self {
            view_projection: camera.view_projection().to_cols_array_2d(),
            texture_projection: camera.projection_matrix().to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            resolution: [width as f32, height as f32, 0.0, 0.0],
            channel_resolution: [CHANNEL_RESOLUTION, CHANNEL_RESOLUTION, 0.0, 0.0],
            mouse: [0.0; 4],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_matches_wgsl_size() {
        assert_eq!(std::mem::size_of::<ReliefParams>(), 3 * 64 + 3 * 16);
    }

    #[test]
    fn test_resolution_fields() {
        let params = ReliefParams::new(&PerspectiveCamera::default(), Mat4::IDENTITY, 192, 256);
        assert_eq!(params.resolution, [192.0, 256.0, 0.0, 0.0]);
        assert_eq!(params.channel_resolution, [1024.0, 1024.0, 0.0, 0.0]);
        assert_eq!(params.model, Mat4::IDENTITY.to_cols_array_2d());
    }
}
