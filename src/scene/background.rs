// SPDX-License-Identifier: GPL-3.0-only

//! Background quad behind the relief
//!
//! A flat, segmented plane the size of the raster at the background pixel
//! pitch. Its geometry never changes; only the transform and visibility are
//! updated from the configuration each frame.

use crate::config::Config;
use crate::constants::background::{PLANE_SIZE, SEGMENTS};
use glam::{Mat4, Vec3};

/// Segmented plane geometry, facing +Z
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneGeometry {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl PlaneGeometry {
    pub fn new(width: f32, height: f32, segments_x: u32, segments_y: u32) -> Self {
        let (gx, gy) = (segments_x.max(1), segments_y.max(1));
        let (gx1, gy1) = (gx + 1, gy + 1);
        let segment_width = width / gx as f32;
        let segment_height = height / gy as f32;

        let count = (gx1 * gy1) as usize;
        let mut positions = Vec::with_capacity(count);
        let mut normals = Vec::with_capacity(count);
        let mut uvs = Vec::with_capacity(count);

        for iy in 0..gy1 {
            let y = iy as f32 * segment_height - height * 0.5;
            for ix in 0..gx1 {
                let x = ix as f32 * segment_width - width * 0.5;
                positions.push([x, -y, 0.0]);
                normals.push([0.0, 0.0, 1.0]);
                uvs.push([ix as f32 / gx as f32, 1.0 - iy as f32 / gy as f32]);
            }
        }

        let mut indices = Vec::with_capacity((gx * gy * 6) as usize);
        for iy in 0..gy {
            for ix in 0..gx {
                let a = ix + gx1 * iy;
                let b = ix + gx1 * (iy + 1);
                let c = (ix + 1) + gx1 * (iy + 1);
                let d = (ix + 1) + gx1 * iy;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        Self {
            positions,
            normals,
            uvs,
            indices,
        }
    }
}

/// Background quad and its per-frame transform
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundQuad {
    geometry: PlaneGeometry,
    pub position: Vec3,
    pub scale: f32,
    pub visible: bool,
}

impl BackgroundQuad {
    /// Plane covering a `width × height` raster
    pub fn for_raster(width: u32, height: u32) -> Self {
        Self {
            geometry: PlaneGeometry::new(
                width as f32 * PLANE_SIZE,
                height as f32 * PLANE_SIZE,
                SEGMENTS,
                SEGMENTS,
            ),
            position: Vec3::ZERO,
            scale: 1.0,
            visible: true,
        }
    }

    /// Pull position, scale and visibility from the configuration
    pub fn apply_config(&mut self, config: &Config) {
        self.position = Vec3::new(0.0, 0.0, config.background_depth);
        self.scale = config.background_scale;
        self.visible = config.show_background_pic;
    }

    pub fn geometry(&self) -> &PlaneGeometry {
        &self.geometry
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position) * Mat4::from_scale(Vec3::splat(self.scale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_geometry_counts() {
        let plane = PlaneGeometry::new(4.0, 2.0, 10, 10);
        assert_eq!(plane.positions.len(), 121);
        assert_eq!(plane.indices.len(), 600);
        assert_eq!(plane.positions[0], [-2.0, 1.0, 0.0]);
        assert_eq!(plane.positions[120], [2.0, -1.0, 0.0]);
        assert_eq!(plane.uvs[0], [0.0, 1.0]);
    }

    #[test]
    fn test_apply_config() {
        let mut quad = BackgroundQuad::for_raster(192, 256);
        let config = Config {
            background_depth: -3.0,
            background_scale: 2.0,
            show_background_pic: false,
            ..Default::default()
        };
        quad.apply_config(&config);
        assert_eq!(quad.position, Vec3::new(0.0, 0.0, -3.0));
        assert!(!quad.visible);

        let corner = quad.model_matrix().transform_point3(Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(corner, Vec3::new(2.0, 2.0, -3.0));
    }
}
