// SPDX-License-Identifier: GPL-3.0-only

//! Fixed perspective camera looking down −Z

use crate::constants::{camera, renderer_aspect};
use glam::{Mat4, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view (degrees)
    pub fov_degrees: f32,
    /// Width over height of the output surface
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self {
            fov_degrees: camera::FOV_DEGREES,
            aspect: renderer_aspect(),
            near: camera::NEAR,
            far: camera::FAR,
            position: Vec3::new(0.0, 0.0, camera::DISTANCE),
        }
    }
}

impl PerspectiveCamera {
    /// Projection into wgpu clip space (depth 0..1)
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    /// World-to-camera transform; the camera has no rotation
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_translation(-self.position)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}
