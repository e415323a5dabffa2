// SPDX-License-Identifier: GPL-3.0-only

//! Scene state owned by the frame loop
//!
//! Holds everything the renderer draws: the relief mesh, the background
//! quad, the camera, the clear color and the two input rasters used as
//! textures. Depth refreshes mutate the scene in place.

pub mod background;
pub mod camera;
pub mod sync;

pub use background::{BackgroundQuad, PlaneGeometry};
pub use camera::PerspectiveCamera;
pub use sync::{Generation, SceneGenerations};

use crate::config::{Color, Config};
use crate::depth::{DepthDecoder, Raster};
use crate::errors::{AppResult, RasterError};
use crate::mesh::Mesh;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct SceneState {
    camera: PerspectiveCamera,
    mesh: Mesh,
    background: BackgroundQuad,
    clear_color: Color,
    depth_texture: Raster,
    color_texture: Raster,
    generations: SceneGenerations,
}

impl SceneState {
    /// Build the scene from the initial raster pair
    ///
    /// Fails if either raster is empty or the two differ in size.
    pub fn new(depth: Raster, color: Raster, config: &Config) -> AppResult<Self> {
        Self::check_pair(&depth, &color)?;

        let decoder = DepthDecoder::new(config.invalid_depth_threshold);
        let mesh = Mesh::build(&depth, &decoder, config.image_scale, config.depth_scale);

        let mut background = BackgroundQuad::for_raster(depth.width(), depth.height());
        background.apply_config(config);

        info!(
            width = depth.width(),
            height = depth.height(),
            triangles = mesh.triangle_count(),
            "Scene initialized"
        );

        Ok(Self {
            camera: PerspectiveCamera::default(),
            mesh,
            background,
            clear_color: config.background_color,
            depth_texture: depth,
            color_texture: color,
            generations: SceneGenerations::default(),
        })
    }

    /// Pull the per-frame settings (clear color and background transform)
    pub fn apply_frame_config(&mut self, config: &Config) {
        self.clear_color = config.background_color;
        self.background.apply_config(config);
    }

    /// Replace both textures and bring the mesh in line with the new depth
    ///
    /// The rasters must match the size the scene was built with; on
    /// mismatch nothing is touched. Refreshing twice with the same rasters
    /// leaves identical buffers.
    pub fn refresh_depth(&mut self, depth: Raster, color: Raster, config: &Config) -> AppResult<()> {
        Self::check_pair(&depth, &color)?;
        let (width, height) = self.dimensions();
        depth.expect_dimensions(width, height)?;

        let decoder = DepthDecoder::new(config.invalid_depth_threshold);
        self.mesh.update_depths(&depth, &decoder, config.depth_scale);

        self.depth_texture = depth;
        self.color_texture = color;
        self.generations.bump_refresh();

        self.mesh.compute_bounds();

        debug!(triangles = self.mesh.triangle_count(), "Depth refreshed");
        Ok(())
    }

    fn check_pair(depth: &Raster, color: &Raster) -> Result<(), RasterError> {
        if depth.is_empty() {
            return Err(RasterError::Empty { name: "depth" });
        }
        if color.is_empty() {
            return Err(RasterError::Empty { name: "color" });
        }
        color.expect_dimensions(depth.width(), depth.height())
    }

    /// Raster size the scene was built for
    pub fn dimensions(&self) -> (u32, u32) {
        (self.mesh.grid().width(), self.mesh.grid().height())
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn background(&self) -> &BackgroundQuad {
        &self.background
    }

    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    pub fn depth_texture(&self) -> &Raster {
        &self.depth_texture
    }

    pub fn color_texture(&self) -> &Raster {
        &self.color_texture
    }

    pub fn generations(&self) -> SceneGenerations {
        self.generations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;

    fn raster(width: u32, height: u32, value: u8) -> Raster {
        Raster::from_fn(width, height, |_, _| [value, 0, 0, 255])
    }

    #[test]
    fn test_new_rejects_mismatched_pair() {
        let err = SceneState::new(raster(4, 4, 200), raster(4, 3, 0), &Config::default()).unwrap_err();
        assert!(matches!(err, AppError::Raster(RasterError::DimensionMismatch { .. })));

        let err = SceneState::new(raster(0, 4, 200), raster(0, 4, 0), &Config::default()).unwrap_err();
        assert!(matches!(err, AppError::Raster(RasterError::Empty { name: "depth" })));
    }

    #[test]
    fn test_refresh_rejects_resize_without_mutation() {
        let config = Config::default();
        let mut scene = SceneState::new(raster(4, 4, 200), raster(4, 4, 0), &config).unwrap();
        let before_mesh = scene.mesh().clone();
        let before_gen = scene.generations();

        assert!(scene.refresh_depth(raster(5, 4, 10), raster(5, 4, 0), &config).is_err());
        assert_eq!(scene.mesh(), &before_mesh);
        assert_eq!(scene.generations(), before_gen);
    }

    #[test]
    fn test_refresh_bumps_generations_and_bounds() {
        let config = Config::default();
        let mut scene = SceneState::new(raster(4, 4, 200), raster(4, 4, 0), &config).unwrap();
        let before = scene.generations();

        scene.refresh_depth(raster(4, 4, 100), raster(4, 4, 0), &config).unwrap();
        let after = scene.generations();
        assert_ne!(before.positions, after.positions);
        assert_ne!(before.indices, after.indices);
        assert_ne!(before.depth_texture, after.depth_texture);
        assert_ne!(before.color_texture, after.color_texture);

        let bounds = scene.mesh().bounds().unwrap();
        let z = 100.0 / 255.0;
        assert!((bounds.aabb.min.z - z).abs() < 1e-5);
    }

    #[test]
    fn test_frame_config_updates_background() {
        let mut config = Config::default();
        let mut scene = SceneState::new(raster(2, 2, 200), raster(2, 2, 0), &config).unwrap();
        config.background_color = Color::WHITE;
        config.show_background_pic = false;
        scene.apply_frame_config(&config);
        assert_eq!(scene.clear_color(), Color::WHITE);
        assert!(!scene.background().visible);
    }
}
