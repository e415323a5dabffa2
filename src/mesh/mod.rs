// SPDX-License-Identifier: GPL-3.0-only

//! Relief mesh: vertex grid, triangle list and bounding volumes
//!
//! The mesh is built once from the first depth raster. Later refreshes
//! rewrite vertex depths in place and rebuild the index list; the attribute
//! arrays are never reallocated.

mod builder;
mod grid;

pub use builder::{build_indices, cell_samples, cell_vertices};
pub use grid::VertexGrid;

use crate::depth::{DepthDecoder, Raster};
use glam::Vec3;
use tracing::debug;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Box around `points`, `None` if there are none
    pub fn from_points(points: &[[f32; 3]]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let start = Vec3::from_array(*first);
        let (min, max) = rest.iter().fold((start, start), |(min, max), p| {
            let p = Vec3::from_array(*p);
            (min.min(p), max.max(p))
        });
        Some(Self { min, max })
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Bounding sphere centered on the bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    /// Sphere at the box center reaching the farthest point
    pub fn from_points(points: &[[f32; 3]], aabb: &Aabb) -> Self {
        let center = aabb.center();
        let radius_squared = points
            .iter()
            .map(|p| center.distance_squared(Vec3::from_array(*p)))
            .fold(0.0f32, f32::max);
        Self {
            center,
            radius: radius_squared.sqrt(),
        }
    }
}

/// Bounding volumes used for culling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub aabb: Aabb,
    pub sphere: BoundingSphere,
}

impl Bounds {
    /// Bounds over every grid vertex, indexed or not
    pub fn compute(positions: &[[f32; 3]]) -> Option<Self> {
        let aabb = Aabb::from_points(positions)?;
        let sphere = BoundingSphere::from_points(positions, &aabb);
        Some(Self { aabb, sphere })
    }
}

/// Vertex grid plus the triangles currently emitted over it
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    grid: VertexGrid,
    indices: Vec<u32>,
    bounds: Option<Bounds>,
}

impl Mesh {
    /// Build the grid, triangulate it and compute bounds
    pub fn build(raster: &Raster, decoder: &DepthDecoder, image_scale: f32, depth_scale: f32) -> Self {
        let grid = VertexGrid::build(raster, decoder, image_scale, depth_scale);
        let indices = Self::triangulate(raster, decoder);
        let bounds = Bounds::compute(grid.positions());

        debug!(
            vertex_count = grid.len(),
            triangle_count = indices.len() / 3,
            "Built relief mesh"
        );

        Self {
            grid,
            indices,
            bounds,
        }
    }

    /// Rewrite vertex depths from `raster` and rebuild the index list
    ///
    /// The caller has checked that `raster` matches the grid dimensions.
    pub fn update_depths(&mut self, raster: &Raster, decoder: &DepthDecoder, depth_scale: f32) {
        self.grid.update_depths(raster, decoder, depth_scale);
        self.indices = Self::triangulate(raster, decoder);
    }

    /// Recompute bounding box and sphere from the current positions
    pub fn compute_bounds(&mut self) {
        self.bounds = Bounds::compute(self.grid.positions());
    }

    fn triangulate(raster: &Raster, decoder: &DepthDecoder) -> Vec<u32> {
        build_indices(raster.width(), raster.height(), |index| {
            decoder.depth_at(raster, index)
        })
    }

    pub fn grid(&self) -> &VertexGrid {
        &self.grid
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        self.grid.positions()
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn bounds(&self) -> Option<&Bounds> {
        self.bounds.as_ref()
    }

    /// Corner positions of triangle `k`
    pub fn triangle(&self, k: usize) -> Option<[[f32; 3]; 3]> {
        let tri = self.indices.get(k * 3..k * 3 + 3)?;
        let positions = self.grid.positions();
        Some([
            positions[tri[0] as usize],
            positions[tri[1] as usize],
            positions[tri[2] as usize],
        ])
    }

    /// Iterator over the corner positions of every emitted triangle
    pub fn triangles(&self) -> impl Iterator<Item = [[f32; 3]; 3]> + '_ {
        (0..self.triangle_count()).filter_map(|k| self.triangle(k))
    }
}
