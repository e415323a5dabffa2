// SPDX-License-Identifier: GPL-3.0-only

//! Vertex grid: one vertex per pixel corner
//!
//! A `W × H` raster yields `(W + 1) × (H + 1)` vertices. Everything except
//! the `z` of each position is fixed at construction.

use crate::depth::{DepthDecoder, Raster};

/// Per-vertex attributes stored as separate arrays (one GPU buffer each)
#[derive(Debug, Clone, PartialEq)]
pub struct VertexGrid {
    width: u32,
    height: u32,
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    colors: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
}

impl VertexGrid {
    /// Build the grid for `raster`
    ///
    /// Positions are centered on the raster midpoint, scaled by `image_scale`
    /// in x/y (y pointing up) and by `depth_scale` in z.
    pub fn build(raster: &Raster, decoder: &DepthDecoder, image_scale: f32, depth_scale: f32) -> Self {
        let (width, height) = raster.dimensions();
        let (w, h) = (width as f32, height as f32);
        let count = crate::constants::grid_vertex_count(width, height);

        let mut positions = Vec::with_capacity(count);
        let mut normals = Vec::with_capacity(count);
        let mut colors = Vec::with_capacity(count);
        let mut uvs = Vec::with_capacity(count);

        for i in 0..=height {
            let y = i as f32 - h * 0.5;
            for j in 0..=width {
                let x = j as f32 - w * 0.5;
                let depth = decoder.depth_at(raster, Self::sample_index(width, i, j));

                positions.push([x * image_scale, -y * image_scale, depth * depth_scale]);
                normals.push([0.0, 0.0, 1.0]);
                colors.push([x / w + 0.5, y / h + 0.5, 1.0]);
                uvs.push([j as f32 / w, 1.0 - i as f32 / h]);
            }
        }

        Self {
            width,
            height,
            positions,
            normals,
            colors,
            uvs,
        }
    }

    /// Re-decode every vertex depth and overwrite `z`
    ///
    /// Boundary vertices use the same pixel addressing as construction.
    pub fn update_depths(&mut self, raster: &Raster, decoder: &DepthDecoder, depth_scale: f32) {
        let width = self.width;
        for i in 0..=self.height {
            for j in 0..=width {
                let depth = decoder.depth_at(raster, Self::sample_index(width, i, j));
                let vertex = Self::vertex_index(width, i, j);
                self.positions[vertex][2] = depth * depth_scale;
            }
        }
    }

    /// Pixel offset a grid vertex reads its depth from
    ///
    /// Uses the raster row stride, so the extra column wraps into the next
    /// row and the extra row runs past the end.
    #[inline]
    pub fn sample_index(width: u32, i: u32, j: u32) -> usize {
        i as usize * width as usize + j as usize
    }

    /// Flat index of grid vertex `(i, j)`
    #[inline]
    pub fn vertex_index(width: u32, i: u32, j: u32) -> usize {
        i as usize * (width as usize + 1) + j as usize
    }

    /// Raster width the grid was built for
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Raster height the grid was built for
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    pub fn colors(&self) -> &[[f32; 3]] {
        &self.colors
    }

    pub fn uvs(&self) -> &[[f32; 2]] {
        &self.uvs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::INVALID_DEPTH;

    #[test]
    fn test_grid_layout() {
        let raster = Raster::from_fn(2, 2, |_, _| [128, 0, 0, 255]);
        let grid = VertexGrid::build(&raster, &DepthDecoder::default(), 1.0, 2.0);
        assert_eq!(grid.len(), 9);

        // Corner (0, 0) sits at the top-left, y up
        assert_eq!(grid.positions()[0][0], -1.0);
        assert_eq!(grid.positions()[0][1], 1.0);
        assert!((grid.positions()[0][2] - 2.0 * 128.0 / 255.0).abs() < 1e-6);

        // Last vertex reads past the raster: invalid depth
        assert_eq!(grid.positions()[8], [1.0, -1.0, INVALID_DEPTH * 2.0]);

        assert_eq!(grid.uvs()[0], [0.0, 1.0]);
        assert_eq!(grid.uvs()[8], [1.0, 0.0]);
        assert_eq!(grid.colors()[0], [0.0, 0.0, 1.0]);
        assert!(grid.normals().iter().all(|n| *n == [0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_update_depths_only_touches_z() {
        let raster = Raster::from_fn(3, 2, |_, _| [200, 0, 0, 255]);
        let mut grid = VertexGrid::build(&raster, &DepthDecoder::default(), 0.5, 1.0);
        let before = grid.clone();

        let flat = Raster::from_fn(3, 2, |_, _| [0, 0, 0, 255]);
        grid.update_depths(&flat, &DepthDecoder::default(), 1.0);

        for (old, new) in before.positions().iter().zip(grid.positions()) {
            assert_eq!(old[0], new[0]);
            assert_eq!(old[1], new[1]);
            assert_eq!(new[2], INVALID_DEPTH);
        }
        assert_eq!(before.uvs(), grid.uvs());
        assert_eq!(before.colors(), grid.colors());
    }
}
