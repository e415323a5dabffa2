// SPDX-License-Identifier: GPL-3.0-only

//! Grid triangulation
//!
//! Two triangles per raster cell, split along the `b–d` diagonal:
//!
//! ```text
//!   b ---- a        (i, j)   (i, j+1)
//!   | \    |
//!   |   \  |
//!   c ---- d        (i+1, j) (i+1, j+1)
//! ```
//!
//! A triangle is emitted only when all three of its samples decode to a
//! valid depth. Holes are never bridged.
//!
//! Validity is read at pixel offsets (`row * W + col`) while the emitted
//! corners are vertex-grid offsets (`row * (W + 1) + col`). Away from the
//! first row and column the two address different points; the resulting
//! hole pattern is kept as-is.

use crate::depth::is_valid_depth;

/// Vertex-grid indices of the four corners of cell `(i, j)`, as `[a, b, c, d]`
#[inline]
pub fn cell_vertices(width: u32, i: u32, j: u32) -> [u32; 4] {
    let row = width + 1;
    [
        i * row + (j + 1),
        i * row + j,
        (i + 1) * row + j,
        (i + 1) * row + (j + 1),
    ]
}

/// Pixel offsets the validity of cell `(i, j)` is read from, as `[a', b', c', d']`
#[inline]
pub fn cell_samples(width: u32, i: u32, j: u32) -> [usize; 4] {
    let (w, i, j) = (width as usize, i as usize, j as usize);
    [
        i * w + j + 1,
        i * w + j,
        (i + 1) * w + j,
        (i + 1) * w + j + 1,
    ]
}

/// Build the index list for a `width × height` raster
///
/// `depth_at` returns the decoded depth at a flat pixel offset; offsets may
/// run past the raster and must then decode as invalid.
pub fn build_indices<F>(width: u32, height: u32, depth_at: F) -> Vec<u32>
where
    F: Fn(usize) -> f32,
{
    let mut indices = Vec::new();

    for i in 0..height {
        for j in 0..width {
            let [a, b, c, d] = cell_vertices(width, i, j);
            let [sa, sb, sc, sd] = cell_samples(width, i, j);

            let a_valid = is_valid_depth(depth_at(sa));
            let b_valid = is_valid_depth(depth_at(sb));
            let c_valid = is_valid_depth(depth_at(sc));
            let d_valid = is_valid_depth(depth_at(sd));

            if a_valid && b_valid && d_valid {
                indices.extend_from_slice(&[a, b, d]);
            }

            if b_valid && c_valid && d_valid {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::INVALID_DEPTH;

    fn depth_from(samples: &[bool]) -> impl Fn(usize) -> f32 + '_ {
        move |index| match samples.get(index) {
            Some(true) => 0.5,
            _ => INVALID_DEPTH,
        }
    }

    #[test]
    fn test_two_by_two_all_valid() {
        let samples = [true; 4];
        let indices = build_indices(2, 2, depth_from(&samples));
        // Only the top-left cell has all its samples inside the raster
        assert_eq!(indices, vec![1, 0, 4, 0, 3, 4]);
    }

    #[test]
    fn test_two_by_two_top_left_invalid() {
        let samples = [false, true, true, true];
        let indices = build_indices(2, 2, depth_from(&samples));
        assert!(indices.is_empty());
    }

    #[test]
    fn test_triangles_are_independent() {
        // 2x3 raster; cell (0,0) samples: a'=1 b'=0 c'=2 d'=3
        let mut samples = [true; 6];
        samples[1] = false; // a' only in the first triangle
        let indices = build_indices(2, 3, depth_from(&samples));
        assert_eq!(&indices[..3], &[0, 3, 4]);

        let mut samples = [true; 6];
        samples[2] = false; // c' only in the second triangle
        let indices = build_indices(2, 3, depth_from(&samples));
        assert_eq!(&indices[..3], &[1, 0, 4]);
    }

    #[test]
    fn test_no_degenerate_triangles() {
        let samples = vec![true; 12 * 9];
        let indices = build_indices(12, 9, depth_from(&samples));
        assert!(!indices.is_empty());
        assert!(indices.len() <= 6 * 12 * 9);
        for tri in indices.chunks(3) {
            assert!(tri[0] != tri[1] && tri[1] != tri[2] && tri[0] != tri[2]);
        }
    }

    #[test]
    fn test_all_invalid_is_empty() {
        let indices = build_indices(8, 8, |_| INVALID_DEPTH);
        assert!(indices.is_empty());
    }
}
