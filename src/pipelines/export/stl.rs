// SPDX-License-Identifier: GPL-3.0-only

//! STL serialization (ASCII and binary)
//!
//! Facet normals are recomputed from the winding of each triangle; the
//! vertex normals of the relief grid are not used.

use super::SolidModelWriter;
use crate::constants::STL_SOLID_NAME;
use std::fmt::Write as _;

/// Size of the binary STL header
const BINARY_HEADER_LEN: usize = 80;
/// Bytes per facet record in binary STL
const BINARY_FACET_LEN: usize = 50;

/// Unit normal of a counter-clockwise triangle, zero if degenerate
pub fn triangle_normal(tri: &[[f32; 3]; 3]) -> [f32; 3] {
    let [ax, ay, az] = tri[0];
    let [bx, by, bz] = tri[1];
    let [cx, cy, cz] = tri[2];

    let ab = [bx - ax, by - ay, bz - az];
    let ac = [cx - ax, cy - ay, cz - az];
    let n = [
        ab[1] * ac[2] - ab[2] * ac[1],
        ab[2] * ac[0] - ab[0] * ac[2],
        ab[0] * ac[1] - ab[1] * ac[0],
    ];
    let len2 = n[0] * n[0] + n[1] * n[1] + n[2] * n[2];
    if len2 <= f32::EPSILON * f32::EPSILON {
        return [0.0, 0.0, 0.0];
    }
    let inv_len = 1.0 / len2.sqrt();
    [n[0] * inv_len, n[1] * inv_len, n[2] * inv_len]
}

/// STL writer; ASCII unless `binary` is set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StlExporter {
    pub binary: bool,
}

impl StlExporter {
    pub fn ascii() -> Self {
        Self { binary: false }
    }

    pub fn binary() -> Self {
        Self { binary: true }
    }

    fn facets<'a>(
        positions: &'a [[f32; 3]],
        indices: &'a [u32],
    ) -> impl Iterator<Item = [[f32; 3]; 3]> + 'a {
        indices.chunks_exact(3).filter_map(move |tri| {
            Some([
                *positions.get(tri[0] as usize)?,
                *positions.get(tri[1] as usize)?,
                *positions.get(tri[2] as usize)?,
            ])
        })
    }

    fn write_ascii(positions: &[[f32; 3]], indices: &[u32]) -> Vec<u8> {
        let mut out = String::new();
        let _ = writeln!(out, "solid {}", STL_SOLID_NAME);

        for tri in Self::facets(positions, indices) {
            let [nx, ny, nz] = triangle_normal(&tri);
            let _ = writeln!(out, "\tfacet normal {} {} {}", nx, ny, nz);
            out.push_str("\t\touter loop\n");
            for [x, y, z] in tri {
                let _ = writeln!(out, "\t\t\tvertex {} {} {}", x, y, z);
            }
            out.push_str("\t\tendloop\n");
            out.push_str("\tendfacet\n");
        }

        let _ = writeln!(out, "endsolid {}", STL_SOLID_NAME);
        out.into_bytes()
    }

    fn write_binary(positions: &[[f32; 3]], indices: &[u32]) -> Vec<u8> {
        let facets: Vec<[[f32; 3]; 3]> = Self::facets(positions, indices).collect();
        let mut out = Vec::with_capacity(BINARY_HEADER_LEN + 4 + facets.len() * BINARY_FACET_LEN);

        let mut header = [0u8; BINARY_HEADER_LEN];
        let name = STL_SOLID_NAME.as_bytes();
        let copy_n = name.len().min(header.len());
        header[..copy_n].copy_from_slice(&name[..copy_n]);
        out.extend_from_slice(&header);

        out.extend_from_slice(&(facets.len() as u32).to_le_bytes());

        for tri in &facets {
            for component in triangle_normal(tri) {
                out.extend_from_slice(&component.to_le_bytes());
            }
            for vertex in tri {
                for component in vertex {
                    out.extend_from_slice(&component.to_le_bytes());
                }
            }
            out.extend_from_slice(&0u16.to_le_bytes());
        }

        out
    }
}

impl SolidModelWriter for StlExporter {
    fn serialize(&self, positions: &[[f32; 3]], indices: &[u32]) -> Vec<u8> {
        if self.binary {
            Self::write_binary(positions, indices)
        } else {
            Self::write_ascii(positions, indices)
        }
    }

    fn extension(&self) -> &'static str {
        "stl"
    }
}
