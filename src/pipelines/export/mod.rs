// SPDX-License-Identifier: GPL-3.0-only

//! Solid model export
//!
//! Serializes the relief mesh (positions and triangle list, background
//! excluded) through a [`SolidModelWriter`] and delivers the bytes to a file.

mod stl;

pub use stl::{StlExporter, triangle_normal};

use crate::errors::{AppError, AppResult};
use crate::mesh::Mesh;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Serializer for a triangle soup
pub trait SolidModelWriter {
    /// Encode the triangles `indices` selects from `positions`
    fn serialize(&self, positions: &[[f32; 3]], indices: &[u32]) -> Vec<u8>;

    /// File extension (without the dot)
    fn extension(&self) -> &'static str;
}

/// Serialize the current mesh
pub fn export_mesh(mesh: &Mesh, writer: &dyn SolidModelWriter) -> Vec<u8> {
    debug!(triangles = mesh.triangle_count(), "Serializing mesh");
    writer.serialize(mesh.positions(), mesh.indices())
}

/// Serialize the current mesh and write it to `path`
pub fn save_export(mesh: &Mesh, writer: &dyn SolidModelWriter, path: &Path) -> AppResult<PathBuf> {
    let bytes = export_mesh(mesh, writer);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| AppError::Storage(format!("{}: {}", parent.display(), e)))?;
    }
    std::fs::write(path, &bytes)
        .map_err(|e| AppError::Storage(format!("{}: {}", path.display(), e)))?;

    info!(
        path = %path.display(),
        triangles = mesh.triangle_count(),
        bytes = bytes.len(),
        "Exported mesh"
    );
    Ok(path.to_path_buf())
}
