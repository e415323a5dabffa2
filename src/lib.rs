// SPDX-License-Identifier: GPL-3.0-only

//! Tactile Picture - textured 3D reliefs from a color image and a depth image
//!
//! A depth-encoded raster is decoded into a grid of vertices, triangulated
//! wherever the depth is valid, drawn with the matching color image as
//! texture, and can be exported as an STL solid.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`depth`]: Input rasters and fixed-point depth decoding
//! - [`mesh`]: Vertex grid, triangulation and bounds
//! - [`scene`]: Scene state and the depth refresh protocol
//! - [`frame_loop`]: Display loop and inbound scene commands
//! - [`pipelines`]: STL export and frame capture hand-off
//! - [`backends`]: Raster sources
//! - [`gpu`]: wgpu device and offscreen renderer
//! - [`config`]: User configuration handling
//! - [`storage`]: Output locations and snapshots
//!
//! # Example
//!
//! ```ignore
//! let depth = backends::load_raster(Path::new("depth.png"))?;
//! let color = backends::load_raster(Path::new("color.png"))?;
//! let scene = SceneState::new(depth, color, &Config::default())?;
//! let stl = export_mesh(scene.mesh(), &StlExporter::ascii());
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod depth;
pub mod errors;
pub mod frame_loop;
pub mod gpu;
pub mod mesh;
pub mod pipelines;
pub mod scene;
pub mod storage;

// Re-export commonly used types
pub use config::{Color, Config};
pub use depth::{DepthDecoder, Raster};
pub use errors::{AppError, AppResult};
pub use frame_loop::{FrameLoop, FrameRenderer, RenderedFrame, SceneCommand};
pub use mesh::Mesh;
pub use pipelines::export::{SolidModelWriter, StlExporter, export_mesh, save_export};
pub use scene::SceneState;
