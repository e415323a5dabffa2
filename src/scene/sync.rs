// SPDX-License-Identifier: GPL-3.0-only

//! Dirty tracking for GPU-side copies of scene data
//!
//! Every resource the renderer mirrors has a generation counter. Mutating
//! the CPU copy bumps the counter; the renderer remembers the generation it
//! last uploaded and re-uploads only on a mismatch.

/// Monotonic version of one resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    /// Generation that no uploaded resource ever has
    pub const NEVER: Generation = Generation(u64::MAX);

    pub fn bump(&mut self) {
        self.0 = self.0.wrapping_add(1);
        if *self == Self::NEVER {
            self.0 = 0;
        }
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

/// Generations of every resource mirrored on the GPU
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneGenerations {
    pub positions: Generation,
    pub indices: Generation,
    pub depth_texture: Generation,
    pub color_texture: Generation,
}

impl SceneGenerations {
    /// Mark everything a depth refresh touches
    pub fn bump_refresh(&mut self) {
        self.depth_texture.bump();
        self.color_texture.bump();
        self.positions.bump();
        self.indices.bump();
    }

    /// Sentinel set the renderer starts from, forcing a full first upload
    pub fn never_uploaded() -> Self {
        Self {
            positions: Generation::NEVER,
            indices: Generation::NEVER,
            depth_texture: Generation::NEVER,
            color_texture: Generation::NEVER,
        }
    }
}
