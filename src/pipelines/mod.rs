// SPDX-License-Identifier: GPL-3.0-only

//! Output pipelines
//!
//! - [`export`]: solid model export of the relief mesh
//! - [`capture`]: hand-off of rendered frames to an external recorder

pub mod capture;
pub mod export;
