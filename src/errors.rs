// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the relief viewer

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone, Error)]
pub enum AppError {
    /// Input raster errors
    #[error("Raster error: {0}")]
    Raster(#[from] RasterError),
    /// GPU setup or submission errors
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    /// Capture precondition errors
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
    /// Storage/filesystem errors
    #[error("Storage error: {0}")]
    Storage(String),
    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

/// Errors about the two input rasters
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RasterError {
    /// A required input raster could not be read
    #[error("Input raster unavailable at {path}: {reason}")]
    Unavailable { path: PathBuf, reason: String },
    /// A raster has zero width or height
    #[error("Raster {name} is empty")]
    Empty { name: &'static str },
    /// Pixel buffer length disagrees with the declared dimensions
    #[error("Raster has {actual} bytes, expected {expected} for {width}x{height}")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    /// Depth and color rasters differ in size, or a refresh changed the size
    #[error("Raster size mismatch: expected {expected_width}x{expected_height}, got {width}x{height}")]
    DimensionMismatch {
        expected_width: u32,
        expected_height: u32,
        width: u32,
        height: u32,
    },
}

/// GPU-specific errors
#[derive(Debug, Clone, Error)]
pub enum GpuError {
    /// No adapter could be found
    #[error("No suitable GPU adapter: {0}")]
    AdapterUnavailable(String),
    /// Device creation failed
    #[error("Failed to create GPU device: {0}")]
    DeviceCreation(String),
    /// Reading the rendered frame back failed
    #[error("Frame readback failed: {0}")]
    Readback(String),
    /// The scene no longer fits the resources allocated at startup
    #[error("Scene does not match GPU resources: {0}")]
    ResourceMismatch(String),
}

/// Capture precondition errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// Capturing requires the camera to orbit on its own
    #[error("autoAnimation must be turned on!")]
    AutoAnimationDisabled,
}

// Conversion from String for call sites that only carry a message
impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}
