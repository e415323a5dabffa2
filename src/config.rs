// SPDX-License-Identifier: GPL-3.0-only

//! User-facing configuration surface
//!
//! A small set of named scalars, colors and flags. The core reads them every
//! frame and on every depth refresh but never writes them.

use crate::constants::{INVALID_DEPTH_THRESHOLD, background};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// Directory name used under the platform config directory
const CONFIG_DIR_NAME: &str = "tactile-picture";
/// Config file name
const CONFIG_FILE_NAME: &str = "config.json";

/// Linear RGB color stored as `"#rrggbb"`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Channels as an array, for uniform and clear-color upload
    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(format!("Invalid color '{}', expected #rrggbb", s));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .map(|v| v as f32 / 255.0)
                .map_err(|e| format!("Invalid color '{}': {}", s, e))
        };

        Ok(Color::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let to_byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        write!(
            f,
            "#{:02x}{:02x}{:02x}",
            to_byte(self.r),
            to_byte(self.g),
            to_byte(self.b)
        )
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Rendering configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// World units per raster pixel, horizontally and vertically
    pub image_scale: f32,
    /// World units per unit of decoded depth
    pub depth_scale: f32,
    /// Clear color behind the scene
    pub background_color: Color,
    /// Uniform scale of the background quad
    pub background_scale: f32,
    /// Z position of the background quad
    pub background_depth: f32,
    /// Whether the background quad is drawn
    pub show_background_pic: bool,
    /// Orbit speed used by the capture path (radians per millisecond)
    pub camera_speed: f32,
    /// Whether the camera orbits on its own; required for capture
    pub auto_animation: bool,
    /// Decoded depths at or below this value are treated as "no data"
    pub invalid_depth_threshold: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_scale: background::PLANE_SIZE, // Mesh matches the background plane
            depth_scale: 1.0,
            background_color: Color::BLACK,
            background_scale: 1.0,
            background_depth: 0.0,
            show_background_pic: true,
            camera_speed: 0.001,
            auto_animation: false,
            invalid_depth_threshold: INVALID_DEPTH_THRESHOLD,
        }
    }
}

impl Config {
    /// Platform default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Parse a config from JSON text; missing keys fall back to defaults
    pub fn from_json(text: &str) -> AppResult<Self> {
        let config: Config = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file
    pub fn load(path: &Path) -> AppResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_json(&text)?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load `path` if given, else the platform default if it exists, else defaults
    pub fn load_or_default(path: Option<&Path>) -> AppResult<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        match Self::default_path() {
            Some(default) if default.exists() => Self::load(&default),
            _ => {
                info!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Write the config as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        debug!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Reject values the scene cannot be built from
    pub fn validate(&self) -> AppResult<()> {
        let finite = [
            ("imageScale", self.image_scale),
            ("depthScale", self.depth_scale),
            ("backgroundScale", self.background_scale),
            ("backgroundDepth", self.background_depth),
            ("cameraSpeed", self.camera_speed),
            ("invalidDepthThreshold", self.invalid_depth_threshold),
        ];

        for (name, value) in finite {
            if !value.is_finite() {
                return Err(AppError::Config(format!("{} must be finite", name)));
            }
        }

        Ok(())
    }
}
