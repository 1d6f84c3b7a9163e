//! Render configuration
//!
//! Loaded from a RON file. Every field is optional in the file and falls
//! back to its default.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rasterizer::{
    Argb, DrawModes, FillMode, RasterRule, RasterSettings, DEFAULT_BACKGROUND, HEIGHT, WIDTH,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Framebuffer size in pixels
    pub width: usize,
    pub height: usize,
    /// Window pixels per framebuffer pixel
    pub window_scale: usize,
    /// Vertical field of view
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Packed 0xAARRGGBB
    pub background: Argb,
    pub draw_modes: DrawModes,
    pub fill_mode: FillMode,
    pub raster_rule: RasterRule,
    pub backface_culling: bool,
    pub depth_sort: bool,
    pub show_grid: bool,
    /// World units per second
    pub camera_speed: f32,
    /// Radians per second
    pub turn_speed: f32,
    /// Scene file; the built-in demo scene when unset
    pub scene: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: WIDTH,
            height: HEIGHT,
            window_scale: 1,
            fov_degrees: 60.0,
            near: 0.1,
            far: 100.0,
            background: DEFAULT_BACKGROUND,
            draw_modes: DrawModes::default(),
            fill_mode: FillMode::default(),
            raster_rule: RasterRule::default(),
            backface_culling: true,
            depth_sort: false,
            show_grid: false,
            camera_speed: 3.0,
            turn_speed: 1.5,
            scene: None,
        }
    }
}

impl RenderConfig {
    /// Read, parse and validate a config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&contents)?;
        log::info!("Loaded config: {} ({}x{})", path.display(), config.width, config.height);
        Ok(config)
    }

    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: RenderConfig = ron::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "framebuffer size {}x{} is empty",
                self.width, self.height
            )));
        }
        if self.window_scale == 0 {
            return Err(ConfigError::Invalid("window_scale must be at least 1".into()));
        }
        if !(self.near.is_finite() && self.near > 0.0) {
            return Err(ConfigError::Invalid(format!("near must be positive, got {}", self.near)));
        }
        if !(self.far.is_finite() && self.far > self.near) {
            return Err(ConfigError::Invalid(format!(
                "far ({}) must be greater than near ({})",
                self.far, self.near
            )));
        }
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "fov_degrees must be in (0, 180), got {}",
                self.fov_degrees
            )));
        }
        Ok(())
    }

    pub fn fov_radians(&self) -> f32 {
        self.fov_degrees.to_radians()
    }

    pub fn raster_settings(&self) -> RasterSettings {
        RasterSettings {
            modes: self.draw_modes,
            fill_mode: self.fill_mode,
            rule: self.raster_rule,
        }
    }
}
