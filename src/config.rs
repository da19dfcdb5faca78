// src/config.rs

//! Defines the configuration structures for the painter.
//!
//! The whole tree deserializes from JSON; every section and field has a
//! default, so a config file only needs to name what it changes. The file is
//! located through the `PAINTER_CONFIG` environment variable.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::color::{Rgba, RED};
use crate::lang::ParserOptions;
use crate::painter::{LoopOptions, Marker, ShutdownPolicy};
use anyhow::{Context, Result};
use log::{info, warn};
use once_cell::sync::Lazy;

/// Environment variable naming the JSON config file.
pub const CONFIG_ENV_VAR: &str = "PAINTER_CONFIG";

/// Process-wide configuration, loaded on first use.
pub static CONFIG: Lazy<Config> = Lazy::new(Config::load_or_default);

// --- Top-Level Configuration Structure ---

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Size of the drawing surfaces.
    pub surface: SurfaceConfig,
    /// Figure color and marker geometry.
    pub drawing: DrawingConfig,
    /// Command language options.
    pub parser: ParserConfig,
    /// Operation queue settings.
    pub queue: QueueConfig,
    /// HTTP script listener.
    pub transport: TransportConfig,
    /// Headless presentation.
    pub display: DisplayConfig,
}

impl Config {
    /// Load from `PAINTER_CONFIG` if set, falling back to defaults on any error.
    pub fn load_or_default() -> Self {
        let Some(path) = std::env::var_os(CONFIG_ENV_VAR) else {
            info!("{} not set, using default configuration", CONFIG_ENV_VAR);
            return Config::default();
        };
        match Config::from_file(Path::new(&path)) {
            Ok(config) => {
                info!("Configuration loaded from {:?}", path);
                config
            }
            Err(e) => {
                warn!("{:#}; using default configuration", e);
                Config::default()
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Config::from_json(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn loop_options(&self) -> LoopOptions {
        LoopOptions {
            width: self.surface.width,
            height: self.surface.height,
            queue_capacity: self.queue.capacity,
            shutdown_policy: self.queue.shutdown_policy,
        }
    }

    pub fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            figure_color: self.drawing.figure_color,
            allow_comments: self.parser.allow_comments,
        }
    }

    pub fn marker(&self) -> Marker {
        Marker {
            size_px: self.drawing.marker_size_px,
            thickness_px: self.drawing.marker_thickness_px,
        }
    }
}

// --- Surface Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SurfaceConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        SurfaceConfig {
            width: 400,
            height: 400,
        }
    }
}

// --- Drawing Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DrawingConfig {
    /// Color of every figure marker.
    pub figure_color: Rgba,
    /// Length of each marker bar in pixels.
    pub marker_size_px: u32,
    /// Thickness of each marker bar in pixels.
    pub marker_thickness_px: u32,
}

impl Default for DrawingConfig {
    fn default() -> Self {
        let marker = Marker::default();
        DrawingConfig {
            figure_color: RED,
            marker_size_px: marker.size_px,
            marker_thickness_px: marker.thickness_px,
        }
    }
}

// --- Parser Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ParserConfig {
    /// Skip `#` comment lines. When false they are rejected as unknown commands.
    pub allow_comments: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            allow_comments: true,
        }
    }
}

// --- Queue Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct QueueConfig {
    /// Bounded queue size; producers block when it is full.
    pub capacity: usize,
    /// What happens to still-queued operations on shutdown.
    pub shutdown_policy: ShutdownPolicy,
}

impl Default for QueueConfig {
    fn default() -> Self {
        QueueConfig {
            capacity: 100,
            shutdown_policy: ShutdownPolicy::Discard,
        }
    }
}

// --- Transport Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TransportConfig {
    /// Start the HTTP listener.
    pub enabled: bool,
    pub listen_addr: String,
    /// Largest accepted request body.
    pub max_body_bytes: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            enabled: true,
            listen_addr: "127.0.0.1:17000".to_string(),
            max_body_bytes: 1 << 20,
        }
    }
}

// --- Display Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct DisplayConfig {
    /// Directory for PNG snapshots of presented frames. None disables them.
    pub snapshot_dir: Option<PathBuf>,
}
