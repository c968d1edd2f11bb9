//! Configuration for the window lifecycle core
//!
//! Loads configuration from TOML file at `~/.config/area/wmcore.toml`
//! Auto-generates default config file on first run if missing.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::shared::Geometry;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub discovery: DiscoveryConfig,
    pub panel: PanelConfig,
    /// Explicit usable area; computed from the screen and panel when absent
    pub workspace: Option<WorkspaceConfig>,
}

impl Config {
    /// Load configuration from file, or use defaults if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Same as [`Config::load`] with an explicit path
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            info!("Config file not found at {:?}, using defaults", config_path);
            if let Err(e) = Self::save_default(config_path) {
                warn!("Failed to create default config file: {}", e);
            }
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file {:?}", config_path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", config_path))?;

        info!("Configuration loaded from {:?}", config_path);
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("area");

        Ok(config_dir.join("wmcore.toml"))
    }

    /// Save default configuration to file
    fn save_default(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(&Self::default())
            .context("Failed to serialize default config")?;

        fs::write(path, toml_string).context("Failed to write default config file")?;

        info!("Created default config file at {:?}", path);
        Ok(())
    }

    /// Initial workspace for a screen of the given size
    ///
    /// An explicit `[workspace]` wins. Otherwise the panel's strip is taken
    /// off the matching edge, unless the panel auto-hides.
    pub fn workspace_for_screen(&self, screen: Geometry) -> Geometry {
        if let Some(workspace) = &self.workspace {
            return workspace.to_geometry();
        }
        if self.panel.auto_hide {
            return screen;
        }

        let reserved = self.panel.height;
        let Geometry { x, y, width, height } = screen;
        match self.panel.position {
            PanelPosition::Top => Geometry::new(
                x,
                y.saturating_add(reserved.min(height) as i32),
                width,
                height.saturating_sub(reserved),
            ),
            PanelPosition::Bottom => Geometry::new(x, y, width, height.saturating_sub(reserved)),
            PanelPosition::Left => Geometry::new(
                x.saturating_add(reserved.min(width) as i32),
                y,
                width.saturating_sub(reserved),
                height,
            ),
            PanelPosition::Right => Geometry::new(x, y, width.saturating_sub(reserved), height),
        }
    }
}

/// Window discovery tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Safety sweep period in milliseconds
    pub sweep_interval_ms: u64,
    /// Reconcile cycles a local command may go unconfirmed
    pub settle_cycles: u8,
    /// Enumerate through `_NET_CLIENT_LIST` when a window manager provides it
    pub prefer_client_list: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            sweep_interval_ms: 2000,
            settle_cycles: 3,
            prefer_client_list: true,
        }
    }
}

impl DiscoveryConfig {
    /// Sweep period, never shorter than 100ms
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms.max(100))
    }
}

/// Screen edge the panel is attached to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelPosition {
    #[default]
    Top,
    Bottom,
    Left,
    Right,
}

/// Panel configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Panel thickness in pixels
    pub height: u32,
    pub position: PanelPosition,
    /// An auto-hiding panel reserves no space
    pub auto_hide: bool,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            height: 40,
            position: PanelPosition::Top,
            auto_hide: false,
        }
    }
}

/// Explicit usable area
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl WorkspaceConfig {
    pub fn to_geometry(self) -> Geometry {
        Geometry::new(self.x, self.y, self.width, self.height)
    }
}
