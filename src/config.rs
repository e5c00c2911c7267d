//! Stored clock settings
//!
//! A [`ClocksConfig`] is the TOML form of the control values captured from a
//! board, so they can be written out and put back later. Each section is
//! optional; a section the board could not report is simply absent.

use crate::board::SocFamily;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name used when no path is given
pub const DEFAULT_FILE_NAME: &str = "l4t_dfs.toml";

/// Stored clock settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClocksConfig {
    /// Family the settings were captured on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<SocFamily>,
    /// Fan PWM target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fan: Option<FanConfig>,
    /// GPU frequency range
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu: Option<GpuConfig>,
    /// EMC rate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emc: Option<EmcConfig>,
    /// Per-CPU settings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cpus: Vec<CpuConfig>,
}

/// Fan configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanConfig {
    /// PWM target (0-255)
    pub speed: u8,
}

/// GPU configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuConfig {
    /// devfreq floor, must be an advertised frequency
    pub min_freq: i64,
    /// devfreq ceiling, must be an advertised frequency
    pub max_freq: i64,
}

/// EMC configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmcConfig {
    /// Rate to lock the EMC at
    pub freq: i64,
}

/// Settings for one CPU; unset fields are left alone when applying
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuConfig {
    /// CPU id, as in `cpu<N>`
    pub id: u32,
    /// Governor to select
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub governor: Option<String>,
    /// Frequency floor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_freq: Option<i64>,
    /// Frequency ceiling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_freq: Option<i64>,
}

impl ClocksConfig {
    /// Get the default settings file path
    ///
    /// Returns `$HOME/l4t_dfs.toml`, or `./l4t_dfs.toml` when `HOME` is unset.
    pub fn default_path() -> PathBuf {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_FILE_NAME)
    }

    /// Parse settings from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| Error::Config(format!("Failed to parse settings: {}", e)))
    }

    /// Render settings as TOML text
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize settings: {}", e)))
    }

    /// Load settings from a specific path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&contents)
    }

    /// Save settings to a specific path
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_toml()?)?;
        log::info!("saved clock settings to {}", path.display());
        Ok(())
    }

    /// Settings for `cpu_id`, if any were stored
    pub fn cpu(&self, cpu_id: u32) -> Option<&CpuConfig> {
        self.cpus.iter().find(|cpu| cpu.id == cpu_id)
    }
}
