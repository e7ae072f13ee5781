//! Layered configuration for choreo renders.
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/choreo/config.toml` (system)
//! 2. `~/.config/choreo/config.toml` (user)
//! 3. `./choreo.toml`, or a path given on the command line
//! 4. Environment variables (`CHOREO_*`, `RUST_LOG`)
//!
//! A file only needs the keys it changes.
//!
//! # Example Config
//!
//! ```toml
//! [render]
//! fps = 24
//! fps_base = 1
//! frame_offset = 0
//!
//! [combine]
//! policy = "sum"
//! rest_value = 0.0
//! prune_count = 2
//!
//! [logging]
//! level = "info"
//!
//! [output]
//! format = "json"
//! ```

pub mod loader;
pub mod sections;

pub use loader::{discover_config_files, discover_config_files_with_override, ConfigSources};
pub use sections::{CombineConfig, LoggingConfig, OutputConfig, OutputFormat, RenderConfig};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChoreoConfig {
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub combine: CombineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl ChoreoConfig {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration, with `config_path` in place of `./choreo.toml`.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration from optional path and return information about sources.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = ChoreoConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            loader::load_from_file(&mut config, &path)?;
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        let mut output = String::new();

        output.push_str("# choreo configuration\n\n");

        output.push_str("[render]\n");
        output.push_str(&format!("fps = {}\n", self.render.fps));
        output.push_str(&format!("fps_base = {}\n", self.render.fps_base));
        output.push_str(&format!("frame_offset = {}\n", self.render.frame_offset));

        output.push_str("\n[combine]\n");
        output.push_str(&format!("policy = \"{}\"\n", self.combine.policy));
        output.push_str(&format!("rest_value = {:?}\n", self.combine.rest_value));
        output.push_str(&format!("prune_count = {}\n", self.combine.prune_count));

        output.push_str("\n[logging]\n");
        output.push_str(&format!("level = \"{}\"\n", self.logging.level));

        output.push_str("\n[output]\n");
        output.push_str(&format!("format = \"{}\"\n", self.output.format));

        output
    }
}
