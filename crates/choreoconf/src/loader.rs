//! Config file discovery, loading, and environment variable overlay.

use crate::{ChoreoConfig, ConfigError};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local). Only returns files
/// that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided and exists, it replaces the local override.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/choreo/config.toml");
    if system.exists() {
        files.push(system);
    }

    // XDG_CONFIG_HOME or ~/.config
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("choreo/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("choreo.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Overlay one TOML file onto `config`.
pub fn load_from_file(config: &mut ChoreoConfig, path: &Path) -> Result<(), ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    apply_toml(config, &contents, path)
}

/// Overlay the keys present in `contents`; absent keys keep their value.
pub fn apply_toml(config: &mut ChoreoConfig, contents: &str, path: &Path) -> Result<(), ConfigError> {
    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let bad = |key: &str, expected: &str| ConfigError::Parse {
        path: path.to_path_buf(),
        message: format!("{key} must be {expected}"),
    };

    if let Some(render) = table.get("render").and_then(|v| v.as_table()) {
        if let Some(v) = render.get("fps") {
            config.render.fps = v
                .as_integer()
                .and_then(|n| u32::try_from(n).ok())
                .filter(|n| *n > 0)
                .ok_or_else(|| bad("render.fps", "a positive integer"))?;
        }
        if let Some(v) = render.get("fps_base") {
            config.render.fps_base = v
                .as_integer()
                .and_then(|n| u32::try_from(n).ok())
                .filter(|n| *n > 0)
                .ok_or_else(|| bad("render.fps_base", "a positive integer"))?;
        }
        if let Some(v) = render.get("frame_offset") {
            config.render.frame_offset = v
                .as_integer()
                .ok_or_else(|| bad("render.frame_offset", "an integer"))?;
        }
    }

    if let Some(combine) = table.get("combine").and_then(|v| v.as_table()) {
        if let Some(v) = combine.get("policy") {
            config.combine.policy = v
                .as_str()
                .ok_or_else(|| bad("combine.policy", "a string"))?
                .to_string();
        }
        if let Some(v) = combine.get("rest_value") {
            // integers are accepted for convenience
            config.combine.rest_value = v
                .as_float()
                .or_else(|| v.as_integer().map(|n| n as f64))
                .ok_or_else(|| bad("combine.rest_value", "a number"))?;
        }
        if let Some(v) = combine.get("prune_count") {
            config.combine.prune_count = v
                .as_integer()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| bad("combine.prune_count", "a non-negative integer"))?;
        }
    }

    if let Some(logging) = table.get("logging").and_then(|v| v.as_table()) {
        if let Some(v) = logging.get("level") {
            config.logging.level = v
                .as_str()
                .ok_or_else(|| bad("logging.level", "a string"))?
                .to_string();
        }
    }

    if let Some(output) = table.get("output").and_then(|v| v.as_table()) {
        if let Some(v) = output.get("format") {
            config.output.format = v
                .as_str()
                .ok_or_else(|| bad("output.format", "a string"))?
                .parse()
                .map_err(|message| ConfigError::Parse {
                    path: path.to_path_buf(),
                    message,
                })?;
        }
    }

    Ok(())
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut ChoreoConfig, sources: &mut ConfigSources) {
    apply_overrides_from(config, sources, |key| env::var(key).ok());
}

/// Apply overrides from any variable lookup. Unparseable values are ignored.
pub fn apply_overrides_from<F>(config: &mut ChoreoConfig, sources: &mut ConfigSources, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("CHOREO_FPS") {
        if let Ok(fps) = v.trim().parse::<u32>() {
            if fps > 0 {
                config.render.fps = fps;
                sources.env_overrides.push("CHOREO_FPS".to_string());
            }
        }
    }
    if let Some(v) = lookup("CHOREO_FPS_BASE") {
        if let Ok(base) = v.trim().parse::<u32>() {
            if base > 0 {
                config.render.fps_base = base;
                sources.env_overrides.push("CHOREO_FPS_BASE".to_string());
            }
        }
    }
    if let Some(v) = lookup("CHOREO_FRAME_OFFSET") {
        if let Ok(offset) = v.trim().parse() {
            config.render.frame_offset = offset;
            sources.env_overrides.push("CHOREO_FRAME_OFFSET".to_string());
        }
    }
    if let Some(v) = lookup("CHOREO_COMBINE_POLICY") {
        config.combine.policy = v;
        sources.env_overrides.push("CHOREO_COMBINE_POLICY".to_string());
    }
    if let Some(v) = lookup("CHOREO_OUTPUT_FORMAT") {
        if let Ok(format) = v.parse() {
            config.output.format = format;
            sources.env_overrides.push("CHOREO_OUTPUT_FORMAT".to_string());
        }
    }

    if let Some(v) = lookup("CHOREO_LOG_LEVEL") {
        config.logging.level = v;
        sources.env_overrides.push("CHOREO_LOG_LEVEL".to_string());
    }
    // RUST_LOG wins over CHOREO_LOG_LEVEL
    if let Some(v) = lookup("RUST_LOG") {
        config.logging.level = v;
        sources.env_overrides.push("RUST_LOG".to_string());
    }
}
