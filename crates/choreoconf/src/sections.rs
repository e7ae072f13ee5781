//! Configuration sections.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Frame timing for rendered keyframes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Frame rate numerator.
    /// Default: 24
    #[serde(default = "RenderConfig::default_fps")]
    pub fps: u32,

    /// Frame rate denominator.
    /// Default: 1
    #[serde(default = "RenderConfig::default_fps_base")]
    pub fps_base: u32,

    /// Added to every emitted frame, for animations that start before frame 0.
    /// Default: 0
    #[serde(default)]
    pub frame_offset: i64,
}

impl RenderConfig {
    fn default_fps() -> u32 {
        24
    }

    fn default_fps_base() -> u32 {
        1
    }

    pub fn frames_per_second(&self) -> f64 {
        self.fps as f64 / self.fps_base.max(1) as f64
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fps: Self::default_fps(),
            fps_base: Self::default_fps_base(),
            frame_offset: 0,
        }
    }
}

/// How overlapping keyframe sequences merge in keyframed groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombineConfig {
    /// sum, min, max, replace-previous, replace-next, crossfade or prune.
    /// Default: sum
    #[serde(default = "CombineConfig::default_policy")]
    pub policy: String,

    /// Resting value the crossfade policy blends around.
    /// Default: 0.0
    #[serde(default)]
    pub rest_value: f64,

    /// Trailing keys the prune policy may drop.
    /// Default: 2
    #[serde(default = "CombineConfig::default_prune_count")]
    pub prune_count: usize,
}

impl CombineConfig {
    fn default_policy() -> String {
        "sum".to_string()
    }

    fn default_prune_count() -> usize {
        2
    }
}

impl Default for CombineConfig {
    fn default() -> Self {
        Self {
            policy: Self::default_policy(),
            rest_value: 0.0,
            prune_count: Self::default_prune_count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive (trace, debug, info, warn, error, or a full
    /// `RUST_LOG` style filter).
    /// Default: info
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// Keyframe stream encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(format!("unknown output format '{other}' (expected json or csv)")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default: json
    #[serde(default)]
    pub format: OutputFormat,
}
