//! Configuration loading and typed config structures for the demo.
//!
//! The canonical configuration lives in `image2gps-config.yaml` at the
//! project root. This module defines strongly-typed structs that mirror the
//! YAML structure, and provides a loader that reads and validates the file.
//! Every field has a default, so an empty file is a valid configuration.

use std::path::Path;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The values parsed but are inconsistent.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level demo configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DemoConfig {
    /// Pipeline timing windows and rates.
    #[serde(default)]
    pub timing: TimingConfig,

    /// Random source settings.
    #[serde(default)]
    pub randomness: RandomnessConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Scripted selections played by the demo binary.
    #[serde(default)]
    pub demo: ScriptConfig,

    /// Map widget defaults.
    #[serde(default)]
    pub map: MapConfig,
}

impl DemoConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `IMAGE2GPS_SEED` overrides `randomness.seed` when set to an integer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if the timing values are inconsistent.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if the timing values are inconsistent.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to a mapping.
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.randomness.apply_env_overrides();
        config.timing.validate()?;
        Ok(config)
    }
}

/// Timing windows and rates for the three-stage reveal.
///
/// All durations are milliseconds of (virtual) time.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimingConfig {
    /// Shortest simulated inference delay.
    #[serde(default = "default_loading_min_ms")]
    pub loading_min_ms: u64,

    /// Longest simulated inference delay.
    #[serde(default = "default_loading_max_ms")]
    pub loading_max_ms: u64,

    /// Interval between progress bar ticks.
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,

    /// Smallest progress increment per tick.
    #[serde(default = "default_progress_step_min")]
    pub progress_step_min: u8,

    /// Largest progress increment per tick.
    #[serde(default = "default_progress_step_max")]
    pub progress_step_max: u8,

    /// Highest value progress may reach before loading completes.
    #[serde(default = "default_progress_ceiling")]
    pub progress_ceiling: u8,

    /// Interval between stream emitter ticks.
    #[serde(default = "default_stream_interval_ms")]
    pub stream_interval_ms: u64,

    /// Characters revealed per stream tick.
    #[serde(default = "default_stream_chars_per_tick")]
    pub stream_chars_per_tick: usize,
}

impl TimingConfig {
    /// Check that windows are ordered and rates are non-zero.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::Invalid {
            reason: reason.to_owned(),
        };
        if self.loading_min_ms > self.loading_max_ms {
            return Err(invalid("loading_min_ms must not exceed loading_max_ms"));
        }
        if self.progress_interval_ms == 0 {
            return Err(invalid("progress_interval_ms must be at least 1"));
        }
        if self.progress_step_min > self.progress_step_max {
            return Err(invalid("progress_step_min must not exceed progress_step_max"));
        }
        if self.progress_ceiling >= 100 {
            return Err(invalid("progress_ceiling must be below 100"));
        }
        if self.stream_interval_ms == 0 {
            return Err(invalid("stream_interval_ms must be at least 1"));
        }
        if self.stream_chars_per_tick == 0 {
            return Err(invalid("stream_chars_per_tick must be at least 1"));
        }
        Ok(())
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            loading_min_ms: default_loading_min_ms(),
            loading_max_ms: default_loading_max_ms(),
            progress_interval_ms: default_progress_interval_ms(),
            progress_step_min: default_progress_step_min(),
            progress_step_max: default_progress_step_max(),
            progress_ceiling: default_progress_ceiling(),
            stream_interval_ms: default_stream_interval_ms(),
            stream_chars_per_tick: default_stream_chars_per_tick(),
        }
    }
}

/// Random source settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RandomnessConfig {
    /// Fixed seed for reproducible timing. `None` seeds from the OS.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl RandomnessConfig {
    /// Override the seed from `IMAGE2GPS_SEED` when it holds an integer.
    pub fn apply_env_overrides(&mut self) {
        self.apply_seed_override(std::env::var("IMAGE2GPS_SEED").ok().as_deref());
    }

    /// Replace the seed with `raw` when it parses as an integer.
    pub fn apply_seed_override(&mut self, raw: Option<&str>) {
        if let Some(seed) = raw.and_then(|val| val.trim().parse::<u64>().ok()) {
            self.seed = Some(seed);
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Scripted selections for the demo binary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ScriptConfig {
    /// Sample ids to select in order. Empty means "the default sample".
    #[serde(default)]
    pub selections: Vec<String>,

    /// Make the next selection after this many milliseconds even if the
    /// current pipeline has not settled. `None` waits for idle.
    #[serde(default)]
    pub reselect_after_ms: Option<u64>,
}

/// Map widget defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MapConfig {
    /// Zoom used when a record does not specify one.
    #[serde(default = "default_zoom")]
    pub default_zoom: u8,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            default_zoom: default_zoom(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_loading_min_ms() -> u64 {
    2600
}

const fn default_loading_max_ms() -> u64 {
    4400
}

const fn default_progress_interval_ms() -> u64 {
    260
}

const fn default_progress_step_min() -> u8 {
    5
}

const fn default_progress_step_max() -> u8 {
    13
}

const fn default_progress_ceiling() -> u8 {
    95
}

const fn default_stream_interval_ms() -> u64 {
    18
}

const fn default_stream_chars_per_tick() -> usize {
    2
}

fn default_log_level() -> String {
    String::from("info")
}

const fn default_zoom() -> u8 {
    13
}
