//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section and every field is optional; anything left out takes the
//! value shown in `config/default.toml`.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::{EngineSettings, DEFAULT_STICK_DEAD_ZONE, DEFAULT_STROKE_END_THRESHOLD};
use crate::error::{Result, StenoStickError};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub mapping: MappingConfig,

    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Recognition tuning
#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    #[serde(default = "default_stick_dead_zone")]
    pub stick_dead_zone: f64,

    #[serde(default = "default_stroke_end_threshold")]
    pub stroke_end_threshold: f64,
}

/// Mapping source
#[derive(Debug, Deserialize, Clone, Default)]
pub struct MappingConfig {
    /// Empty selects the built-in mapping
    #[serde(default)]
    pub path: String,
}

/// Controller selection and input conditioning
#[derive(Debug, Deserialize, Clone)]
pub struct DeviceConfig {
    /// Empty opens every detected gamepad
    #[serde(default)]
    pub path: String,

    #[serde(default = "default_trigger_dead_zone")]
    pub trigger_dead_zone: f64,

    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

/// How strokes are reported
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One line of steno notation per stroke
    #[default]
    Text,
    /// One JSON object per stroke
    Jsonl,
}

/// Stroke output destination
#[derive(Debug, Deserialize, Clone, Default)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Empty writes to stdout
    #[serde(default)]
    pub path: String,
}

/// Log file configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    /// Empty disables the log file
    #[serde(default)]
    pub dir: String,
}

// Default value functions
fn default_stick_dead_zone() -> f64 { DEFAULT_STICK_DEAD_ZONE }
fn default_stroke_end_threshold() -> f64 { DEFAULT_STROKE_END_THRESHOLD }

fn default_trigger_dead_zone() -> f64 { 0.1 }
fn default_channel_capacity() -> usize { 256 }

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stick_dead_zone: default_stick_dead_zone(),
            stroke_end_threshold: default_stroke_end_threshold(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            trigger_dead_zone: default_trigger_dead_zone(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use steno_stick::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration text
    ///
    /// # Errors
    ///
    /// Returns error if TOML parsing or validation fails
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        check_fraction("stick_dead_zone", self.engine.stick_dead_zone)?;
        check_fraction("stroke_end_threshold", self.engine.stroke_end_threshold)?;
        check_fraction("trigger_dead_zone", self.device.trigger_dead_zone)?;

        if self.device.channel_capacity == 0 || self.device.channel_capacity > 65536 {
            return Err(StenoStickError::Config(toml::de::Error::custom(
                "channel_capacity must be between 1 and 65536",
            )));
        }

        Ok(())
    }

    /// Engine tuning derived from the `[engine]` section
    #[must_use]
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            stick_dead_zone: self.engine.stick_dead_zone,
            stroke_end_threshold: self.engine.stroke_end_threshold,
        }
    }

    /// Mapping file, or `None` for the built-in mapping
    #[must_use]
    pub fn mapping_path(&self) -> Option<PathBuf> {
        non_empty_path(&self.mapping.path)
    }

    /// Device node to open, or `None` to scan
    #[must_use]
    pub fn device_path(&self) -> Option<PathBuf> {
        non_empty_path(&self.device.path)
    }

    /// Output file, or `None` for stdout
    #[must_use]
    pub fn output_path(&self) -> Option<PathBuf> {
        non_empty_path(&self.output.path)
    }

    /// Log directory, or `None` when file logging is off
    #[must_use]
    pub fn log_dir(&self) -> Option<PathBuf> {
        non_empty_path(&self.logging.dir)
    }
}

fn check_fraction(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(StenoStickError::Config(toml::de::Error::custom(format!(
            "{} must be between 0.0 and 1.0",
            name
        ))));
    }
    Ok(())
}

fn non_empty_path(value: &str) -> Option<PathBuf> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_valid_config() -> Config {
        Config {
            engine: EngineConfig {
                stick_dead_zone: default_stick_dead_zone(),
                stroke_end_threshold: default_stroke_end_threshold(),
            },
            mapping: MappingConfig { path: String::new() },
            device: DeviceConfig {
                path: String::new(),
                trigger_dead_zone: default_trigger_dead_zone(),
                channel_capacity: default_channel_capacity(),
            },
            output: OutputConfig {
                format: OutputFormat::Text,
                path: String::new(),
            },
            logging: LoggingConfig { dir: String::new() },
        }
    }

    #[test]
    fn test_default_config() {
        let config = create_valid_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.engine_settings(), EngineSettings::default());
    }

    #[test]
    fn test_default_impl_matches_defaults() {
        let config = Config::default();
        assert_eq!(config.engine.stick_dead_zone, 0.6);
        assert_eq!(config.device.channel_capacity, 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_document() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.engine.stroke_end_threshold, 0.4);
        assert_eq!(config.output.format, OutputFormat::Text);
        assert!(config.mapping_path().is_none());
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[engine]
stick_dead_zone = 0.5

[mapping]
path = "/etc/steno-stick/mapping.txt"

[device]
path = "/dev/input/event20"

[output]
format = "jsonl"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.engine.stick_dead_zone, 0.5);
        assert_eq!(config.engine.stroke_end_threshold, 0.4);
        assert_eq!(
            config.mapping_path(),
            Some(PathBuf::from("/etc/steno-stick/mapping.txt"))
        );
        assert_eq!(config.device_path(), Some(PathBuf::from("/dev/input/event20")));
        assert_eq!(config.output.format, OutputFormat::Jsonl);
        assert!(config.output_path().is_none());
    }

    #[test]
    fn test_load_shipped_default_config() {
        let config = Config::load(concat!(env!("CARGO_MANIFEST_DIR"), "/config/default.toml")).unwrap();
        assert_eq!(config.engine_settings(), EngineSettings::default());
        assert!(config.device_path().is_none());
        assert!(config.log_dir().is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/steno-stick.toml");
        assert!(matches!(result, Err(StenoStickError::Io(_))));
    }

    #[test]
    fn test_invalid_output_format() {
        let result = Config::from_toml("[output]\nformat = \"xml\"\n");
        assert!(matches!(result, Err(StenoStickError::Config(_))));
    }

    #[test]
    fn test_stick_dead_zone_negative() {
        let mut config = create_valid_config();
        config.engine.stick_dead_zone = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_stick_dead_zone_too_high() {
        let mut config = create_valid_config();
        config.engine.stick_dead_zone = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_stroke_end_threshold_too_high() {
        let mut config = create_valid_config();
        config.engine.stroke_end_threshold = 1.01;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fraction_bounds_inclusive() {
        let mut config = create_valid_config();
        config.engine.stick_dead_zone = 0.0;
        config.engine.stroke_end_threshold = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_nan_rejected() {
        let mut config = create_valid_config();
        config.device.trigger_dead_zone = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_channel_capacity_zero() {
        let mut config = create_valid_config();
        config.device.channel_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_channel_capacity_too_high() {
        let mut config = create_valid_config();
        config.device.channel_capacity = 65537;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blank_paths_are_none() {
        let mut config = create_valid_config();
        config.output.path = "   ".to_string();
        config.logging.dir = "./logs".to_string();
        assert!(config.output_path().is_none());
        assert_eq!(config.log_dir(), Some(PathBuf::from("./logs")));
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_stick_dead_zone(), 0.6);
        assert_eq!(default_stroke_end_threshold(), 0.4);
        assert_eq!(default_trigger_dead_zone(), 0.1);
        assert_eq!(default_channel_capacity(), 256);
    }
}
