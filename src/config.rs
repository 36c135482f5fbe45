//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use crate::record::ProductKind;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub codec: CodecConfig,

    #[serde(default)]
    pub correction: CorrectionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Heidelberg codec configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CodecConfig {
    /// File extension of Heidelberg files (without the dot)
    #[serde(default = "default_extension")]
    pub extension: String,

    #[serde(default = "default_corrected_suffix")]
    pub corrected_suffix: String,

    #[serde(default = "default_fitted_suffix")]
    pub fitted_suffix: String,
}

fn default_extension() -> String {
    "fh".to_string()
}

fn default_corrected_suffix() -> String {
    ProductKind::Corrected.default_suffix().to_string()
}

fn default_fitted_suffix() -> String {
    ProductKind::Fitted.default_suffix().to_string()
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            corrected_suffix: default_corrected_suffix(),
            fitted_suffix: default_fitted_suffix(),
        }
    }
}

/// Default altitude correction parameters
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CorrectionConfig {
    #[serde(default = "default_factor")]
    pub factor: f64,

    #[serde(default)]
    pub offset: f64,
}

fn default_factor() -> f64 {
    1.0
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            factor: default_factor(),
            offset: 0.0,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::Parse { error, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                error,
            },
            other => other,
        })
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            error: e.to_string(),
        })
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Standard config locations, most specific first
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("ringwidth").join("config.toml"));
        }
        paths.push(PathBuf::from("/etc/ringwidth/config.toml"));
        paths.push(PathBuf::from("./config.toml"));
        paths
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        Self::load_first(&Self::default_paths())
    }

    /// Load the first existing file in `paths` that parses
    ///
    /// Files that exist but fail to load are skipped with a warning. Falls
    /// back to defaults plus environment overrides.
    pub fn load_first(paths: &[PathBuf]) -> Self {
        for path in paths.iter().filter(|p| p.exists()) {
            match Self::load_with_env(path) {
                Ok(config) => {
                    tracing::info!("Loaded config from {:?}", path);
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load config from {:?}: {}", path, e);
                }
            }
        }

        tracing::debug!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(factor) = std::env::var("RINGWIDTH_CORRECTION_FACTOR") {
            match factor.parse() {
                Ok(f) => self.correction.factor = f,
                Err(_) => tracing::warn!("Ignoring invalid RINGWIDTH_CORRECTION_FACTOR: {}", factor),
            }
        }
        if let Ok(offset) = std::env::var("RINGWIDTH_CORRECTION_OFFSET") {
            match offset.parse() {
                Ok(o) => self.correction.offset = o,
                Err(_) => tracing::warn!("Ignoring invalid RINGWIDTH_CORRECTION_OFFSET: {}", offset),
            }
        }

        if let Ok(level) = std::env::var("RINGWIDTH_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("RINGWIDTH_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# ringwidth configuration
#
# Environment variables override these settings:
# - RINGWIDTH_CORRECTION_FACTOR
# - RINGWIDTH_CORRECTION_OFFSET
# - RINGWIDTH_LOG_LEVEL
# - RINGWIDTH_LOG_FORMAT

[codec]
# Extension of Heidelberg files
extension = "fh"

# Suffixes appended to the input name when no output path is given
corrected_suffix = "_corrected"
fitted_suffix = "_fitted"

[correction]
# Default altitude correction: value * factor + offset
factor = 1.0
offset = 0.0

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty or json
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tempfile::{tempdir, NamedTempFile};

    /// Log sink shared with a scoped subscriber
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[test]
    fn test_default_config_parses() {
        let config = Config::from_toml_str(&generate_default_config()).unwrap();
        assert_eq!(config.codec, CodecConfig::default());
        assert_eq!(config.correction, CorrectionConfig::default());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = Config::from_toml_str("[correction]\nfactor = 0.95\n").unwrap();
        assert_eq!(config.correction.factor, 0.95);
        assert_eq!(config.correction.offset, 0.0);
        assert_eq!(config.codec.extension, "fh");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[codec]\nfitted_suffix = \"_std\"").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.codec.fitted_suffix, "_std");
        assert_eq!(config.codec.corrected_suffix, "_corrected");
    }

    #[test]
    fn test_load_reports_path_on_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[codec\nextension = ").unwrap();

        match Config::load(file.path()) {
            Err(ConfigError::Parse { path, .. }) => assert_eq!(path, file.path()),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/ringwidth.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_first_skips_broken_file() {
        let dir = tempdir().unwrap();
        let broken = dir.path().join("broken.toml");
        let good = dir.path().join("good.toml");
        std::fs::write(&broken, "[codec\nextension = ").unwrap();
        std::fs::write(&good, "[codec]\ncorrected_suffix = \"_alt\"\n").unwrap();

        let paths = vec![dir.path().join("missing.toml"), broken, good];
        let config = Config::load_first(&paths);
        assert_eq!(config.codec.corrected_suffix, "_alt");
    }

    #[test]
    fn test_load_first_warns_on_broken_file() {
        let dir = tempdir().unwrap();
        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "[correction]\nfactor = \"steep\"\n").unwrap();

        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let config = tracing::subscriber::with_default(subscriber, || {
            Config::load_first(&[broken.clone()])
        });

        assert_eq!(config.codec, CodecConfig::default());
        let output = logs.contents();
        assert!(output.contains("WARN"), "missing warning in {output:?}");
        assert!(output.contains("broken.toml"));
    }
}
