//! Configuration management for the risk service

use crate::models::inference::DEFAULT_MODEL_FILENAME;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Scoring artifact configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Directory searched for the artifact when HEART_MODEL_PATH is unset
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
    /// First filename tried under `base_dir`
    #[serde(default = "default_model_filename")]
    pub default_filename: String,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
    /// Load the artifact at startup rather than on first prediction
    #[serde(default)]
    pub preload: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Metrics reporting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Seconds between logged summaries; 0 disables reporting
    #[serde(default = "default_report_interval")]
    pub report_interval_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_base_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_model_filename() -> String {
    DEFAULT_MODEL_FILENAME.to_string()
}

fn default_onnx_threads() -> usize {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_report_interval() -> u64 {
    60
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            default_filename: default_model_filename(),
            onnx_threads: default_onnx_threads(),
            preload: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            report_interval_secs: default_report_interval(),
        }
    }
}

impl ServerConfig {
    /// Socket address to bind
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .context(format!("Invalid listen address {}:{}", self.host, self.port))
    }
}

impl AppConfig {
    /// Load configuration from `config/config.toml` and the environment
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific file, then apply `CARDIO__*` overrides.
    ///
    /// The file is optional; missing keys fall back to defaults.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(
                Environment::with_prefix("CARDIO")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.model.default_filename, "final.onnx");
        assert_eq!(config.model.onnx_threads, 1);
        assert!(!config.model.preload);
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.metrics.report_interval_secs, 60);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 9100

[model]
base_dir = "/srv/models"
preload = true

[logging]
format = "json"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from_path(&path).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.model.base_dir, PathBuf::from("/srv/models"));
        assert!(config.model.preload);
        assert_eq!(config.model.default_filename, "final.onnx");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from_path(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.model.base_dir, PathBuf::from("."));
    }

    #[test]
    fn test_bind_addr() {
        let server = ServerConfig::default();
        assert_eq!(server.bind_addr().unwrap().to_string(), "127.0.0.1:8000");

        let bad = ServerConfig {
            host: "not a host".to_string(),
            port: 1,
        };
        assert!(bad.bind_addr().is_err());
    }
}
