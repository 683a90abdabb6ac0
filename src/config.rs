//! Configuration management for the profitability predictor

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default configuration file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Environment variable overriding the configuration file path
pub const CONFIG_PATH_ENV: &str = "MENU_PROFIT_CONFIG";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub artifacts: ArtifactsConfig,
    pub logging: LoggingConfig,
}

/// Locations of the trained artifacts
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactsConfig {
    /// Directory containing the artifact files
    pub dir: String,
    /// Menu item frequency table (JSON object)
    pub frequency_table: String,
    /// Column transformer definition (JSON)
    pub preprocessor: String,
    /// Label encoder classes (JSON)
    pub label_encoder: String,
    /// Classifier: `.onnx` for ONNX Runtime, otherwise a JSON linear model
    pub classifier: String,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_onnx_threads() -> usize {
    1
}

impl ArtifactsConfig {
    pub fn frequency_table_path(&self) -> PathBuf {
        Path::new(&self.dir).join(&self.frequency_table)
    }

    pub fn preprocessor_path(&self) -> PathBuf {
        Path::new(&self.dir).join(&self.preprocessor)
    }

    pub fn label_encoder_path(&self) -> PathBuf {
        Path::new(&self.dir).join(&self.label_encoder)
    }

    pub fn classifier_path(&self) -> PathBuf {
        Path::new(&self.dir).join(&self.classifier)
    }
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            dir: "artifacts".to_string(),
            frequency_table: "menu_item_freq.json".to_string(),
            preprocessor: "preprocessor.json".to_string(),
            label_encoder: "label_encoder.json".to_string(),
            classifier: "classifier.json".to_string(),
            onnx_threads: 1,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `MENU_PROFIT_CONFIG` or the default path.
    ///
    /// A missing file is not an error; built-in defaults apply.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from_path(path)
    }

    /// Load configuration from a specific path, layered over defaults and
    /// under `MENU_PROFIT__*` environment overrides.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let defaults = Self::default();

        let config = Config::builder()
            .set_default("artifacts.dir", defaults.artifacts.dir)?
            .set_default("artifacts.frequency_table", defaults.artifacts.frequency_table)?
            .set_default("artifacts.preprocessor", defaults.artifacts.preprocessor)?
            .set_default("artifacts.label_encoder", defaults.artifacts.label_encoder)?
            .set_default("artifacts.classifier", defaults.artifacts.classifier)?
            .set_default("artifacts.onnx_threads", defaults.artifacts.onnx_threads as u64)?
            .set_default("logging.level", defaults.logging.level)?
            .set_default("logging.format", defaults.logging.format)?
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(
                Environment::with_prefix("MENU_PROFIT")
                    .prefix_separator("__")
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

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            artifacts: ArtifactsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Mutex, MutexGuard, PoisonError};

    /// Serializes tests that read `MENU_PROFIT__*` from the process environment.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_lock() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.artifacts.dir, "artifacts");
        assert_eq!(config.artifacts.onnx_threads, 1);
        assert_eq!(config.logging.level, "info");
        assert_eq!(
            config.artifacts.frequency_table_path(),
            Path::new("artifacts").join("menu_item_freq.json")
        );
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let _env = env_lock();
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from_path(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.artifacts.classifier, "classifier.json");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let _env = env_lock();
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[artifacts]").unwrap();
        writeln!(file, "dir = \"/srv/models\"").unwrap();
        writeln!(file, "classifier = \"xgb_model.onnx\"").unwrap();
        writeln!(file, "onnx_threads = 4").unwrap();

        let config = AppConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.artifacts.dir, "/srv/models");
        assert_eq!(config.artifacts.onnx_threads, 4);
        assert_eq!(config.artifacts.preprocessor, "preprocessor.json");
        assert_eq!(
            config.artifacts.classifier_path(),
            Path::new("/srv/models").join("xgb_model.onnx")
        );
    }

    #[test]
    fn test_env_overrides_file_and_defaults() {
        let _env = env_lock();
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[artifacts]").unwrap();
        writeln!(file, "dir = \"/srv/models\"").unwrap();

        std::env::set_var("MENU_PROFIT__ARTIFACTS__DIR", "/env/models");
        std::env::set_var("MENU_PROFIT__ARTIFACTS__ONNX_THREADS", "3");
        let loaded = AppConfig::load_from_path(file.path());
        std::env::remove_var("MENU_PROFIT__ARTIFACTS__DIR");
        std::env::remove_var("MENU_PROFIT__ARTIFACTS__ONNX_THREADS");

        let config = loaded.unwrap();
        assert_eq!(config.artifacts.dir, "/env/models");
        assert_eq!(config.artifacts.onnx_threads, 3);
        assert_eq!(
            config.artifacts.label_encoder_path(),
            Path::new("/env/models").join("label_encoder.json")
        );
    }
}
