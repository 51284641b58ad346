//! Configuration loading and layered resolution
//!
//! Every setting resolves in the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file is not an error: the service logs a warning and
//! starts with compiled defaults. An explicitly requested file must exist.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming the model directory
pub const ENV_MODEL_DIR: &str = "EXOML_MODEL_DIR";
/// Environment variables for the bind host
pub const ENV_HOST: &[&str] = &["EXOML_HOST"];
/// Environment variables for the listen port, `PORT` kept for hosting platforms
pub const ENV_PORT: &[&str] = &["EXOML_PORT", "PORT"];
/// Environment variable toggling eager artifact loading
pub const ENV_PRELOAD: &str = "EXOML_PRELOAD";

/// How tabular input is turned into the classifier's input tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreprocessingPolicy {
    /// Every numeric cell, row-major, is one time series padded/truncated to T
    #[default]
    Flattened,
    /// Columns are matched by name against the metadata feature list
    Aligned,
}

/// Replacement for missing cells in numeric columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingValueFill {
    #[default]
    Zero,
    /// Mean of the column's finite values (0 when there are none)
    ColumnMean,
}

/// Logging section of the TOML file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Artifact file names, relative to the model directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactFiles {
    pub model: String,
    pub scaler: String,
    pub metadata: String,
}

impl Default for ArtifactFiles {
    fn default() -> Self {
        Self {
            model: "exoplanet_bilstm.onnx".to_string(),
            scaler: "scaler.json".to_string(),
            metadata: "metadata.json".to_string(),
        }
    }
}

impl ArtifactFiles {
    fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("artifacts.model", &self.model),
            ("artifacts.scaler", &self.scaler),
            ("artifacts.metadata", &self.metadata),
        ] {
            if value.trim().is_empty() {
                return Err(Error::InvalidInput(format!("{} must not be empty", key)));
            }
        }
        Ok(())
    }
}

/// Preprocessing section of the TOML file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessingConfig {
    pub policy: PreprocessingPolicy,
    pub missing_values: MissingValueFill,
}

/// Stage deadlines in milliseconds; 0 disables the bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub artifact_load_ms: u64,
    pub inference_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            artifact_load_ms: 60_000,
            inference_ms: 10_000,
        }
    }
}

impl TimeoutConfig {
    pub fn artifact_load(&self) -> Option<Duration> {
        non_zero_millis(self.artifact_load_ms)
    }

    pub fn inference(&self) -> Option<Duration> {
        non_zero_millis(self.inference_ms)
    }
}

fn non_zero_millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

/// On-disk configuration file schema
///
/// Top-level scalars are optional so that the CLI/ENV layers can tell
/// "not set in the file" apart from a value equal to the default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub model_dir: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub preload: Option<bool>,
    pub logging: LoggingConfig,
    pub artifacts: ArtifactFiles,
    pub preprocessing: PreprocessingConfig,
    pub timeouts: TimeoutConfig,
}

impl TomlConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Compiled fallbacks used when no other layer provides a value
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub model_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub preload: bool,
}

impl Default for CompiledDefaults {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("model_files"),
            host: "0.0.0.0".to_string(),
            port: 5001,
            preload: true,
        }
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub model_dir: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub preload: Option<bool>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub model_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub preload: bool,
    pub logging: LoggingConfig,
    pub artifacts: ArtifactFiles,
    pub preprocessing: PreprocessingConfig,
    pub timeouts: TimeoutConfig,
}

impl ServiceConfig {
    /// Merge CLI, environment, TOML and compiled defaults
    pub fn resolve(cli: CliOverrides, file: TomlConfig) -> Result<Self> {
        let defaults = CompiledDefaults::default();

        let model_dir = layered(
            cli.model_dir,
            &[ENV_MODEL_DIR],
            file.model_dir,
            defaults.model_dir,
        )?;
        let host = layered(cli.host, ENV_HOST, file.host, defaults.host)?;
        let port = layered(cli.port, ENV_PORT, file.port, defaults.port)?;
        let preload = layered(cli.preload, &[ENV_PRELOAD], file.preload, defaults.preload)?;

        file.artifacts.validate()?;

        Ok(Self {
            model_dir,
            host,
            port,
            preload,
            logging: file.logging,
            artifacts: file.artifacts,
            preprocessing: file.preprocessing,
            timeouts: file.timeouts,
        })
    }

    /// Socket address string for the HTTP listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Resolve one setting: CLI → first set ENV var → TOML → default
///
/// An environment variable that is set but does not parse is a
/// configuration error rather than a silent fallthrough.
pub fn layered<T>(
    cli: Option<T>,
    env_vars: &[&str],
    file: Option<T>,
    default: T,
) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(value) = cli {
        return Ok(value);
    }

    for name in env_vars {
        if let Ok(raw) = std::env::var(name) {
            return raw
                .trim()
                .parse::<T>()
                .map_err(|e| Error::Config(format!("{}={:?}: {}", name, raw, e)));
        }
    }

    Ok(file.unwrap_or(default))
}

/// Load the TOML configuration file
///
/// With an explicit path the file must exist and parse. Without one, the
/// platform locations are tried and a missing file yields defaults.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        info!("Loaded configuration from {}", path.display());
        return TomlConfig::from_toml_str(&content);
    }

    match default_config_path() {
        Some(path) => {
            let content = std::fs::read_to_string(&path)?;
            info!("Loaded configuration from {}", path.display());
            TomlConfig::from_toml_str(&content)
        }
        None => {
            warn!("No config file found, using compiled defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// First existing config file among the platform locations
fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("exoml").join("config.toml"));
    let system_config = if cfg!(unix) {
        Some(PathBuf::from("/etc/exoml/config.toml"))
    } else {
        None
    };

    [user_config, system_config]
        .into_iter()
        .flatten()
        .find(|path| path.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_zero_disables_bound() {
        let timeouts = TimeoutConfig {
            artifact_load_ms: 0,
            inference_ms: 250,
        };
        assert_eq!(timeouts.artifact_load(), None);
        assert_eq!(timeouts.inference(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_layered_cli_wins_over_file() {
        let value = layered(Some(9000u16), &[], Some(7000), 5001).unwrap();
        assert_eq!(value, 9000);
    }

    #[test]
    fn test_layered_file_then_default() {
        assert_eq!(layered(None, &[], Some(7000u16), 5001).unwrap(), 7000);
        assert_eq!(layered::<u16>(None, &[], None, 5001).unwrap(), 5001);
    }

    #[test]
    fn test_empty_artifact_name_rejected() {
        let files = ArtifactFiles {
            model: " ".to_string(),
            ..ArtifactFiles::default()
        };
        assert!(matches!(files.validate(), Err(Error::InvalidInput(_))));
    }
}
