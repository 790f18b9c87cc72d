//! Configuration for the magic binary
//!
//! Paths live under ~/.magic/ (or `$MAGIC_HOME`). An optional `config.toml`
//! there sets defaults that command-line flags override.

use anyhow::Context;
use magic_protocol::paths::{
    default_config_path, default_data_models_dir, default_logs_dir, magic_home,
};
use magic_schema::SchemaRegistry;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use super::error::HelpfulError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Contents of `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MagicConfig {
    /// Directory of `<version>.json` data model definitions
    #[serde(default = "default_data_models_dir")]
    pub data_models_dir: PathBuf,

    /// Release `upgrade` targets when `--to` is not given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_version: Option<String>,
}

impl Default for MagicConfig {
    fn default() -> Self {
        Self {
            data_models_dir: default_data_models_dir(),
            max_version: None,
        }
    }
}

impl MagicConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path`, or the defaults when it does not exist
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Load `~/.magic/config.toml`
pub fn load_config() -> anyhow::Result<MagicConfig> {
    let path = default_config_path();
    MagicConfig::load_or_default(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

/// Load the data model registry from `models`, falling back to the
/// configured directory.
pub fn load_registry(models: Option<&Path>, config: &MagicConfig) -> anyhow::Result<SchemaRegistry> {
    let dir = models.unwrap_or(config.data_models_dir.as_path());
    SchemaRegistry::load_dir(dir)
        .map_err(|err| anyhow::Error::new(HelpfulError::data_models_not_found(dir, &err.to_string())))
}

/// Arguments for the config command
#[derive(Debug, clap::Args)]
pub struct ConfigArgs {
    /// Show resolved paths in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Run the config command - shows current paths
pub fn run(args: ConfigArgs) -> anyhow::Result<()> {
    let home = magic_home();
    let config_path = default_config_path();
    let config = load_config()?;
    let logs = default_logs_dir();
    let models = &config.data_models_dir;

    if args.json {
        let value = serde_json::json!({
            "home": home.to_string_lossy(),
            "config": {
                "path": config_path.to_string_lossy(),
                "exists": config_path.exists(),
            },
            "data_models": {
                "path": models.to_string_lossy(),
                "exists": models.exists(),
            },
            "max_version": config.max_version,
            "logs": {
                "path": logs.to_string_lossy(),
                "exists": logs.exists(),
            },
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("MAGIC CONFIGURATION");
        println!("===================");
        println!();
        println!("Home:         {}", home.display());
        println!(
            "Config:       {} ({})",
            config_path.display(),
            if config_path.exists() { "exists" } else { "not found" }
        );
        println!();
        println!(
            "Data models:  {} ({})",
            models.display(),
            if models.exists() { "exists" } else { "not found" }
        );
        println!(
            "Max version:  {}",
            config.max_version.as_deref().unwrap_or("latest")
        );
        println!();
        println!("Logs:         {}", logs.display());
    }

    Ok(())
}
