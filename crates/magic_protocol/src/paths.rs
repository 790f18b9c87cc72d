use std::path::PathBuf;

/// Resolve the MagIC home directory.
///
/// Priority:
/// 1) MAGIC_HOME
/// 2) HOME/USERPROFILE
/// 3) ./.magic
pub fn magic_home() -> PathBuf {
    if let Ok(override_path) = std::env::var("MAGIC_HOME") {
        return PathBuf::from(override_path);
    }
    if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
        return PathBuf::from(home).join(".magic");
    }
    PathBuf::from(".").join(".magic")
}

/// Default config file: ~/.magic/config.toml
pub fn default_config_path() -> PathBuf {
    magic_home().join("config.toml")
}

/// Default data model directory: ~/.magic/data_models
pub fn default_data_models_dir() -> PathBuf {
    magic_home().join("data_models")
}

/// Default logs directory: ~/.magic/logs
pub fn default_logs_dir() -> PathBuf {
    magic_home().join("logs")
}
