pub mod error;
pub mod settings;

pub use error::*;
pub use settings::*;

use std::path::{Path, PathBuf};

/// Environment variable pointing directly at a settings file
pub const ENV_CONFIG_PATH: &str = "PROVFLOW_CONFIG_PATH";

/// Settings together with the file they were read from
#[derive(Debug, Clone)]
pub struct LoadedSettings {
    pub settings: WaitSettings,
    /// `None` when no file was found and defaults were used
    pub source: Option<PathBuf>,
}

/// Get the provflow config directory (`~/.config/provflow`)
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("provflow");

    Ok(config_dir)
}

/// Locate the settings file
///
/// Search order:
/// 1. `PROVFLOW_CONFIG_PATH` (direct path)
/// 2. current directory: `provflow.local.yaml`, `provflow.yaml`, `.provflow.yaml`
/// 3. `~/.config/provflow/config.yaml` (global)
pub fn find_config_file() -> Option<PathBuf> {
    if let Ok(config_path) = std::env::var(ENV_CONFIG_PATH) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Some(path);
        }
        tracing::warn!(
            "{} points to {} which does not exist, ignoring",
            ENV_CONFIG_PATH,
            path.display()
        );
    }

    if let Ok(current_dir) = std::env::current_dir() {
        let candidates = ["provflow.local.yaml", "provflow.yaml", ".provflow.yaml"];
        for filename in &candidates {
            let path = current_dir.join(filename);
            if path.exists() {
                return Some(path);
            }
        }
    }

    let global = get_config_dir().ok()?.join("config.yaml");
    global.exists().then_some(global)
}

/// Read settings from a specific file (no environment overrides)
pub fn load_from(path: &Path) -> Result<WaitSettings> {
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(WaitSettings::default());
    }
    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the effective settings: file (if any), then environment, then validate
pub fn load() -> Result<LoadedSettings> {
    let source = find_config_file();
    let mut settings = match &source {
        Some(path) => {
            tracing::debug!("Loading wait settings from {}", path.display());
            load_from(path)?
        }
        None => {
            tracing::debug!("No settings file found, using defaults");
            WaitSettings::default()
        }
    };

    settings.apply_env()?;
    settings.validate()?;

    Ok(LoadedSettings { settings, source })
}
