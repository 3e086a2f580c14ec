use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const SETTINGS_FILE: &str = "settings.json";

/// Errors raised while reading or writing the settings file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Runtime settings. Backed by a settings.json file in the current directory.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Configs {
    pub verbose_mode: bool,
    pub working_directory: String,
    /// Executable of the external geoprocessing engine.
    pub engine_path: String,
    /// Deadline handed to the executor for a single tool run. `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
    /// Default environment overrides, keyed by environment name (e.g. `workspace`).
    pub environments: BTreeMap<String, String>,
}

impl Default for Configs {
    fn default() -> Configs {
        Configs {
            verbose_mode: false,
            working_directory: String::new(),
            engine_path: String::new(),
            timeout_secs: None,
            environments: BTreeMap::new(),
        }
    }
}

impl Configs {
    pub fn new() -> Configs {
        Configs::default()
    }
}

/// Path of the settings file in the current directory.
pub fn settings_path() -> Result<PathBuf, ConfigError> {
    let dir = std::env::current_dir().map_err(|source| ConfigError::Io {
        path: PathBuf::from("."),
        source,
    })?;
    Ok(dir.join(SETTINGS_FILE))
}

pub fn get_configs() -> Result<Configs, ConfigError> {
    get_configs_from(&settings_path()?)
}

/// Reads settings from `path`. A missing file yields the defaults.
pub fn get_configs_from(path: &Path) -> Result<Configs, ConfigError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("no settings file at {}, using defaults", path.display());
            return Ok(Configs::new());
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn save_configs(configs: &Configs) -> Result<(), ConfigError> {
    save_configs_to(configs, &settings_path()?)
}

pub fn save_configs_to(configs: &Configs, path: &Path) -> Result<(), ConfigError> {
    let configs_json = serde_json::to_string_pretty(configs).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, configs_json).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("settings written to {}", path.display());
    Ok(())
}
