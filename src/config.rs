use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const CONFIG_ENV: &str = "FAULT3D_CONFIG";
pub const CONFIG_FILE: &str = "fault3d.toml";

/// Viewer settings. Every field has a default, so a config file only needs the
/// keys it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    /// Default `tracing` directive; `RUST_LOG` wins when set.
    pub log_filter: String,
    /// Labels offered in the mechanism picker.
    pub mechanisms: Vec<String>,
    pub initial: InitialForm,
}

/// Form contents shown on startup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialForm {
    pub upper_edge: String,
    pub lower_edge: String,
    pub dip: String,
    pub strike: String,
    pub mechanism: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "Fault Plane Viewer".to_string(),
            width: 1600,
            height: 900,
            vsync: true,
            log_filter: "info".to_string(),
            mechanisms: [
                "default",
                "subduction",
                "Active Shallow Crust",
                "Stable Continental Crust",
                "Subduction Interface",
                "Subduction IntraSlab",
                "Background Source",
            ]
            .map(String::from)
            .to_vec(),
            initial: InitialForm::default(),
        }
    }
}

impl Default for InitialForm {
    fn default() -> Self {
        Self {
            upper_edge: "-6.90 107.60 0\n-6.95 107.75 0\n-7.05 107.80 0".to_string(),
            lower_edge: "-7.00 107.55 20\n-7.10 107.70 25".to_string(),
            dip: "30".to_string(),
            strike: "45".to_string(),
            mechanism: "subduction".to_string(),
        }
    }
}

impl ViewerConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `$FAULT3D_CONFIG`, else `./fault3d.toml` if present, else defaults.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::locate() {
            Some(path) => Self::from_path(&path),
            None => Ok(Self::default()),
        }
    }

    fn locate() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        let local = PathBuf::from(CONFIG_FILE);
        local.is_file().then_some(local)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
