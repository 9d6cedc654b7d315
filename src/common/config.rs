use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::paths;

/// Native executables used by the Unix backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UnixTools {
    pub useradd: String,
    pub userdel: String,
    pub passwd: String,
    pub getent: String,
}

impl Default for UnixTools {
    fn default() -> Self {
        Self {
            useradd: "useradd".to_string(),
            userdel: "userdel".to_string(),
            passwd: "passwd".to_string(),
            getent: "getent".to_string(),
        }
    }
}

/// Native executables used by the Windows backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WindowsTools {
    pub net: String,
    pub powershell: String,
}

impl Default for WindowsTools {
    fn default() -> Self {
        Self {
            net: "net".to_string(),
            powershell: "powershell".to_string(),
        }
    }
}

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UserctlConfig {
    /// Remove an account again when its initial password could not be set
    pub rollback_partial_create: bool,
    /// Re-run through sudo before mutating operations when not root
    pub escalate: bool,
    pub unix: UnixTools,
    pub windows: WindowsTools,
}

impl UserctlConfig {
    /// Load the config from an explicit path, or from the default location.
    ///
    /// A missing default file yields the defaults; a missing explicit file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from_path(path),
            None => {
                let path = default_config_path()?;
                if !path.exists() {
                    return Ok(Self::default());
                }
                Self::load_from_path(&path)
            }
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml(&contents).with_context(|| format!("parsing config at {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("parsing config")
    }
}

/// Get the path to the config.toml file
pub fn default_config_path() -> Result<PathBuf> {
    Ok(paths::userctl_config_dir()?.join("config.toml"))
}
