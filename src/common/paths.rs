use anyhow::{Context, Result};
use std::path::PathBuf;

/// Centralized path management for userctl

/// Get the userctl config directory. Not created here: the tool only reads from it.
pub fn userctl_config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Unable to determine user config directory")?
        .join("userctl"))
}
