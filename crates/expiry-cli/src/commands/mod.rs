//! Subcommands and the helpers they share.

pub mod batch;
pub mod classify;
pub mod config;
pub mod process;
pub mod sanitize;

use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::debug;

use expiry_core::EngineConfig;

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("expiry")
        .join("config.json")
}

/// Load the configuration from `path`, else the default file, else defaults.
pub fn load_config(path: Option<&str>) -> anyhow::Result<EngineConfig> {
    if let Some(path) = path {
        return Ok(EngineConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using config file {}", default_path.display());
        Ok(EngineConfig::from_file(&default_path)?)
    } else {
        Ok(EngineConfig::default())
    }
}

/// Read OCR text from a file, or from stdin when the path is `-`.
pub fn read_input(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }

    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }
    Ok(std::fs::read_to_string(path)?)
}
