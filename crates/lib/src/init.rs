//! Initialize the configuration directory: create it and write a default config file.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config::Config;

/// Create the config file's parent directory and write the default config if the file is missing.
/// Returns true if a new file was written.
pub fn init_config(config_path: &Path) -> Result<bool> {
    let config_dir = config_dir(config_path);
    std::fs::create_dir_all(&config_dir)
        .with_context(|| format!("creating config directory {}", config_dir.display()))?;

    if config_path.exists() {
        log::debug!("config already exists at {}, skipping", config_path.display());
        return Ok(false);
    }
    let body = serde_json::to_string_pretty(&Config::default()).context("serializing default config")?;
    std::fs::write(config_path, body + "\n")
        .with_context(|| format!("writing default config to {}", config_path.display()))?;
    log::info!("created default config at {}", config_path.display());
    Ok(true)
}

fn config_dir(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_dir_of_bare_file_name_is_cwd() {
        assert_eq!(config_dir(Path::new("module2.json")), PathBuf::from("."));
        assert_eq!(
            config_dir(Path::new("/etc/gowon/module2.json")),
            PathBuf::from("/etc/gowon")
        );
    }
}
