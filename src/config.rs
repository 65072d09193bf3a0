use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct LaunchConfig {
    /// Terminal executable chosen by the user, overriding detection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal_path: Option<String>,
}

impl LaunchConfig {
    pub fn terminal(&self) -> Option<&str> {
        self.terminal_path
            .as_deref()
            .map(str::trim)
            .filter(|path| !path.is_empty())
    }
}

/// Reads `config.json`. A missing, blank or unreadable file yields the
/// default config.
pub fn load_launch_config(path: &Path) -> LaunchConfig {
    if !path.exists() {
        return LaunchConfig::default();
    }
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) => {
            warn!("unable to read {}: {}", path.display(), err);
            return LaunchConfig::default();
        }
    };
    if data.trim().is_empty() {
        return LaunchConfig::default();
    }
    serde_json::from_str(&data).unwrap_or_else(|err| {
        warn!("ignoring unparsable {}: {}", path.display(), err);
        LaunchConfig::default()
    })
}

pub fn save_launch_config(path: &Path, config: &LaunchConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("unable to create directory {}", parent.display()))?;
    }
    let data = serde_json::to_string_pretty(config).context("unable to serialize config")?;
    fs::write(path, data).with_context(|| format!("unable to write {}", path.display()))?;
    Ok(())
}
