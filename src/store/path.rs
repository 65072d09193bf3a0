use anyhow::{Result, anyhow};
use directories::ProjectDirs;
use std::path::PathBuf;

/// Files under the application data directory.
#[derive(Debug, Clone)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn servers(&self) -> PathBuf {
        self.root.join("servers.json")
    }

    pub fn config(&self) -> PathBuf {
        self.root.join("config.json")
    }

    pub fn keys(&self) -> PathBuf {
        self.root.join("keys")
    }
}

pub fn resolve_data_paths(override_dir: Option<PathBuf>) -> Result<DataPaths> {
    if let Some(dir) = override_dir {
        return Ok(DataPaths::new(dir));
    }

    let project_dirs = ProjectDirs::from("", "", "zapcon")
        .ok_or_else(|| anyhow!("unable to resolve data directory"))?;
    Ok(DataPaths::new(project_dirs.data_dir().to_path_buf()))
}
