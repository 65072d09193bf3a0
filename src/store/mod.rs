mod path;

use crate::model::{PortValue, ServerProfile};
use anyhow::{Context, Result, anyhow};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

pub use path::{DataPaths, resolve_data_paths};

/// How a command names a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Id(u64),
    Name(String),
}

impl Selector {
    fn matches(&self, profile: &ServerProfile) -> bool {
        match self {
            Selector::Id(id) => profile.id == *id,
            Selector::Name(name) => profile.name.as_deref() == Some(name.as_str()),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Id(id) => write!(f, "server {}", id),
            Selector::Name(name) => write!(f, "server '{}'", name),
        }
    }
}

/// Field changes for an existing profile; `None` leaves a field alone.
///
/// An empty `name` or `key` removes that field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub host: Option<String>,
    pub user: Option<String>,
    pub port: Option<u16>,
    pub key: Option<String>,
}

impl ProfilePatch {
    fn apply(self, profile: &mut ServerProfile) {
        if let Some(name) = self.name {
            profile.name = Some(name).filter(|name| !name.is_empty());
        }
        if let Some(host) = self.host {
            profile.host = host;
        }
        if let Some(user) = self.user {
            profile.user = user;
        }
        if let Some(port) = self.port {
            profile.port = Some(PortValue::from(port));
        }
        if let Some(key) = self.key {
            profile.key = Some(key).filter(|key| !key.is_empty());
        }
    }
}

/// `servers.json`: a JSON array of profiles.
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Stores a new profile under a fresh id and returns it.
    pub fn add(&self, mut profile: ServerProfile) -> Result<ServerProfile> {
        let mut profiles = self.load()?;
        if let Some(name) = &profile.name {
            if profiles.iter().any(|existing| existing.name.as_ref() == Some(name)) {
                return Err(anyhow!("server '{}' already exists", name));
            }
        }

        let mut id = now_millis().max(1);
        while profiles.iter().any(|existing| existing.id == id) {
            id += 1;
        }
        profile.id = id;
        profiles.push(profile.clone());
        self.save(&profiles)?;
        Ok(profile)
    }

    pub fn list(&self) -> Result<Vec<ServerProfile>> {
        let mut profiles = self.load()?;
        profiles.sort_by(|a, b| a.label().cmp(&b.label()).then(a.id.cmp(&b.id)));
        Ok(profiles)
    }

    pub fn get(&self, selector: &Selector) -> Result<ServerProfile> {
        self.load()?
            .into_iter()
            .find(|profile| selector.matches(profile))
            .ok_or_else(|| anyhow!("{} not found", selector))
    }

    /// Applies `patch` to the selected profile in place, keeping its id.
    pub fn update(&self, selector: &Selector, patch: ProfilePatch) -> Result<ServerProfile> {
        let mut profiles = self.load()?;
        let index = profiles
            .iter()
            .position(|profile| selector.matches(profile))
            .ok_or_else(|| anyhow!("{} not found", selector))?;
        let id = profiles[index].id;

        if let Some(name) = patch.name.as_deref().filter(|name| !name.is_empty()) {
            let taken = profiles
                .iter()
                .any(|other| other.id != id && other.name.as_deref() == Some(name));
            if taken {
                return Err(anyhow!("server '{}' already exists", name));
            }
        }

        let profile = &mut profiles[index];
        patch.apply(profile);
        if profile.host.trim().is_empty() || profile.user.trim().is_empty() {
            return Err(anyhow!("host and user must not be empty"));
        }
        let updated = profile.clone();
        self.save(&profiles)?;
        Ok(updated)
    }

    pub fn remove(&self, selector: &Selector) -> Result<()> {
        let mut profiles = self.load()?;
        let before = profiles.len();
        profiles.retain(|profile| !selector.matches(profile));
        if profiles.len() == before {
            return Err(anyhow!("{} not found", selector));
        }
        self.save(&profiles)
    }

    fn load(&self) -> Result<Vec<ServerProfile>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&self.path)
            .with_context(|| format!("unable to read store {}", self.path.display()))?;
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        let profiles = serde_json::from_str(&data)
            .with_context(|| format!("unable to parse store {}", self.path.display()))?;
        Ok(profiles)
    }

    fn save(&self, profiles: &[ServerProfile]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("unable to create store directory {}", parent.display())
            })?;
        }
        let data =
            serde_json::to_string_pretty(profiles).context("unable to serialize servers")?;
        fs::write(&self.path, data)
            .with_context(|| format!("unable to write store {}", self.path.display()))?;
        Ok(())
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(0)
}
