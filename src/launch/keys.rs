//! Private key staging.
//!
//! Copies a key into the app-owned `keys/` directory with owner-only
//! permissions so strict SSH clients accept it. Copies are memoized by
//! source path and source modification time for the lifetime of the
//! [`KeyStager`]; entries are never evicted.

use log::{debug, error};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

const DEFAULT_KEY_EXTENSION: &str = ".pem";

#[derive(Debug, Clone, PartialEq, Eq)]
struct KeyCacheEntry {
    staged_path: PathBuf,
    source_modified: SystemTime,
}

pub struct KeyStager {
    keys_dir: PathBuf,
    cache: Mutex<HashMap<PathBuf, KeyCacheEntry>>,
}

impl KeyStager {
    pub fn new(keys_dir: PathBuf) -> Self {
        Self {
            keys_dir,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Returns a path to a usable copy of `original`.
    ///
    /// Empty or missing paths are passed through untouched, and any I/O
    /// failure falls back to `original` after logging it.
    pub fn stage(&self, original: &str) -> String {
        if original.is_empty() {
            return original.to_string();
        }
        let source = match resolve(original) {
            Ok(path) => path,
            Err(err) => {
                error!("unable to resolve key path {}: {}", original, err);
                return original.to_string();
            }
        };
        if !source.is_file() {
            return original.to_string();
        }

        match self.stage_file(&source) {
            Ok(staged) => staged.to_string_lossy().into_owned(),
            Err(err) => {
                error!("failed to stage private key {}: {}", source.display(), err);
                original.to_string()
            }
        }
    }

    fn stage_file(&self, source: &Path) -> io::Result<PathBuf> {
        // Held across the copy so concurrent requests for one key never race
        // on the staged file.
        let mut cache = self.cache.lock();

        let source_modified = fs::metadata(source)?.modified()?;
        if let Some(entry) = cache.get(source) {
            if entry.source_modified == source_modified && entry.staged_path.is_file() {
                debug!("reusing staged key {}", entry.staged_path.display());
                return Ok(entry.staged_path.clone());
            }
        }

        fs::create_dir_all(&self.keys_dir)?;
        let staged_path = self.keys_dir.join(staged_file_name(source));
        let contents = fs::read(source)?;
        write_private(&staged_path, &contents)?;
        debug!("staged {} as {}", source.display(), staged_path.display());

        cache.insert(
            source.to_path_buf(),
            KeyCacheEntry {
                staged_path: staged_path.clone(),
                source_modified,
            },
        );
        Ok(staged_path)
    }
}

/// Absolute form of `original` with `.` and `..` folded away lexically, so
/// every spelling of one key shares a staged copy.
fn resolve(original: &str) -> io::Result<PathBuf> {
    let absolute = std::path::absolute(original)?;
    let mut resolved = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => resolved.push(other),
        }
    }
    Ok(resolved)
}

/// `<sha256 of the absolute source path><extension>`, `.pem` when the source
/// has no extension.
fn staged_file_name(source: &Path) -> String {
    let digest = Sha256::digest(source.to_string_lossy().as_bytes());
    let extension = source
        .extension()
        .map(|ext| ext.to_string_lossy())
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_else(|| DEFAULT_KEY_EXTENSION.to_string());
    format!("{:x}{}", digest, extension)
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents)?;
    // `mode` only applies on creation.
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    // NTFS ACLs of the per-user data directory already restrict access.
    fs::write(path, contents)
}
