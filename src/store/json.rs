//! JSON file store
//!
//! Whole-document load/save with atomic rename and backup recovery.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;

use crate::error::{Result, VaultError};

/// Crash-safe JSON document store rooted at one directory
///
/// ## Concurrency:
/// - `lock`: owned by this instance, not shared process-wide
///   - `load`/`exists` take it shared (many concurrent readers)
///   - `save`/`delete` take it exclusive
/// - Other processes touching the same files are not coordinated
pub struct JsonStore {
    /// Directory all names are resolved against
    root: PathBuf,

    /// Guards every file under `root` that this store manages
    lock: RwLock<()>,

    /// Number of loads served from a backup file
    recoveries: AtomicU64,
}

impl JsonStore {
    const BACKUP_SUFFIX: &'static str = ".bak";
    const TEMP_SUFFIX: &'static str = ".tmp";

    /// Open a store rooted at `root`, creating the directory if needed
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| {
            VaultError::WriteFailure(format!("create data dir {}: {}", root.display(), e))
        })?;

        tracing::debug!("JSON store opened at {}", root.display());

        Ok(Self {
            root,
            lock: RwLock::new(()),
            recoveries: AtomicU64::new(0),
        })
    }

    /// Serialize `document` and atomically replace `name` with it
    ///
    /// Steps:
    /// 1. Serialize (nothing on disk changes if this fails)
    /// 2. Refresh `{name}.bak` from the current file through
    ///    `{name}.bak.tmp` (best-effort)
    /// 3. Write and fsync `{name}.tmp`
    /// 4. Rename `{name}.tmp` over `{name}`
    pub fn save<T: Serialize + ?Sized>(&self, name: &str, document: &T) -> Result<()> {
        let data = serde_json::to_vec_pretty(document)?;

        let _write_guard = self.lock.write();

        let path = self.path_of(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                VaultError::WriteFailure(format!("create dir {}: {}", parent.display(), e))
            })?;
        }

        if path.exists() {
            Self::refresh_backup(&path);
        }

        let temp_path = sibling(&path, Self::TEMP_SUFFIX);
        if let Err(e) = write_synced(&temp_path, &data) {
            let _ = fs::remove_file(&temp_path);
            tracing::error!("Failed to write temp file {}: {}", temp_path.display(), e);
            return Err(VaultError::WriteFailure(format!(
                "write {}: {}",
                temp_path.display(),
                e
            )));
        }

        if let Err(e) = fs::rename(&temp_path, &path) {
            let _ = fs::remove_file(&temp_path);
            tracing::error!("Failed to rename {} into place: {}", temp_path.display(), e);
            return Err(VaultError::WriteFailure(format!(
                "rename {} -> {}: {}",
                temp_path.display(),
                path.display(),
                e
            )));
        }

        tracing::debug!("Saved {} ({} bytes)", name, data.len());
        Ok(())
    }

    /// Load `name`, or `T::default()` if it is absent or empty
    ///
    /// If the file does not parse, `{name}.bak` is tried and returned
    /// transparently on success. Only when both fail is `CorruptData`
    /// returned.
    pub fn load<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T> {
        let _read_guard = self.lock.read();

        let path = self.path_of(name);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("{} does not exist, treating as empty", name);
                return Ok(T::default());
            }
            Err(e) => {
                tracing::error!("Failed to read {}: {}", path.display(), e);
                return Err(VaultError::ReadFailure(format!("{}: {}", path.display(), e)));
            }
        };

        if is_blank(&bytes) {
            tracing::debug!("{} is empty, treating as empty", name);
            return Ok(T::default());
        }

        match serde_json::from_slice(&bytes) {
            Ok(document) => Ok(document),
            Err(parse_err) => {
                tracing::warn!("{} failed to parse ({}), trying backup", name, parse_err);

                match Self::read_backup(&path) {
                    Some(document) => {
                        self.recoveries.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!("Recovered {} from {}", name, Self::BACKUP_SUFFIX);
                        Ok(document)
                    }
                    None => Err(VaultError::CorruptData(format!("{}: {}", name, parse_err))),
                }
            }
        }
    }

    /// Whether `name` currently exists
    pub fn exists(&self, name: &str) -> bool {
        let _read_guard = self.lock.read();
        self.path_of(name).exists()
    }

    /// Remove `name` (the backup is left alone). Absent files are fine.
    pub fn delete(&self, name: &str) -> Result<()> {
        let _write_guard = self.lock.write();

        let path = self.path_of(name);
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!("Deleted {}", name);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("Delete of missing {} ignored", name);
                Ok(())
            }
            Err(e) => Err(VaultError::WriteFailure(format!("delete {}: {}", path.display(), e))),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Resolved path of `name`
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Resolved path of the backup of `name`
    pub fn backup_path_of(&self, name: &str) -> PathBuf {
        sibling(&self.path_of(name), Self::BACKUP_SUFFIX)
    }

    /// Resolved path of the in-flight temp file of `name`
    pub fn temp_path_of(&self, name: &str) -> PathBuf {
        sibling(&self.path_of(name), Self::TEMP_SUFFIX)
    }

    /// Resolved path of the in-flight temp file of the backup of `name`
    pub fn backup_temp_path_of(&self, name: &str) -> PathBuf {
        sibling(&self.backup_path_of(name), Self::TEMP_SUFFIX)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// How many loads have been answered from a backup since open
    pub fn recovery_count(&self) -> u64 {
        self.recoveries.load(Ordering::Relaxed)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Copy the current file to `.bak`, unless it is unparseable. Backing up
    /// a corrupt file would overwrite the last good copy.
    fn refresh_backup(path: &Path) {
        let backup_path = sibling(path, Self::BACKUP_SUFFIX);

        let current = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Backup skipped, cannot read {}: {}", path.display(), e);
                return;
            }
        };

        if is_blank(&current) || serde_json::from_slice::<IgnoredAny>(&current).is_err() {
            tracing::warn!("Backup skipped, {} is not valid JSON", path.display());
            return;
        }

        // A crash mid-copy must not truncate the last good backup
        let backup_temp = sibling(&backup_path, Self::TEMP_SUFFIX);
        let refreshed = write_synced(&backup_temp, &current)
            .and_then(|()| fs::rename(&backup_temp, &backup_path));

        match refreshed {
            Ok(()) => tracing::trace!("Backup refreshed: {}", backup_path.display()),
            Err(e) => {
                let _ = fs::remove_file(&backup_temp);
                tracing::warn!(
                    "Failed to write backup {}: {}, continuing with save",
                    backup_path.display(),
                    e
                )
            }
        }
    }

    fn read_backup<T: DeserializeOwned>(path: &Path) -> Option<T> {
        let backup_path = sibling(path, Self::BACKUP_SUFFIX);
        let bytes = fs::read(&backup_path).ok()?;
        if is_blank(&bytes) {
            return None;
        }
        match serde_json::from_slice(&bytes) {
            Ok(document) => Some(document),
            Err(e) => {
                tracing::error!("Backup {} is unusable too: {}", backup_path.display(), e);
                None
            }
        }
    }
}

/// `{path}{suffix}` in the same directory
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

fn write_synced(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(data)?;
    file.sync_all()
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}
