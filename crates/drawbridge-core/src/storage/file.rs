//! Scratch-directory file access.

use super::{StorageError, StorageResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Directory name used under the platform data directory.
pub const DEFAULT_SCRATCH_DIR_NAME: &str = "drawbridge";

/// Directory that scene file names are resolved against.
///
/// Only plain relative names are accepted; nothing outside the directory is
/// reachable.
#[derive(Debug, Clone)]
pub struct ScratchDir {
    /// Base directory for relative paths.
    base_path: PathBuf,
}

impl ScratchDir {
    /// Create scratch storage rooted at the given directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create scratch directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Scratch storage in the default location.
    ///
    /// On Unix: `~/.local/share/drawbridge/scratch/`
    /// On Windows: `%LOCALAPPDATA%\drawbridge\scratch\`
    /// Falls back to the system temp directory when neither is known.
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(std::env::temp_dir);
        Self::new(base.join(DEFAULT_SCRATCH_DIR_NAME).join("scratch"))
    }

    /// Resolve a file name against the scratch directory.
    ///
    /// Absolute paths and `..` components are rejected.
    pub fn resolve(&self, filename: &str) -> StorageResult<PathBuf> {
        let path = Path::new(filename);
        let escapes = path.is_absolute()
            || path.components().any(|component| {
                matches!(
                    component,
                    Component::ParentDir | Component::RootDir | Component::Prefix(_)
                )
            });
        if escapes || filename.trim().is_empty() {
            return Err(StorageError::InvalidPath(filename.to_string()));
        }
        Ok(self.base_path.join(path))
    }

    /// Write text to a file, creating parent directories as needed.
    /// Returns the resolved path.
    pub fn write(&self, filename: &str, contents: &str) -> StorageResult<PathBuf> {
        let path = self.resolve(filename)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                StorageError::Io(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        fs::write(&path, contents).map_err(|e| {
            StorageError::Io(format!("Failed to write {}: {}", path.display(), e))
        })?;
        Ok(path)
    }

    /// Read a text file.
    pub fn read(&self, filename: &str) -> StorageResult<String> {
        let path = self.resolve(filename)?;
        fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(path.display().to_string()),
            _ => StorageError::Io(format!("Failed to read {}: {}", path.display(), e)),
        })
    }

    /// Get the base path.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}
