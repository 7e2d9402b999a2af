use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};

use crate::errors::ResourceError;

// @module: File and directory utilities

// @const: Prefix of per-run scratch directories
const SCRATCH_PREFIX: &str = "vttspeak_";

/// Per-run scratch directory
///
/// Every run gets its own uniquely named directory. It is removed when the
/// handle is closed or dropped, on success and error paths alike; removal
/// failures are logged and otherwise ignored.
#[derive(Debug)]
pub struct ScratchDir {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl ScratchDir {
    /// Create a scratch directory under the system temp dir
    pub fn create(run_id: &str) -> Result<Self, ResourceError> {
        Self::create_in(std::env::temp_dir(), run_id)
    }

    /// Create a scratch directory under `parent`
    pub fn create_in<P: AsRef<Path>>(parent: P, run_id: &str) -> Result<Self, ResourceError> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("{}{}_", SCRATCH_PREFIX, run_id))
            .tempdir_in(parent)
            .map_err(ResourceError::CreateScratch)?;
        let path = dir.path().to_path_buf();
        debug!("Created scratch directory {:?}", path);
        Ok(Self { dir: Some(dir), path })
    }

    /// Location of the directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of a file inside the directory
    pub fn join<P: AsRef<Path>>(&self, name: P) -> PathBuf {
        self.path.join(name)
    }

    /// Remove the directory now, logging a failure
    pub fn close(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if let Some(dir) = self.dir.take() {
            match dir.close() {
                Ok(()) => debug!("Removed scratch directory {:?}", self.path),
                Err(e) => warn!("Failed to remove scratch directory {:?}: {}", self.path, e),
            }
        }
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        self.remove();
    }
}

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    /// Lowercase extension of a path, if any
    pub fn extension_lowercase<P: AsRef<Path>>(path: P) -> Option<String> {
        path.as_ref()
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }

    /// Directory a destination file will be created in
    pub fn parent_dir<P: AsRef<Path>>(path: P) -> PathBuf {
        match path.as_ref().parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Temporary file next to `destination`, keeping its extension
    ///
    /// The file is deleted on drop unless persisted, so a failed write
    /// never leaves a partial artifact at the destination.
    pub fn staging_file_for<P: AsRef<Path>>(destination: P) -> Result<NamedTempFile, ResourceError> {
        let destination = destination.as_ref();
        let parent = Self::parent_dir(destination);
        let suffix = Self::extension_lowercase(destination)
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();

        Self::ensure_dir(&parent).map_err(|e| ResourceError::Output {
            path: destination.to_path_buf(),
            source: std::io::Error::other(e.to_string()),
        })?;

        let mut builder = tempfile::Builder::new();
        builder.prefix(".vttspeak-").suffix(&suffix);

        // Same mode as a plain create; the process umask still applies
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(std::fs::Permissions::from_mode(0o666));
        }

        builder
            .tempfile_in(&parent)
            .map_err(|source| ResourceError::Output {
                path: destination.to_path_buf(),
                source,
            })
    }

    /// Move a staged file onto its destination
    pub fn persist_staging_file<P: AsRef<Path>>(staged: NamedTempFile, destination: P) -> Result<(), ResourceError> {
        let destination = destination.as_ref();
        staged
            .persist(destination)
            .map(|_| ())
            .map_err(|e| ResourceError::Output {
                path: destination.to_path_buf(),
                source: e.error,
            })
    }

    /// Write bytes to `destination` atomically
    pub fn write_atomically<P: AsRef<Path>>(destination: P, content: &[u8]) -> Result<(), ResourceError> {
        let destination = destination.as_ref();
        let mut staged = Self::staging_file_for(destination)?;

        staged
            .write_all(content)
            .and_then(|_| staged.flush())
            .map_err(|source| ResourceError::Output {
                path: destination.to_path_buf(),
                source,
            })?;

        Self::persist_staging_file(staged, destination)
    }
}
