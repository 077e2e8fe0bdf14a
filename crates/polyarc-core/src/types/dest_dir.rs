//! Validated destination directory type.

use super::access;
use super::access::Access;
use crate::ArchiveError;
use crate::Result;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

/// A directory that exists and is writable by the current process.
///
/// Constructing a `DestDir` is the first step of every create and extract
/// call, so failures surface before any source is touched.
///
/// # Examples
///
/// ```no_run
/// use polyarc_core::types::DestDir;
///
/// # fn main() -> polyarc_core::Result<()> {
/// let dest = DestDir::new("/tmp/extraction")?;
/// println!("Extracting to: {}", dest.as_path().display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestDir(PathBuf);

impl DestDir {
    /// Validates an existing directory.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the path does not exist, is not a
    /// directory, or is not writable.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Err(ArchiveError::invalid_argument(format!(
                "destination does not exist: {}",
                path.display()
            )));
        }
        Self::validate_existing(path)
    }

    /// Validates a directory, creating it (and its parents) first when it
    /// does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the path exists but is not a writable
    /// directory, or if it cannot be created.
    pub fn create_or_validate(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if fs::symlink_metadata(&path).is_err() {
            fs::create_dir_all(&path).map_err(|e| {
                ArchiveError::invalid_argument(format!(
                    "destination cannot be created: {}: {e}",
                    path.display()
                ))
            })?;
            tracing::debug!(path = %path.display(), "created destination directory");
        }
        Self::validate_existing(path)
    }

    fn validate_existing(path: PathBuf) -> Result<Self> {
        if !path.is_dir() {
            return Err(ArchiveError::invalid_argument(format!(
                "destination is not a directory: {}",
                path.display()
            )));
        }
        if !access::check(&path, Access::Write)? {
            return Err(ArchiveError::invalid_argument(format!(
                "destination is not writable: {}",
                path.display()
            )));
        }
        Ok(Self(path))
    }

    /// Returns the path as a `&Path`.
    #[inline]
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Joins a relative path to this directory.
    #[inline]
    #[must_use]
    pub fn join(&self, path: impl AsRef<Path>) -> PathBuf {
        self.0.join(path)
    }
}
