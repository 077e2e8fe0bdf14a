//! Validated archive source path.

use super::access;
use super::access::Access;
use crate::ArchiveError;
use crate::Result;
use std::path::Path;
use std::path::PathBuf;

/// A path that exists and is readable by the current process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePath(PathBuf);

impl SourcePath {
    /// Validates `path`.
    ///
    /// Symbolic links are checked through their target.
    ///
    /// # Errors
    ///
    /// Returns `SourceNotFound` if nothing exists at `path`, or
    /// `SourceUnreadable` if it cannot be read.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Err(ArchiveError::SourceNotFound { path });
        }
        if !access::check(&path, Access::Read)? {
            return Err(ArchiveError::SourceUnreadable { path });
        }
        Ok(Self(path))
    }

    /// Returns the path as a `&Path`.
    #[inline]
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Converts into the inner `PathBuf`.
    #[inline]
    #[must_use]
    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_existing_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let file = temp.path().join("a.txt");
        fs::write(&file, "a").unwrap();
        let source = SourcePath::new(&file).unwrap();
        assert_eq!(source.as_path(), file);
        assert_eq!(source.into_path_buf(), file);
    }

    #[test]
    fn test_missing_source() {
        let temp = tempfile::TempDir::new().unwrap();
        let missing = temp.path().join("missing.txt");
        let err = SourcePath::new(&missing).unwrap_err();
        assert!(matches!(err, ArchiveError::SourceNotFound { path } if path == missing));
    }

    #[test]
    #[cfg(unix)]
    fn test_unreadable_source() {
        use std::os::unix::fs::PermissionsExt;

        if crate::test_utils::is_root() {
            return;
        }
        let temp = tempfile::TempDir::new().unwrap();
        let file = temp.path().join("secret.txt");
        fs::write(&file, "s").unwrap();
        fs::set_permissions(&file, fs::Permissions::from_mode(0o000)).unwrap();

        let err = SourcePath::new(&file).unwrap_err();
        assert!(matches!(err, ArchiveError::SourceUnreadable { .. }));
    }
}
