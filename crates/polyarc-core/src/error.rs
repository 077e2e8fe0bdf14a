//! Error types for archive creation, extraction and streaming.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `ArchiveError`.
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Errors that can occur while creating, extracting or streaming archives.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// I/O operation failed in a backend or on the filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A destination or argument is unusable (not a directory, not
    /// writable, out-of-range option).
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// What was wrong with the argument.
        reason: String,
    },

    /// A declared source path does not exist.
    #[error("source not found: {path}")]
    SourceNotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// A declared source path exists but cannot be read.
    #[error("source not readable: {path}")]
    SourceUnreadable {
        /// The unreadable path.
        path: PathBuf,
    },

    /// An archive stream or entry was used in a state that does not allow
    /// the operation (entry consumed or invalidated, stream closed).
    #[error("invalid stream state: {reason}")]
    InvalidState {
        /// Which state rule was violated.
        reason: String,
    },

    /// The requested archive format or compression pairing has no backend.
    #[error("unsupported format: {reason}")]
    UnsupportedFormat {
        /// Which format or pairing was requested.
        reason: String,
    },

    /// The backend codec rejected the archive contents.
    #[error("invalid archive: {0}")]
    InvalidArchive(String),

    /// An entry name would be written outside the destination directory.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending entry name.
        path: PathBuf,
    },
}

impl ArchiveError {
    /// Returns `true` if this error was raised by a precondition check
    /// before any byte was read or written.
    ///
    /// # Examples
    ///
    /// ```
    /// use polyarc_core::ArchiveError;
    /// use std::path::PathBuf;
    ///
    /// let err = ArchiveError::SourceNotFound {
    ///     path: PathBuf::from("missing.txt"),
    /// };
    /// assert!(err.is_precondition());
    ///
    /// let err = ArchiveError::InvalidArchive("bad header".into());
    /// assert!(!err.is_precondition());
    /// ```
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument { .. }
                | Self::SourceNotFound { .. }
                | Self::SourceUnreadable { .. }
        )
    }

    /// Returns `true` if this error signals API misuse of a stream or entry.
    ///
    /// Such errors are never worth retrying.
    #[must_use]
    pub const fn is_usage_error(&self) -> bool {
        matches!(self, Self::InvalidState { .. })
    }

    /// Returns a context string for this error, if available.
    ///
    /// # Examples
    ///
    /// ```
    /// use polyarc_core::ArchiveError;
    ///
    /// let err = ArchiveError::InvalidArchive("bad header".to_string());
    /// assert_eq!(err.context(), Some("bad header"));
    ///
    /// let err = ArchiveError::Io(std::io::Error::other("disk full"));
    /// assert_eq!(err.context(), None);
    /// ```
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        match self {
            Self::InvalidArchive(msg) => Some(msg),
            Self::InvalidArgument { reason }
            | Self::InvalidState { reason }
            | Self::UnsupportedFormat { reason } => Some(reason),
            _ => None,
        }
    }

    pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState {
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(reason: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            reason: reason.into(),
        }
    }
}

impl From<zip::result::ZipError> for ArchiveError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(io) => Self::Io(io),
            other => Self::InvalidArchive(format!("zip: {other}")),
        }
    }
}

impl From<sevenz_rust2::Error> for ArchiveError {
    fn from(err: sevenz_rust2::Error) -> Self {
        let err_str = err.to_string();
        if err_str.to_lowercase().contains("i/o") {
            return Self::Io(std::io::Error::other(err_str));
        }
        Self::InvalidArchive(format!("7z: {err_str}"))
    }
}

impl From<walkdir::Error> for ArchiveError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(std::path::Path::to_path_buf);
        match err.into_io_error() {
            Some(io) if io.kind() == std::io::ErrorKind::PermissionDenied => {
                path.map_or(Self::Io(io), |path| Self::SourceUnreadable { path })
            }
            Some(io) => Self::Io(io),
            None => Self::Io(std::io::Error::other("directory walk failed")),
        }
    }
}
