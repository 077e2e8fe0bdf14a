//! Error conversion utilities for CLI.
//!
//! Converts polyarc-core's typed errors (thiserror) into user-friendly
//! contextual errors (anyhow) with actionable guidance.

use anyhow::anyhow;
use polyarc_core::ArchiveError;
use std::path::Path;

/// Converts `ArchiveError` to a user-friendly anyhow error with context.
pub fn convert_archive_error(err: ArchiveError, archive: &Path) -> anyhow::Error {
    match err {
        ArchiveError::PathTraversal { path } => anyhow!(
            "Security violation: Archive '{}' attempted path traversal with '{}'\n\
             HINT: This archive may be malicious. Do not extract from untrusted sources.",
            archive.display(),
            path.display()
        ),
        ArchiveError::SourceNotFound { path } => anyhow!(
            "No such file or directory: '{}'\n\
             HINT: Check the path and try again.",
            path.display()
        ),
        ArchiveError::SourceUnreadable { path } => anyhow!(
            "Permission denied reading '{}'\n\
             HINT: Check the file permissions of the source.",
            path.display()
        ),
        ArchiveError::InvalidArgument { reason } => anyhow!(
            "Cannot use '{}': {reason}\n\
             HINT: The output location must be a writable directory.",
            archive.display()
        ),
        ArchiveError::UnsupportedFormat { reason } => anyhow!(
            "Archive format not supported for '{}': {reason}\n\
             HINT: Supported formats: tar (.gz, .bz2, .xz, .zst), zip, jar, 7z, \
             cpio, ar. Use --format to override the suffix.",
            archive.display()
        ),
        ArchiveError::InvalidArchive(reason) => anyhow!(
            "Invalid archive '{}': {reason}\n\
             HINT: The archive may be corrupted or malformed.",
            archive.display()
        ),
        ArchiveError::Io(io_err) => anyhow!(
            "I/O error while processing '{}': {io_err}",
            archive.display()
        ),
        ArchiveError::InvalidState { .. } => anyhow::Error::from(err)
            .context(format!("Error processing archive '{}'", archive.display())),
    }
}

/// Adds archive context to a library result.
pub fn add_archive_context<T>(
    result: Result<T, ArchiveError>,
    archive: &Path,
) -> anyhow::Result<T> {
    result.map_err(|e| convert_archive_error(e, archive))
}
