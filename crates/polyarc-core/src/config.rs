//! Archiver configuration.

use crate::ArchiveError;
use crate::Result;

/// Configuration shared by archive creation and extraction.
///
/// An [`Archiver`](crate::Archiver) holds its configuration immutably, so
/// one instance can serve any number of calls.
///
/// # Examples
///
/// ```
/// use polyarc_core::ArchiverConfig;
///
/// let config = ArchiverConfig::default()
///     .with_compression_level(9)
///     .with_exclude_patterns(vec!["*.tmp".to_string()]);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiverConfig {
    /// Compression level (1-9) for compressing codecs and zip deflate.
    ///
    /// `None` uses each codec's default.
    ///
    /// Default: `None`.
    pub compression_level: Option<u8>,

    /// Include files and directories whose name starts with `.`.
    ///
    /// Default: `true`, so a tree survives a round trip unchanged.
    pub include_hidden: bool,

    /// Patterns to exclude when walking sources.
    ///
    /// Each pattern is an exact name, `*.ext` or `prefix*`, matched against
    /// every path component below the source root.
    ///
    /// Default: empty.
    pub exclude_patterns: Vec<String>,

    /// Archive the targets of symbolic links instead of skipping them.
    ///
    /// Default: `false`.
    pub follow_symlinks: bool,

    /// Record permission bits on create and restore them on extract.
    ///
    /// Default: `true`.
    pub preserve_permissions: bool,
}

impl Default for ArchiverConfig {
    fn default() -> Self {
        Self {
            compression_level: None,
            include_hidden: true,
            exclude_patterns: Vec::new(),
            follow_symlinks: false,
            preserve_permissions: true,
        }
    }
}

impl ArchiverConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the compression level. Out-of-range values are reported by
    /// [`validate`](Self::validate).
    #[must_use]
    pub const fn with_compression_level(mut self, level: u8) -> Self {
        self.compression_level = Some(level);
        self
    }

    /// Sets whether to include hidden files.
    #[must_use]
    pub const fn with_include_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Sets the exclude patterns.
    #[must_use]
    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    /// Sets whether to follow symlinks.
    #[must_use]
    pub const fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Sets whether to record and restore permissions.
    #[must_use]
    pub const fn with_preserve_permissions(mut self, preserve: bool) -> Self {
        self.preserve_permissions = preserve;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the compression level is set but not
    /// in 1-9.
    pub fn validate(&self) -> Result<()> {
        if let Some(level) = self.compression_level
            && !(1..=9).contains(&level)
        {
            return Err(ArchiveError::invalid_argument(format!(
                "compression level {level} is outside 1-9"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = ArchiverConfig::default();
        assert_eq!(config.compression_level, None);
        assert!(config.include_hidden);
        assert!(config.exclude_patterns.is_empty());
        assert!(!config.follow_symlinks);
        assert!(config.preserve_permissions);
        assert_eq!(config, ArchiverConfig::new());
    }

    #[test]
    fn test_config_builder() {
        let config = ArchiverConfig::default()
            .with_compression_level(9)
            .with_include_hidden(false)
            .with_exclude_patterns(vec!["*.log".to_string()])
            .with_follow_symlinks(true)
            .with_preserve_permissions(false);

        assert_eq!(config.compression_level, Some(9));
        assert!(!config.include_hidden);
        assert_eq!(config.exclude_patterns, vec!["*.log".to_string()]);
        assert!(config.follow_symlinks);
        assert!(!config.preserve_permissions);
    }

    #[test]
    fn test_config_validate_bounds() {
        assert!(ArchiverConfig::default().validate().is_ok());
        assert!(ArchiverConfig::default().with_compression_level(1).validate().is_ok());
        assert!(ArchiverConfig::default().with_compression_level(9).validate().is_ok());

        for level in [0, 10] {
            let err = ArchiverConfig::default()
                .with_compression_level(level)
                .validate()
                .unwrap_err();
            assert!(matches!(err, ArchiveError::InvalidArgument { .. }));
        }
    }
}
