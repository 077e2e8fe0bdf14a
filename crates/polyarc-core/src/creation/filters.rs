//! Path filtering for archive creation.
//!
//! Filters look only at the path relative to the source root, so a source
//! that itself lives below a hidden directory is still archived.

use crate::config::ArchiverConfig;
use std::path::Path;

/// Checks if a relative path should be left out of the archive.
///
/// A path is skipped if any component is hidden while `include_hidden` is
/// false, or if any component matches an exclude pattern.
///
/// # Examples
///
/// ```
/// use polyarc_core::ArchiverConfig;
/// use polyarc_core::creation::filters;
/// use std::path::Path;
///
/// let config = ArchiverConfig::default().with_include_hidden(false);
/// assert!(filters::should_skip(Path::new("src/.cache/x"), &config));
/// assert!(!filters::should_skip(Path::new("src/main.rs"), &config));
/// ```
#[must_use]
pub fn should_skip(relative: &Path, config: &ArchiverConfig) -> bool {
    if !config.include_hidden && is_hidden(relative) {
        return true;
    }
    config
        .exclude_patterns
        .iter()
        .any(|pattern| matches_pattern(relative, pattern))
}

/// Checks if any component of `relative` starts with `.`.
///
/// # Examples
///
/// ```
/// use polyarc_core::creation::filters;
/// use std::path::Path;
///
/// assert!(filters::is_hidden(Path::new(".gitignore")));
/// assert!(filters::is_hidden(Path::new(".config/app.toml")));
/// assert!(!filters::is_hidden(Path::new("dir/normal.rs")));
/// ```
#[must_use]
pub fn is_hidden(relative: &Path) -> bool {
    relative.components().any(|component| {
        component
            .as_os_str()
            .to_str()
            .is_some_and(|name| name.starts_with('.') && name != "." && name != "..")
    })
}

/// Matches each component of `relative` against a simple glob.
///
/// Supports exact names (`.git`), extension wildcards (`*.tmp`) and prefix
/// wildcards (`build*`).
///
/// # Examples
///
/// ```
/// use polyarc_core::creation::filters;
/// use std::path::Path;
///
/// assert!(filters::matches_pattern(Path::new("dir/.git/HEAD"), ".git"));
/// assert!(filters::matches_pattern(Path::new("dir/test.tmp"), "*.tmp"));
/// assert!(!filters::matches_pattern(Path::new("file_temp"), "temp*"));
/// ```
#[must_use]
pub fn matches_pattern(relative: &Path, pattern: &str) -> bool {
    relative.components().any(|component| {
        component
            .as_os_str()
            .to_str()
            .is_some_and(|name| pattern_matches(name, pattern))
    })
}

fn pattern_matches(s: &str, pattern: &str) -> bool {
    if pattern == s {
        return true;
    }
    if let Some(prefix) = pattern.strip_suffix('*') {
        return s.starts_with(prefix);
    }
    if let Some(suffix) = pattern.strip_prefix('*') {
        return s.ends_with(suffix);
    }
    false
}
