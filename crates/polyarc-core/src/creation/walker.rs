//! Source tree walking with filtering.
//!
//! Sources are turned into a flat, ordered list of [`EntryDescriptor`]s
//! before any output exists, so walk failures never leave a partial
//! archive behind.

use crate::ArchiveError;
use crate::Result;
use crate::backend::EntryDescriptor;
use crate::config::ArchiverConfig;
use crate::creation::filters;
use crate::mode;
use std::fs::Metadata;
use std::path::Path;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Walks one source root with filtering based on `ArchiverConfig`.
///
/// Entries come out parents first, siblings sorted by file name, which
/// keeps archive order deterministic across platforms.
///
/// # Examples
///
/// ```no_run
/// use polyarc_core::ArchiverConfig;
/// use polyarc_core::creation::walker::FilteredWalker;
/// use std::path::Path;
///
/// let config = ArchiverConfig::default();
/// let walker = FilteredWalker::new(Path::new("./project"), &config);
/// for entry in walker.walk() {
///     println!("Would add: {}", entry.unwrap().name);
/// }
/// ```
pub struct FilteredWalker<'a> {
    root: &'a Path,
    prefix: Option<&'a str>,
    config: &'a ArchiverConfig,
}

impl<'a> FilteredWalker<'a> {
    /// Creates a walker yielding the contents of `root`, named relative to
    /// `root` itself.
    #[must_use]
    pub const fn new(root: &'a Path, config: &'a ArchiverConfig) -> Self {
        Self {
            root,
            prefix: None,
            config,
        }
    }

    /// Creates a walker yielding `root` and its contents, named below
    /// `prefix`.
    #[must_use]
    pub const fn with_prefix(root: &'a Path, prefix: &'a str, config: &'a ArchiverConfig) -> Self {
        Self {
            root,
            prefix: Some(prefix),
            config,
        }
    }

    /// Returns an iterator over the filtered entries.
    ///
    /// Excluded directories are pruned together with their contents.
    /// Symbolic links are skipped with a warning unless `follow_symlinks`
    /// is set.
    ///
    /// # Errors
    ///
    /// Items are `SourceUnreadable` for directories that cannot be listed,
    /// or I/O errors for metadata failures.
    pub fn walk(&self) -> impl Iterator<Item = Result<EntryDescriptor>> + '_ {
        let min_depth = usize::from(self.prefix.is_none());
        WalkDir::new(self.root)
            .follow_links(self.config.follow_symlinks)
            .min_depth(min_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| {
                let relative = entry.path().strip_prefix(self.root).unwrap_or(entry.path());
                !filters::should_skip(relative, self.config)
            })
            .filter_map(move |entry| match entry {
                Ok(entry) => self.describe(&entry).transpose(),
                Err(e) => Some(Err(ArchiveError::from(e))),
            })
    }

    fn describe(&self, entry: &walkdir::DirEntry) -> Result<Option<EntryDescriptor>> {
        let path = entry.path();
        if entry.path_is_symlink() && !self.config.follow_symlinks {
            tracing::warn!(path = %path.display(), "skipping symbolic link");
            return Ok(None);
        }

        let metadata = entry.metadata()?;
        if !metadata.is_dir() && !metadata.is_file() {
            tracing::warn!(path = %path.display(), "skipping special file");
            return Ok(None);
        }

        let relative = path.strip_prefix(self.root).unwrap_or(path);
        let name = archive_name(self.prefix, relative);
        Ok(Some(descriptor(name, path.to_path_buf(), &metadata, self.config)))
    }
}

/// Joins `prefix` and the components of `relative` with `/`.
fn archive_name(prefix: Option<&str>, relative: &Path) -> String {
    prefix
        .into_iter()
        .map(str::to_string)
        .chain(
            relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned()),
        )
        .collect::<Vec<_>>()
        .join("/")
}

fn descriptor(
    name: String,
    source: PathBuf,
    metadata: &Metadata,
    config: &ArchiverConfig,
) -> EntryDescriptor {
    let is_directory = metadata.is_dir();
    EntryDescriptor {
        name,
        source,
        is_directory,
        size: if is_directory { 0 } else { metadata.len() },
        mode: config
            .preserve_permissions
            .then(|| mode::mode_from_metadata(metadata)),
        last_modified: metadata.modified().ok(),
    }
}

/// Collects the entries of every source in order.
///
/// A single directory source contributes its contents, so its own name
/// does not appear in the archive. Otherwise each source is named by its
/// file name and directories bring their contents below that name.
///
/// # Errors
///
/// Returns `SourceNotFound` or `SourceUnreadable` for unusable sources and
/// I/O errors for metadata failures.
pub fn collect_entries<P: AsRef<Path>>(
    sources: &[P],
    config: &ArchiverConfig,
) -> Result<Vec<EntryDescriptor>> {
    let mut entries = Vec::new();

    if let [only] = sources
        && only.as_ref().is_dir()
    {
        for entry in FilteredWalker::new(only.as_ref(), config).walk() {
            entries.push(entry?);
        }
        return Ok(entries);
    }

    for source in sources {
        let path = source.as_ref();
        let name = path
            .file_name()
            .ok_or_else(|| {
                ArchiveError::invalid_argument(format!(
                    "source has no file name: {}",
                    path.display()
                ))
            })?
            .to_string_lossy()
            .into_owned();

        if filters::should_skip(Path::new(&name), config) {
            continue;
        }
        for entry in FilteredWalker::with_prefix(path, &name, config).walk() {
            entries.push(entry?);
        }
    }

    Ok(entries)
}
