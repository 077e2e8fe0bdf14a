//! Single-cursor iteration over archive entries.
//!
//! An [`ArchiveStream`] wraps a backend reader and yields one
//! [`ArchiveEntry`] at a time. Each entry remembers the stream generation
//! it was produced in; advancing or closing the stream invalidates every
//! earlier entry, and a successful extraction consumes the entry.
//!
//! The stream is `!Send` and `!Sync`: it models one cursor over one byte
//! source and must stay on the thread that opened it.
//!
//! # Examples
//!
//! ```no_run
//! use polyarc_core::Archiver;
//! use polyarc_core::formats::ArchiveFormat;
//!
//! # fn main() -> polyarc_core::Result<()> {
//! let archiver = Archiver::new(ArchiveFormat::Tar)?;
//! let mut stream = archiver.stream("backup.tar")?;
//! while let Some(entry) = stream.next_entry()? {
//!     if entry.name().ends_with(".conf") {
//!         entry.extract("/tmp/configs")?;
//!     }
//! }
//! stream.close()?;
//! # Ok(())
//! # }
//! ```

use std::cell::Cell;
use std::cell::RefCell;
use std::fs;
use std::fs::File;
use std::io;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use std::rc::Rc;
use std::rc::Weak;
use std::time::SystemTime;

use crate::ArchiveError;
use crate::Result;
use crate::backend::ArchiveReader;
use crate::backend::EntryHeader;
use crate::backend::EntryLink;
use crate::mode;

struct StreamState {
    reader: Option<Box<dyn ArchiveReader>>,
    generation: u64,
    restore_permissions: bool,
}

impl StreamState {
    fn close(&mut self) -> Result<()> {
        self.generation += 1;
        match self.reader.take() {
            Some(mut reader) => reader.close(),
            None => Ok(()),
        }
    }
}

/// A cursor over the entries of one archive.
pub struct ArchiveStream {
    state: Rc<RefCell<StreamState>>,
}

impl std::fmt::Debug for ArchiveStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ArchiveStream")
            .field("generation", &state.generation)
            .field("closed", &state.reader.is_none())
            .finish()
    }
}

impl ArchiveStream {
    pub(crate) fn new(reader: Box<dyn ArchiveReader>, restore_permissions: bool) -> Self {
        Self {
            state: Rc::new(RefCell::new(StreamState {
                reader: Some(reader),
                generation: 0,
                restore_permissions,
            })),
        }
    }

    /// Advances to the next entry.
    ///
    /// Any entry yielded earlier becomes invalid, whether or not it was
    /// extracted. Returns `None` once the archive is exhausted; the stream
    /// stays open until [`close`](Self::close) is called.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the stream is closed, or the backend's
    /// error if the next header cannot be read.
    pub fn next_entry(&mut self) -> Result<Option<ArchiveEntry>> {
        let mut state = self.state.borrow_mut();
        state.generation += 1;
        let generation = state.generation;
        let reader = state
            .reader
            .as_mut()
            .ok_or_else(|| ArchiveError::invalid_state("archive stream is closed"))?;

        let Some(header) = reader.next_entry()? else {
            return Ok(None);
        };
        drop(state);

        ArchiveEntry::from_header(header, generation, Rc::downgrade(&self.state)).map(Some)
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.borrow().reader.is_none()
    }

    /// Releases the backend. Closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the backend's error from the first close.
    pub fn close(&mut self) -> Result<()> {
        self.state.borrow_mut().close()
    }
}

impl Drop for ArchiveStream {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.try_borrow_mut()
            && let Err(e) = state.close()
        {
            tracing::debug!(error = %e, "error closing archive stream on drop");
        }
    }
}

/// One entry of an [`ArchiveStream`].
///
/// Directory entries always report a size of zero, whatever the backend
/// stored, and their names end in `/`.
#[derive(Debug)]
pub struct ArchiveEntry {
    name: String,
    is_directory: bool,
    size: u64,
    last_modified: Option<SystemTime>,
    mode: Option<u32>,
    link: Option<EntryLink>,
    generation: u64,
    consumed: Cell<bool>,
    stream: Weak<RefCell<StreamState>>,
}

impl ArchiveEntry {
    fn from_header(
        header: EntryHeader,
        generation: u64,
        stream: Weak<RefCell<StreamState>>,
    ) -> Result<Self> {
        let is_directory = header.is_directory || header.name.ends_with('/');
        let mut name = header.name;
        if is_directory && !name.ends_with('/') {
            name.push('/');
        }
        let mode = header.attributes.restorable_mode()?;
        Ok(Self {
            name,
            is_directory,
            size: if is_directory { 0 } else { header.size },
            last_modified: header.last_modified,
            mode,
            link: header.link,
            generation,
            consumed: Cell::new(false),
            stream,
        })
    }

    /// Name as stored in the archive; directories end in `/`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` for directory entries.
    #[must_use]
    pub const fn is_directory(&self) -> bool {
        self.is_directory
    }

    /// Content size in bytes, `0` for directories.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Modification time, when the format records one.
    #[must_use]
    pub const fn last_modified(&self) -> Option<SystemTime> {
        self.last_modified
    }

    /// Permission bits recorded in the archive, if any.
    #[must_use]
    pub const fn mode(&self) -> Option<u32> {
        self.mode
    }

    /// Link target for symbolic and hard link entries.
    #[must_use]
    pub const fn link(&self) -> Option<&EntryLink> {
        self.link.as_ref()
    }

    /// Copies the entry's metadata into an owned [`EntryInfo`].
    #[must_use]
    pub fn info(&self) -> EntryInfo {
        EntryInfo {
            name: self.name.clone(),
            is_directory: self.is_directory,
            size: self.size,
            last_modified: self.last_modified,
            mode: self.mode,
            link: self.link.clone(),
        }
    }

    /// Returns `true` after a successful [`extract`](Self::extract).
    #[must_use]
    pub fn is_consumed(&self) -> bool {
        self.consumed.get()
    }

    /// Writes this entry below `destination` and returns the created path.
    ///
    /// Directories are created recursively; files have their parents
    /// created and existing files are overwritten. Symbolic links are
    /// recreated as-is, and hard links become copies of the earlier entry
    /// they name. Recorded permissions are restored when the archiver is
    /// configured to preserve them.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if the entry was already extracted, the stream has
    ///   moved past it, or the stream is closed or dropped
    /// - `PathTraversal` if the name is absolute or climbs out with `..`,
    ///   if a symlink target leaves `destination`, or if the entry would be
    ///   written through an existing symlink
    /// - `InvalidArchive` for a hard link whose target was not extracted
    /// - `UnsupportedFormat` for symbolic links off unix
    /// - I/O errors from the filesystem or backend, unchanged
    pub fn extract(&self, destination: impl AsRef<Path>) -> Result<PathBuf> {
        self.extract_inner(destination.as_ref(), false)
    }

    /// Extracts the entry; with `defer_directory_mode` set, directory
    /// permissions are left for the caller to apply once the directory's
    /// children have been written.
    pub(crate) fn extract_inner(&self, destination: &Path, defer_directory_mode: bool) -> Result<PathBuf> {
        if self.consumed.get() {
            return Err(ArchiveError::invalid_state(format!(
                "entry {} was already extracted",
                self.name
            )));
        }
        let stream = self
            .stream
            .upgrade()
            .ok_or_else(|| ArchiveError::invalid_state("archive stream was dropped"))?;
        let mut state = stream.borrow_mut();
        if state.reader.is_none() {
            return Err(ArchiveError::invalid_state("archive stream is closed"));
        }
        if state.generation != self.generation {
            return Err(ArchiveError::invalid_state(format!(
                "stream has advanced past entry {}",
                self.name
            )));
        }
        let restore = state.restore_permissions;

        let relative = sanitize_name(&self.name)?;
        // only a directory entry such as "./" may name the destination itself
        if relative.as_os_str().is_empty() && !self.is_directory {
            return Err(ArchiveError::PathTraversal {
                path: PathBuf::from(&self.name),
            });
        }
        verify_parent_not_symlink(destination, &relative)?;
        let target = destination.join(&relative);

        match &self.link {
            Some(EntryLink::Symbolic(link_target)) => {
                check_link_target(&relative, link_target)?;
                prepare_file_target(&target)?;
                create_symlink(link_target, &target)?;
            }
            Some(EntryLink::Hard(original)) => {
                let original_relative = sanitize_name(original)?;
                verify_parent_not_symlink(destination, &original_relative)?;
                let source = destination.join(original_relative);
                if !fs::metadata(&source).is_ok_and(|m| m.is_file()) {
                    return Err(ArchiveError::InvalidArchive(format!(
                        "hard link {} points to {original}, which has not been extracted",
                        self.name
                    )));
                }
                if source != target {
                    prepare_file_target(&target)?;
                    fs::copy(&source, &target)?;
                }
            }
            None if self.is_directory => fs::create_dir_all(&target)?,
            None => {
                prepare_file_target(&target)?;
                let mut file = File::create(&target)?;
                let reader = state
                    .reader
                    .as_mut()
                    .ok_or_else(|| ArchiveError::invalid_state("archive stream is closed"))?;
                let mut content = reader.entry_reader()?;
                io::copy(&mut content, &mut file)?;
            }
        }

        // chmod would follow a symlink to its target
        let is_symlink = matches!(self.link, Some(EntryLink::Symbolic(_)));
        if restore
            && !is_symlink
            && let Some(mode) = self.mode
            && !(self.is_directory && defer_directory_mode)
        {
            mode::apply_mode(&target, mode)?;
        }

        self.consumed.set(true);
        tracing::trace!(name = %self.name, path = %target.display(), "extracted entry");
        Ok(target)
    }
}

/// Metadata of one entry, detached from its stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    /// Name as stored in the archive; directories end in `/`.
    pub name: String,
    /// Whether the entry is a directory.
    pub is_directory: bool,
    /// Content size in bytes, `0` for directories.
    pub size: u64,
    /// Modification time, when recorded.
    pub last_modified: Option<SystemTime>,
    /// Permission bits, when recorded.
    pub mode: Option<u32>,
    /// Link target, for link entries.
    pub link: Option<EntryLink>,
}

/// Creates the parents of a file-like target and removes whatever
/// non-directory sits at its place. Read-only files from an earlier run
/// cannot be truncated in place.
fn prepare_file_target(target: &Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    if fs::symlink_metadata(target).is_ok_and(|m| !m.is_dir()) {
        fs::remove_file(target)?;
    }
    Ok(())
}

/// Rejects entries whose parent chain below `destination` runs through an
/// existing symlink.
fn verify_parent_not_symlink(destination: &Path, relative: &Path) -> Result<()> {
    let Some(parent) = relative.parent() else {
        return Ok(());
    };
    let mut current = destination.to_path_buf();
    for component in parent.components() {
        current.push(component);
        if fs::symlink_metadata(&current).is_ok_and(|m| m.file_type().is_symlink()) {
            return Err(ArchiveError::PathTraversal {
                path: relative.to_path_buf(),
            });
        }
    }
    Ok(())
}

/// Resolves a symlink target against the link's directory without touching
/// the filesystem and fails if it leaves the destination.
fn check_link_target(link: &Path, target: &str) -> Result<()> {
    let escape = || ArchiveError::PathTraversal {
        path: PathBuf::from(target),
    };
    let mut resolved = link.parent().map(Path::to_path_buf).unwrap_or_default();
    for component in Path::new(target).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !resolved.pop() {
                    return Err(escape());
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(escape()),
        }
    }
    Ok(())
}

#[cfg(unix)]
fn create_symlink(target: &str, link: &Path) -> Result<()> {
    std::os::unix::fs::symlink(target, link)?;
    Ok(())
}

#[cfg(not(unix))]
fn create_symlink(_target: &str, link: &Path) -> Result<()> {
    Err(ArchiveError::unsupported(format!(
        "cannot create symbolic link {} on this platform",
        link.display()
    )))
}

/// Turns an entry name into a relative path that stays below the
/// destination.
fn sanitize_name(name: &str) -> Result<PathBuf> {
    let traversal = || ArchiveError::PathTraversal {
        path: PathBuf::from(name),
    };
    let mut relative = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(traversal());
            }
        }
    }
    Ok(relative)
}
