//! tar backend.
//!
//! Reading drives `tar::Archive::entries`. The entry iterator borrows the
//! archive, so both live in one self-referencing cell that the reader can
//! advance entry by entry. GNU long names and PAX records are resolved by
//! the `tar` crate.

use std::io;
use std::io::Read;
use std::time::Duration;
use std::time::SystemTime;

use ::tar::EntryType;
use ::tar::Header;

use super::ArchiveReader;
use super::ArchiveWriter;
use super::EntryDescriptor;
use super::EntryHeader;
use super::EntryLink;
use super::Sink;
use crate::ArchiveError;
use crate::Result;
use crate::attributes::AttributeAccessor;

type Source = Box<dyn Read>;

struct Cursor<'a> {
    entries: ::tar::Entries<'a, Source>,
    current: Option<::tar::Entry<'a, Source>>,
}

impl Cursor<'_> {
    fn advance(&mut self) -> Result<Option<EntryHeader>> {
        // the old entry must be released before `tar` skips its data
        self.current = None;
        for entry in self.entries.by_ref() {
            let entry = entry.map_err(|e| ArchiveError::InvalidArchive(format!("tar: {e}")))?;
            if let Some(header) = describe(&entry)? {
                tracing::trace!(name = %header.name, size = header.size, "tar entry");
                self.current = Some(entry);
                return Ok(Some(header));
            }
        }
        Ok(None)
    }
}

#[allow(unsafe_code)] // expanded by `self_referencing`
mod cell {
    use ouroboros::self_referencing;

    use super::Cursor;
    use super::Source;

    #[self_referencing(pub_extras)]
    pub(crate) struct OpenArchive {
        archive: ::tar::Archive<Source>,
        #[borrows(mut archive)]
        #[not_covariant]
        pub(super) cursor: Cursor<'this>,
    }
}

use cell::OpenArchive;

/// Maps one `tar` entry to a header; `None` for metadata-only records.
fn describe(entry: &::tar::Entry<'_, Source>) -> Result<Option<EntryHeader>> {
    let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
    let header = entry.header();
    let kind = header.entry_type();
    let link_target = || {
        entry
            .link_name_bytes()
            .filter(|target| !target.is_empty())
            .map(|target| String::from_utf8_lossy(&target).into_owned())
            .ok_or_else(|| ArchiveError::InvalidArchive(format!("tar: link {name} has no target")))
    };

    let (is_directory, link) = match kind {
        EntryType::Regular | EntryType::Continuous | EntryType::GNUSparse => {
            (name.ends_with('/'), None)
        }
        EntryType::Directory => (true, None),
        EntryType::Symlink => (false, Some(EntryLink::Symbolic(link_target()?))),
        EntryType::Link => (false, Some(EntryLink::Hard(link_target()?))),
        EntryType::XGlobalHeader => {
            tracing::debug!(name = %name, "ignoring pax global header");
            return Ok(None);
        }
        other => {
            return Err(ArchiveError::unsupported(format!(
                "tar entry {name} has type {other:?}, which cannot be extracted"
            )));
        }
    };

    let last_modified = header
        .mtime()
        .ok()
        .map(|secs| SystemTime::UNIX_EPOCH + Duration::from_secs(secs));
    Ok(Some(EntryHeader {
        size: if link.is_some() { 0 } else { entry.size() },
        name,
        is_directory,
        last_modified,
        attributes: AttributeAccessor::Tar(Box::new(header.clone())),
        link,
    }))
}

/// Pull-style tar reader.
pub struct TarReader {
    open: Option<OpenArchive>,
}

impl TarReader {
    /// Wraps a (decompressed) tar byte stream.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the entry iterator cannot be created.
    pub fn new(inner: Source) -> Result<Self> {
        let open = OpenArchive::try_new(::tar::Archive::new(inner), |archive| {
            archive.entries().map(|entries| Cursor {
                entries,
                current: None,
            })
        })?;
        Ok(Self { open: Some(open) })
    }
}

impl ArchiveReader for TarReader {
    fn next_entry(&mut self) -> Result<Option<EntryHeader>> {
        match self.open.as_mut() {
            Some(open) => open.with_cursor_mut(|cursor| cursor.advance()),
            None => Ok(None),
        }
    }

    fn entry_reader(&mut self) -> Result<Box<dyn Read + '_>> {
        let open = self.open.as_mut().ok_or_else(super::no_current_entry)?;
        if !open.with_cursor(|cursor| cursor.current.is_some()) {
            return Err(super::no_current_entry());
        }
        Ok(Box::new(CurrentEntry(open)))
    }

    fn close(&mut self) -> Result<()> {
        self.open = None;
        Ok(())
    }
}

/// Reads the entry the cursor is positioned on.
struct CurrentEntry<'a>(&'a mut OpenArchive);

impl Read for CurrentEntry<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.with_cursor_mut(|cursor| match cursor.current.as_mut() {
            Some(entry) => entry.read(buf),
            None => Ok(0),
        })
    }
}

/// tar writer producing GNU headers.
pub struct TarWriter {
    builder: ::tar::Builder<Sink>,
}

impl TarWriter {
    pub(crate) fn new(sink: Sink) -> Self {
        Self {
            builder: ::tar::Builder::new(sink),
        }
    }
}

impl ArchiveWriter for TarWriter {
    fn write_entry(&mut self, entry: &EntryDescriptor, content: Option<&mut dyn Read>) -> Result<()> {
        let mut header = Header::new_gnu();
        header.set_mode(entry.mode_or_default());
        header.set_mtime(entry.mtime_secs());

        if entry.is_directory {
            header.set_entry_type(EntryType::Directory);
            header.set_size(0);
            self.builder
                .append_data(&mut header, format!("{}/", entry.name), io::empty())?;
        } else {
            header.set_entry_type(EntryType::Regular);
            header.set_size(entry.size);
            match content {
                Some(reader) => self.builder.append_data(&mut header, &entry.name, reader)?,
                None => self.builder.append_data(&mut header, &entry.name, io::empty())?,
            }
        }
        tracing::trace!(name = %entry.name, "tar entry written");
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<()> {
        let sink = self.builder.into_inner()?;
        sink.finish()?;
        Ok(())
    }
}
