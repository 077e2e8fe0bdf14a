//! zip and jar backend.
//!
//! Entries are visited by central-directory index, so the reader keeps only
//! the index of its current entry and reopens it on demand.

use std::fs::File;
use std::io::Read;
use std::io::Seek;
use std::time::SystemTime;

use ::zip::CompressionMethod;
use ::zip::DateTime;
use ::zip::ZipArchive;
use ::zip::write::SimpleFileOptions;
use time::OffsetDateTime;

use super::ArchiveReader;
use super::ArchiveWriter;
use super::EntryDescriptor;
use super::EntryHeader;
use crate::Result;
use crate::attributes::AttributeAccessor;

/// Random-access zip reader.
pub struct ZipReader<R: Read + Seek> {
    archive: ZipArchive<R>,
    next_index: usize,
    current: Option<usize>,
}

impl<R: Read + Seek> ZipReader<R> {
    /// Parses the central directory of `source`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArchive` if `source` is not a zip archive.
    pub fn new(source: R) -> Result<Self> {
        let archive = ZipArchive::new(source)?;
        tracing::debug!(entries = archive.len(), "opened zip archive");
        Ok(Self {
            archive,
            next_index: 0,
            current: None,
        })
    }
}

impl<R: Read + Seek> ArchiveReader for ZipReader<R> {
    fn next_entry(&mut self) -> Result<Option<EntryHeader>> {
        self.current = None;
        if self.next_index >= self.archive.len() {
            return Ok(None);
        }
        let index = self.next_index;
        self.next_index += 1;

        let file = self.archive.by_index_raw(index)?;
        let name = file.name().to_string();
        let header = EntryHeader {
            is_directory: file.is_dir(),
            size: file.size(),
            last_modified: file.last_modified().and_then(to_system_time),
            attributes: AttributeAccessor::Zip {
                unix_mode: file.unix_mode(),
            },
            link: None,
            name,
        };
        drop(file);

        self.current = Some(index);
        Ok(Some(header))
    }

    fn entry_reader(&mut self) -> Result<Box<dyn Read + '_>> {
        let index = self.current.ok_or_else(super::no_current_entry)?;
        // a second reader on the same entry would start over
        self.current = None;
        Ok(Box::new(self.archive.by_index(index)?))
    }

    fn close(&mut self) -> Result<()> {
        self.current = None;
        self.next_index = self.archive.len();
        Ok(())
    }
}

fn to_system_time(dt: DateTime) -> Option<SystemTime> {
    OffsetDateTime::try_from(dt).ok().map(SystemTime::from)
}

/// Zip timestamps carry no zone and are limited to 1980..=2107.
fn from_system_time(time: SystemTime) -> Option<DateTime> {
    DateTime::try_from(OffsetDateTime::from(time)).ok()
}

/// zip writer using deflate.
pub struct ZipWriter {
    zip: ::zip::ZipWriter<File>,
    level: Option<u8>,
}

impl ZipWriter {
    pub(crate) fn new(file: File, level: Option<u8>) -> Self {
        Self {
            zip: ::zip::ZipWriter::new(file),
            level,
        }
    }

    fn options(&self, entry: &EntryDescriptor) -> SimpleFileOptions {
        let mut options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(self.level.map(i64::from))
            .unix_permissions(entry.mode_or_default())
            .large_file(entry.size >= u64::from(u32::MAX));
        if let Some(dt) = entry.last_modified.and_then(from_system_time) {
            options = options.last_modified_time(dt);
        }
        options
    }
}

impl ArchiveWriter for ZipWriter {
    fn write_entry(&mut self, entry: &EntryDescriptor, content: Option<&mut dyn Read>) -> Result<()> {
        let options = self.options(entry);
        if entry.is_directory {
            self.zip.add_directory(format!("{}/", entry.name), options)?;
        } else {
            self.zip.start_file(entry.name.as_str(), options)?;
            if let Some(reader) = content {
                std::io::copy(reader, &mut self.zip)?;
            }
        }
        tracing::trace!(name = %entry.name, "zip entry written");
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<()> {
        let file = self.zip.finish()?;
        file.sync_all()?;
        Ok(())
    }
}
