//! 7z backend.
//!
//! `sevenz-rust2` decodes solid blocks through a callback, so the reader
//! runs the whole decode once when opened and spools entry contents into an
//! anonymous temporary file. Entries are then replayed in archive order.

use std::fs::File;
use std::io;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::time::SystemTime;

use sevenz_rust2::ArchiveEntry;
use sevenz_rust2::Password;

use super::ArchiveReader;
use super::ArchiveWriter;
use super::EntryDescriptor;
use super::EntryHeader;
use crate::ArchiveError;
use crate::Result;
use crate::attributes::AttributeAccessor;

struct Spooled {
    header: EntryHeader,
    offset: u64,
    len: u64,
}

/// 7z reader replaying entries from a decoded spool.
pub struct SevenZReader {
    spool: File,
    entries: std::vec::IntoIter<Spooled>,
    current: Option<(u64, u64)>,
}

impl SevenZReader {
    /// Decodes `source` into a spool.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArchive` for malformed or encrypted archives.
    pub fn new<R: Read + Seek>(source: R) -> Result<Self> {
        let mut reader = sevenz_rust2::ArchiveReader::new(source, Password::empty())?;
        let mut spool = tempfile::tempfile()?;
        let mut entries = Vec::new();
        let mut offset = 0u64;

        reader.for_each_entries(|entry: &ArchiveEntry, content: &mut dyn Read| {
            let len = if entry.is_directory() {
                0
            } else {
                io::copy(content, &mut spool)
                    .map_err(|e| sevenz_rust2::Error::Other(format!("spooling failed: {e}").into()))?
            };
            entries.push(Spooled {
                header: header_for(entry),
                offset,
                len,
            });
            offset += len;
            Ok(true)
        })?;

        tracing::debug!(entries = entries.len(), bytes = offset, "decoded 7z archive");
        Ok(Self {
            spool,
            entries: entries.into_iter(),
            current: None,
        })
    }
}

fn header_for(entry: &ArchiveEntry) -> EntryHeader {
    let last_modified = if entry.has_last_modified_date {
        SystemTime::try_from(entry.last_modified_date).ok()
    } else {
        None
    };
    EntryHeader {
        name: entry.name.clone(),
        is_directory: entry.is_directory(),
        size: entry.size,
        last_modified,
        attributes: AttributeAccessor::Fallback,
        link: None,
    }
}

impl ArchiveReader for SevenZReader {
    fn next_entry(&mut self) -> Result<Option<EntryHeader>> {
        self.current = None;
        Ok(self.entries.next().map(|spooled| {
            self.current = Some((spooled.offset, spooled.len));
            spooled.header
        }))
    }

    fn entry_reader(&mut self) -> Result<Box<dyn Read + '_>> {
        let (offset, len) = self.current.take().ok_or_else(super::no_current_entry)?;
        self.spool.seek(SeekFrom::Start(offset))?;
        Ok(Box::new((&mut self.spool).take(len)))
    }

    fn close(&mut self) -> Result<()> {
        self.current = None;
        self.entries = Vec::new().into_iter();
        Ok(())
    }
}

/// 7z writer using the library's default LZMA2 settings.
pub struct SevenZWriter {
    writer: sevenz_rust2::ArchiveWriter<File>,
}

impl SevenZWriter {
    pub(crate) fn new(file: File) -> Result<Self> {
        Ok(Self {
            writer: sevenz_rust2::ArchiveWriter::new(file)?,
        })
    }
}

impl ArchiveWriter for SevenZWriter {
    fn write_entry(&mut self, entry: &EntryDescriptor, content: Option<&mut dyn Read>) -> Result<()> {
        let archive_entry = ArchiveEntry::from_path(&entry.source, entry.name.clone());
        match content {
            Some(reader) if !entry.is_directory => {
                self.writer.push_archive_entry(archive_entry, Some(reader))?;
            }
            _ => {
                self.writer
                    .push_archive_entry::<&[u8]>(archive_entry, None)?;
            }
        }
        tracing::trace!(name = %entry.name, "7z entry written");
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<()> {
        let file = self
            .writer
            .finish()
            .map_err(|e| ArchiveError::InvalidArchive(format!("7z: {e}")))?;
        file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_rejects_garbage() {
        let result = SevenZReader::new(Cursor::new(b"not a 7z archive".to_vec()));
        assert!(result.is_err());
    }

    #[test]
    fn test_writes_and_replays_entries() {
        let temp = tempfile::TempDir::new().unwrap();
        let src = temp.path().join("hello.txt");
        std::fs::write(&src, "hello 7z").unwrap();
        let dir = temp.path().join("nested");
        std::fs::create_dir(&dir).unwrap();

        let out = temp.path().join("out.7z");
        let mut writer: Box<dyn ArchiveWriter> =
            Box::new(SevenZWriter::new(File::create(&out).unwrap()).unwrap());
        writer
            .write_entry(
                &EntryDescriptor {
                    name: "nested".into(),
                    source: dir,
                    is_directory: true,
                    size: 0,
                    mode: None,
                    last_modified: None,
                },
                None,
            )
            .unwrap();
        let mut body = File::open(&src).unwrap();
        writer
            .write_entry(
                &EntryDescriptor {
                    name: "nested/hello.txt".into(),
                    source: src,
                    is_directory: false,
                    size: 8,
                    mode: None,
                    last_modified: None,
                },
                Some(&mut body),
            )
            .unwrap();
        writer.finish().unwrap();

        let mut reader = SevenZReader::new(File::open(&out).unwrap()).unwrap();
        let mut seen = Vec::new();
        while let Some(header) = reader.next_entry().unwrap() {
            assert!(!header.attributes.has_mode());
            if header.is_directory {
                seen.push((header.name, String::new()));
            } else {
                let mut text = String::new();
                reader.entry_reader().unwrap().read_to_string(&mut text).unwrap();
                seen.push((header.name, text));
            }
        }
        seen.sort();
        assert_eq!(
            seen,
            vec![
                ("nested".to_string(), String::new()),
                ("nested/hello.txt".to_string(), "hello 7z".to_string()),
            ]
        );
    }
}
