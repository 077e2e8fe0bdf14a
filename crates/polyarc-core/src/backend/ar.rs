//! ar backend.
//!
//! `ar` members borrow their archive, so the reader spools the current
//! member's content before handing control back: small members stay in
//! memory, larger ones roll over to an anonymous temporary file. The
//! format has no directories; the writer drops them with a warning.

use std::io;
use std::io::Read;
use std::io::Seek;
use std::time::Duration;
use std::time::SystemTime;

use super::ArchiveReader;
use super::ArchiveWriter;
use super::Bounded;
use super::EntryDescriptor;
use super::EntryHeader;
use super::Sink;
use crate::ArchiveError;
use crate::Result;
use crate::attributes::AttributeAccessor;

const GLOBAL_HEADER: &[u8] = b"!<arch>\n";
const S_IFREG: u32 = 0o100_000;
/// Members up to this size are spooled in memory.
const SPOOL_IN_MEMORY: usize = 1024 * 1024;

/// Sequential ar reader.
pub struct ArReader<R: Read> {
    archive: ::ar::Archive<R>,
    current: Option<tempfile::SpooledTempFile>,
}

impl<R: Read> ArReader<R> {
    /// Wraps a (decompressed) ar byte stream.
    pub fn new(inner: R) -> Self {
        Self {
            archive: ::ar::Archive::new(inner),
            current: None,
        }
    }
}

impl<R: Read> ArchiveReader for ArReader<R> {
    fn next_entry(&mut self) -> Result<Option<EntryHeader>> {
        self.current = None;
        let Some(entry) = self.archive.next_entry() else {
            return Ok(None);
        };
        let mut entry = entry.map_err(|e| {
            if e.kind() == io::ErrorKind::InvalidData {
                ArchiveError::InvalidArchive(format!("ar: {e}"))
            } else {
                ArchiveError::Io(e)
            }
        })?;

        let header = entry.header();
        let name = String::from_utf8_lossy(header.identifier()).into_owned();
        let mode = header.mode();
        let size = header.size();
        let mtime = header.mtime();

        // the header size is untrusted; copy what is actually there
        let mut content = tempfile::SpooledTempFile::new(SPOOL_IN_MEMORY);
        let mut remaining = size;
        let copied = io::copy(&mut Bounded::new(&mut entry, &mut remaining), &mut content);
        if let Err(e) = copied {
            return Err(if e.kind() == io::ErrorKind::UnexpectedEof {
                ArchiveError::InvalidArchive(format!(
                    "ar: member {name} is truncated ({} of {size} bytes)",
                    size - remaining
                ))
            } else {
                ArchiveError::Io(e)
            });
        }
        content.rewind()?;
        self.current = Some(content);

        tracing::trace!(name = %name, size, "ar member");
        Ok(Some(EntryHeader {
            is_directory: name.ends_with('/'),
            name,
            size,
            last_modified: Some(SystemTime::UNIX_EPOCH + Duration::from_secs(mtime)),
            attributes: AttributeAccessor::Ar { mode },
            link: None,
        }))
    }

    fn entry_reader(&mut self) -> Result<Box<dyn Read + '_>> {
        match &mut self.current {
            Some(content) => Ok(Box::new(content)),
            None => Err(super::no_current_entry()),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.current = None;
        Ok(())
    }
}

/// ar writer using BSD-style long names.
pub struct ArWriter {
    builder: ::ar::Builder<Sink>,
    members: usize,
}

impl ArWriter {
    pub(crate) fn new(sink: Sink) -> Self {
        Self {
            builder: ::ar::Builder::new(sink),
            members: 0,
        }
    }
}

impl ArchiveWriter for ArWriter {
    fn write_entry(&mut self, entry: &EntryDescriptor, content: Option<&mut dyn Read>) -> Result<()> {
        if entry.is_directory {
            tracing::warn!(name = %entry.name, "ar cannot store directories, skipping");
            return Ok(());
        }
        let mut header = ::ar::Header::new(entry.name.as_bytes().to_vec(), entry.size);
        header.set_mode(S_IFREG | entry.mode_or_default());
        header.set_mtime(entry.mtime_secs());
        match content {
            Some(reader) => self.builder.append(&header, reader)?,
            None => self.builder.append(&header, io::empty())?,
        }
        self.members += 1;
        tracing::trace!(name = %entry.name, "ar member written");
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<()> {
        let members = self.members;
        let mut sink = self.builder.into_inner()?;
        if members == 0 {
            io::Write::write_all(&mut sink, GLOBAL_HEADER)?;
        }
        sink.finish()?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn build(members: &[(&str, &[u8])]) -> Vec<u8> {
        let mut builder = ::ar::Builder::new(Vec::new());
        for (name, data) in members {
            let mut header = ::ar::Header::new(name.as_bytes().to_vec(), data.len() as u64);
            header.set_mode(0o100_640);
            header.set_mtime(1_650_000_000);
            builder.append(&header, *data).unwrap();
        }
        builder.into_inner().unwrap()
    }

    #[test]
    fn test_reads_members() {
        let data = build(&[("one.o", b"first"), ("two.o", b"second")]);
        let mut reader = ArReader::new(data.as_slice());

        let first = reader.next_entry().unwrap().unwrap();
        assert_eq!(first.name, "one.o");
        assert!(!first.is_directory);
        assert_eq!(first.attributes.restorable_mode().unwrap(), Some(0o640));

        let second = reader.next_entry().unwrap().unwrap();
        assert_eq!(second.size, 6);
        let mut body = String::new();
        reader.entry_reader().unwrap().read_to_string(&mut body).unwrap();
        assert_eq!(body, "second");

        assert!(reader.next_entry().unwrap().is_none());
    }

    #[test]
    fn test_long_member_name() {
        let name = "a_member_name_well_beyond_sixteen_bytes.txt";
        let data = build(&[(name, b"x")]);
        let mut reader = ArReader::new(data.as_slice());
        assert_eq!(reader.next_entry().unwrap().unwrap().name, name);
    }

    #[test]
    fn test_header_only_archive_is_empty() {
        let mut reader = ArReader::new(GLOBAL_HEADER);
        assert!(reader.next_entry().unwrap().is_none());
    }

    #[test]
    fn test_oversized_member_header_is_rejected() {
        // the header claims ~10 GB, only five bytes follow
        let mut data = GLOBAL_HEADER.to_vec();
        data.extend_from_slice(
            format!("{:<16}{:<12}{:<6}{:<6}{:<8}{:<10}`\n", "big.o", 0, 0, 0, 100_644, 9_999_999_999u64)
                .as_bytes(),
        );
        data.extend_from_slice(b"short");
        assert_eq!(data.len(), 8 + 60 + 5);

        let mut reader = ArReader::new(data.as_slice());
        assert!(matches!(
            reader.next_entry(),
            Err(ArchiveError::InvalidArchive(_))
        ));
    }

    #[test]
    fn test_large_member_spills_to_disk() {
        let big = vec![0x5a_u8; SPOOL_IN_MEMORY + 1];
        let data = build(&[("big.o", big.as_slice())]);
        let mut reader = ArReader::new(data.as_slice());
        let header = reader.next_entry().unwrap().unwrap();
        assert_eq!(header.size, big.len() as u64);
        let mut body = Vec::new();
        reader.entry_reader().unwrap().read_to_end(&mut body).unwrap();
        assert_eq!(body, big);
    }
}
