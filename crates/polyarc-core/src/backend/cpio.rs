//! cpio backend (SVR4 "newc" variant).

use std::io;
use std::io::Read;
use std::time::Duration;
use std::time::SystemTime;

use ::cpio::newc;

use super::ArchiveReader;
use super::ArchiveWriter;
use super::EntryDescriptor;
use super::EntryHeader;
use super::EntryLink;
use super::Sink;
use crate::ArchiveError;
use crate::Result;
use crate::attributes::AttributeAccessor;

const S_IFMT: u32 = 0o170_000;
const S_IFDIR: u32 = 0o040_000;
const S_IFREG: u32 = 0o100_000;
const S_IFLNK: u32 = 0o120_000;
/// Longest symlink target accepted from an archive.
const MAX_LINK_TARGET: u32 = 4096;

/// Malformed headers surface as `InvalidData`; anything else is real I/O.
fn codec_error(err: io::Error) -> ArchiveError {
    if err.kind() == io::ErrorKind::InvalidData {
        ArchiveError::InvalidArchive(format!("cpio: {err}"))
    } else {
        ArchiveError::Io(err)
    }
}

enum State<R: Read> {
    Between(R),
    InEntry(newc::Reader<R>),
    Done,
}

/// Sequential cpio reader.
pub struct CpioReader<R: Read> {
    state: State<R>,
}

impl<R: Read> CpioReader<R> {
    /// Wraps a (decompressed) cpio byte stream.
    pub fn new(inner: R) -> Self {
        Self {
            state: State::Between(inner),
        }
    }
}

impl<R: Read> ArchiveReader for CpioReader<R> {
    fn next_entry(&mut self) -> Result<Option<EntryHeader>> {
        let inner = match std::mem::replace(&mut self.state, State::Done) {
            State::Between(inner) => inner,
            State::InEntry(reader) => reader.finish()?,
            State::Done => return Ok(None),
        };
        let mut reader = newc::Reader::new(inner).map_err(codec_error)?;
        let entry = reader.entry();
        if entry.is_trailer() {
            return Ok(None);
        }

        let mode = entry.mode();
        let name = entry.name().to_string();
        let size = u64::from(entry.file_size());
        let last_modified =
            Some(SystemTime::UNIX_EPOCH + Duration::from_secs(u64::from(entry.mtime())));
        let (is_directory, link) = match mode & S_IFMT {
            S_IFREG => (false, None),
            S_IFDIR => (true, None),
            S_IFLNK => (false, Some(EntryLink::Symbolic(read_link_target(&name, &mut reader)?))),
            kind => {
                return Err(ArchiveError::unsupported(format!(
                    "cpio entry {name} has file type {kind:o}, which cannot be extracted"
                )));
            }
        };

        let header = EntryHeader {
            name,
            is_directory,
            size: if link.is_some() { 0 } else { size },
            last_modified,
            attributes: AttributeAccessor::Cpio { mode },
            link,
        };
        tracing::trace!(name = %header.name, size = header.size, "cpio entry");
        self.state = State::InEntry(reader);
        Ok(Some(header))
    }

    fn entry_reader(&mut self) -> Result<Box<dyn Read + '_>> {
        match &mut self.state {
            State::InEntry(reader) => Ok(Box::new(reader)),
            _ => Err(super::no_current_entry()),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.state = State::Done;
        Ok(())
    }
}

/// Symlink targets are stored as the entry's content.
fn read_link_target<R: Read>(name: &str, reader: &mut newc::Reader<R>) -> Result<String> {
    let size = reader.entry().file_size();
    if size == 0 || size > MAX_LINK_TARGET {
        return Err(ArchiveError::InvalidArchive(format!(
            "cpio: symlink {name} has a {size}-byte target"
        )));
    }
    let mut target = Vec::new();
    reader.read_to_end(&mut target)?;
    Ok(String::from_utf8_lossy(&target).into_owned())
}

/// cpio writer.
pub struct CpioWriter {
    sink: Sink,
    next_ino: u32,
}

impl CpioWriter {
    pub(crate) fn new(sink: Sink) -> Self {
        Self { sink, next_ino: 1 }
    }
}

impl ArchiveWriter for CpioWriter {
    fn write_entry(&mut self, entry: &EntryDescriptor, content: Option<&mut dyn Read>) -> Result<()> {
        let file_type = if entry.is_directory { S_IFDIR } else { S_IFREG };
        let size = if entry.is_directory {
            0
        } else {
            u32::try_from(entry.size).map_err(|_| {
                ArchiveError::invalid_argument(format!(
                    "{} exceeds the 4 GiB cpio entry limit",
                    entry.name
                ))
            })?
        };
        let mtime = u32::try_from(entry.mtime_secs()).unwrap_or(u32::MAX);

        let builder = newc::Builder::new(&entry.name)
            .ino(self.next_ino)
            .mode(file_type | entry.mode_or_default())
            .mtime(mtime)
            .nlink(if entry.is_directory { 2 } else { 1 });
        self.next_ino += 1;

        let mut writer = builder.write(&mut self.sink, size);
        if let Some(reader) = content
            && !entry.is_directory
        {
            io::copy(reader, &mut writer)?;
        }
        writer.finish()?;
        tracing::trace!(name = %entry.name, "cpio entry written");
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        newc::trailer(&mut self.sink)?;
        self.sink.finish()?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn build(entries: &[(&str, u32, &[u8])]) -> Vec<u8> {
        let mut out = Vec::new();
        for (ino, (name, mode, data)) in entries.iter().enumerate() {
            let mut writer = newc::Builder::new(name)
                .ino(u32::try_from(ino).unwrap())
                .mode(*mode)
                .mtime(1_600_000_000)
                .write(&mut out, u32::try_from(data.len()).unwrap());
            io::Write::write_all(&mut writer, data).unwrap();
            writer.finish().unwrap();
        }
        newc::trailer(&mut out).unwrap();
        out
    }

    #[test]
    fn test_reads_files_and_directories() {
        let data = build(&[
            ("etc", 0o040_755, b""),
            ("etc/hosts", 0o100_644, b"127.0.0.1 localhost\n"),
        ]);
        let mut reader = CpioReader::new(data.as_slice());

        let dir = reader.next_entry().unwrap().unwrap();
        assert!(dir.is_directory);
        assert_eq!(dir.attributes.restorable_mode().unwrap(), Some(0o755));

        let file = reader.next_entry().unwrap().unwrap();
        assert_eq!(file.name, "etc/hosts");
        assert_eq!(file.size, 20);
        assert_eq!(
            file.last_modified,
            Some(SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000))
        );
        let mut body = String::new();
        reader.entry_reader().unwrap().read_to_string(&mut body).unwrap();
        assert_eq!(body, "127.0.0.1 localhost\n");

        assert!(reader.next_entry().unwrap().is_none());
        assert!(reader.next_entry().unwrap().is_none());
    }

    #[test]
    fn test_skips_unread_content() {
        let data = build(&[("a", 0o100_600, b"aaaaaaa"), ("b", 0o100_600, b"bb")]);
        let mut reader = CpioReader::new(data.as_slice());
        reader.next_entry().unwrap();
        let second = reader.next_entry().unwrap().unwrap();
        assert_eq!(second.name, "b");
        let mut body = Vec::new();
        reader.entry_reader().unwrap().read_to_end(&mut body).unwrap();
        assert_eq!(body, b"bb");
    }

    #[test]
    fn test_symlinks_carry_their_target() {
        let data = build(&[("link", 0o120_777, b"target"), ("f", 0o100_644, b"f")]);
        let mut reader = CpioReader::new(data.as_slice());
        let link = reader.next_entry().unwrap().unwrap();
        assert_eq!(link.name, "link");
        assert_eq!(link.link, Some(EntryLink::Symbolic("target".to_string())));
        assert_eq!(link.size, 0);
        assert_eq!(reader.next_entry().unwrap().unwrap().name, "f");
    }

    #[test]
    fn test_device_nodes_are_rejected() {
        let data = build(&[("null", 0o020_666, b"")]);
        let mut reader = CpioReader::new(data.as_slice());
        assert!(matches!(
            reader.next_entry(),
            Err(ArchiveError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let mut reader = CpioReader::new(&b"this is not a cpio archive at all, no magic here"[..]);
        assert!(reader.next_entry().is_err());
    }
}
