//! Per-format codec adapters.
//!
//! Each backend turns a codec crate into a pull-style [`ArchiveReader`]
//! (one entry at a time, content read from the current position) or a
//! push-style [`ArchiveWriter`]. Nothing above this module looks at binary
//! layouts.

use std::fs::File;
use std::io;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Read;
use std::io::Seek;
use std::io::Write;
use std::path::PathBuf;
use std::time::SystemTime;

use crate::ArchiveError;
use crate::Result;
use crate::attributes::AttributeAccessor;
use crate::formats::ArchiveFormat;
use crate::formats::CompressionType;
use crate::formats::compression::Encoder;

pub mod ar;
pub mod cpio;
pub mod sevenz;
pub mod tar;
pub mod zip;

/// Metadata of the entry a reader is positioned on.
#[derive(Debug, Clone)]
pub struct EntryHeader {
    /// Name as stored in the archive, `/`-separated.
    pub name: String,
    /// Whether the backend flagged this entry as a directory.
    pub is_directory: bool,
    /// Content size reported by the backend.
    pub size: u64,
    /// Modification time, when the format records one.
    pub last_modified: Option<SystemTime>,
    /// Format-specific permission metadata.
    pub attributes: AttributeAccessor,
    /// Link target, for symbolic and hard link entries.
    pub link: Option<EntryLink>,
}

/// Target of a link entry, as stored in the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryLink {
    /// Symbolic link; the target is relative to the link's own directory.
    Symbolic(String),
    /// Hard link to an earlier entry of the same archive.
    Hard(String),
}

impl EntryLink {
    /// The stored target path.
    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            Self::Symbolic(target) | Self::Hard(target) => target,
        }
    }
}

/// Description of an entry to be written.
#[derive(Debug, Clone)]
pub struct EntryDescriptor {
    /// Name inside the archive, `/`-separated, without a trailing slash.
    pub name: String,
    /// Source path on disk.
    pub source: PathBuf,
    /// Whether this is a directory entry.
    pub is_directory: bool,
    /// Content size in bytes, `0` for directories.
    pub size: u64,
    /// Permission bits to record, `None` for the format default.
    pub mode: Option<u32>,
    /// Modification time to record.
    pub last_modified: Option<SystemTime>,
}

impl EntryDescriptor {
    /// Mode to store: the recorded bits, or `0o755`/`0o644`.
    #[must_use]
    pub fn mode_or_default(&self) -> u32 {
        self.mode
            .unwrap_or(if self.is_directory { 0o755 } else { 0o644 })
    }

    /// Modification time as seconds since the unix epoch.
    #[must_use]
    pub fn mtime_secs(&self) -> u64 {
        self.last_modified
            .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
            .map_or(0, |d| d.as_secs())
    }
}

/// Sequential reader over the entries of an archive.
pub trait ArchiveReader {
    /// Advances to the next entry, skipping any unread content of the
    /// current one. Returns `None` at the end of the archive.
    fn next_entry(&mut self) -> Result<Option<EntryHeader>>;

    /// Returns a reader over the unread content of the current entry.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the reader is not positioned on an entry.
    fn entry_reader(&mut self) -> Result<Box<dyn Read + '_>>;

    /// Releases the underlying source. Calling it twice is harmless.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Writer appending entries to a new archive.
pub trait ArchiveWriter {
    /// Appends one entry. `content` is `None` for directories.
    fn write_entry(&mut self, entry: &EntryDescriptor, content: Option<&mut dyn Read>)
    -> Result<()>;

    /// Writes trailers and flushes the archive to disk.
    fn finish(self: Box<Self>) -> Result<()>;
}

/// Where archive bytes come from.
pub enum ArchiveInput {
    /// A seekable file on disk.
    File(File),
    /// A forward-only byte stream.
    Stream(Box<dyn Read>),
}

impl ArchiveInput {
    /// Returns a seekable source, spooling a stream into an anonymous
    /// temporary file first.
    fn into_seekable(self) -> Result<File> {
        match self {
            Self::File(file) => Ok(file),
            Self::Stream(mut reader) => {
                let mut spool = tempfile::tempfile()?;
                let copied = io::copy(&mut reader, &mut spool)?;
                spool.rewind()?;
                tracing::debug!(bytes = copied, "spooled archive stream to temporary file");
                Ok(spool)
            }
        }
    }

    fn into_stream(self, compression: Option<CompressionType>) -> Result<Box<dyn Read>> {
        let raw: Box<dyn Read> = match self {
            Self::File(file) => Box::new(BufReader::new(file)),
            Self::Stream(reader) => reader,
        };
        Ok(match compression {
            Some(codec) => Box::new(codec.decoder(raw)?),
            None => raw,
        })
    }
}

/// Output sink shared by the streamable writers.
pub(crate) enum Sink {
    Plain(BufWriter<File>),
    Compressed(Encoder<BufWriter<File>>),
}

impl Sink {
    fn new(file: File, compression: Option<CompressionType>, level: Option<u8>) -> Result<Self> {
        let buffered = BufWriter::new(file);
        Ok(match compression {
            Some(codec) => Self::Compressed(codec.encoder(buffered, level)?),
            None => Self::Plain(buffered),
        })
    }

    pub(crate) fn finish(self) -> io::Result<()> {
        let mut buffered = match self {
            Self::Plain(w) => w,
            Self::Compressed(e) => e.finish()?,
        };
        buffered.flush()?;
        buffered.into_inner().map_err(io::IntoInnerError::into_error)?.sync_all()
    }
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(w) => w.write(buf),
            Self::Compressed(e) => e.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(w) => w.flush(),
            Self::Compressed(e) => e.flush(),
        }
    }
}

/// Returns `Ok` if a backend exists for the pairing.
///
/// # Errors
///
/// Returns `UnsupportedFormat` for arj and for compression layered over a
/// random-access format.
pub fn ensure_supported(format: ArchiveFormat, compression: Option<CompressionType>) -> Result<()> {
    if format == ArchiveFormat::Arj {
        return Err(ArchiveError::unsupported("no arj codec is available"));
    }
    if let Some(codec) = compression
        && !format.supports_compression()
    {
        return Err(ArchiveError::unsupported(format!(
            "{format} archives cannot be wrapped in {codec}"
        )));
    }
    Ok(())
}

/// Opens a reader for `input`.
///
/// # Errors
///
/// Returns `UnsupportedFormat` for unsupported pairings, or the codec's
/// error if the archive cannot be opened.
pub fn open_reader(
    format: ArchiveFormat,
    compression: Option<CompressionType>,
    input: ArchiveInput,
) -> Result<Box<dyn ArchiveReader>> {
    ensure_supported(format, compression)?;
    tracing::debug!(%format, compression = ?compression, "opening archive for reading");

    Ok(match format {
        ArchiveFormat::Tar => Box::new(tar::TarReader::new(input.into_stream(compression)?)?),
        ArchiveFormat::Cpio => Box::new(cpio::CpioReader::new(input.into_stream(compression)?)),
        ArchiveFormat::Ar => Box::new(ar::ArReader::new(input.into_stream(compression)?)),
        ArchiveFormat::Zip | ArchiveFormat::Jar => {
            Box::new(zip::ZipReader::new(input.into_seekable()?)?)
        }
        ArchiveFormat::SevenZ => Box::new(sevenz::SevenZReader::new(input.into_seekable()?)?),
        ArchiveFormat::Arj => return Err(ArchiveError::unsupported("no arj codec is available")),
    })
}

/// Opens a writer producing a new archive in `file`.
///
/// # Errors
///
/// Returns `UnsupportedFormat` for unsupported pairings, or an I/O error if
/// the encoder cannot be initialised.
pub fn open_writer(
    format: ArchiveFormat,
    compression: Option<CompressionType>,
    level: Option<u8>,
    file: File,
) -> Result<Box<dyn ArchiveWriter>> {
    ensure_supported(format, compression)?;
    tracing::debug!(%format, compression = ?compression, "opening archive for writing");

    Ok(match format {
        ArchiveFormat::Tar => Box::new(tar::TarWriter::new(Sink::new(file, compression, level)?)),
        ArchiveFormat::Cpio => Box::new(cpio::CpioWriter::new(Sink::new(file, compression, level)?)),
        ArchiveFormat::Ar => Box::new(ar::ArWriter::new(Sink::new(file, compression, level)?)),
        ArchiveFormat::Zip | ArchiveFormat::Jar => Box::new(zip::ZipWriter::new(file, level)),
        ArchiveFormat::SevenZ => Box::new(sevenz::SevenZWriter::new(file)?),
        ArchiveFormat::Arj => return Err(ArchiveError::unsupported("no arj codec is available")),
    })
}

/// Reader over the remaining bytes of an entry that keeps the owner's
/// byte counter in sync.
pub(crate) struct Bounded<'a, R: Read + ?Sized> {
    inner: &'a mut R,
    remaining: &'a mut u64,
}

impl<'a, R: Read + ?Sized> Bounded<'a, R> {
    pub(crate) fn new(inner: &'a mut R, remaining: &'a mut u64) -> Self {
        Self { inner, remaining }
    }
}

impl<R: Read + ?Sized> Read for Bounded<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || *self.remaining == 0 {
            return Ok(0);
        }
        let max = usize::try_from(*self.remaining).unwrap_or(usize::MAX).min(buf.len());
        let n = self.inner.read(&mut buf[..max])?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "archive ended inside an entry",
            ));
        }
        *self.remaining -= n as u64;
        Ok(n)
    }
}

pub(crate) fn no_current_entry() -> ArchiveError {
    ArchiveError::invalid_state("reader is not positioned on an entry")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_compressed_zip() {
        let file = tempfile::tempfile().unwrap();
        let err = open_writer(ArchiveFormat::Zip, Some(CompressionType::Gzip), None, file)
            .err()
            .unwrap();
        assert!(matches!(err, ArchiveError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_rejects_arj() {
        let input = ArchiveInput::Stream(Box::new(io::empty()));
        let err = open_reader(ArchiveFormat::Arj, None, input).err().unwrap();
        assert!(matches!(err, ArchiveError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_bounded_tracks_remaining() {
        let data = b"abcdefgh";
        let mut src: &[u8] = data;
        let mut remaining = 5u64;
        let mut out = Vec::new();
        Bounded::new(&mut src, &mut remaining)
            .read_to_end(&mut out)
            .unwrap();
        assert_eq!(out, b"abcde");
        assert_eq!(remaining, 0);
        assert_eq!(src, b"fgh");
    }

    #[test]
    fn test_bounded_detects_truncation() {
        let mut src: &[u8] = b"abc";
        let mut remaining = 10u64;
        let mut out = Vec::new();
        let err = Bounded::new(&mut src, &mut remaining)
            .read_to_end(&mut out)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_bounded_empty_buffer_reads_nothing() {
        let mut src: &[u8] = b"abc";
        let mut remaining = 3u64;
        let mut bounded = Bounded::new(&mut src, &mut remaining);
        assert_eq!(bounded.read(&mut []).unwrap(), 0);
        let mut byte = [0u8; 1];
        assert_eq!(bounded.read(&mut byte).unwrap(), 1);
        assert_eq!(remaining, 2);
    }

    #[test]
    fn test_spool_stream_is_seekable() {
        let input = ArchiveInput::Stream(Box::new(io::Cursor::new(b"payload".to_vec())));
        let mut file = input.into_seekable().unwrap();
        let mut out = String::new();
        file.read_to_string(&mut out).unwrap();
        assert_eq!(out, "payload");
    }
}
