//! Compression codecs layered over streamable archive formats.
//!
//! # Supported Codecs
//!
//! - **Gzip** (.gz): fast, universally supported
//! - **Bzip2** (.bz2): better ratio, slower
//! - **Xz** (.xz): best ratio, slowest
//! - **Zstd** (.zst): modern codec with fast decompression

use std::fmt;
use std::io;
use std::io::BufReader;
use std::io::Read;
use std::io::Write;

/// Compression codec.
///
/// # Examples
///
/// ```
/// use polyarc_core::formats::CompressionType;
///
/// assert_eq!(CompressionType::Gzip.suffix(), ".gz");
/// assert_eq!(CompressionType::Zstd.name(), "zstd");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionType {
    /// Bzip2 (Burrows-Wheeler).
    Bzip2,
    /// Gzip (deflate).
    Gzip,
    /// Xz (LZMA2).
    Xz,
    /// Zstandard.
    Zstd,
}

impl CompressionType {
    /// Every codec, in suffix-table order.
    pub const ALL: [Self; 4] = [Self::Bzip2, Self::Gzip, Self::Xz, Self::Zstd];

    /// Returns the file suffix for this codec, including the dot.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Bzip2 => ".bz2",
            Self::Gzip => ".gz",
            Self::Xz => ".xz",
            Self::Zstd => ".zst",
        }
    }

    /// Returns a human-readable name for this codec.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bzip2 => "bzip2",
            Self::Gzip => "gzip",
            Self::Xz => "xz",
            Self::Zstd => "zstd",
        }
    }

    /// Parses a codec name as produced by [`name`](Self::name).
    ///
    /// The short suffix forms (`gz`, `bz2`, `zst`) are accepted too.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|codec| codec.name() == name || &codec.suffix()[1..] == name)
    }

    /// Wraps `writer` in an encoder for this codec.
    ///
    /// `level` uses the 1-9 scale; `None` selects the codec default.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoder cannot be initialised.
    pub fn encoder<W: Write>(self, writer: W, level: Option<u8>) -> io::Result<Encoder<W>> {
        Ok(match self {
            Self::Bzip2 => Encoder::Bzip2(bzip2::write::BzEncoder::new(
                writer,
                bzip2_level(level),
            )),
            Self::Gzip => Encoder::Gzip(flate2::write::GzEncoder::new(
                writer,
                flate2_level(level),
            )),
            Self::Xz => Encoder::Xz(xz2::write::XzEncoder::new(writer, xz_level(level))),
            Self::Zstd => Encoder::Zstd(zstd::stream::write::Encoder::new(
                writer,
                zstd_level(level),
            )?),
        })
    }

    /// Wraps `reader` in a decoder for this codec.
    ///
    /// # Errors
    ///
    /// Returns an error if the decoder cannot be initialised.
    pub fn decoder<R: Read>(self, reader: R) -> io::Result<Decoder<R>> {
        Ok(match self {
            Self::Bzip2 => Decoder::Bzip2(bzip2::read::MultiBzDecoder::new(reader)),
            Self::Gzip => Decoder::Gzip(flate2::read::MultiGzDecoder::new(reader)),
            Self::Xz => Decoder::Xz(xz2::read::XzDecoder::new_multi_decoder(reader)),
            Self::Zstd => Decoder::Zstd(zstd::stream::read::Decoder::new(reader)?),
        })
    }
}

impl fmt::Display for CompressionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn flate2_level(level: Option<u8>) -> flate2::Compression {
    match level {
        None | Some(6) => flate2::Compression::default(),
        Some(1..=3) => flate2::Compression::fast(),
        Some(7..=9) => flate2::Compression::best(),
        Some(n) => flate2::Compression::new(u32::from(n.min(9))),
    }
}

fn bzip2_level(level: Option<u8>) -> bzip2::Compression {
    match level {
        None | Some(6) => bzip2::Compression::default(),
        Some(1) => bzip2::Compression::fast(),
        Some(7..=9) => bzip2::Compression::best(),
        Some(n) => bzip2::Compression::new(u32::from(n.clamp(1, 9))),
    }
}

fn xz_level(level: Option<u8>) -> u32 {
    level.map_or(6, |n| u32::from(n.min(9)))
}

/// Maps the 1-9 scale onto zstd's 1-22 range; zstd's default is 3.
fn zstd_level(level: Option<u8>) -> i32 {
    match level {
        None => 3,
        Some(1..=3) => 1,
        Some(7..=9) => 19,
        Some(n) => i32::from(n),
    }
}

/// A writer compressing into `W`.
pub enum Encoder<W: Write> {
    /// Bzip2 stream.
    Bzip2(bzip2::write::BzEncoder<W>),
    /// Gzip stream.
    Gzip(flate2::write::GzEncoder<W>),
    /// Xz stream.
    Xz(xz2::write::XzEncoder<W>),
    /// Zstandard stream.
    Zstd(zstd::stream::write::Encoder<'static, W>),
}

impl<W: Write> Encoder<W> {
    /// Writes the codec trailer and returns the inner writer.
    ///
    /// Dropping an encoder without calling this may leave a truncated
    /// stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the trailer cannot be written.
    pub fn finish(self) -> io::Result<W> {
        match self {
            Self::Bzip2(e) => e.finish(),
            Self::Gzip(e) => e.finish(),
            Self::Xz(e) => e.finish(),
            Self::Zstd(e) => e.finish(),
        }
    }
}

impl<W: Write> Write for Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Bzip2(e) => e.write(buf),
            Self::Gzip(e) => e.write(buf),
            Self::Xz(e) => e.write(buf),
            Self::Zstd(e) => e.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Bzip2(e) => e.flush(),
            Self::Gzip(e) => e.flush(),
            Self::Xz(e) => e.flush(),
            Self::Zstd(e) => e.flush(),
        }
    }
}

/// A reader decompressing from `R`.
pub enum Decoder<R: Read> {
    /// Bzip2 stream.
    Bzip2(bzip2::read::MultiBzDecoder<R>),
    /// Gzip stream.
    Gzip(flate2::read::MultiGzDecoder<R>),
    /// Xz stream.
    Xz(xz2::read::XzDecoder<R>),
    /// Zstandard stream.
    Zstd(zstd::stream::read::Decoder<'static, BufReader<R>>),
}

impl<R: Read> Read for Decoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Bzip2(d) => d.read(buf),
            Self::Gzip(d) => d.read(buf),
            Self::Xz(d) => d.read(buf),
            Self::Zstd(d) => d.read(buf),
        }
    }
}
