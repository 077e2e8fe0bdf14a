//! Single-file compression.

use std::fs;
use std::fs::File;
use std::io;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use crate::ArchiveError;
use crate::Result;
use crate::formats::CompressionType;
use crate::formats::FileType;
use crate::types::DestDir;
use crate::types::SourcePath;

/// Compresses and decompresses single files with one codec.
///
/// # Examples
///
/// ```no_run
/// use polyarc_core::Compressor;
/// use polyarc_core::formats::CompressionType;
///
/// # fn main() -> polyarc_core::Result<()> {
/// let gzip = Compressor::new(CompressionType::Gzip);
/// let packed = gzip.compress("access.log", "/var/archive")?;
/// assert!(packed.ends_with("access.log.gz"));
/// gzip.decompress(&packed, "/tmp")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Compressor {
    compression: CompressionType,
    level: Option<u8>,
}

impl Compressor {
    /// Creates a compressor using the codec's default level.
    #[must_use]
    pub const fn new(compression: CompressionType) -> Self {
        Self {
            compression,
            level: None,
        }
    }

    /// Creates a compressor for the codec implied by `path`'s suffix.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedFormat` if the suffix names no compression, or
    /// names an archive container such as `.tar.gz`.
    pub fn for_path(path: impl AsRef<Path>) -> Result<Self> {
        let file_type = FileType::resolve(path.as_ref());
        match (file_type.archive_format, file_type.compression_type) {
            (None, Some(compression)) => Ok(Self::new(compression)),
            (Some(format), _) => Err(ArchiveError::unsupported(format!(
                "{} is a {format} archive, not a compressed file",
                path.as_ref().display()
            ))),
            (None, None) => Err(ArchiveError::unsupported(format!(
                "no compression suffix on {}",
                path.as_ref().display()
            ))),
        }
    }

    /// Sets the compression level (1-9).
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `level` is outside 1-9.
    pub fn with_level(mut self, level: u8) -> Result<Self> {
        if !(1..=9).contains(&level) {
            return Err(ArchiveError::invalid_argument(format!(
                "compression level {level} is outside 1-9"
            )));
        }
        self.level = Some(level);
        Ok(self)
    }

    /// The codec.
    #[must_use]
    pub const fn compression(&self) -> CompressionType {
        self.compression
    }

    /// Compresses `source` and returns the path of the compressed file.
    ///
    /// If `destination` is an existing directory the output is
    /// `<destination>/<source name><suffix>`; otherwise `destination` is
    /// the output file itself and its parent must be a writable directory.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for an unusable destination, or a source that
    ///   is not a regular file
    /// - `SourceNotFound` / `SourceUnreadable` for an unusable source
    /// - I/O errors, unchanged
    pub fn compress(
        &self,
        source: impl AsRef<Path>,
        destination: impl AsRef<Path>,
    ) -> Result<PathBuf> {
        let source = source.as_ref();
        let output = output_path(destination.as_ref(), || {
            let name = file_name(source)?;
            Ok(format!("{name}{}", self.compression.suffix()))
        })?;
        let source = regular_file(source)?;

        tracing::debug!(
            source = %source.as_path().display(),
            output = %output.display(),
            codec = %self.compression,
            "compressing file"
        );
        let mut input = BufReader::new(File::open(source.as_path())?);
        let file = File::create(&output)?;
        let mut encoder = self.compression.encoder(BufWriter::new(file), self.level)?;
        io::copy(&mut input, &mut encoder)?;
        finish(encoder.finish()?)?;
        Ok(output)
    }

    /// Decompresses `source` and returns the path of the restored file.
    ///
    /// If `destination` is an existing directory the output name is the
    /// source name without the codec suffix, or the full source name when
    /// it lacks the suffix.
    ///
    /// # Errors
    ///
    /// Same as [`compress`](Self::compress), plus codec errors for corrupt
    /// input.
    pub fn decompress(
        &self,
        source: impl AsRef<Path>,
        destination: impl AsRef<Path>,
    ) -> Result<PathBuf> {
        let source = source.as_ref();
        let output = output_path(destination.as_ref(), || {
            let name = file_name(source)?;
            let suffix = self.compression.suffix();
            Ok(match name.strip_suffix(suffix) {
                Some(stem) if !stem.is_empty() => stem.to_string(),
                _ => name,
            })
        })?;
        let source = regular_file(source)?;

        tracing::debug!(
            source = %source.as_path().display(),
            output = %output.display(),
            codec = %self.compression,
            "decompressing file"
        );
        let input = BufReader::new(File::open(source.as_path())?);
        self.decode_into(input, &output)?;
        Ok(output)
    }

    /// Decompresses a byte stream into `destination_file`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the parent of `destination_file` is not
    /// a writable directory, or codec and I/O errors.
    pub fn decompress_reader(
        &self,
        reader: impl Read,
        destination_file: impl AsRef<Path>,
    ) -> Result<PathBuf> {
        let output = destination_file.as_ref().to_path_buf();
        DestDir::new(parent_dir(&output))?;
        self.decode_into(reader, &output)?;
        Ok(output)
    }

    fn decode_into(&self, reader: impl Read, output: &Path) -> Result<()> {
        let mut decoder = self.compression.decoder(reader)?;
        let mut writer = BufWriter::new(File::create(output)?);
        io::copy(&mut decoder, &mut writer)?;
        finish(writer)
    }
}

/// Resolves the output file: inside `destination` when it is a directory,
/// `destination` itself otherwise.
fn output_path(destination: &Path, name: impl FnOnce() -> Result<String>) -> Result<PathBuf> {
    if destination.is_dir() {
        let dir = DestDir::new(destination)?;
        return Ok(dir.join(name()?));
    }
    DestDir::new(parent_dir(destination))?;
    Ok(destination.to_path_buf())
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            ArchiveError::invalid_argument(format!("no file name in {}", path.display()))
        })
}

fn regular_file(path: &Path) -> Result<SourcePath> {
    let source = SourcePath::new(path)?;
    if !fs::metadata(source.as_path())?.is_file() {
        return Err(ArchiveError::invalid_argument(format!(
            "not a regular file: {}",
            path.display()
        )));
    }
    Ok(source)
}

fn finish(mut writer: BufWriter<File>) -> Result<()> {
    writer.flush()?;
    writer
        .into_inner()
        .map_err(io::IntoInnerError::into_error)?
        .sync_all()?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const BODY: &str = "line of text that compresses well\n";

    fn source(temp: &TempDir) -> PathBuf {
        let path = temp.path().join("data.txt");
        fs::write(&path, BODY.repeat(200)).unwrap();
        path
    }

    #[test]
    fn test_roundtrip_every_codec() {
        for codec in CompressionType::ALL {
            let temp = TempDir::new().unwrap();
            let src = source(&temp);
            let packed_dir = temp.path().join("packed");
            let out_dir = temp.path().join("out");
            fs::create_dir(&packed_dir).unwrap();
            fs::create_dir(&out_dir).unwrap();

            let compressor = Compressor::new(codec).with_level(9).unwrap();
            let packed = compressor.compress(&src, &packed_dir).unwrap();
            assert_eq!(
                packed.file_name().unwrap().to_str().unwrap(),
                format!("data.txt{}", codec.suffix())
            );
            assert!(fs::metadata(&packed).unwrap().len() < fs::metadata(&src).unwrap().len());

            let restored = compressor.decompress(&packed, &out_dir).unwrap();
            assert_eq!(restored, out_dir.join("data.txt"));
            assert_eq!(fs::read_to_string(restored).unwrap(), BODY.repeat(200));
        }
    }

    #[test]
    fn test_explicit_output_file() {
        let temp = TempDir::new().unwrap();
        let src = source(&temp);
        let target = temp.path().join("custom.bin");
        let out = Compressor::new(CompressionType::Xz).compress(&src, &target).unwrap();
        assert_eq!(out, target);

        let restored = temp.path().join("restored.txt");
        let file = File::open(&target).unwrap();
        Compressor::new(CompressionType::Xz)
            .decompress_reader(file, &restored)
            .unwrap();
        assert_eq!(fs::read_to_string(restored).unwrap(), BODY.repeat(200));
    }

    #[test]
    fn test_decompress_keeps_name_without_suffix() {
        let temp = TempDir::new().unwrap();
        let src = source(&temp);
        let odd = temp.path().join("payload");
        Compressor::new(CompressionType::Gzip).compress(&src, &odd).unwrap();

        let out_dir = temp.path().join("out");
        fs::create_dir(&out_dir).unwrap();
        let restored = Compressor::new(CompressionType::Gzip)
            .decompress(&odd, &out_dir)
            .unwrap();
        assert_eq!(restored, out_dir.join("payload"));
    }

    #[test]
    fn test_missing_source() {
        let temp = TempDir::new().unwrap();
        let err = Compressor::new(CompressionType::Gzip)
            .compress(temp.path().join("missing"), temp.path())
            .unwrap_err();
        assert!(matches!(err, ArchiveError::SourceNotFound { .. }));
    }

    #[test]
    fn test_directory_source_rejected() {
        let temp = TempDir::new().unwrap();
        let err = Compressor::new(CompressionType::Gzip)
            .compress(temp.path(), temp.path())
            .unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidArgument { .. }));
    }

    #[test]
    fn test_missing_parent_is_invalid_argument() {
        let temp = TempDir::new().unwrap();
        let src = source(&temp);
        let err = Compressor::new(CompressionType::Gzip)
            .compress(&src, temp.path().join("no/such/dir/out.gz"))
            .unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidArgument { .. }));
    }

    #[test]
    fn test_corrupt_input_fails() {
        let temp = TempDir::new().unwrap();
        let bogus = temp.path().join("bogus.gz");
        fs::write(&bogus, b"definitely not gzip").unwrap();
        let out = temp.path().join("out");
        fs::create_dir(&out).unwrap();
        assert!(Compressor::new(CompressionType::Gzip).decompress(&bogus, &out).is_err());
    }

    #[test]
    fn test_for_path() {
        assert_eq!(
            Compressor::for_path("a/b.txt.zst").unwrap().compression(),
            CompressionType::Zstd
        );
        assert!(Compressor::for_path("site.tar.gz").is_err());
        assert!(Compressor::for_path("notes.txt").is_err());
    }

    #[test]
    fn test_level_bounds() {
        assert!(Compressor::new(CompressionType::Bzip2).with_level(0).is_err());
        assert!(Compressor::new(CompressionType::Bzip2).with_level(10).is_err());
    }
}
