//! Suffix-based file type resolution.
//!
//! The resolver consults a single ordered table. Combined suffixes such as
//! `.tar.gz` and `.tgz` come first, then plain archive suffixes, then plain
//! compression suffixes. The first entry whose literal is a suffix of the
//! path wins, so `file.tar.gz` resolves to tar + gzip rather than gzip
//! alone. Matching is exact and case-sensitive.

use std::path::Path;

use super::ArchiveFormat;
use super::CompressionType;

/// The archive format and compression implied by a file name.
///
/// # Examples
///
/// ```
/// use polyarc_core::formats::{ArchiveFormat, CompressionType, FileType};
///
/// let ft = FileType::resolve("backups/site.tar.gz");
/// assert_eq!(ft.archive_format, Some(ArchiveFormat::Tar));
/// assert_eq!(ft.compression_type, Some(CompressionType::Gzip));
/// assert_eq!(ft.suffix, ".tar.gz");
///
/// assert_eq!(FileType::resolve("notes.txt"), FileType::UNKNOWN);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileType {
    /// Container format, if the suffix names one.
    pub archive_format: Option<ArchiveFormat>,
    /// Compression codec, if the suffix names one.
    pub compression_type: Option<CompressionType>,
    /// The matched or composed suffix, empty for [`FileType::UNKNOWN`].
    pub suffix: String,
}

struct Suffix {
    literal: &'static str,
    archive_format: Option<ArchiveFormat>,
    compression_type: Option<CompressionType>,
}

const fn entry(
    literal: &'static str,
    archive_format: Option<ArchiveFormat>,
    compression_type: Option<CompressionType>,
) -> Suffix {
    Suffix {
        literal,
        archive_format,
        compression_type,
    }
}

impl Suffix {
    fn file_type(&self) -> FileType {
        FileType {
            archive_format: self.archive_format,
            compression_type: self.compression_type,
            suffix: self.literal.to_string(),
        }
    }
}

/// Suffix table in precedence order.
const SUFFIX_TABLE: &[Suffix] = &[
    entry(".tar.gz", Some(ArchiveFormat::Tar), Some(CompressionType::Gzip)),
    entry(".tgz", Some(ArchiveFormat::Tar), Some(CompressionType::Gzip)),
    entry(".tar.bz2", Some(ArchiveFormat::Tar), Some(CompressionType::Bzip2)),
    entry(".tbz2", Some(ArchiveFormat::Tar), Some(CompressionType::Bzip2)),
    entry(".tbz", Some(ArchiveFormat::Tar), Some(CompressionType::Bzip2)),
    entry(".tar.xz", Some(ArchiveFormat::Tar), Some(CompressionType::Xz)),
    entry(".txz", Some(ArchiveFormat::Tar), Some(CompressionType::Xz)),
    entry(".tar.zst", Some(ArchiveFormat::Tar), Some(CompressionType::Zstd)),
    entry(".tzst", Some(ArchiveFormat::Tar), Some(CompressionType::Zstd)),
    entry(".ar", Some(ArchiveFormat::Ar), None),
    entry(".arj", Some(ArchiveFormat::Arj), None),
    entry(".cpio", Some(ArchiveFormat::Cpio), None),
    entry(".jar", Some(ArchiveFormat::Jar), None),
    entry(".7z", Some(ArchiveFormat::SevenZ), None),
    entry(".tar", Some(ArchiveFormat::Tar), None),
    entry(".zip", Some(ArchiveFormat::Zip), None),
    entry(".bz2", None, Some(CompressionType::Bzip2)),
    entry(".gz", None, Some(CompressionType::Gzip)),
    entry(".xz", None, Some(CompressionType::Xz)),
    entry(".zst", None, Some(CompressionType::Zstd)),
];

impl FileType {
    /// The value for a name no table entry matches.
    pub const UNKNOWN: Self = Self {
        archive_format: None,
        compression_type: None,
        suffix: String::new(),
    };

    /// Resolves the file type of `path` from its suffix.
    ///
    /// Only the final path component is considered. Non-UTF-8 names are
    /// unknown.
    #[must_use]
    pub fn resolve(path: impl AsRef<Path>) -> Self {
        let Some(name) = path.as_ref().file_name().and_then(|n| n.to_str()) else {
            return Self::UNKNOWN;
        };
        Self::resolve_name(name)
    }

    /// Resolves the file type of a bare file name.
    #[must_use]
    pub fn resolve_name(name: &str) -> Self {
        SUFFIX_TABLE
            .iter()
            .find(|entry| name.len() > entry.literal.len() && name.ends_with(entry.literal))
            .map_or(Self::UNKNOWN, Suffix::file_type)
    }

    /// Builds the file type for an explicit format and optional codec.
    ///
    /// The suffix is the canonical long form: `.tar.gz` for tar + gzip, and
    /// the format suffix followed by the codec suffix for pairings the
    /// table has no literal for, such as `.cpio.gz`.
    #[must_use]
    pub fn of(format: ArchiveFormat, compression: Option<CompressionType>) -> Self {
        SUFFIX_TABLE
            .iter()
            .find(|entry| {
                entry.archive_format == Some(format) && entry.compression_type == compression
            })
            .map_or_else(
                || Self {
                    archive_format: Some(format),
                    compression_type: compression,
                    suffix: format!(
                        "{}{}",
                        format.suffix(),
                        compression.map_or("", CompressionType::suffix)
                    ),
                },
                Suffix::file_type,
            )
    }

    /// Returns `true` if the suffix names an archive container.
    #[must_use]
    pub const fn is_archive(&self) -> bool {
        self.archive_format.is_some()
    }

    /// Returns `true` if the suffix names a compression codec.
    #[must_use]
    pub const fn is_compressed(&self) -> bool {
        self.compression_type.is_some()
    }

    /// Returns `true` if nothing matched.
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        self.archive_format.is_none() && self.compression_type.is_none()
    }
}
