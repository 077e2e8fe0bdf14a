//! Archive container formats.

use std::fmt;

/// Archive container format.
///
/// # Examples
///
/// ```
/// use polyarc_core::formats::ArchiveFormat;
///
/// assert_eq!(ArchiveFormat::Tar.suffix(), ".tar");
/// assert!(ArchiveFormat::Zip.requires_seek());
/// assert!(ArchiveFormat::Cpio.supports_compression());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    /// Unix `ar` archive.
    Ar,
    /// ARJ archive.
    Arj,
    /// cpio archive (newc variant).
    Cpio,
    /// Java archive, a zip with a different suffix.
    Jar,
    /// 7z archive.
    SevenZ,
    /// tar archive.
    Tar,
    /// ZIP archive.
    Zip,
}

impl ArchiveFormat {
    /// Every format, in suffix-table order.
    pub const ALL: [Self; 7] = [
        Self::Ar,
        Self::Arj,
        Self::Cpio,
        Self::Jar,
        Self::SevenZ,
        Self::Tar,
        Self::Zip,
    ];

    /// Returns the file suffix for this format, including the dot.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Ar => ".ar",
            Self::Arj => ".arj",
            Self::Cpio => ".cpio",
            Self::Jar => ".jar",
            Self::SevenZ => ".7z",
            Self::Tar => ".tar",
            Self::Zip => ".zip",
        }
    }

    /// Returns the lowercase format name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ar => "ar",
            Self::Arj => "arj",
            Self::Cpio => "cpio",
            Self::Jar => "jar",
            Self::SevenZ => "7z",
            Self::Tar => "tar",
            Self::Zip => "zip",
        }
    }

    /// Parses a format name as produced by [`name`](Self::name).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|format| format.name() == name)
    }

    /// Returns `true` if reading this format needs random access.
    #[must_use]
    pub const fn requires_seek(self) -> bool {
        matches!(self, Self::Jar | Self::SevenZ | Self::Zip)
    }

    /// Returns `true` if this format can be wrapped in a compression codec.
    #[must_use]
    pub const fn supports_compression(self) -> bool {
        matches!(self, Self::Ar | Self::Cpio | Self::Tar)
    }

    /// Returns `true` if this format can store directory entries.
    #[must_use]
    pub const fn supports_directories(self) -> bool {
        !matches!(self, Self::Ar)
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffixes_start_with_dot() {
        for format in ArchiveFormat::ALL {
            assert!(format.suffix().starts_with('.'));
            assert_eq!(&format.suffix()[1..], format.name());
        }
    }

    #[test]
    fn test_from_name() {
        assert_eq!(ArchiveFormat::from_name("7z"), Some(ArchiveFormat::SevenZ));
        assert_eq!(ArchiveFormat::from_name("cpio"), Some(ArchiveFormat::Cpio));
        assert_eq!(ArchiveFormat::from_name("TAR"), None);
    }

    #[test]
    fn test_capabilities() {
        assert!(ArchiveFormat::Tar.supports_compression());
        assert!(!ArchiveFormat::Zip.supports_compression());
        assert!(!ArchiveFormat::Tar.requires_seek());
        assert!(ArchiveFormat::SevenZ.requires_seek());
        assert!(!ArchiveFormat::Ar.supports_directories());
    }
}
