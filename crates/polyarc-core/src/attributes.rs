//! Normalised access to the mode stored by each archive format.
//!
//! Every backend hands its entries to the stream wrapped in an
//! [`AttributeAccessor`]. The variant records how the format carries
//! permission bits, so reading a mode is a `match` instead of a downcast.

use crate::mode::PERMISSION_MASK;

/// Format-specific view of an entry's permission metadata.
#[derive(Debug, Clone)]
pub enum AttributeAccessor {
    /// A tar header. The mode field is parsed lazily and may be malformed.
    Tar(Box<tar::Header>),

    /// A zip entry. Only archives written on unix hosts carry a mode.
    Zip {
        /// The unix mode from the external attributes, if any.
        unix_mode: Option<u32>,
    },

    /// A cpio entry, whose mode includes the file-type bits.
    Cpio {
        /// Raw `c_mode` value.
        mode: u32,
    },

    /// An ar member.
    Ar {
        /// Raw mode value from the member header.
        mode: u32,
    },

    /// An arj entry.
    Arj {
        /// Raw file mode from the local header.
        mode: u32,
    },

    /// A format without permission metadata (7z).
    Fallback,
}

impl AttributeAccessor {
    /// Returns the entry's mode as stored by the format.
    ///
    /// Formats without mode metadata, and zip entries written on non-unix
    /// hosts, report `0`.
    ///
    /// # Errors
    ///
    /// Returns the backend's error unchanged when the stored value cannot be
    /// parsed (a corrupt tar mode field, for instance).
    ///
    /// # Examples
    ///
    /// ```
    /// use polyarc_core::attributes::AttributeAccessor;
    ///
    /// let cpio = AttributeAccessor::Cpio { mode: 0o100_644 };
    /// assert_eq!(cpio.mode().unwrap(), 0o100_644);
    ///
    /// let sevenz = AttributeAccessor::Fallback;
    /// assert_eq!(sevenz.mode().unwrap(), 0);
    /// ```
    pub fn mode(&self) -> std::io::Result<u32> {
        match self {
            Self::Tar(header) => header.mode(),
            Self::Zip { unix_mode } => Ok(unix_mode.unwrap_or(0)),
            Self::Cpio { mode } | Self::Ar { mode } | Self::Arj { mode } => Ok(*mode),
            Self::Fallback => Ok(0),
        }
    }

    /// Returns `true` if the format records permissions for this entry.
    #[must_use]
    pub const fn has_mode(&self) -> bool {
        match self {
            Self::Tar(_) | Self::Cpio { .. } | Self::Ar { .. } | Self::Arj { .. } => true,
            Self::Zip { unix_mode } => unix_mode.is_some(),
            Self::Fallback => false,
        }
    }

    /// Returns the permission bits worth restoring on extraction.
    ///
    /// `None` when the format carries no mode or the stored permissions are
    /// all zero, which formats use to mean "unspecified".
    ///
    /// # Errors
    ///
    /// Propagates the error from [`mode`](Self::mode).
    pub fn restorable_mode(&self) -> std::io::Result<Option<u32>> {
        if !self.has_mode() {
            return Ok(None);
        }
        let mode = self.mode()? & PERMISSION_MASK;
        Ok((mode != 0).then_some(mode))
    }
}
