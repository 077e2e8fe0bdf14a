//! Conversion between integer modes and POSIX permission sets.
//!
//! Only the low nine bits of a mode carry permissions: three triplets for
//! owner, group and others, each decoded as read (bit 2), write (bit 1) and
//! execute (bit 0). File-type and setuid/setgid/sticky bits are ignored.

use std::collections::BTreeSet;
use std::fs::Metadata;
use std::path::Path;

/// Mask selecting the nine permission bits of a mode.
pub const PERMISSION_MASK: u32 = 0o777;

/// One of the nine POSIX read/write/execute flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PosixPermission {
    /// `0o400`
    OwnerRead,
    /// `0o200`
    OwnerWrite,
    /// `0o100`
    OwnerExecute,
    /// `0o040`
    GroupRead,
    /// `0o020`
    GroupWrite,
    /// `0o010`
    GroupExecute,
    /// `0o004`
    OthersRead,
    /// `0o002`
    OthersWrite,
    /// `0o001`
    OthersExecute,
}

impl PosixPermission {
    /// All nine permissions, highest bit first.
    pub const ALL: [Self; 9] = [
        Self::OwnerRead,
        Self::OwnerWrite,
        Self::OwnerExecute,
        Self::GroupRead,
        Self::GroupWrite,
        Self::GroupExecute,
        Self::OthersRead,
        Self::OthersWrite,
        Self::OthersExecute,
    ];

    /// Returns the mode bit this permission occupies.
    ///
    /// # Examples
    ///
    /// ```
    /// use polyarc_core::mode::PosixPermission;
    ///
    /// assert_eq!(PosixPermission::OwnerRead.bit(), 0o400);
    /// assert_eq!(PosixPermission::OthersExecute.bit(), 0o001);
    /// ```
    #[must_use]
    pub const fn bit(self) -> u32 {
        match self {
            Self::OwnerRead => 0o400,
            Self::OwnerWrite => 0o200,
            Self::OwnerExecute => 0o100,
            Self::GroupRead => 0o040,
            Self::GroupWrite => 0o020,
            Self::GroupExecute => 0o010,
            Self::OthersRead => 0o004,
            Self::OthersWrite => 0o002,
            Self::OthersExecute => 0o001,
        }
    }
}

/// An unordered set of POSIX permissions.
pub type PermissionSet = BTreeSet<PosixPermission>;

/// Decodes the permission bits of `mode` into a permission set.
///
/// Bits above `0o777` are ignored.
///
/// # Examples
///
/// ```
/// use polyarc_core::mode::{PosixPermission, to_permissions};
///
/// let perms = to_permissions(0o640);
/// assert_eq!(perms.len(), 3);
/// assert!(perms.contains(&PosixPermission::OwnerRead));
/// assert!(perms.contains(&PosixPermission::OwnerWrite));
/// assert!(perms.contains(&PosixPermission::GroupRead));
/// ```
#[must_use]
pub fn to_permissions(mode: u32) -> PermissionSet {
    PosixPermission::ALL
        .into_iter()
        .filter(|perm| mode & perm.bit() != 0)
        .collect()
}

/// Encodes a permission set as an integer mode.
///
/// This is the inverse of [`to_permissions`] on the low nine bits.
///
/// # Examples
///
/// ```
/// use polyarc_core::mode::{to_mode, to_permissions};
///
/// assert_eq!(to_mode(&to_permissions(0o755)), 0o755);
/// assert_eq!(to_mode(&to_permissions(0o100_644)), 0o644);
/// ```
#[must_use]
pub fn to_mode(permissions: &PermissionSet) -> u32 {
    permissions.iter().fold(0, |mode, perm| mode | perm.bit())
}

/// Reads the permission bits of a filesystem entry.
///
/// On platforms without POSIX modes a mode is synthesised from the
/// read-only flag: `0o555` or `0o755` for directories, `0o444` or `0o644`
/// for everything else.
#[must_use]
pub fn mode_from_metadata(metadata: &Metadata) -> u32 {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & PERMISSION_MASK
    }
    #[cfg(not(unix))]
    {
        let base = if metadata.is_dir() { 0o755 } else { 0o644 };
        if metadata.permissions().readonly() {
            base & !0o222
        } else {
            base
        }
    }
}

/// Applies the permission bits of `mode` to `path`.
///
/// # Errors
///
/// Returns an error if the permissions cannot be changed.
pub fn apply_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(
            path,
            std::fs::Permissions::from_mode(to_mode(&to_permissions(mode))),
        )
    }
    #[cfg(not(unix))]
    {
        let mut perms = std::fs::metadata(path)?.permissions();
        perms.set_readonly(mode & PosixPermission::OwnerWrite.bit() == 0);
        std::fs::set_permissions(path, perms)
    }
}
