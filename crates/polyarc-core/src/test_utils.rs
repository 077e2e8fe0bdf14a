//! Test utilities shared by unit tests, integration tests and benches.
//!
//! # Panics
//!
//! All functions in this module may panic on I/O errors since they are
//! designed for test use only where panics are acceptable.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::BTreeMap;
use std::fs;
use std::io::Cursor;
use std::io::Write;
use std::path::Path;

/// Name of the over-long file in the fixture tree.
pub const LONG_FILE_NAME: &str = concat!(
    "looooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooo",
    "oooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooo",
    "ooooooooooong_filename.txt"
);

/// Relative paths of every entry in the fixture tree, directories without
/// a trailing slash.
pub const FIXTURE_ENTRIES: [&str; 12] = [
    "file.txt",
    LONG_FILE_NAME,
    "folder",
    "folder/folder_file.txt",
    "folder/subfolder",
    "folder/subfolder/subfolder_file.txt",
    "permissions",
    "permissions/executable_file.txt",
    "permissions/private_executable_file.txt",
    "permissions/readonly_file.txt",
    "permissions/private_folder",
    "permissions/private_folder/private_file.txt",
];

/// Builds the reference tree below `root`.
///
/// ```text
/// file.txt
/// looo...ong_filename.txt
/// folder/folder_file.txt
/// folder/subfolder/subfolder_file.txt
/// permissions/executable_file.txt          0755
/// permissions/private_executable_file.txt  0700
/// permissions/readonly_file.txt            0444
/// permissions/private_folder/              0700
/// permissions/private_folder/private_file.txt
/// ```
pub fn create_fixture_tree(root: &Path) {
    fs::create_dir_all(root.join("folder/subfolder")).unwrap();
    fs::create_dir_all(root.join("permissions/private_folder")).unwrap();

    fs::write(root.join("file.txt"), "file.txt content\n").unwrap();
    fs::write(root.join(LONG_FILE_NAME), "a file with a very long name\n").unwrap();
    fs::write(root.join("folder/folder_file.txt"), "folder_file.txt content\n").unwrap();
    fs::write(
        root.join("folder/subfolder/subfolder_file.txt"),
        "subfolder_file.txt content\n",
    )
    .unwrap();
    fs::write(root.join("permissions/executable_file.txt"), "#!/bin/sh\necho executable\n").unwrap();
    fs::write(
        root.join("permissions/private_executable_file.txt"),
        "#!/bin/sh\necho private\n",
    )
    .unwrap();
    fs::write(root.join("permissions/readonly_file.txt"), "read only\n").unwrap();
    fs::write(
        root.join("permissions/private_folder/private_file.txt"),
        "private content\n",
    )
    .unwrap();

    set_mode(&root.join("permissions/executable_file.txt"), 0o755);
    set_mode(&root.join("permissions/private_executable_file.txt"), 0o700);
    set_mode(&root.join("permissions/readonly_file.txt"), 0o444);
    set_mode(&root.join("permissions/private_folder"), 0o700);
}

/// Sets permission bits, a no-op off unix.
pub fn set_mode(path: &Path, mode: u32) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
    }
    #[cfg(not(unix))]
    {
        let _ = (path, mode);
    }
}

/// One node of a [`snapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Whether the node is a directory.
    pub is_dir: bool,
    /// File content, empty for directories.
    pub content: Vec<u8>,
    /// Permission bits (unix only, `0` elsewhere).
    pub mode: u32,
}

/// Captures every file and directory below `root`, keyed by `/`-separated
/// relative path.
#[must_use]
pub fn snapshot(root: &Path) -> BTreeMap<String, Node> {
    let mut nodes = BTreeMap::new();
    for entry in walkdir::WalkDir::new(root).min_depth(1) {
        let entry = entry.unwrap();
        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap()
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        let metadata = entry.metadata().unwrap();
        let is_dir = metadata.is_dir();
        nodes.insert(
            relative,
            Node {
                is_dir,
                content: if is_dir {
                    Vec::new()
                } else {
                    fs::read(entry.path()).unwrap()
                },
                mode: mode_of(&metadata),
            },
        );
    }
    nodes
}

#[cfg(unix)]
fn mode_of(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn mode_of(_metadata: &fs::Metadata) -> u32 {
    0
}

/// Returns `true` when running with an effective uid of 0, where
/// permission checks never fail.
#[must_use]
pub fn is_root() -> bool {
    #[cfg(unix)]
    {
        // SAFETY: geteuid() has no preconditions and cannot fail.
        #[allow(unsafe_code)]
        let euid = unsafe { libc::geteuid() };
        euid == 0
    }
    #[cfg(not(unix))]
    {
        false
    }
}

/// Creates an in-memory tar archive from `(path, content)` pairs.
///
/// Paths ending in `/` become directory entries. Names are written into
/// the raw header so that unsafe names (`../x`, `/etc/x`) survive.
///
/// # Examples
///
/// ```
/// use polyarc_core::test_utils::create_test_tar;
///
/// let data = create_test_tar(&[("dir/", b""), ("dir/file.txt", b"hello")]);
/// assert_eq!(data.len() % 512, 0);
/// ```
#[must_use]
pub fn create_test_tar(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (path, data) in entries {
        let mut header = tar::Header::new_gnu();
        let name_field = &mut header.as_old_mut().name;
        name_field[..path.len()].copy_from_slice(path.as_bytes());
        if path.ends_with('/') {
            header.set_entry_type(tar::EntryType::Directory);
            header.set_mode(0o755);
            header.set_size(0);
        } else {
            header.set_entry_type(tar::EntryType::Regular);
            header.set_mode(0o644);
            header.set_size(data.len() as u64);
        }
        header.set_mtime(1_700_000_000);
        header.set_cksum();
        builder.append(&header, *data).unwrap();
    }
    builder.into_inner().unwrap()
}

/// Creates an in-memory tar archive holding `orig.txt`, a hard link
/// `link.txt` and a symbolic link `sym.txt`, both pointing at `orig.txt`.
#[must_use]
pub fn create_linked_tar() -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());

    let mut header = tar::Header::new_gnu();
    header.set_mode(0o644);
    header.set_size(9);
    header.set_mtime(1_700_000_000);
    header.set_cksum();
    builder.append_data(&mut header, "orig.txt", &b"original\n"[..]).unwrap();

    let links = [
        ("link.txt", tar::EntryType::Link, 0o644),
        ("sym.txt", tar::EntryType::Symlink, 0o777),
    ];
    for (name, kind, mode) in links {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(kind);
        header.set_mode(mode);
        header.set_size(0);
        header.set_mtime(1_700_000_000);
        builder.append_link(&mut header, name, "orig.txt").unwrap();
    }
    builder.into_inner().unwrap()
}

/// Creates an in-memory zip archive from `(path, content)` pairs, stored
/// uncompressed. Files get mode `0o644`, directories (ending in `/`) `0o755`.
#[must_use]
pub fn create_test_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    use zip::write::SimpleFileOptions;
    use zip::write::ZipWriter;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored)
        .unix_permissions(0o644);

    for (path, data) in entries {
        if path.ends_with('/') {
            zip.add_directory(*path, options.unix_permissions(0o755)).unwrap();
        } else {
            zip.start_file(*path, options).unwrap();
            zip.write_all(data).unwrap();
        }
    }
    zip.finish().unwrap().into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_tree_shape() {
        let temp = tempfile::TempDir::new().unwrap();
        create_fixture_tree(temp.path());
        let nodes = snapshot(temp.path());
        let names: Vec<_> = nodes.keys().map(String::as_str).collect();
        let mut expected = FIXTURE_ENTRIES.to_vec();
        expected.sort_unstable();
        assert_eq!(names, expected);
        #[cfg(unix)]
        assert_eq!(nodes["permissions/readonly_file.txt"].mode, 0o444);
    }

    #[test]
    fn test_create_test_tar_keeps_raw_names() {
        let data = create_test_tar(&[("../escape.txt", b"x")]);
        let mut archive = tar::Archive::new(data.as_slice());
        let entry = archive.entries().unwrap().next().unwrap().unwrap();
        assert_eq!(entry.path_bytes().as_ref(), b"../escape.txt");
    }
}
