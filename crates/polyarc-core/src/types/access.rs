//! Effective permission probes.

use std::io;
use std::path::Path;

/// Access mode to probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Access {
    Read,
    Write,
}

/// Returns `true` if the current process may access `path` in `mode`.
///
/// On unix this asks the kernel through `access(2)`, which honours the
/// effective uid and ACLs without opening anything.
#[cfg(unix)]
pub(crate) fn check(path: &Path, mode: Access) -> io::Result<bool> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains null byte"))?;
    let flag = match mode {
        Access::Read => libc::R_OK,
        Access::Write => libc::W_OK,
    };

    // SAFETY: `c_path` is a valid NUL-terminated string that outlives the
    // call, and access() does not retain the pointer.
    #[allow(unsafe_code)]
    let result = unsafe { libc::access(c_path.as_ptr(), flag) };
    Ok(result == 0)
}

#[cfg(not(unix))]
pub(crate) fn check(path: &Path, mode: Access) -> io::Result<bool> {
    let metadata = std::fs::metadata(path)?;
    Ok(match mode {
        Access::Read if metadata.is_dir() => std::fs::read_dir(path).is_ok(),
        Access::Read => std::fs::File::open(path).is_ok(),
        Access::Write => !metadata.permissions().readonly(),
    })
}
