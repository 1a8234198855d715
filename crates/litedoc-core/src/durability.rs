//! Platform durable sync for the document file and its directory
//!
//! An atomic save is only crash-safe if the new file's data reaches the
//! device before the rename, and the rename itself reaches the device
//! afterwards. `sync_file` maps to the strongest per-platform primitive,
//! `sync_dir` persists directory entries where the platform allows it.

use std::fs::File;
use std::io;
use std::path::Path;

/// Block until `file`'s data is on persistent storage.
///
/// | Platform  | Primitive              |
/// |-----------|------------------------|
/// | Linux     | `fdatasync()`          |
/// | macOS/iOS | `fcntl(F_FULLFSYNC)`   |
/// | Windows   | `FlushFileBuffers()`   |
/// | Other     | `File::sync_data()`    |
///
/// Plain `fsync()` on Apple platforms returns once the drive has the data in
/// its cache, which does not survive power loss.
pub fn sync_file(file: &File) -> io::Result<()> {
    #[cfg(target_os = "linux")]
    {
        use std::os::unix::io::AsRawFd;
        // SAFETY: the descriptor belongs to `file`, which outlives the call.
        check(unsafe { libc::fdatasync(file.as_raw_fd()) })
    }

    #[cfg(any(target_os = "macos", target_os = "ios"))]
    {
        use std::os::unix::io::AsRawFd;
        // SAFETY: the descriptor belongs to `file`, which outlives the call.
        check(unsafe { libc::fcntl(file.as_raw_fd(), libc::F_FULLFSYNC) })
    }

    #[cfg(target_os = "windows")]
    {
        use std::os::windows::io::AsRawHandle;
        use winapi::um::fileapi::FlushFileBuffers;
        // SAFETY: the handle belongs to `file`, which outlives the call.
        let flushed = unsafe { FlushFileBuffers(file.as_raw_handle() as *mut _) };
        if flushed != 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }

    #[cfg(not(any(
        target_os = "linux",
        target_os = "macos",
        target_os = "ios",
        target_os = "windows"
    )))]
    {
        file.sync_data()
    }
}

/// Persist directory entries (creations, renames) under `dir`.
///
/// On Unix the directory is opened read-only and synced like a file. Some
/// filesystems (network mounts, FUSE, older HFS+ for `F_FULLFSYNC`) refuse
/// to sync a directory descriptor with `EINVAL`; that is reported as
/// success since there is nothing stronger to fall back to.
///
/// Windows cannot open a directory as a `File` without backup semantics and
/// NTFS journals the rename itself, so this is a no-op there.
pub fn sync_dir(dir: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        let handle = File::open(dir)?;
        match sync_file(&handle) {
            Err(err) if is_unsupported(&err) => {
                tracing::debug!(
                    dir = %dir.display(),
                    error = %err,
                    "directory sync not supported by filesystem"
                );
                Ok(())
            }
            other => other,
        }
    }

    #[cfg(not(unix))]
    {
        let _ = dir;
        Ok(())
    }
}

/// Map a libc return code to `io::Result`.
#[cfg(any(target_os = "linux", target_os = "macos", target_os = "ios"))]
fn check(ret: libc::c_int) -> io::Result<()> {
    if ret == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Whether a directory sync failed because the filesystem cannot do it.
#[cfg(unix)]
fn is_unsupported(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::EINVAL)
}
