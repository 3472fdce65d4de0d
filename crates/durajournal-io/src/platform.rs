//! Platform strategy for durable file I/O.
//!
//! The [`Platform`] trait is the seam between the journal lifecycle and the
//! operating system. Each target gets one implementation:
//!
//! - [`Posix`](crate::Posix): `O_DIRECT | O_DSYNC`, explicit unlink for
//!   ephemeral journals, `fstatfs`-based directory sync policy
//! - [`Windows`](crate::Windows): `FILE_FLAG_NO_BUFFERING |
//!   FILE_FLAG_WRITE_THROUGH`, `FILE_FLAG_DELETE_ON_CLOSE`
//!
//! [`NativePlatform`] names the implementation for the current target. Tests
//! wrap it to inject failures into individual steps.

#[cfg(not(any(target_os = "linux", target_os = "android")))]
use std::cell::Cell;
use std::fs::File;
use std::io;
use std::path::Path;
#[cfg(not(any(target_os = "linux", target_os = "android")))]
use std::sync::atomic::{AtomicU64, Ordering};

use fs2::FileExt;

use crate::dir_sync::DirSyncPolicy;
use crate::{JournalError, OpenFlags};

#[cfg(unix)]
pub type NativePlatform = crate::posix::Posix;

#[cfg(windows)]
pub type NativePlatform = crate::windows::Windows;

/// Durable I/O primitives for one operating system.
///
/// All methods are synchronous and blocking.
pub trait Platform {
    /// Whether the OS itself removes a delete-on-close file when its handle
    /// closes. When false, the journal unlinks the file explicitly.
    fn deletes_on_close(&self) -> bool;

    /// Opens (creating if absent) a file for writing with the given flags.
    fn open_for_write(&self, path: &Path, flags: OpenFlags) -> io::Result<File>;

    /// Completes enabling unbuffered I/O on a freshly opened file.
    ///
    /// A no-op where the open flags already do the whole job.
    fn finish_unbuffered(&self, file: &File) -> io::Result<()>;

    /// Opens an existing file for reading.
    fn open_for_read(&self, path: &Path) -> io::Result<File>;

    /// Writes at an absolute offset. May write fewer bytes than requested.
    fn write_at(&self, file: &File, buf: &[u8], offset: u64) -> io::Result<usize>;

    /// Reads at an absolute offset. Returns 0 at end of file.
    fn read_at(&self, file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize>;

    /// Forces buffered writes to stable storage.
    fn flush(&self, file: &File) -> Result<(), JournalError>;

    /// Returns the current length of the file.
    fn file_size(&self, file: &File) -> Result<u64, JournalError>;

    /// Determines whether `dir` may have its metadata synced.
    fn directory_sync_policy(&self, dir: &Path) -> Result<DirSyncPolicy, JournalError>;

    /// Syncs the metadata of the directory containing `path`, if the
    /// directory sync policy allows it.
    fn sync_directory_for(&self, path: &Path) -> Result<(), JournalError>;

    /// Closes the file, reporting errors that dropping would swallow.
    fn close(&self, file: File) -> io::Result<()>;

    /// Whether `err` is the OS "invalid argument" error.
    fn is_invalid_argument(&self, err: &io::Error) -> bool;

    /// Whether `err` means the filesystem can not preallocate space.
    fn is_unsupported(&self, err: &io::Error) -> bool;

    /// Identifier of the calling thread.
    fn current_thread_id(&self) -> u64;

    /// Removes `path` from the filesystem namespace.
    fn unlink(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }

    /// Reserves `len` bytes of disk space starting at offset 0, extending
    /// the file if it is shorter.
    fn preallocate(&self, file: &File, len: u64) -> io::Result<()> {
        file.allocate(len)
    }

    /// Resizes the file to exactly `size` bytes. See [`resize_file`].
    fn resize(&self, file: &File, size: u64) -> Result<(), JournalError> {
        resize_file(self, file, size)
    }
}

/// Resizes `file` to exactly `size` bytes using `platform`'s preallocation.
///
/// Growth reserves the space up front so that running out of disk shows up
/// here rather than on a later write. Filesystems without preallocation fall
/// back to a sparse extension.
pub fn resize_file<P: Platform + ?Sized>(
    platform: &P,
    file: &File,
    size: u64,
) -> Result<(), JournalError> {
    let current = file
        .metadata()
        .map_err(|source| JournalError::Resize { size, source })?
        .len();

    if size > current {
        match platform.preallocate(file, size) {
            Ok(()) => {}
            Err(e) if platform.is_unsupported(&e) => {
                tracing::debug!(size, error = %e, "preallocation unsupported, extending file");
            }
            Err(source) => return Err(JournalError::Resize { size, source }),
        }
    }

    // Preallocation never shrinks and may round up, so pin the length.
    file.set_len(size)
        .map_err(|source| JournalError::Resize { size, source })
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

#[cfg(not(any(target_os = "linux", target_os = "android")))]
thread_local! {
    static THREAD_ID: Cell<u64> = const { Cell::new(0) };
}

/// Process-unique id for the calling thread, assigned on first use.
///
/// Used where the OS offers no cheap kernel thread id.
#[cfg(not(any(target_os = "linux", target_os = "android")))]
pub(crate) fn sequential_thread_id() -> u64 {
    THREAD_ID.with(|id| {
        if id.get() == 0 {
            id.set(NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed));
        }
        id.get()
    })
}
