//! POSIX implementation of the durable I/O primitives.
//!
//! Durable journals are opened with `O_DSYNC` and, where the OS has it,
//! `O_DIRECT`. Ephemeral journals have no OS-level delete-on-close, so they
//! are unlinked explicitly before the descriptor is closed.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::{FileExt, OpenOptionsExt};
use std::os::unix::io::IntoRawFd;
use std::path::Path;

use crate::dir_sync::{self, DirSyncPolicy};
use crate::platform::Platform;
use crate::{JournalError, OpenFlags};

/// Journal files are private to the owning process user.
const JOURNAL_FILE_MODE: u32 = 0o600;

/// Durable I/O on Linux, the BSDs and macOS.
#[derive(Debug, Clone, Copy, Default)]
pub struct Posix;

impl Posix {
    fn native_flags(flags: OpenFlags) -> i32 {
        let mut native = 0;
        if flags.synchronous {
            native |= libc::O_DSYNC;
        }
        #[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd"))]
        if flags.unbuffered {
            native |= libc::O_DIRECT;
        }
        native
    }

    fn open_directory(dir: &Path) -> Result<File, JournalError> {
        File::open(dir).map_err(|source| JournalError::Open {
            path: dir.to_path_buf(),
            source,
        })
    }

    #[cfg(any(target_os = "linux", target_os = "android"))]
    fn probe_filesystem(dir: &File) -> Result<DirSyncPolicy, JournalError> {
        let stat = nix::sys::statfs::fstatfs(dir).map_err(|errno| JournalError::Stat {
            source: io::Error::from(errno),
        })?;
        // Magic numbers fit in 32 bits; the kernel word may be wider.
        Ok(dir_sync::policy_for_magic(stat.filesystem_type().0 as u32))
    }

    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    fn probe_filesystem(_dir: &File) -> Result<DirSyncPolicy, JournalError> {
        Ok(DirSyncPolicy::Allowed)
    }
}

impl Platform for Posix {
    fn deletes_on_close(&self) -> bool {
        false
    }

    fn open_for_write(&self, path: &Path, flags: OpenFlags) -> io::Result<File> {
        OpenOptions::new()
            .write(true)
            .create(true)
            .mode(JOURNAL_FILE_MODE)
            .custom_flags(Self::native_flags(flags))
            .open(path)
    }

    fn finish_unbuffered(&self, _file: &File) -> io::Result<()> {
        // O_DIRECT is fully applied at open.
        Ok(())
    }

    fn open_for_read(&self, path: &Path) -> io::Result<File> {
        File::open(path)
    }

    fn write_at(&self, file: &File, buf: &[u8], offset: u64) -> io::Result<usize> {
        file.write_at(buf, offset)
    }

    fn read_at(&self, file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        file.read_at(buf, offset)
    }

    fn flush(&self, file: &File) -> Result<(), JournalError> {
        file.sync_all().map_err(|source| JournalError::Sync { source })
    }

    fn file_size(&self, file: &File) -> Result<u64, JournalError> {
        file.metadata()
            .map(|m| m.len())
            .map_err(|source| JournalError::Stat { source })
    }

    fn directory_sync_policy(&self, dir: &Path) -> Result<DirSyncPolicy, JournalError> {
        let handle = Self::open_directory(dir)?;
        Self::probe_filesystem(&handle)
    }

    fn sync_directory_for(&self, path: &Path) -> Result<(), JournalError> {
        let dir = dir_sync::parent_dir(path);
        let handle = Self::open_directory(&dir)?;

        match Self::probe_filesystem(&handle)? {
            DirSyncPolicy::Allowed => handle
                .sync_all()
                .map_err(|source| JournalError::Sync { source }),
            DirSyncPolicy::NotAllowed => {
                tracing::debug!(dir = %dir.display(), "directory sync skipped on remote filesystem");
                Ok(())
            }
        }
    }

    fn close(&self, file: File) -> io::Result<()> {
        nix::unistd::close(file.into_raw_fd()).map_err(io::Error::from)
    }

    fn is_invalid_argument(&self, err: &io::Error) -> bool {
        err.raw_os_error() == Some(libc::EINVAL)
    }

    fn is_unsupported(&self, err: &io::Error) -> bool {
        matches!(
            err.raw_os_error(),
            Some(code) if code == libc::EOPNOTSUPP || code == libc::ENOSYS
        )
    }

    #[cfg(any(target_os = "linux", target_os = "android"))]
    fn current_thread_id(&self) -> u64 {
        nix::unistd::gettid().as_raw() as u64
    }

    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    fn current_thread_id(&self) -> u64 {
        crate::platform::sequential_thread_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synchronous_maps_to_dsync() {
        let flags = OpenFlags {
            synchronous: true,
            ..OpenFlags::default()
        };
        assert_eq!(Posix::native_flags(flags) & libc::O_DSYNC, libc::O_DSYNC);
        assert_eq!(Posix::native_flags(OpenFlags::default()), 0);
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn unbuffered_maps_to_direct() {
        let native = Posix::native_flags(OpenFlags::durable());
        assert_eq!(native & libc::O_DIRECT, libc::O_DIRECT);
        assert_eq!(native & libc::O_DSYNC, libc::O_DSYNC);
    }

    #[test]
    fn close_reports_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("close.dat");
        let file = Posix
            .open_for_write(&path, OpenFlags::default())
            .unwrap();
        Posix.close(file).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn new_files_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mode.dat");
        let file = Posix
            .open_for_write(&path, OpenFlags::default())
            .unwrap();
        let mode = file.metadata().unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0);
    }

    #[test]
    fn sync_directory_for_bare_name_uses_cwd() {
        assert!(Posix.sync_directory_for(Path::new("journal.0001")).is_ok());
    }

    #[test]
    fn thread_ids_differ_across_threads() {
        let here = Posix.current_thread_id();
        let there = std::thread::spawn(|| Posix.current_thread_id())
            .join()
            .unwrap();
        assert_ne!(here, there);
        assert_eq!(here, Posix.current_thread_id());
    }
}
