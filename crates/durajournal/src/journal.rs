//! Journal handle lifecycle.
//!
//! A [`JournalHandle`] owns exactly one open journal file. Handles are created
//! by [`JournalHandle::open_for_write`] or [`JournalHandle::open_for_read`] and
//! destroyed by [`JournalHandle::close`]. All I/O is positional: offsets are
//! passed explicitly and the handle keeps no cursor.
//!
//! # Construction
//!
//! Opening for writes is a multi-step sequence (open, finish unbuffered I/O,
//! size query, grow). The handle is assembled first and only handed to the
//! caller once every step succeeded; any failure rolls it back in order
//! (unlink ephemeral file, close descriptor) before the error is returned.
//!
//! # Durability ordering of truncate
//!
//! ```text
//! flush pending writes ──► resize file ──► sync containing directory
//! ```
//!
//! The directory sync is skipped on filesystems where the policy forbids it.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use durajournal_io::{
    DurabilitySupport, JournalError, JournalMode, NativePlatform, OpenFlags, Platform,
};

use crate::options::JournalOptions;

/// An open journal file.
///
/// Not reentrant: mutating operations take `&mut self`, so one handle has one
/// writer. Distinct handles are independent.
#[derive(Debug)]
pub struct JournalHandle<P: Platform = NativePlatform> {
    /// `None` only after the handle has been released.
    file: Option<File>,
    /// Present for write handles only.
    path: Option<PathBuf>,
    delete_on_close: bool,
    pub(crate) platform: P,
}

impl JournalHandle<NativePlatform> {
    /// Opens (creating if absent) a journal for writes.
    ///
    /// Returns the handle and the journal's size, which is `initial_size` if
    /// the file had to grow and the existing size otherwise. An existing file
    /// is never shrunk.
    ///
    /// # Panics
    ///
    /// Panics if `initial_size` is zero.
    pub fn open_for_write(
        path: impl AsRef<Path>,
        mode: JournalMode,
        initial_size: u64,
        support: DurabilitySupport,
    ) -> Result<(Self, u64), JournalError> {
        Self::open_for_write_on(
            NativePlatform::default(),
            path.as_ref(),
            mode,
            initial_size,
            support,
        )
    }

    /// Opens a journal for writes using parameters from [`JournalOptions`].
    pub fn open_with_options(
        path: impl AsRef<Path>,
        options: &JournalOptions,
    ) -> Result<(Self, u64), JournalError> {
        Self::open_for_write(
            path,
            options.mode,
            options.initial_size,
            options.durability,
        )
    }

    /// Opens an existing journal read-only.
    pub fn open_for_read(path: impl AsRef<Path>) -> Result<Self, JournalError> {
        Self::open_for_read_on(NativePlatform::default(), path.as_ref())
    }
}

impl<P: Platform> JournalHandle<P> {
    /// [`JournalHandle::open_for_write`] on an explicit platform.
    pub fn open_for_write_on(
        platform: P,
        path: &Path,
        mode: JournalMode,
        initial_size: u64,
        support: DurabilitySupport,
    ) -> Result<(Self, u64), JournalError> {
        assert!(initial_size > 0, "journal initial size must be positive");

        let flags = OpenFlags::for_journal(mode, support);
        let file = platform
            .open_for_write(path, flags)
            .map_err(|source| JournalError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        let mut handle = Self {
            file: Some(file),
            path: Some(path.to_path_buf()),
            delete_on_close: flags.delete_on_close,
            platform,
        };

        match handle.prepare(flags, initial_size) {
            Ok(size) => {
                tracing::debug!(
                    path = %path.display(),
                    mode = ?mode,
                    support = ?support,
                    size,
                    "opened journal for writes"
                );
                Ok((handle, size))
            }
            Err(cause) => Err(handle.abort(cause)),
        }
    }

    /// [`JournalHandle::open_for_read`] on an explicit platform.
    pub fn open_for_read_on(platform: P, path: &Path) -> Result<Self, JournalError> {
        let file = platform
            .open_for_read(path)
            .map_err(|source| JournalError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::debug!(path = %path.display(), "opened journal for reads");
        Ok(Self {
            file: Some(file),
            path: None,
            delete_on_close: false,
            platform,
        })
    }

    /// Finishes enabling unbuffered I/O and grows the file to `initial_size`.
    fn prepare(&self, flags: OpenFlags, initial_size: u64) -> Result<u64, JournalError> {
        let file = self.file();

        if flags.unbuffered {
            self.platform
                .finish_unbuffered(file)
                .map_err(|source| JournalError::Sync { source })?;
        }

        let current = self.platform.file_size(file)?;
        // Grow only when strictly smaller; an equal size is already usable.
        if current < initial_size {
            self.platform.resize(file, initial_size)?;
            Ok(initial_size)
        } else {
            Ok(current)
        }
    }

    /// Rolls back a handle that failed to finish opening.
    ///
    /// An unlink failure replaces `cause` as the reported error. A close
    /// failure during rollback is only logged.
    fn abort(mut self, cause: JournalError) -> JournalError {
        let path = self.path.clone().unwrap_or_default();
        match self.release() {
            Ok(()) => cause,
            Err(err @ JournalError::Unlink { .. }) => {
                tracing::warn!(
                    path = %path.display(),
                    cause = %cause,
                    error = %err,
                    "failed to remove ephemeral journal during rollback"
                );
                err
            }
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to close journal during rollback"
                );
                cause
            }
        }
    }

    /// Writes all of `buf` at `offset`.
    ///
    /// With unbuffered I/O the buffer address, its length and `offset` must
    /// be block aligned (see [`durajournal_io::AlignedBuffer`]); misaligned
    /// transfers fail with the platform's error.
    pub fn write(&mut self, buf: &[u8], offset: u64) -> Result<(), JournalError> {
        let file = self.file();
        let mut written = 0;

        while written < buf.len() {
            let pos = offset + written as u64;
            let n = self
                .platform
                .write_at(file, &buf[written..], pos)
                .map_err(|source| JournalError::Write {
                    offset,
                    len: buf.len(),
                    source,
                })?;
            if n == 0 {
                return Err(JournalError::Write {
                    offset,
                    len: buf.len(),
                    source: io::Error::from(io::ErrorKind::WriteZero),
                });
            }
            written += n;
        }

        Ok(())
    }

    /// Reads up to `buf.len()` bytes at `offset`.
    ///
    /// Returns the number of bytes read, which is short only at end of file.
    pub fn read(&self, buf: &mut [u8], offset: u64) -> Result<usize, JournalError> {
        let file = self.file();
        let len = buf.len();
        let mut filled = 0;

        while filled < len {
            let pos = offset + filled as u64;
            let n = self
                .platform
                .read_at(file, &mut buf[filled..], pos)
                .map_err(|source| JournalError::Read {
                    offset,
                    len,
                    source,
                })?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        Ok(filled)
    }

    /// Resizes the journal to `size` bytes, durably.
    ///
    /// The first failing step determines the returned error.
    pub fn truncate(&mut self, size: u64) -> Result<(), JournalError> {
        let file = self.file();

        self.platform.flush(file)?;
        self.platform.resize(file, size)?;
        // Directory sync does not persist the inode size.
        self.platform.flush(file)?;
        if let Some(path) = &self.path {
            self.platform.sync_directory_for(path)?;
        }

        tracing::debug!(size, "truncated journal");
        Ok(())
    }

    /// Returns the current size of the journal file.
    pub fn size(&self) -> Result<u64, JournalError> {
        self.platform.file_size(self.file())
    }

    /// The journal's path. `None` for read handles.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether the journal is removed from the filesystem when closed.
    pub fn is_delete_on_close(&self) -> bool {
        self.delete_on_close
    }

    /// Closes the journal, removing it first if it is ephemeral.
    ///
    /// Both steps are always attempted. If both fail, the unlink failure is
    /// returned and the close failure is logged.
    pub fn close(mut self) -> Result<(), JournalError> {
        let result = self.release();
        tracing::debug!(
            path = ?self.path,
            ok = result.is_ok(),
            "closed journal"
        );
        result
    }

    fn file(&self) -> &File {
        // The file is only taken by `release`, after which the handle is
        // never used again.
        self.file.as_ref().expect("journal file already released")
    }

    /// Unlinks (if ephemeral) and closes the file. Idempotent.
    fn release(&mut self) -> Result<(), JournalError> {
        let Some(file) = self.file.take() else {
            return Ok(());
        };

        let mut first_error = None;

        if self.delete_on_close && !self.platform.deletes_on_close() {
            if let Some(path) = &self.path {
                if let Err(source) = self.platform.unlink(path) {
                    first_error = Some(JournalError::Unlink {
                        path: path.clone(),
                        source,
                    });
                }
            }
        }

        if let Err(source) = self.platform.close(file) {
            let err = JournalError::Close { source };
            match &first_error {
                Some(first) => tracing::error!(
                    error = %err,
                    detail_code = err.detail_code(),
                    reported = %first,
                    "journal close failed after unlink failure"
                ),
                None => first_error = Some(err),
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<P: Platform> Drop for JournalHandle<P> {
    fn drop(&mut self) {
        if self.file.is_none() {
            return;
        }
        if let Err(e) = self.release() {
            tracing::error!(error = %e, "failed to release journal dropped without close");
        }
    }
}
