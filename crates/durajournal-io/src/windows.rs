//! Windows implementation of the durable I/O primitives.
//!
//! Durable journals use `FILE_FLAG_NO_BUFFERING | FILE_FLAG_WRITE_THROUGH`.
//! Ephemeral journals use `FILE_FLAG_DELETE_ON_CLOSE`, so the OS removes them
//! when the last handle closes and no explicit unlink is needed.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::windows::fs::{FileExt, OpenOptionsExt};
use std::path::Path;

use crate::dir_sync::DirSyncPolicy;
use crate::platform::Platform;
use crate::{JournalError, OpenFlags};

const FILE_SHARE_READ: u32 = 0x0000_0001;
const FILE_SHARE_WRITE: u32 = 0x0000_0002;
const FILE_SHARE_DELETE: u32 = 0x0000_0004;

const FILE_ATTRIBUTE_TEMPORARY: u32 = 0x0000_0100;
const FILE_FLAG_DELETE_ON_CLOSE: u32 = 0x0400_0000;
const FILE_FLAG_NO_BUFFERING: u32 = 0x2000_0000;
const FILE_FLAG_WRITE_THROUGH: u32 = 0x8000_0000;

const ERROR_INVALID_FUNCTION: i32 = 1;
const ERROR_NOT_SUPPORTED: i32 = 50;
const ERROR_INVALID_PARAMETER: i32 = 87;

/// Durable I/O on Windows.
#[derive(Debug, Clone, Copy, Default)]
pub struct Windows;

impl Windows {
    fn share_mode(flags: OpenFlags) -> u32 {
        if flags.delete_on_close {
            FILE_SHARE_READ | FILE_SHARE_WRITE | FILE_SHARE_DELETE
        } else {
            FILE_SHARE_READ
        }
    }

    fn native_flags(flags: OpenFlags) -> u32 {
        let mut native = 0;
        if flags.unbuffered {
            native |= FILE_FLAG_NO_BUFFERING;
        }
        if flags.synchronous {
            native |= FILE_FLAG_WRITE_THROUGH;
        }
        if flags.delete_on_close {
            native |= FILE_FLAG_DELETE_ON_CLOSE;
        }
        native
    }

    fn attributes(flags: OpenFlags) -> u32 {
        if flags.delete_on_close {
            FILE_ATTRIBUTE_TEMPORARY
        } else {
            0
        }
    }
}

impl Platform for Windows {
    fn deletes_on_close(&self) -> bool {
        true
    }

    fn open_for_write(&self, path: &Path, flags: OpenFlags) -> io::Result<File> {
        OpenOptions::new()
            .write(true)
            .create(true)
            .share_mode(Self::share_mode(flags))
            .custom_flags(Self::native_flags(flags))
            .attributes(Self::attributes(flags))
            .open(path)
    }

    fn finish_unbuffered(&self, _file: &File) -> io::Result<()> {
        Ok(())
    }

    fn open_for_read(&self, path: &Path) -> io::Result<File> {
        OpenOptions::new()
            .read(true)
            .share_mode(FILE_SHARE_READ | FILE_SHARE_WRITE | FILE_SHARE_DELETE)
            .open(path)
    }

    fn write_at(&self, file: &File, buf: &[u8], offset: u64) -> io::Result<usize> {
        file.seek_write(buf, offset)
    }

    fn read_at(&self, file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        file.seek_read(buf, offset)
    }

    fn flush(&self, file: &File) -> Result<(), JournalError> {
        file.sync_all().map_err(|source| JournalError::Flush { source })
    }

    fn file_size(&self, file: &File) -> Result<u64, JournalError> {
        file.metadata()
            .map(|m| m.len())
            .map_err(|source| JournalError::GetSize { source })
    }

    fn directory_sync_policy(&self, _dir: &Path) -> Result<DirSyncPolicy, JournalError> {
        // Directories can not be flushed through the file API.
        Ok(DirSyncPolicy::NotAllowed)
    }

    fn sync_directory_for(&self, _path: &Path) -> Result<(), JournalError> {
        Ok(())
    }

    fn close(&self, file: File) -> io::Result<()> {
        drop(file);
        Ok(())
    }

    fn is_invalid_argument(&self, err: &io::Error) -> bool {
        err.raw_os_error() == Some(ERROR_INVALID_PARAMETER)
    }

    fn is_unsupported(&self, err: &io::Error) -> bool {
        matches!(
            err.raw_os_error(),
            Some(ERROR_NOT_SUPPORTED | ERROR_INVALID_FUNCTION)
        )
    }

    fn current_thread_id(&self) -> u64 {
        crate::platform::sequential_thread_id()
    }
}
