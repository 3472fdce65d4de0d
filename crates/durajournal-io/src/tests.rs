//! Integration tests for the native platform primitives.

use std::fs::File;
use std::io;
use std::path::Path;

use proptest::prelude::*;

use crate::{
    AlignedBuffer, BLOCK_ALIGNMENT, DirSyncPolicy, JournalError, NativePlatform, OpenFlags,
    OUT_OF_SPACE, Platform, SpecialErrno, Status,
};

#[cfg(unix)]
const PREALLOCATE_UNSUPPORTED: i32 = libc::EOPNOTSUPP;
#[cfg(windows)]
const PREALLOCATE_UNSUPPORTED: i32 = 50; // ERROR_NOT_SUPPORTED

/// Native platform whose preallocation always fails with `code`.
struct FailingPreallocate {
    inner: NativePlatform,
    code: i32,
}

impl FailingPreallocate {
    fn new(code: i32) -> Self {
        Self {
            inner: NativePlatform::default(),
            code,
        }
    }
}

impl Platform for FailingPreallocate {
    fn deletes_on_close(&self) -> bool {
        self.inner.deletes_on_close()
    }

    fn open_for_write(&self, path: &Path, flags: OpenFlags) -> io::Result<File> {
        self.inner.open_for_write(path, flags)
    }

    fn finish_unbuffered(&self, file: &File) -> io::Result<()> {
        self.inner.finish_unbuffered(file)
    }

    fn open_for_read(&self, path: &Path) -> io::Result<File> {
        self.inner.open_for_read(path)
    }

    fn write_at(&self, file: &File, buf: &[u8], offset: u64) -> io::Result<usize> {
        self.inner.write_at(file, buf, offset)
    }

    fn read_at(&self, file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        self.inner.read_at(file, buf, offset)
    }

    fn flush(&self, file: &File) -> Result<(), JournalError> {
        self.inner.flush(file)
    }

    fn file_size(&self, file: &File) -> Result<u64, JournalError> {
        self.inner.file_size(file)
    }

    fn directory_sync_policy(&self, dir: &Path) -> Result<DirSyncPolicy, JournalError> {
        self.inner.directory_sync_policy(dir)
    }

    fn sync_directory_for(&self, path: &Path) -> Result<(), JournalError> {
        self.inner.sync_directory_for(path)
    }

    fn close(&self, file: File) -> io::Result<()> {
        self.inner.close(file)
    }

    fn is_invalid_argument(&self, err: &io::Error) -> bool {
        self.inner.is_invalid_argument(err)
    }

    fn is_unsupported(&self, err: &io::Error) -> bool {
        self.inner.is_unsupported(err)
    }

    fn current_thread_id(&self) -> u64 {
        self.inner.current_thread_id()
    }

    fn preallocate(&self, _file: &File, _len: u64) -> io::Result<()> {
        Err(io::Error::from_raw_os_error(self.code))
    }
}

fn platform() -> NativePlatform {
    NativePlatform::default()
}

#[test]
fn positional_write_and_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("positional.dat");
    let p = platform();

    let file = p.open_for_write(&path, OpenFlags::default()).unwrap();
    assert_eq!(p.write_at(&file, b"world", 6).unwrap(), 5);
    assert_eq!(p.write_at(&file, b"hello ", 0).unwrap(), 6);
    p.flush(&file).unwrap();
    p.close(file).unwrap();

    let file = p.open_for_read(&path).unwrap();
    let mut buf = [0u8; 11];
    assert_eq!(p.read_at(&file, &mut buf, 0).unwrap(), 11);
    assert_eq!(&buf, b"hello world");
    p.close(file).unwrap();
}

#[test]
fn read_at_boundaries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("boundaries.dat");
    let p = platform();

    let data: Vec<u8> = (0..=255).collect();
    std::fs::write(&path, &data).unwrap();

    let file = p.open_for_read(&path).unwrap();
    let mut buf = [0u8; 10];

    assert_eq!(p.read_at(&file, &mut buf, 100).unwrap(), 10);
    assert_eq!(&buf, &[100, 101, 102, 103, 104, 105, 106, 107, 108, 109]);

    // Only 6 bytes left
    assert_eq!(p.read_at(&file, &mut buf, 250).unwrap(), 6);
    assert_eq!(&buf[..6], &[250, 251, 252, 253, 254, 255]);

    assert_eq!(p.read_at(&file, &mut buf, 1000).unwrap(), 0);
}

#[test]
fn resize_grows_and_shrinks() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("resize.dat");
    let p = platform();

    let file = p.open_for_write(&path, OpenFlags::default()).unwrap();
    p.resize(&file, 64 * 1024).unwrap();
    assert_eq!(p.file_size(&file).unwrap(), 64 * 1024);

    p.resize(&file, 1024).unwrap();
    assert_eq!(p.file_size(&file).unwrap(), 1024);
    p.close(file).unwrap();

    assert_eq!(std::fs::metadata(&path).unwrap().len(), 1024);
}

#[test]
fn resize_on_read_only_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("readonly.dat");
    std::fs::write(&path, b"abc").unwrap();
    let p = platform();

    let file = p.open_for_read(&path).unwrap();
    let err = p.resize(&file, 0).unwrap_err();
    assert_eq!(err.status(), Status::ResizeFailure);
}

#[test]
fn resize_without_preallocation_extends_sparsely() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sparse.dat");
    let p = FailingPreallocate::new(PREALLOCATE_UNSUPPORTED);

    let file = p.open_for_write(&path, OpenFlags::default()).unwrap();
    p.resize(&file, 32 * 1024).unwrap();
    assert_eq!(p.file_size(&file).unwrap(), 32 * 1024);

    // Shrinking never preallocates.
    p.resize(&file, 512).unwrap();
    assert_eq!(p.file_size(&file).unwrap(), 512);
    p.close(file).unwrap();
}

#[test]
fn resize_reports_preallocation_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("full.dat");
    let p = FailingPreallocate::new(OUT_OF_SPACE);

    let file = p.open_for_write(&path, OpenFlags::default()).unwrap();
    let err = p.resize(&file, 32 * 1024).unwrap_err();
    assert_eq!(err.status(), Status::ResizeFailure);
    assert_eq!(err.special(), SpecialErrno::OutOfSpace);
    assert_eq!(p.file_size(&file).unwrap(), 0);
}

#[test]
fn preallocate_extends_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prealloc.dat");
    let p = platform();

    let file = p.open_for_write(&path, OpenFlags::default()).unwrap();
    p.preallocate(&file, 8192).unwrap();
    assert!(p.file_size(&file).unwrap() >= 8192);
}

#[test]
fn unlink_removes_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("unlink.dat");
    std::fs::write(&path, b"x").unwrap();

    platform().unlink(&path).unwrap();
    assert!(!path.exists());

    let err = platform().unlink(&path).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
}

#[test]
fn open_for_read_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let err = platform()
        .open_for_read(&dir.path().join("missing.dat"))
        .unwrap_err();
    assert_eq!(err.raw_os_error(), Some(crate::NOT_FOUND));
}

#[test]
fn synchronous_journal_accepts_aligned_block() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dsync.dat");
    let p = platform();

    let flags = OpenFlags {
        synchronous: true,
        ..OpenFlags::default()
    };
    let file = p.open_for_write(&path, flags).unwrap();
    let buf = AlignedBuffer::from_data(b"synchronous");
    assert_eq!(p.write_at(&file, buf.as_slice(), 0).unwrap(), BLOCK_ALIGNMENT);
    p.close(file).unwrap();
}

proptest! {
    /// Property: bytes written at any offset read back unchanged
    #[test]
    fn prop_write_then_read_at_offset(
        data in prop::collection::vec(any::<u8>(), 1..512),
        offset in 0u64..16_384,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prop.dat");
        let p = platform();

        let file = p.open_for_write(&path, OpenFlags::default()).unwrap();
        let written = p.write_at(&file, &data, offset).unwrap();
        prop_assert_eq!(written, data.len());
        p.close(file).unwrap();

        let file = p.open_for_read(&path).unwrap();
        let mut back = vec![0u8; data.len()];
        let read = p.read_at(&file, &mut back, offset).unwrap();
        prop_assert_eq!(read, data.len());
        prop_assert_eq!(back, data);
    }
}
