//! Storage durability self-test.
//!
//! Some filesystems and devices accept the durable-mode open flags but reject
//! actual transfers with them. Preallocating a small file opened with those
//! flags surfaces this as an "invalid argument" error, which is reported as
//! [`Status::DurabilityNotSupported`](durajournal_io::Status) so the caller
//! can fall back to [`DurabilitySupport::NotSupported`](durajournal_io::DurabilitySupport).

use std::fs::File;
use std::io;
use std::path::Path;

use durajournal_io::{JournalError, NativePlatform, OpenFlags, Platform};

/// Size of the probe file's preallocation (64 KiB).
pub const PROBE_SIZE: u64 = 64 * 1024;

/// Checks whether the storage behind `temp_path` supports durable journals.
///
/// A probe file opened at `temp_path` is always removed before returning. If
/// the open itself fails, the path is removed only when nothing existed there
/// beforehand, so an unrelated file is never deleted.
pub fn test_storage_durability(temp_path: impl AsRef<Path>) -> Result<(), JournalError> {
    test_storage_durability_on(&NativePlatform::default(), temp_path.as_ref())
}

/// [`test_storage_durability`] on an explicit platform.
pub fn test_storage_durability_on<P: Platform>(
    platform: &P,
    temp_path: &Path,
) -> Result<(), JournalError> {
    let existed = temp_path.symlink_metadata().is_ok();

    let result = match platform.open_for_write(temp_path, OpenFlags::durable()) {
        Ok(file) => {
            let allocated = allocate(platform, &file, temp_path);
            if let Err(e) = platform.close(file) {
                tracing::warn!(path = %temp_path.display(), error = %e, "failed to close durability probe file");
            }
            remove(platform, temp_path);
            allocated
        }
        Err(source) => {
            // Some filesystems create the entry before rejecting the flags.
            if !existed {
                remove(platform, temp_path);
            }
            Err(JournalError::Open {
                path: temp_path.to_path_buf(),
                source,
            })
        }
    };

    match &result {
        Ok(()) => tracing::debug!(path = %temp_path.display(), "storage supports durable journals"),
        Err(e) => tracing::debug!(
            path = %temp_path.display(),
            status = ?e.status(),
            error = %e,
            "storage durability probe failed"
        ),
    }
    result
}

fn allocate<P: Platform>(platform: &P, file: &File, temp_path: &Path) -> Result<(), JournalError> {
    platform.preallocate(file, PROBE_SIZE).map_err(|source| {
        if platform.is_invalid_argument(&source) {
            JournalError::DurabilityNotSupported {
                path: temp_path.to_path_buf(),
                source,
            }
        } else {
            JournalError::AllocateSpace {
                size: PROBE_SIZE,
                source,
            }
        }
    })
}

fn remove<P: Platform>(platform: &P, temp_path: &Path) {
    match platform.unlink(temp_path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(
            path = %temp_path.display(),
            error = %e,
            "failed to remove durability probe file"
        ),
    }
}
