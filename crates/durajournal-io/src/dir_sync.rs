//! Directory metadata sync policy.
//!
//! After a journal is resized its new length lives in directory metadata, so
//! the containing directory is synced as well. Remote filesystems (NFS and
//! the SMB/CIFS family) are excluded: their protocols may not implement
//! directory fsync, or may stall on it.

use std::path::{Path, PathBuf};

use crate::JournalError;
use crate::platform::{NativePlatform, Platform};

/// Whether syncing a directory's metadata is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirSyncPolicy {
    Allowed,
    NotAllowed,
}

pub const NFS_SUPER_MAGIC: u32 = 0x6969;
pub const SMB_SUPER_MAGIC: u32 = 0x517B;
pub const CIFS_MAGIC_NUMBER: u32 = 0xFF53_4D42;
pub const SMB2_MAGIC_NUMBER: u32 = 0xFE53_4D42;

/// Classifies a filesystem by its `statfs` magic number.
pub fn policy_for_magic(magic: u32) -> DirSyncPolicy {
    match magic {
        NFS_SUPER_MAGIC | CIFS_MAGIC_NUMBER | SMB_SUPER_MAGIC | SMB2_MAGIC_NUMBER => {
            DirSyncPolicy::NotAllowed
        }
        _ => DirSyncPolicy::Allowed,
    }
}

/// Determines whether `directory` may be synced on this platform.
///
/// Failing to identify the filesystem is an error, never an implicit
/// [`DirSyncPolicy::Allowed`].
pub fn sync_allowed(directory: &Path) -> Result<DirSyncPolicy, JournalError> {
    NativePlatform::default().directory_sync_policy(directory)
}

/// Returns the directory containing `path`, using `.` for bare file names.
pub fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(NFS_SUPER_MAGIC, DirSyncPolicy::NotAllowed; "nfs")]
    #[test_case(CIFS_MAGIC_NUMBER, DirSyncPolicy::NotAllowed; "cifs")]
    #[test_case(SMB_SUPER_MAGIC, DirSyncPolicy::NotAllowed; "smb")]
    #[test_case(SMB2_MAGIC_NUMBER, DirSyncPolicy::NotAllowed; "smb2")]
    #[test_case(0xEF53, DirSyncPolicy::Allowed; "ext4")]
    #[test_case(0x5846_5342, DirSyncPolicy::Allowed; "xfs")]
    #[test_case(0x0102_1994, DirSyncPolicy::Allowed; "tmpfs")]
    fn magic_classification(magic: u32, expected: DirSyncPolicy) {
        assert_eq!(policy_for_magic(magic), expected);
    }

    #[test]
    fn parent_of_bare_name_is_current_dir() {
        assert_eq!(parent_dir(Path::new("journal.0001")), PathBuf::from("."));
        assert_eq!(
            parent_dir(Path::new("data/journals/journal.0001")),
            PathBuf::from("data/journals")
        );
    }

    #[test]
    fn missing_directory_is_a_probe_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let result = sync_allowed(&missing);
        if cfg!(windows) {
            assert_eq!(result.unwrap(), DirSyncPolicy::NotAllowed);
        } else {
            assert!(result.is_err());
        }
    }

    #[test]
    #[cfg(unix)]
    fn local_temp_dir_is_probed() {
        let dir = tempfile::tempdir().unwrap();
        assert!(sync_allowed(dir.path()).is_ok());
    }
}
