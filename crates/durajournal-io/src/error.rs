//! Journal error taxonomy.
//!
//! Every fallible journal operation returns a [`JournalError`]. Each variant
//! maps to exactly one [`Status`] and carries the raw OS error it was built
//! from, so callers get both a stable classification and the platform detail
//! code for diagnostics.

use std::collections::TryReserveError;
use std::io;
use std::path::PathBuf;

use crate::errno::{self, SpecialErrno};

/// Coarse outcome of a journal operation.
///
/// The integer values are stable and may be handed across an ABI boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Status {
    Success = 0,
    AllocationFailure = 1,
    OpenFailure = 2,
    StatFailure = 3,
    ResizeFailure = 4,
    SyncFailure = 5,
    CloseFailure = 6,
    UnlinkFailure = 7,
    FlushFailure = 8,
    AllocateSpaceFailure = 9,
    DurabilityNotSupported = 10,
    /// Windows only: querying the file size failed.
    GetSizeFailure = 11,
    WriteFailure = 12,
    ReadFailure = 13,
}

impl Status {
    /// Returns the stable integer code for this status.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == Status::Success
    }
}

/// Errors from journal operations.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    /// A scratch buffer could not be reserved.
    #[error("failed to allocate {size} bytes: {source}")]
    Allocation {
        size: usize,
        #[source]
        source: TryReserveError,
    },

    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to stat journal file: {source}")]
    Stat {
        #[source]
        source: io::Error,
    },

    #[error("failed to query journal file size: {source}")]
    GetSize {
        #[source]
        source: io::Error,
    },

    #[error("failed to resize journal file to {size} bytes: {source}")]
    Resize {
        size: u64,
        #[source]
        source: io::Error,
    },

    #[error("failed to sync: {source}")]
    Sync {
        #[source]
        source: io::Error,
    },

    #[error("failed to flush journal file buffers: {source}")]
    Flush {
        #[source]
        source: io::Error,
    },

    #[error("failed to close journal file: {source}")]
    Close {
        #[source]
        source: io::Error,
    },

    #[error("failed to unlink {path}: {source}")]
    Unlink {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to allocate {size} bytes of file space: {source}")]
    AllocateSpace {
        size: u64,
        #[source]
        source: io::Error,
    },

    /// The storage rejected the unbuffered + synchronous flag combination.
    #[error("storage at {path} does not support durable writes: {source}")]
    DurabilityNotSupported {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {len} bytes at offset {offset}: {source}")]
    Write {
        offset: u64,
        len: usize,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {len} bytes at offset {offset}: {source}")]
    Read {
        offset: u64,
        len: usize,
        #[source]
        source: io::Error,
    },
}

impl JournalError {
    /// Returns the status classification of this error.
    pub fn status(&self) -> Status {
        match self {
            Self::Allocation { .. } => Status::AllocationFailure,
            Self::Open { .. } => Status::OpenFailure,
            Self::Stat { .. } => Status::StatFailure,
            Self::GetSize { .. } => Status::GetSizeFailure,
            Self::Resize { .. } => Status::ResizeFailure,
            Self::Sync { .. } => Status::SyncFailure,
            Self::Flush { .. } => Status::FlushFailure,
            Self::Close { .. } => Status::CloseFailure,
            Self::Unlink { .. } => Status::UnlinkFailure,
            Self::AllocateSpace { .. } => Status::AllocateSpaceFailure,
            Self::DurabilityNotSupported { .. } => Status::DurabilityNotSupported,
            Self::Write { .. } => Status::WriteFailure,
            Self::Read { .. } => Status::ReadFailure,
        }
    }

    /// Returns the raw OS error code behind this error, or 0 if the failure
    /// did not originate from an OS call.
    pub fn detail_code(&self) -> i32 {
        match self {
            Self::Allocation { .. } => errno::OUT_OF_MEMORY,
            Self::Open { source, .. }
            | Self::Stat { source }
            | Self::GetSize { source }
            | Self::Resize { source, .. }
            | Self::Sync { source }
            | Self::Flush { source }
            | Self::Close { source }
            | Self::Unlink { source, .. }
            | Self::AllocateSpace { source, .. }
            | Self::DurabilityNotSupported { source, .. }
            | Self::Write { source, .. }
            | Self::Read { source, .. } => source.raw_os_error().unwrap_or(0),
        }
    }

    /// Classifies the detail code into the special conditions callers react to.
    pub fn special(&self) -> SpecialErrno {
        errno::classify(self.detail_code())
    }
}
