//! # durajournal-io: Durable I/O primitives for write-ahead journals
//!
//! This crate holds everything below the journal lifecycle:
//!
//! - **Durability modes** ([`JournalMode`], [`DurabilitySupport`]) and the
//!   platform-neutral [`OpenFlags`] they select
//! - **Platform strategy** ([`Platform`]) with a POSIX and a Windows
//!   implementation; [`NativePlatform`] is the one for the current target
//! - **Directory sync policy** ([`sync_allowed`]) that keeps directory fsync
//!   away from NFS and SMB/CIFS mounts
//! - **Error taxonomy** ([`JournalError`], [`Status`]) and OS error string
//!   translation ([`error_string`], [`SpecialErrno`])
//! - **Aligned buffers** ([`AlignedBuffer`]) for unbuffered transfers
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────┐
//! │         durajournal        │
//! │  (JournalHandle, probe)    │
//! └─────────────┬──────────────┘
//!               │ Platform
//! ┌─────────────┴──────────────┐
//! │       durajournal-io       │
//! │  ┌─────────┐  ┌──────────┐ │
//! │  │  Posix  │  │ Windows  │ │
//! │  └─────────┘  └──────────┘ │
//! └────────────────────────────┘
//! ```

#[cfg(not(any(unix, windows)))]
compile_error!("durajournal-io supports unix and windows targets only");

mod aligned;
mod dir_sync;
mod errno;
mod error;
mod mode;
mod platform;

#[cfg(unix)]
mod posix;
#[cfg(windows)]
mod windows;

pub use aligned::{AlignedBuffer, BLOCK_ALIGNMENT, is_aligned, round_up};
pub use dir_sync::{
    CIFS_MAGIC_NUMBER, DirSyncPolicy, NFS_SUPER_MAGIC, SMB_SUPER_MAGIC, SMB2_MAGIC_NUMBER,
    parent_dir, policy_for_magic, sync_allowed,
};
pub use errno::{
    ErrorString, ErrorStringError, INVALID_ARGUMENT, NOT_FOUND, OUT_OF_MEMORY, OUT_OF_SPACE,
    SpecialErrno, classify, describe, error_string,
};
pub use error::{JournalError, Status};
pub use mode::{DurabilitySupport, JournalMode, OpenFlags};
pub use platform::{NativePlatform, Platform, resize_file};

#[cfg(unix)]
pub use posix::Posix;
#[cfg(windows)]
pub use windows::Windows;

#[cfg(test)]
mod tests;
