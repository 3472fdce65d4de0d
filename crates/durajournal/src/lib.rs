//! # durajournal: Durable journal files for write-ahead logging
//!
//! `durajournal` opens, writes, reads, truncates and closes the journal files
//! a write-ahead-log storage engine records transactions into. A successful
//! write means the bytes are as durable as the selected [`JournalMode`]
//! promises:
//!
//! - **`Durable`** (default): unbuffered and synchronous writes, degraded to
//!   synchronous-only for storage marked [`DurabilitySupport::NotSupported`]
//! - **`PureMemory`**: an ephemeral journal removed when closed
//! - **`Danger`**: no durability flags at all
//!
//! The engine above decides what to write and when; this crate decides how
//! the bytes reach stable storage and reports failures as a [`Status`] plus
//! the raw OS detail code.
//!
//! # Example
//!
//! ```no_run
//! use durajournal::{AlignedBuffer, DurabilitySupport, JournalHandle, JournalMode};
//!
//! # fn main() -> Result<(), durajournal::JournalError> {
//! let support = match durajournal::test_storage_durability("journals/probe.tmp") {
//!     Ok(()) => DurabilitySupport::Supported,
//!     Err(_) => DurabilitySupport::NotSupported,
//! };
//!
//! let (mut journal, size) =
//!     JournalHandle::open_for_write("journals/0001.journal", JournalMode::Durable, 4096, support)?;
//! assert!(size >= 4096);
//!
//! let mut block = AlignedBuffer::zeroed(4096);
//! block.fill(0xAB);
//! journal.write(block.as_slice(), 0)?;
//! journal.truncate(2048)?;
//! journal.close()?;
//! # Ok(())
//! # }
//! ```

mod journal;
mod options;
mod probe;

pub use durajournal_io::{
    AlignedBuffer, BLOCK_ALIGNMENT, DirSyncPolicy, DurabilitySupport, ErrorString,
    ErrorStringError, JournalError, JournalMode, NativePlatform, OpenFlags, Platform,
    SpecialErrno, Status, classify, describe, error_string, sync_allowed,
};
pub use journal::JournalHandle;
pub use options::{DEFAULT_INITIAL_SIZE, JournalOptions, OptionsError, OptionsLoader};
pub use probe::{PROBE_SIZE, test_storage_durability, test_storage_durability_on};

/// Returns an identifier for the calling thread.
///
/// On Linux this is the kernel thread id; elsewhere a process-unique id
/// assigned on first use.
pub fn get_current_thread_id() -> u64 {
    NativePlatform::default().current_thread_id()
}
