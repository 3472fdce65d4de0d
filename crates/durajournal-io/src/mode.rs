//! Durability modes and the platform-neutral flags they select.

use serde::{Deserialize, Serialize};

/// How aggressively journal writes are forced to stable storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalMode {
    /// No durability flags. Fastest; data may be lost on crash.
    Danger,
    /// Ephemeral journal, removed from the filesystem when closed.
    PureMemory,
    /// Unbuffered and synchronous writes.
    #[default]
    Durable,
}

/// Whether the target storage honors unbuffered I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurabilitySupport {
    #[default]
    Supported,
    NotSupported,
}

/// Flags for opening a journal for writes.
///
/// Each platform translates these into its native open flags:
/// `O_DIRECT`/`O_DSYNC` on POSIX, `FILE_FLAG_NO_BUFFERING`/
/// `FILE_FLAG_WRITE_THROUGH`/`FILE_FLAG_DELETE_ON_CLOSE` on Windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenFlags {
    /// Bypass the OS page cache.
    pub unbuffered: bool,
    /// Every write returns only once the data is on stable storage.
    pub synchronous: bool,
    /// The backing file is removed from the namespace on close.
    pub delete_on_close: bool,
}

impl OpenFlags {
    /// Selects flags for a journal opened in `mode`.
    pub fn for_journal(mode: JournalMode, support: DurabilitySupport) -> Self {
        match mode {
            JournalMode::Danger => Self::default(),
            JournalMode::PureMemory => Self {
                delete_on_close: true,
                ..Self::default()
            },
            JournalMode::Durable => match support {
                DurabilitySupport::Supported => Self::durable(),
                DurabilitySupport::NotSupported => Self {
                    synchronous: true,
                    ..Self::default()
                },
            },
        }
    }

    /// Full durability: unbuffered and synchronous.
    pub fn durable() -> Self {
        Self {
            unbuffered: true,
            synchronous: true,
            delete_on_close: false,
        }
    }
}
