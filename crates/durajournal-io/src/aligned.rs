//! Aligned buffers for unbuffered journal I/O.
//!
//! Journals opened with unbuffered I/O (`O_DIRECT`, `FILE_FLAG_NO_BUFFERING`)
//! require the buffer address, the transfer length and the file offset to be
//! multiples of the device block size. The journal layer does not fix up
//! misaligned transfers, so callers use an `AlignedBuffer` to meet the
//! contract.

use crate::JournalError;

/// Block alignment requirement for unbuffered I/O (4 KiB).
pub const BLOCK_ALIGNMENT: usize = 4096;

/// A zero-initialized buffer whose start address and length are both
/// multiples of [`BLOCK_ALIGNMENT`].
///
/// The backing `Vec` is over-allocated by one block and never grows, so the
/// aligned window inside it stays put for the buffer's lifetime.
#[derive(Debug)]
pub struct AlignedBuffer {
    storage: Vec<u8>,
    start: usize,
    len: usize,
}

impl AlignedBuffer {
    /// Creates a zeroed buffer of at least `len` bytes.
    ///
    /// The length is rounded up to the nearest multiple of
    /// [`BLOCK_ALIGNMENT`].
    pub fn zeroed(len: usize) -> Self {
        let len = round_up(len, BLOCK_ALIGNMENT);
        Self::from_storage(vec![0; len + BLOCK_ALIGNMENT], len)
    }

    /// Like [`AlignedBuffer::zeroed`], but reports allocation failure instead
    /// of aborting.
    pub fn try_zeroed(len: usize) -> Result<Self, JournalError> {
        let len = round_up(len, BLOCK_ALIGNMENT);
        let total = len + BLOCK_ALIGNMENT;

        let mut storage = Vec::new();
        storage
            .try_reserve_exact(total)
            .map_err(|source| JournalError::Allocation {
                size: total,
                source,
            })?;
        storage.resize(total, 0);
        Ok(Self::from_storage(storage, len))
    }

    /// Creates an aligned buffer holding `data`, zero-padded to the next
    /// block boundary.
    pub fn from_data(data: &[u8]) -> Self {
        let mut buf = Self::zeroed(data.len());
        buf.as_mut_slice()[..data.len()].copy_from_slice(data);
        buf
    }

    fn from_storage(storage: Vec<u8>, len: usize) -> Self {
        let addr = storage.as_ptr() as usize;
        let start = (BLOCK_ALIGNMENT - addr % BLOCK_ALIGNMENT) % BLOCK_ALIGNMENT;
        Self {
            storage,
            start,
            len,
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.storage[self.start..self.start + self.len]
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.storage[self.start..self.start + self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Fills the whole buffer with `byte`.
    pub fn fill(&mut self, byte: u8) {
        self.as_mut_slice().fill(byte);
    }
}

impl AsRef<[u8]> for AlignedBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl AsMut<[u8]> for AlignedBuffer {
    fn as_mut(&mut self) -> &mut [u8] {
        self.as_mut_slice()
    }
}

/// Whether `buf` can be used for an unbuffered transfer as-is.
pub fn is_aligned(buf: &[u8]) -> bool {
    buf.as_ptr() as usize % BLOCK_ALIGNMENT == 0 && buf.len() % BLOCK_ALIGNMENT == 0
}

/// Rounds `value` up to the nearest multiple of `alignment`.
pub fn round_up(value: usize, alignment: usize) -> usize {
    debug_assert!(
        alignment.is_power_of_two(),
        "alignment must be a power of two"
    );
    (value + alignment - 1) & !(alignment - 1)
}
