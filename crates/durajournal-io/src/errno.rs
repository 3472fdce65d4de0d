//! OS error code translation.
//!
//! Turns raw platform error codes into bounded, NUL-terminated messages and a
//! coarse [`SpecialErrno`] classification that callers use to special-case
//! out-of-memory, not-found and out-of-space conditions.

use std::io;

/// Conditions callers commonly react to without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SpecialErrno {
    #[default]
    None,
    OutOfMemory,
    NotFound,
    OutOfSpace,
}

#[cfg(unix)]
mod codes {
    pub const OUT_OF_MEMORY: i32 = libc::ENOMEM;
    pub const NOT_FOUND: i32 = libc::ENOENT;
    pub const OUT_OF_SPACE: i32 = libc::ENOSPC;
    pub const INVALID_ARGUMENT: i32 = libc::EINVAL;

    pub fn classify(code: i32) -> super::SpecialErrno {
        use super::SpecialErrno;
        match code {
            libc::ENOMEM => SpecialErrno::OutOfMemory,
            libc::ENOENT => SpecialErrno::NotFound,
            libc::ENOSPC => SpecialErrno::OutOfSpace,
            _ => SpecialErrno::None,
        }
    }
}

#[cfg(windows)]
mod codes {
    const ERROR_FILE_NOT_FOUND: i32 = 2;
    const ERROR_PATH_NOT_FOUND: i32 = 3;
    const ERROR_NOT_ENOUGH_MEMORY: i32 = 8;
    const ERROR_OUTOFMEMORY: i32 = 14;
    const ERROR_HANDLE_DISK_FULL: i32 = 39;
    const ERROR_INVALID_PARAMETER: i32 = 87;
    const ERROR_DISK_FULL: i32 = 112;

    pub const OUT_OF_MEMORY: i32 = ERROR_NOT_ENOUGH_MEMORY;
    pub const NOT_FOUND: i32 = ERROR_FILE_NOT_FOUND;
    pub const OUT_OF_SPACE: i32 = ERROR_DISK_FULL;
    pub const INVALID_ARGUMENT: i32 = ERROR_INVALID_PARAMETER;

    pub fn classify(code: i32) -> super::SpecialErrno {
        use super::SpecialErrno;
        match code {
            ERROR_NOT_ENOUGH_MEMORY | ERROR_OUTOFMEMORY => SpecialErrno::OutOfMemory,
            ERROR_FILE_NOT_FOUND | ERROR_PATH_NOT_FOUND => SpecialErrno::NotFound,
            ERROR_DISK_FULL | ERROR_HANDLE_DISK_FULL => SpecialErrno::OutOfSpace,
            _ => SpecialErrno::None,
        }
    }
}

/// Native code for "out of memory".
pub const OUT_OF_MEMORY: i32 = codes::OUT_OF_MEMORY;
/// Native code for "no such file or directory".
pub const NOT_FOUND: i32 = codes::NOT_FOUND;
/// Native code for "no space left on device".
pub const OUT_OF_SPACE: i32 = codes::OUT_OF_SPACE;
/// Native code for "invalid argument".
pub const INVALID_ARGUMENT: i32 = codes::INVALID_ARGUMENT;

/// Classifies a raw OS error code.
pub fn classify(code: i32) -> SpecialErrno {
    codes::classify(code)
}

/// Failure to render an error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ErrorStringError {
    /// The destination has no room for even the terminator.
    #[error("error string buffer has no room for a terminator")]
    BufferTooSmall,
}

/// Result of [`error_string`].
///
/// The classification is always populated, even when rendering fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorString {
    pub class: SpecialErrno,
    /// Number of message bytes written, excluding the terminator.
    pub rendered: Result<usize, ErrorStringError>,
}

/// Returns the platform's message for `code` without the trailing
/// `(os error N)` that `std` appends.
pub fn describe(code: i32) -> String {
    let rendered = io::Error::from_raw_os_error(code).to_string();
    let suffix = format!(" (os error {code})");
    match rendered.strip_suffix(&suffix) {
        Some(message) => message.to_owned(),
        None => rendered,
    }
}

/// Renders the message for `code` into `buf` as a NUL-terminated string.
///
/// The message is truncated to at most `buf.len() - 1` bytes, cut on a UTF-8
/// character boundary.
pub fn error_string(code: i32, buf: &mut [u8]) -> ErrorString {
    let class = classify(code);
    let rendered = render_into(&describe(code), buf);
    ErrorString { class, rendered }
}

fn render_into(message: &str, buf: &mut [u8]) -> Result<usize, ErrorStringError> {
    let Some(max) = buf.len().checked_sub(1) else {
        return Err(ErrorStringError::BufferTooSmall);
    };

    let mut len = message.len().min(max);
    while !message.is_char_boundary(len) {
        len -= 1;
    }

    buf[..len].copy_from_slice(&message.as_bytes()[..len]);
    buf[len] = 0;
    Ok(len)
}
