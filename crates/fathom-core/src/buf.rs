//! Fixed-size destination buffer conventions for string accessors.
//!
//! Two conventions exist across the binary interface and both are supported
//! as named operation variants rather than by overloading one call on null
//! pointers:
//!
//! 1. Negotiated size: the caller queries the required size (`*_size`
//!    accessors built on [`required_size`]), allocates exactly that, then
//!    fills with [`fill`]. An undersized destination is a hard error with no
//!    partial write.
//! 2. Legacy fixed buffer: the caller pre-allocates generously and
//!    [`fill_lossy`] writes a terminated result that silently truncates to
//!    fit.
//!
//! Neither convention ever writes past the declared destination length.

use crate::error::{CoreError, Result};

/// Destination size required to hold `s`: its UTF-8 bytes plus a NUL
/// terminator.
pub fn required_size(s: &str) -> usize {
    s.len() + 1
}

/// Copy `s` plus a NUL terminator into `dst` (negotiated-size convention).
///
/// Returns the number of bytes written, which always equals
/// [`required_size`]. Fails with `BufferTooSmall` — writing nothing — when
/// `dst` cannot hold the full result.
pub fn fill(s: &str, dst: &mut [u8]) -> Result<usize> {
    let required = required_size(s);
    if dst.len() < required {
        return Err(CoreError::BufferTooSmall {
            required,
            provided: dst.len(),
        });
    }
    dst[..s.len()].copy_from_slice(s.as_bytes());
    dst[s.len()] = 0;
    Ok(required)
}

/// Copy as much of `s` as fits into `dst`, always NUL-terminated (legacy
/// convention).
///
/// Truncation happens on a character boundary so the destination stays
/// valid UTF-8. Returns the bytes written including the terminator; an
/// empty destination writes nothing and returns 0.
pub fn fill_lossy(s: &str, dst: &mut [u8]) -> usize {
    if dst.is_empty() {
        return 0;
    }
    let mut end = s.len().min(dst.len() - 1);
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    dst[..end].copy_from_slice(&s.as_bytes()[..end]);
    dst[end] = 0;
    end + 1
}
