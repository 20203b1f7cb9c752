//! Error and status types for the marshaling layer.

use thiserror::Error;

/// Result type for marshaling operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur in the marshaling layer.
///
/// Every failure maps onto exactly one [`Status`] code; marshaling errors are
/// detected and returned before any caller-visible state is mutated.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Malformed, out-of-range or missing-required input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A requested key or entry does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Operation attempted on a handle in the wrong state (released,
    /// not ready, or carrying no data for the request).
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// A caller-supplied destination buffer is too small for the result.
    #[error("buffer too small: required {required} bytes, provided {provided}")]
    BufferTooSmall {
        /// Bytes the operation needs to write, including the terminator.
        required: usize,
        /// Bytes the caller provided.
        provided: usize,
    },

    /// Failure originating from an underlying inference backend.
    #[error("backend error: {0}")]
    Backend(String),

    /// Unspecified internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Closed status code enumeration shared across the binary interface.
///
/// The numeric codes are pinned and versioned with the dtype codes (protocol
/// v1); downstream bindings dispatch on these values and must never see them
/// drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Status {
    /// Success.
    Ok = 0,
    /// Malformed or out-of-range input.
    InvalidArgument = 1,
    /// Requested entry does not exist.
    NotFound = 2,
    /// Operation not valid for the handle's current state.
    InvalidOperation = 3,
    /// Destination buffer cannot hold the result.
    BufferTooSmall = 4,
    /// Failure inside an inference backend.
    Backend = 5,
    /// Unspecified internal failure.
    Internal = 6,
}

impl Status {
    /// The pinned numeric code for this status.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Look up a status by its pinned numeric code.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Ok),
            1 => Some(Self::InvalidArgument),
            2 => Some(Self::NotFound),
            3 => Some(Self::InvalidOperation),
            4 => Some(Self::BufferTooSmall),
            5 => Some(Self::Backend),
            6 => Some(Self::Internal),
            _ => None,
        }
    }
}

impl From<&CoreError> for Status {
    fn from(error: &CoreError) -> Self {
        match error {
            CoreError::InvalidArgument(_) => Status::InvalidArgument,
            CoreError::NotFound(_) => Status::NotFound,
            CoreError::InvalidOperation(_) => Status::InvalidOperation,
            CoreError::BufferTooSmall { .. } => Status::BufferTooSmall,
            CoreError::Backend(_) => Status::Backend,
            CoreError::Internal(_) => Status::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_are_pinned() {
        assert_eq!(Status::Ok.code(), 0);
        assert_eq!(Status::InvalidArgument.code(), 1);
        assert_eq!(Status::NotFound.code(), 2);
        assert_eq!(Status::InvalidOperation.code(), 3);
        assert_eq!(Status::BufferTooSmall.code(), 4);
        assert_eq!(Status::Backend.code(), 5);
        assert_eq!(Status::Internal.code(), 6);
    }

    #[test]
    fn test_status_round_trip() {
        for code in 0..=6 {
            let status = Status::from_code(code).unwrap();
            assert_eq!(status.code(), code);
        }
        assert!(Status::from_code(7).is_none());
        assert!(Status::from_code(-1).is_none());
    }

    #[test]
    fn test_error_to_status() {
        let err = CoreError::BufferTooSmall {
            required: 10,
            provided: 9,
        };
        assert_eq!(Status::from(&err), Status::BufferTooSmall);
        assert_eq!(
            Status::from(&CoreError::NotFound("x".into())),
            Status::NotFound
        );
    }
}
