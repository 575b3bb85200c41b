// Error types for the UBX codec

use thiserror::Error;

/// Errors building an outgoing frame
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("payload of {0} bytes exceeds the UBX length field")]
    PayloadTooLong(usize),
}

/// Errors raised while decoding an incoming byte stream
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error(
        "checksum mismatch on {class:#04x}/{id:#04x}: expected {expected:02x?}, got {actual:02x?}"
    )]
    ChecksumMismatch {
        class: u8,
        id: u8,
        expected: (u8, u8),
        actual: (u8, u8),
    },

    #[error("declared payload length {0} exceeds decoder limit")]
    PayloadTooLong(usize),
}

/// Errors interpreting the payload of a decoded frame
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    #[error("{message} payload must be {expected}, got {actual} bytes")]
    BadLength {
        message: &'static str,
        expected: &'static str,
        actual: usize,
    },

    #[error("{message} contains non-ASCII text")]
    BadText { message: &'static str },
}
