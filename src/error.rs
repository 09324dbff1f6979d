//! Error types for packing and unpacking.

use std::string::FromUtf8Error;

/// Errors that can occur while packing or unpacking MessagePack data.
///
/// Any error returned by an [`Unpacker`](crate::unpack::Unpacker) is terminal
/// for that instance: the read position may sit inside a partially consumed
/// value and cannot be resynchronized.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("type mismatch: expected {expected}, found marker 0x{found:02X}")]
    TypeMismatch { expected: &'static str, found: u8 },

    #[error("type mismatch: raw payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] FromUtf8Error),

    #[error("value does not fit in {0}")]
    Overflow(&'static str),

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("unsupported type: {0}")]
    UnsupportedType(&'static str),

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The observable failure classes of [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    TypeMismatch,
    Overflow,
    UnexpectedEof,
    UnsupportedType,
    LimitExceeded,
    Io,
}

impl Error {
    /// Returns the failure class. Invalid UTF-8 in a string read counts as a
    /// type mismatch.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TypeMismatch { .. } | Self::InvalidUtf8(_) => ErrorKind::TypeMismatch,
            Self::Overflow(_) => ErrorKind::Overflow,
            Self::UnexpectedEof => ErrorKind::UnexpectedEof,
            Self::UnsupportedType(_) => ErrorKind::UnsupportedType,
            Self::LimitExceeded(_) => ErrorKind::LimitExceeded,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn mismatch(expected: &'static str, found: u8) -> Self {
        Self::TypeMismatch { expected, found }
    }

    /// Overflow error naming the Rust target type `T`.
    pub(crate) fn overflow<T>() -> Self {
        Self::Overflow(std::any::type_name::<T>())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
