// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::coding::DecodeError;

/// Represents errors that can occur in the flat hash table
#[derive(Debug)]
pub enum Error {
    /// Memory block is too small to hold a header and at least one slot
    /// (or too large to be addressed by slot links)
    InvalidSize {
        /// Size of the given memory block
        size: usize,

        /// Minimum size needed
        required: usize,
    },

    /// Invalid key or value
    InvalidArgument(&'static str),

    /// No empty slot is left for the entry
    OutOfSpace,

    /// Key does not exist
    NotFound,

    /// Iteration cursor is exhausted
    NoMoreElements,

    /// The slot structure is inconsistent
    ///
    /// Caused by unsynchronized concurrent access or a corrupted block;
    /// the table should not be used anymore.
    IntegrityFault(String),

    /// The memory block does not contain an initialized table
    InvalidHeader(&'static str),

    /// Unknown format version in the table header
    InvalidVersion(u8),

    /// I/O error (dump sinks)
    Io(std::io::Error),

    /// Stored value could not be decoded as the requested type
    Decode(DecodeError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HashArrError: {self:?}")
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<DecodeError> for Error {
    fn from(value: DecodeError) -> Self {
        Self::Decode(value)
    }
}

/// Table result
pub type Result<T> = std::result::Result<T, Error>;
