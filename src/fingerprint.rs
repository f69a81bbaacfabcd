// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

/// Size of an encoded fingerprint in bytes
pub const FINGERPRINT_SIZE: usize = 16;

/// A 128-bit key fingerprint
///
/// Stored next to a truncated key so that two long keys sharing the same
/// prefix and length can still be told apart.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Fingerprint(u128);

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl Fingerprint {
    /// Wraps a fingerprint value.
    #[must_use]
    pub fn from_raw(value: u128) -> Self {
        Self(value)
    }

    /// Returns the raw 128-bit integer.
    #[must_use]
    pub fn into_u128(self) -> u128 {
        self.0
    }

    /// Returns the on-memory (little-endian) representation.
    #[must_use]
    pub fn to_bytes(self) -> [u8; FINGERPRINT_SIZE] {
        self.0.to_le_bytes()
    }

    /// Reads a fingerprint from its on-memory representation.
    #[must_use]
    pub fn from_bytes(bytes: [u8; FINGERPRINT_SIZE]) -> Self {
        Self(u128::from_le_bytes(bytes))
    }
}
