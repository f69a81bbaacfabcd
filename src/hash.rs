// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::fingerprint::Fingerprint;

/// Hashes a key for home slot selection.
///
/// The seed is fixed, so every process attached to the same block
/// computes the same home index for a key.
#[must_use]
pub fn hash32(bytes: &[u8]) -> u32 {
    xxhash_rust::xxh32::xxh32(bytes, 0)
}

/// Computes the 128-bit content fingerprint used to tell truncated keys apart.
#[must_use]
pub fn fingerprint128(bytes: &[u8]) -> Fingerprint {
    Fingerprint::from_raw(xxhash_rust::xxh3::xxh3_128(bytes))
}
