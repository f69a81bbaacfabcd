// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Fixed-size slot layout
//!
//! Every slot is [`SLOT_SIZE`] bytes. All integers are little-endian.
//!
//! ```text
//! [0..2)   collision count (i16)     0 = empty, >0 = home, -1 = collision, -2 = extension
//! [2..4)   value chunk size (u16)    value bytes stored in this slot
//! [4..8)   home index (u32)          for extension blocks: previous block index
//! [8..12)  link (i32)                next extension block, -1 = end of chain
//! [12..78) payload
//!
//! pair payload:      value[32] | key[16] | key len (u16) | fingerprint[16]
//! extension payload: value[66]
//! ```
//!
//! The layout is the sharing format: processes attached to the same block
//! must be built with the same constants.

// NOTE: All offsets are constants inside a slot, and slot views are only
// constructed over exactly SLOT_SIZE bytes
#![allow(clippy::indexing_slicing)]

use crate::fingerprint::{Fingerprint, FINGERPRINT_SIZE};
use byteorder::{ByteOrder, LittleEndian};

/// Maximum number of key bytes stored in a slot, longer keys are truncated
pub const KEY_CAPACITY: usize = 16;

/// Value bytes stored inline in a key/value slot
pub const VALUE_CAPACITY: usize = 32;

const SLOT_HEADER_SIZE: usize = 12;

/// Value bytes stored in an extension slot
pub const EXTENSION_CAPACITY: usize = VALUE_CAPACITY + KEY_CAPACITY + 2 + FINGERPRINT_SIZE;

/// Size of a single slot in bytes
pub const SLOT_SIZE: usize = SLOT_HEADER_SIZE + EXTENSION_CAPACITY;

/// Maximum number of entries sharing one home slot
pub const MAX_COLLISIONS: u16 = i16::MAX as u16;

/// Link value terminating an extension chain
const NO_LINK: i32 = -1;

const COUNT_OFFSET: usize = 0;
const CHUNK_SIZE_OFFSET: usize = 2;
const HOME_OFFSET: usize = 4;
const LINK_OFFSET: usize = 8;
const PAYLOAD_OFFSET: usize = SLOT_HEADER_SIZE;

const PAIR_VALUE_OFFSET: usize = PAYLOAD_OFFSET;
const PAIR_KEY_OFFSET: usize = PAIR_VALUE_OFFSET + VALUE_CAPACITY;
const PAIR_KEY_LEN_OFFSET: usize = PAIR_KEY_OFFSET + KEY_CAPACITY;
const PAIR_FINGERPRINT_OFFSET: usize = PAIR_KEY_LEN_OFFSET + 2;

/// What a slot currently holds
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SlotKind {
    /// Unused slot
    Empty,

    /// First block of an entry that lives at its home index
    ///
    /// `collisions` counts all live entries with this home index,
    /// including this one.
    Home {
        /// Entries hashing to this slot
        collisions: u16,
    },

    /// First block of an entry whose home index is elsewhere
    Collision,

    /// Continuation block of an oversized value
    Extension,
}

impl SlotKind {
    /// Returns `true` if the slot starts a key/value pair.
    #[must_use]
    pub fn is_pair(self) -> bool {
        matches!(self, Self::Home { .. } | Self::Collision)
    }

    /// Number of value bytes a slot of this kind can hold.
    #[must_use]
    pub fn value_capacity(self) -> usize {
        match self {
            Self::Extension => EXTENSION_CAPACITY,
            _ => VALUE_CAPACITY,
        }
    }
}

impl From<SlotKind> for i16 {
    #[allow(clippy::cast_possible_wrap)]
    fn from(value: SlotKind) -> Self {
        match value {
            SlotKind::Empty => 0,
            // NOTE: Bounded by MAX_COLLISIONS
            SlotKind::Home { collisions } => collisions as i16,
            SlotKind::Collision => -1,
            SlotKind::Extension => -2,
        }
    }
}

impl TryFrom<i16> for SlotKind {
    type Error = ();

    #[allow(clippy::cast_sign_loss)]
    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Empty),
            1.. => Ok(Self::Home {
                collisions: value as u16,
            }),
            -1 => Ok(Self::Collision),
            -2 => Ok(Self::Extension),
            _ => Err(()),
        }
    }
}

/// Number of slots a value of the given length occupies.
#[must_use]
pub fn slots_needed(value_len: usize) -> usize {
    if value_len <= VALUE_CAPACITY {
        1
    } else {
        1 + (value_len - VALUE_CAPACITY).div_ceil(EXTENSION_CAPACITY)
    }
}

/// Read-only view over one slot
#[derive(Copy, Clone)]
pub struct Slot<'a>(&'a [u8]);

impl<'a> Slot<'a> {
    /// Wraps exactly [`SLOT_SIZE`] bytes.
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        debug_assert_eq!(SLOT_SIZE, bytes.len());
        Self(bytes)
    }

    /// Raw collision counter / tag.
    #[must_use]
    pub fn raw_count(&self) -> i16 {
        LittleEndian::read_i16(&self.0[COUNT_OFFSET..])
    }

    /// Returns `true` if the slot holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw_count() == 0
    }

    /// Value bytes stored in this slot.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        usize::from(LittleEndian::read_u16(&self.0[CHUNK_SIZE_OFFSET..]))
    }

    /// Home index (pairs) or previous block index (extension blocks).
    #[must_use]
    pub fn home(&self) -> u32 {
        LittleEndian::read_u32(&self.0[HOME_OFFSET..])
    }

    /// Raw link value.
    #[must_use]
    pub fn raw_link(&self) -> i32 {
        LittleEndian::read_i32(&self.0[LINK_OFFSET..])
    }

    /// Next block of the value chain, if any.
    ///
    /// Any negative link ends the chain.
    #[must_use]
    pub fn link(&self) -> Option<u32> {
        u32::try_from(self.raw_link()).ok()
    }

    /// Original length of the stored key.
    #[must_use]
    pub fn key_len(&self) -> usize {
        usize::from(LittleEndian::read_u16(&self.0[PAIR_KEY_LEN_OFFSET..]))
    }

    /// Returns `true` if only a prefix of the key is stored.
    #[must_use]
    pub fn is_key_truncated(&self) -> bool {
        self.key_len() > KEY_CAPACITY
    }

    /// The stored (possibly truncated) key bytes.
    #[must_use]
    pub fn stored_key(&self) -> &'a [u8] {
        let len = self.key_len().min(KEY_CAPACITY);
        &self.0[PAIR_KEY_OFFSET..PAIR_KEY_OFFSET + len]
    }

    /// Fingerprint of the full key.
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        let mut bytes = [0; FINGERPRINT_SIZE];
        bytes.copy_from_slice(
            &self.0[PAIR_FINGERPRINT_OFFSET..PAIR_FINGERPRINT_OFFSET + FINGERPRINT_SIZE],
        );
        Fingerprint::from_bytes(bytes)
    }

    /// The value bytes held by this slot.
    ///
    /// Returns `None` if the chunk size exceeds what a slot of that kind can hold.
    #[must_use]
    pub fn value_chunk(&self, kind: SlotKind) -> Option<&'a [u8]> {
        let bytes: &'a [u8] = self.0;
        let start = match kind {
            SlotKind::Extension => PAYLOAD_OFFSET,
            _ => PAIR_VALUE_OFFSET,
        };
        let size = self.chunk_size();
        (size <= kind.value_capacity()).then(|| &bytes[start..start + size])
    }
}

/// Mutable view over one slot
pub struct SlotMut<'a>(&'a mut [u8]);

impl<'a> SlotMut<'a> {
    /// Wraps exactly [`SLOT_SIZE`] bytes.
    pub(crate) fn new(bytes: &'a mut [u8]) -> Self {
        debug_assert_eq!(SLOT_SIZE, bytes.len());
        Self(bytes)
    }

    /// Zeroes the whole slot.
    pub fn clear(&mut self) {
        self.0.fill(0);
    }

    /// Sets the collision counter / tag.
    pub fn set_kind(&mut self, kind: SlotKind) {
        LittleEndian::write_i16(&mut self.0[COUNT_OFFSET..], i16::from(kind));
    }

    /// Sets the home index (or previous block index).
    pub fn set_home(&mut self, home: u32) {
        LittleEndian::write_u32(&mut self.0[HOME_OFFSET..], home);
    }

    /// Sets the next block of the value chain.
    #[allow(clippy::cast_possible_wrap)]
    pub fn set_link(&mut self, link: Option<u32>) {
        // NOTE: Indexes are bounded by the table capacity, which fits into i32
        let raw = link.map_or(NO_LINK, |idx| idx as i32);
        LittleEndian::write_i32(&mut self.0[LINK_OFFSET..], raw);
    }

    /// Stores the (possibly truncated) key, its original length and fingerprint.
    ///
    /// The key length must fit into a u16.
    #[allow(clippy::cast_possible_truncation)]
    pub fn set_key(&mut self, key: &[u8], fingerprint: Fingerprint) {
        let stored = key.len().min(KEY_CAPACITY);
        let area = &mut self.0[PAIR_KEY_OFFSET..PAIR_KEY_OFFSET + KEY_CAPACITY];
        area.fill(0);
        area[..stored].copy_from_slice(&key[..stored]);

        LittleEndian::write_u16(&mut self.0[PAIR_KEY_LEN_OFFSET..], key.len() as u16);

        self.0[PAIR_FINGERPRINT_OFFSET..PAIR_FINGERPRINT_OFFSET + FINGERPRINT_SIZE]
            .copy_from_slice(&fingerprint.to_bytes());
    }

    /// Copies as much of `value` as fits into this slot and returns the number of bytes written.
    #[allow(clippy::cast_possible_truncation)]
    pub fn write_value(&mut self, kind: SlotKind, value: &[u8]) -> usize {
        let start = match kind {
            SlotKind::Extension => PAYLOAD_OFFSET,
            _ => PAIR_VALUE_OFFSET,
        };
        let n = value.len().min(kind.value_capacity());
        self.0[start..start + n].copy_from_slice(&value[..n]);

        // NOTE: n <= EXTENSION_CAPACITY
        LittleEndian::write_u16(&mut self.0[CHUNK_SIZE_OFFSET..], n as u16);
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::fingerprint128;
    use test_log::test;

    #[test]
    fn slot_layout_size() {
        assert_eq!(66, EXTENSION_CAPACITY);
        assert_eq!(78, SLOT_SIZE);
        assert_eq!(SLOT_SIZE, PAIR_FINGERPRINT_OFFSET + FINGERPRINT_SIZE);
    }

    #[test]
    fn slot_kind_tags() {
        for kind in [
            SlotKind::Empty,
            SlotKind::Home { collisions: 1 },
            SlotKind::Home { collisions: 7 },
            SlotKind::Collision,
            SlotKind::Extension,
        ] {
            assert_eq!(Ok(kind), SlotKind::try_from(i16::from(kind)));
        }

        assert_eq!(Err(()), SlotKind::try_from(-3_i16));
        assert_eq!(Err(()), SlotKind::try_from(i16::MIN));
    }

    #[test]
    fn slots_needed_boundaries() {
        assert_eq!(1, slots_needed(0));
        assert_eq!(1, slots_needed(VALUE_CAPACITY));
        assert_eq!(2, slots_needed(VALUE_CAPACITY + 1));
        assert_eq!(2, slots_needed(VALUE_CAPACITY + EXTENSION_CAPACITY));
        assert_eq!(3, slots_needed(VALUE_CAPACITY + EXTENSION_CAPACITY + 1));
    }

    #[test]
    fn slot_pair_fields() {
        let mut bytes = [0; SLOT_SIZE];
        let key = b"a-rather-long-key-name";
        let fp = fingerprint128(key);

        let mut slot = SlotMut::new(&mut bytes);
        slot.set_kind(SlotKind::Collision);
        slot.set_home(5);
        slot.set_link(Some(9));
        slot.set_key(key, fp);
        assert_eq!(VALUE_CAPACITY, slot.write_value(SlotKind::Collision, &[7; 40]));

        let slot = Slot::new(&bytes);
        assert_eq!(-1, slot.raw_count());
        assert_eq!(5, slot.home());
        assert_eq!(Some(9), slot.link());
        assert_eq!(key.len(), slot.key_len());
        assert!(slot.is_key_truncated());
        assert_eq!(&key[..KEY_CAPACITY], slot.stored_key());
        assert_eq!(fp, slot.fingerprint());
        assert_eq!(Some(&[7; VALUE_CAPACITY][..]), slot.value_chunk(SlotKind::Collision));
    }

    #[test]
    fn slot_extension_fields() {
        let mut bytes = [0; SLOT_SIZE];

        let mut slot = SlotMut::new(&mut bytes);
        slot.set_kind(SlotKind::Extension);
        slot.set_link(None);
        assert_eq!(10, slot.write_value(SlotKind::Extension, b"0123456789"));

        let slot = Slot::new(&bytes);
        assert_eq!(None, slot.link());
        assert_eq!(-1, slot.raw_link());
        assert_eq!(Some(&b"0123456789"[..]), slot.value_chunk(SlotKind::Extension));
    }

    #[test]
    fn slot_oversized_chunk_is_rejected() {
        let mut bytes = [0; SLOT_SIZE];
        LittleEndian::write_u16(&mut bytes[CHUNK_SIZE_OFFSET..], 50);

        let slot = Slot::new(&bytes);
        assert_eq!(None, slot.value_chunk(SlotKind::Home { collisions: 1 }));
        assert!(slot.value_chunk(SlotKind::Extension).is_some());
    }
}
