// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

mod debug;
mod get;
mod iter;
mod put;
mod remove;
mod text;
mod verify;


pub use iter::{Entry, Iter};

use crate::{
    header::{self, Header, ENTRIES_OFFSET, HEADER_SIZE, USED_SLOTS_OFFSET},
    slot::{Slot, SlotKind, SlotMut, SLOT_SIZE},
    Error,
};
use std::ops::Range;

/// Largest slot count addressable by the i32 slot links
pub(crate) const MAX_CAPACITY: usize = i32::MAX as usize;

/// Smallest block that holds a table (header and one slot)
const MIN_BLOCK_SIZE: usize = HEADER_SIZE + SLOT_SIZE;

/// Returns how many bytes a memory block needs to hold `max_slots` slots.
///
/// A single entry can take several slots if its value is large.
///
/// Returns `None` if the size does not fit into `usize`.
///
/// ```
/// assert_eq!(Some(16 + 10 * 78), hasharr::calculate_required_size(10));
/// assert_eq!(None, hasharr::calculate_required_size(usize::MAX));
/// ```
#[must_use]
pub fn calculate_required_size(max_slots: usize) -> Option<usize> {
    SLOT_SIZE
        .checked_mul(max_slots)
        .and_then(|slots| slots.checked_add(HEADER_SIZE))
}

/// Table size statistics, see [`FlatHashTable::size`]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TableSize {
    /// Number of live keys
    pub entries: usize,

    /// Total number of slots
    pub capacity: usize,

    /// Number of non-empty slots
    pub used_slots: usize,
}

impl TableSize {
    /// Ratio of used slots to total slots.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn load_factor(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.used_slots as f64 / self.capacity as f64
        }
    }
}

/// A hash table living entirely inside a caller-provided memory block
///
/// The header, every key and every value are stored inside the block,
/// so it can be placed in shared memory or a memory-mapped file and be
/// opened by other processes with [`FlatHashTable::open`].
///
/// The slot capacity is fixed at creation. Values larger than one slot
/// are chained across additional slots, keys longer than
/// [`KEY_CAPACITY`](crate::KEY_CAPACITY) bytes are stored truncated together
/// with a fingerprint of the full key.
///
/// ##### Concurrency
///
/// The table does no locking. Inside one process, `&mut self` serializes
/// writers. Processes sharing a block must wrap every call into their own
/// cross-process lock (e.g. an advisory file lock or a semaphore).
pub struct FlatHashTable<B> {
    memory: B,

    /// Copy of the header capacity, fixed at creation
    capacity: u32,
}

impl<B: AsRef<[u8]>> std::fmt::Debug for FlatHashTable<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlatHashTable")
            .field("size", &self.size())
            .finish_non_exhaustive()
    }
}

impl<B: AsRef<[u8]>> FlatHashTable<B> {
    /// Attaches to a block that was initialized by [`FlatHashTable::create`].
    ///
    /// Nothing is written, so a read-only block (e.g. `&[u8]`) is enough
    /// for lookups and iteration.
    ///
    /// # Errors
    ///
    /// Returns error if the block does not contain a valid table header,
    /// or is smaller than the capacity in its header requires.
    pub fn open(memory: B) -> crate::Result<Self> {
        let bytes = memory.as_ref();
        let header = Header::read_from(bytes)?;

        let capacity = header.capacity as usize;

        let Some(required) = calculate_required_size(capacity)
            .filter(|_| capacity > 0 && capacity <= MAX_CAPACITY)
        else {
            return Err(Error::InvalidHeader("Capacity"));
        };

        if bytes.len() < required {
            return Err(Error::InvalidSize {
                size: bytes.len(),
                required,
            });
        }

        if header.used_slots > header.capacity || header.entries > header.used_slots {
            return Err(Error::InvalidHeader("Counters"));
        }

        log::debug!(
            "Opened flat hash table: {} entries, {}/{} slots used",
            header.entries,
            header.used_slots,
            header.capacity,
        );

        Ok(Self {
            memory,
            capacity: header.capacity,
        })
    }

    /// Returns the number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity as usize
    }

    /// Returns the number of live keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries() as usize
    }

    /// Returns `true` if the table contains no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of keys, the slot capacity and the number of used slots.
    #[must_use]
    pub fn size(&self) -> TableSize {
        TableSize {
            entries: self.entries() as usize,
            capacity: self.capacity(),
            used_slots: self.used_slots() as usize,
        }
    }

    /// Returns the underlying memory block.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.memory.as_ref()
    }

    /// Returns a reference to the memory block, e.g. to flush a memory map.
    #[must_use]
    pub fn get_ref(&self) -> &B {
        &self.memory
    }

    /// Gives the memory block back to the caller.
    #[must_use]
    pub fn into_inner(self) -> B {
        self.memory
    }

    pub(crate) fn used_slots(&self) -> u32 {
        header::read_u32(self.memory.as_ref(), USED_SLOTS_OFFSET)
    }

    pub(crate) fn entries(&self) -> u32 {
        header::read_u32(self.memory.as_ref(), ENTRIES_OFFSET)
    }

    pub(crate) fn free_slots(&self) -> usize {
        self.capacity().saturating_sub(self.used_slots() as usize)
    }

    /// Home index of a key.
    pub(crate) fn home_index(&self, key: &[u8]) -> u32 {
        crate::hash::hash32(key) % self.capacity
    }

    /// Next index in probe order, wrapping around at the end of the slot array.
    pub(crate) fn next_index(&self, idx: u32) -> u32 {
        if idx + 1 >= self.capacity {
            0
        } else {
            idx + 1
        }
    }

    fn slot_range(idx: u32) -> Range<usize> {
        let start = HEADER_SIZE + idx as usize * SLOT_SIZE;
        start..(start + SLOT_SIZE)
    }

    /// Returns a view of the given slot.
    ///
    /// `idx` must be smaller than the capacity.
    #[allow(clippy::indexing_slicing)]
    pub(crate) fn slot(&self, idx: u32) -> Slot<'_> {
        debug_assert!(idx < self.capacity);

        // NOTE: The block was checked to hold `capacity` slots
        Slot::new(&self.memory.as_ref()[Self::slot_range(idx)])
    }

    /// Decodes the tag of the given slot.
    pub(crate) fn kind_of(&self, idx: u32) -> crate::Result<SlotKind> {
        let raw = self.slot(idx).raw_count();

        SlotKind::try_from(raw)
            .map_err(|()| integrity_fault(format!("slot {idx} has invalid tag {raw}")))
    }

    /// Checks that a slot index read from the block is in bounds.
    pub(crate) fn checked_index(&self, idx: u32) -> crate::Result<u32> {
        if idx < self.capacity {
            Ok(idx)
        } else {
            Err(integrity_fault(format!(
                "slot index {idx} out of bounds (capacity {})",
                self.capacity,
            )))
        }
    }

    /// Finds the nearest empty slot starting at `start`, wrapping around once.
    pub(crate) fn find_empty(&self, start: u32) -> Option<u32> {
        let start = if start >= self.capacity { 0 } else { start };

        let mut idx = start;
        loop {
            if self.slot(idx).is_empty() {
                return Some(idx);
            }

            idx = self.next_index(idx);
            if idx == start {
                return None;
            }
        }
    }

    /// Counts the slots of the value chain starting at `idx`.
    pub(crate) fn chain_len(&self, idx: u32) -> crate::Result<usize> {
        let mut count = 1;
        let mut current = idx;

        while let Some(next) = self.slot(current).link() {
            current = self.checked_index(next)?;
            count += 1;

            if count > self.capacity() {
                return Err(integrity_fault(format!("value chain at slot {idx} loops")));
            }
        }

        Ok(count)
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> FlatHashTable<B> {
    /// Initializes a new, empty table inside the given memory block.
    ///
    /// The whole block is zeroed. The slot capacity is
    /// `(block size - header size) / slot size`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSize`] if the block cannot hold a single slot.
    pub fn create(mut memory: B) -> crate::Result<Self> {
        let bytes = memory.as_mut();
        let size = bytes.len();

        let capacity = size.saturating_sub(HEADER_SIZE) / SLOT_SIZE;

        if capacity < 1 || size <= HEADER_SIZE {
            return Err(Error::InvalidSize {
                size,
                required: MIN_BLOCK_SIZE,
            });
        }

        // NOTE: Links are i32, so larger blocks only use the addressable part
        let capacity = capacity.min(MAX_CAPACITY);

        #[allow(clippy::cast_possible_truncation)]
        let capacity = capacity as u32;

        bytes.fill(0);
        Header::new(capacity).write_into(bytes);

        log::debug!("Created flat hash table with {capacity} slots ({size} bytes)");

        Ok(Self { memory, capacity })
    }

    /// Removes every entry.
    ///
    /// Zeroes the whole slot array and resets the counters.
    pub fn clear(&mut self) {
        let capacity = self.capacity();

        // NOTE: The block was checked to hold `capacity` slots
        let end = HEADER_SIZE + capacity * SLOT_SIZE;

        if let Some(slots) = self.memory.as_mut().get_mut(HEADER_SIZE..end) {
            slots.fill(0);
        }

        self.set_used_slots(0);
        self.set_entries(0);

        log::debug!("Cleared flat hash table ({capacity} slots)");
    }

    pub(crate) fn set_used_slots(&mut self, value: u32) {
        header::write_u32(self.memory.as_mut(), USED_SLOTS_OFFSET, value);
    }

    pub(crate) fn set_entries(&mut self, value: u32) {
        header::write_u32(self.memory.as_mut(), ENTRIES_OFFSET, value);
    }

    /// Returns a mutable view of the given slot.
    ///
    /// `idx` must be smaller than the capacity.
    #[allow(clippy::indexing_slicing)]
    pub(crate) fn slot_mut(&mut self, idx: u32) -> SlotMut<'_> {
        debug_assert!(idx < self.capacity);

        // NOTE: The block was checked to hold `capacity` slots
        SlotMut::new(&mut self.memory.as_mut()[Self::slot_range(idx)])
    }

    /// Marks a slot as taken.
    pub(crate) fn claim_slot(&mut self) {
        let used = self.used_slots();
        self.set_used_slots(used + 1);
    }

    /// Zeroes a slot and marks it as free.
    pub(crate) fn release_slot(&mut self, idx: u32) {
        self.slot_mut(idx).clear();

        let used = self.used_slots();
        self.set_used_slots(used.saturating_sub(1));
    }

    /// Copies slot `from` into the empty slot `to`; `from` is left untouched.
    pub(crate) fn copy_slot(&mut self, from: u32, to: u32) -> crate::Result<()> {
        if !self.slot(to).is_empty() || self.slot(from).is_empty() {
            return Err(integrity_fault(format!(
                "cannot copy slot {from} into non-empty slot {to}"
            )));
        }

        let src = Self::slot_range(from);
        let dst = Self::slot_range(to).start;
        self.memory.as_mut().copy_within(src, dst);
        self.claim_slot();

        Ok(())
    }

    /// Frees the value chain starting at `idx`, returns the number of slots freed.
    pub(crate) fn free_chain(&mut self, idx: u32) -> crate::Result<usize> {
        let mut freed = 0;
        let mut current = Some(idx);

        while let Some(idx) = current {
            let idx = self.checked_index(idx)?;

            if self.slot(idx).is_empty() {
                return Err(integrity_fault(format!("value chain hits empty slot {idx}")));
            }

            current = self.slot(idx).link();
            self.release_slot(idx);
            freed += 1;
        }

        Ok(freed)
    }
}

/// Builds an integrity error, logging it at the point of detection.
pub(crate) fn integrity_fault(msg: String) -> Error {
    log::error!("Flat hash table integrity fault: {msg}");
    Error::IntegrityFault(msg)
}
