// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{
    header::HEADER_SIZE,
    slot::SLOT_SIZE,
    table::{calculate_required_size, MAX_CAPACITY},
    Error, FlatHashTable,
};

/// Table configuration
///
/// The slot layout itself is fixed at compile time, because it is
/// the format shared between processes. The configuration only decides
/// how many slots a table gets.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    /// Number of slots
    max_slots: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self { max_slots: 1_000 }
    }
}

impl Config {
    /// Creates a configuration for a table with `max_slots` slots.
    #[must_use]
    pub fn new(max_slots: usize) -> Self {
        Self { max_slots }
    }

    /// Creates a configuration for as many slots as fit into `bytes`.
    #[must_use]
    pub fn from_memory_size(bytes: usize) -> Self {
        Self {
            max_slots: bytes.saturating_sub(HEADER_SIZE) / SLOT_SIZE,
        }
    }

    /// Sets the number of slots.
    ///
    /// A single entry takes more than one slot if its value
    /// does not fit into one slot.
    #[must_use]
    pub fn max_slots(mut self, n: usize) -> Self {
        self.max_slots = n;
        self
    }

    /// Returns the configured number of slots.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.max_slots
    }

    /// Returns the memory block size needed for the configured slots.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSize`] if no slots are configured.
    ///
    /// Returns [`Error::InvalidArgument`] if more slots are configured than
    /// slot links can address (`i32::MAX`), or the size overflows `usize`.
    pub fn memory_size(&self) -> crate::Result<usize> {
        if self.max_slots == 0 {
            return Err(Error::InvalidSize {
                size: HEADER_SIZE,
                required: HEADER_SIZE + SLOT_SIZE,
            });
        }

        if self.max_slots > MAX_CAPACITY {
            return Err(Error::InvalidArgument("slot count exceeds i32::MAX"));
        }

        calculate_required_size(self.max_slots)
            .ok_or(Error::InvalidArgument("table size overflows usize"))
    }

    /// Allocates a heap block and creates a table in it.
    ///
    /// # Errors
    ///
    /// Same as [`Config::memory_size`].
    pub fn create_in_memory(&self) -> crate::Result<FlatHashTable<Vec<u8>>> {
        FlatHashTable::create(vec![0; self.memory_size()?])
    }

    /// Creates a table in a caller-provided block.
    ///
    /// The table uses the whole block, so it may get more slots than configured.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSize`] if the block is smaller than [`Config::memory_size`],
    /// or the error of [`Config::memory_size`].
    pub fn create_in<B: AsRef<[u8]> + AsMut<[u8]>>(
        &self,
        memory: B,
    ) -> crate::Result<FlatHashTable<B>> {
        let size = memory.as_ref().len();
        let required = self.memory_size()?;

        if size < required {
            return Err(Error::InvalidSize { size, required });
        }

        FlatHashTable::create(memory)
    }
}
