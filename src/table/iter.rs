// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use super::FlatHashTable;
use crate::Error;

/// A key/value pair read from the table
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Entry {
    /// Stored key bytes
    ///
    /// Only the first [`KEY_CAPACITY`](crate::KEY_CAPACITY) bytes
    /// of longer keys are stored.
    pub key: Vec<u8>,

    /// Length of the original key
    pub key_len: usize,

    /// Value bytes
    pub value: Vec<u8>,
}

impl Entry {
    /// Returns `true` if `key` is only a prefix of the original key.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.key.len() < self.key_len
    }
}

impl<B: AsRef<[u8]>> FlatHashTable<B> {
    /// Returns the next entry at or after `cursor`, advancing the cursor past it.
    ///
    /// Start with a cursor of `0`. Entries come in slot order, not in
    /// insertion order; the order is undefined if the table is modified
    /// between calls.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoMoreElements`] once the cursor reaches the end of the table.
    pub fn get_next(&self, cursor: &mut usize) -> crate::Result<Entry> {
        while *cursor < self.capacity() {
            #[allow(clippy::cast_possible_truncation)]
            let idx = *cursor as u32;

            *cursor += 1;

            if !self.kind_of(idx)?.is_pair() {
                continue;
            }

            let slot = self.slot(idx);
            let key = slot.stored_key().to_vec();
            let key_len = slot.key_len();
            let value = self.read_value(idx)?;

            return Ok(Entry {
                key,
                key_len,
                value,
            });
        }

        Err(Error::NoMoreElements)
    }

    /// Returns an iterator over all entries in slot order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, B> {
        Iter {
            table: self,
            cursor: 0,
        }
    }
}

/// Iterator over the entries of a [`FlatHashTable`]
pub struct Iter<'a, B> {
    table: &'a FlatHashTable<B>,
    cursor: usize,
}

impl<B: AsRef<[u8]>> Iterator for Iter<'_, B> {
    type Item = crate::Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.table.get_next(&mut self.cursor) {
            Ok(entry) => Some(Ok(entry)),
            Err(Error::NoMoreElements) => None,
            Err(e) => {
                // NOTE: Do not yield the same error forever
                self.cursor = self.table.capacity();
                Some(Err(e))
            }
        }
    }
}

impl<'a, B: AsRef<[u8]>> IntoIterator for &'a FlatHashTable<B> {
    type Item = crate::Result<Entry>;
    type IntoIter = Iter<'a, B>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

