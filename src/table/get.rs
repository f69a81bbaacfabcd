// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use super::{integrity_fault, put::check_key, FlatHashTable};
use crate::{
    fingerprint::Fingerprint,
    hash::fingerprint128,
    slot::{Slot, SlotKind, KEY_CAPACITY},
    Error,
};

/// Compares a lookup key against the key stored in a pair slot.
///
/// Truncated keys match if length, stored prefix and fingerprint are equal.
/// The fingerprint of the lookup key is computed at most once per lookup.
fn key_matches(slot: &Slot<'_>, key: &[u8], fingerprint: &mut Option<Fingerprint>) -> bool {
    if slot.key_len() != key.len() {
        return false;
    }

    if key.len() <= KEY_CAPACITY {
        return slot.stored_key() == key;
    }

    let prefix = key.get(..KEY_CAPACITY).unwrap_or(key);
    if slot.stored_key() != prefix {
        return false;
    }

    let fingerprint = *fingerprint.get_or_insert_with(|| fingerprint128(key));
    slot.fingerprint() == fingerprint
}

impl<B: AsRef<[u8]>> FlatHashTable<B> {
    /// Returns a copy of the value of the given key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the key does not exist,
    /// or [`Error::InvalidArgument`] for an empty key.
    pub fn get<K: AsRef<[u8]>>(&self, key: K) -> crate::Result<Vec<u8>> {
        let key = key.as_ref();
        check_key(key)?;

        let home = self.home_index(key);
        let idx = self.find_entry(key, home)?.ok_or(Error::NotFound)?;

        self.read_value(idx)
    }

    /// Returns `true` if the table contains the given key.
    ///
    /// # Errors
    ///
    /// Returns error if the slot structure is corrupted.
    pub fn contains_key<K: AsRef<[u8]>>(&self, key: K) -> crate::Result<bool> {
        let key = key.as_ref();
        check_key(key)?;

        let home = self.home_index(key);
        Ok(self.find_entry(key, home)?.is_some())
    }

    /// Finds the slot holding the first block of `key`.
    ///
    /// Scans circularly from the home slot, looking at pair slots belonging
    /// to `home`, and stops once as many candidates as the home slot counts
    /// have been compared.
    pub(crate) fn find_entry(&self, key: &[u8], home: u32) -> crate::Result<Option<u32>> {
        let SlotKind::Home { collisions } = self.kind_of(home)? else {
            return Ok(None);
        };

        let mut fingerprint = None;
        let mut seen = 0;
        let mut idx = home;

        while seen < collisions {
            let slot = self.slot(idx);

            if slot.home() == home && self.kind_of(idx)?.is_pair() {
                seen += 1;

                if key_matches(&slot, key, &mut fingerprint) {
                    return Ok(Some(idx));
                }
            }

            idx = self.next_index(idx);
            if idx == home {
                break;
            }
        }

        Ok(None)
    }

    /// Reassembles the value whose first block is at `idx`.
    pub(crate) fn read_value(&self, idx: u32) -> crate::Result<Vec<u8>> {
        let mut value = Vec::new();
        let mut current = idx;
        let mut steps = 0;

        loop {
            let kind = self.kind_of(current)?;

            let expected = if current == idx {
                kind.is_pair()
            } else {
                kind == SlotKind::Extension
            };

            if !expected {
                return Err(integrity_fault(format!(
                    "unexpected {kind:?} slot {current} in value chain of slot {idx}"
                )));
            }

            let slot = self.slot(current);

            let chunk = slot.value_chunk(kind).ok_or_else(|| {
                integrity_fault(format!(
                    "slot {current} has invalid chunk size {}",
                    slot.chunk_size()
                ))
            })?;
            value.extend_from_slice(chunk);

            let Some(next) = slot.link() else {
                break;
            };

            steps += 1;
            if steps >= self.capacity() {
                return Err(integrity_fault(format!("value chain at slot {idx} loops")));
            }

            current = self.checked_index(next)?;
        }

        Ok(value)
    }
}
