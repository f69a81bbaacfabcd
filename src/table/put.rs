// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use super::{integrity_fault, FlatHashTable};
use crate::{
    hash::fingerprint128,
    slot::{slots_needed, SlotKind, MAX_COLLISIONS},
    Error,
};

/// Rejects keys that cannot be stored.
pub(super) fn check_key(key: &[u8]) -> crate::Result<()> {
    if key.is_empty() {
        return Err(Error::InvalidArgument("key is empty"));
    }

    if key.len() > usize::from(u16::MAX) {
        return Err(Error::InvalidArgument("key is longer than 65535 bytes"));
    }

    Ok(())
}

fn out_of_space(key: &[u8]) -> Error {
    log::warn!(
        "Flat hash table is out of space for key {:?}",
        String::from_utf8_lossy(key),
    );
    Error::OutOfSpace
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> FlatHashTable<B> {
    /// Inserts a key/value pair, replacing the value if the key already exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the key is empty or longer than 65535 bytes.
    ///
    /// Returns [`Error::OutOfSpace`] if there are not enough empty slots for
    /// the value. In that case the table is left unchanged.
    pub fn put<K: AsRef<[u8]>, V: AsRef<[u8]>>(&mut self, key: K, value: V) -> crate::Result<()> {
        let key = key.as_ref();
        let value = value.as_ref();

        check_key(key)?;

        if self.free_slots() == 0 {
            return Err(out_of_space(key));
        }

        let needed = slots_needed(value.len());
        let home = self.home_index(key);

        match self.kind_of(home)? {
            SlotKind::Empty => {
                if needed > self.free_slots() {
                    return Err(out_of_space(key));
                }

                self.write_entry(home, home, SlotKind::Home { collisions: 1 }, key, value)?;

                log::trace!(
                    "put(new) {:?} (idx={home}, used={})",
                    String::from_utf8_lossy(key),
                    self.used_slots(),
                );
            }
            SlotKind::Home { collisions } => {
                if let Some(idx) = self.find_entry(key, home)? {
                    // NOTE: The old slots are reused, so only the difference has to be free
                    let reclaimed = self.chain_len(idx)?;

                    if needed > self.free_slots() + reclaimed {
                        return Err(out_of_space(key));
                    }

                    log::trace!("put(upd) {:?} (idx={idx})", String::from_utf8_lossy(key));

                    self.remove(key)?;
                    return self.put(key, value);
                }

                if collisions >= MAX_COLLISIONS || needed > self.free_slots() {
                    return Err(out_of_space(key));
                }

                let idx = self
                    .find_empty(self.next_index(home))
                    .ok_or_else(|| out_of_space(key))?;

                self.write_entry(idx, home, SlotKind::Collision, key, value)?;

                self.slot_mut(home).set_kind(SlotKind::Home {
                    collisions: collisions + 1,
                });

                log::trace!(
                    "put(col) {:?} (idx={idx}, home={home}, used={})",
                    String::from_utf8_lossy(key),
                    self.used_slots(),
                );
            }
            SlotKind::Collision | SlotKind::Extension => {
                // NOTE: Moving the foreign block takes one slot and frees the home slot
                if needed > self.free_slots() {
                    return Err(out_of_space(key));
                }

                let target = self
                    .find_empty(self.next_index(home))
                    .ok_or_else(|| out_of_space(key))?;

                self.relocate(home, target)?;
                self.write_entry(home, home, SlotKind::Home { collisions: 1 }, key, value)?;

                log::trace!(
                    "put(swp) {:?} (idx={home}, moved to {target}, used={})",
                    String::from_utf8_lossy(key),
                    self.used_slots(),
                );
            }
        }

        Ok(())
    }

    /// Writes a new entry into the empty slot `idx`, chaining extension
    /// blocks for the part of the value that does not fit.
    ///
    /// If the chain cannot be completed, every slot claimed so far is released.
    pub(super) fn write_entry(
        &mut self,
        idx: u32,
        home: u32,
        kind: SlotKind,
        key: &[u8],
        value: &[u8],
    ) -> crate::Result<()> {
        if !self.slot(idx).is_empty() {
            return Err(integrity_fault(format!(
                "slot {idx} is not empty for new entry"
            )));
        }

        {
            let mut slot = self.slot_mut(idx);
            slot.clear();
            slot.set_kind(kind);
            slot.set_home(home);
            slot.set_link(None);
            slot.set_key(key, fingerprint128(key));
        }

        let written = self.slot_mut(idx).write_value(kind, value);
        self.claim_slot();

        let mut rest = value.get(written..).unwrap_or_default();
        let mut tail = idx;

        while !rest.is_empty() {
            let Some(next) = self.find_empty(self.next_index(tail)) else {
                self.free_chain(idx)?;
                return Err(out_of_space(key));
            };

            let written = {
                let mut slot = self.slot_mut(next);
                slot.clear();
                slot.set_kind(SlotKind::Extension);
                slot.set_home(tail);
                slot.set_link(None);
                slot.write_value(SlotKind::Extension, rest)
            };

            self.slot_mut(tail).set_link(Some(next));
            self.claim_slot();

            log::trace!(
                "slot {next} is linked to slot {tail} for key {:?}",
                String::from_utf8_lossy(key),
            );

            rest = rest.get(written..).unwrap_or_default();
            tail = next;
        }

        let entries = self.entries();
        self.set_entries(entries + 1);

        Ok(())
    }

    /// Moves a collision or extension block out of the way, fixing the links
    /// that point at it.
    fn relocate(&mut self, from: u32, to: u32) -> crate::Result<()> {
        self.copy_slot(from, to)?;
        self.release_slot(from);

        let moved = self.slot(to);
        let link = moved.link();
        let prev = moved.home();

        if let Some(next) = link {
            let next = self.checked_index(next)?;
            self.slot_mut(next).set_home(to);
        }

        if self.kind_of(to)? == SlotKind::Extension {
            let prev = self.checked_index(prev)?;
            self.slot_mut(prev).set_link(Some(to));
        }

        Ok(())
    }
}
