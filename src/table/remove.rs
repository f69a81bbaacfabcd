// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use super::{integrity_fault, put::check_key, FlatHashTable};
use crate::{slot::SlotKind, Error};

impl<B: AsRef<[u8]> + AsMut<[u8]>> FlatHashTable<B> {
    /// Removes a key and frees every slot of its value.
    ///
    /// If the key sits in its home slot and other keys collided with it,
    /// one of the colliding entries is moved into the home slot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the key does not exist.
    ///
    /// Returns [`Error::IntegrityFault`] if the slot structure is inconsistent.
    pub fn remove<K: AsRef<[u8]>>(&mut self, key: K) -> crate::Result<()> {
        let key = key.as_ref();
        check_key(key)?;

        let home = self.home_index(key);

        let Some(idx) = self.find_entry(key, home)? else {
            log::trace!("rem {:?} - not found", String::from_utf8_lossy(key));
            return Err(Error::NotFound);
        };

        match self.kind_of(idx)? {
            SlotKind::Home { collisions: 1 } => {
                self.free_chain(idx)?;

                log::trace!(
                    "rem {:?} (idx={idx}, used={})",
                    String::from_utf8_lossy(key),
                    self.used_slots(),
                );
            }
            SlotKind::Home { collisions } => {
                let partner = self.find_collision_partner(idx)?;

                self.free_chain(idx)?;
                self.copy_slot(partner, idx)?;
                self.release_slot(partner);

                self.slot_mut(idx).set_kind(SlotKind::Home {
                    collisions: collisions - 1,
                });

                if let Some(next) = self.slot(idx).link() {
                    let next = self.checked_index(next)?;
                    self.slot_mut(next).set_home(idx);
                }

                log::trace!(
                    "rem(lead) {:?} (idx={idx}, moved {partner}, used={})",
                    String::from_utf8_lossy(key),
                    self.used_slots(),
                );
            }
            SlotKind::Collision => {
                let SlotKind::Home { collisions } = self.kind_of(home)? else {
                    return Err(integrity_fault(format!(
                        "home slot {home} of collision slot {idx} is not a home slot"
                    )));
                };

                if collisions <= 1 {
                    return Err(integrity_fault(format!(
                        "collision counter of home slot {home} is {collisions}"
                    )));
                }

                self.slot_mut(home).set_kind(SlotKind::Home {
                    collisions: collisions - 1,
                });
                self.free_chain(idx)?;

                log::trace!(
                    "rem(dup) {:?} (idx={idx}, home={home}, used={})",
                    String::from_utf8_lossy(key),
                    self.used_slots(),
                );
            }
            kind @ (SlotKind::Empty | SlotKind::Extension) => {
                return Err(integrity_fault(format!(
                    "lookup returned {kind:?} slot {idx}"
                )));
            }
        }

        let entries = self.entries();
        self.set_entries(entries.saturating_sub(1));

        Ok(())
    }

    /// Finds a collision entry that belongs to the home slot `home`.
    fn find_collision_partner(&self, home: u32) -> crate::Result<u32> {
        let mut idx = self.next_index(home);

        while idx != home {
            if self.kind_of(idx)? == SlotKind::Collision && self.slot(idx).home() == home {
                return Ok(idx);
            }
            idx = self.next_index(idx);
        }

        Err(integrity_fault(format!(
            "home slot {home} has no collision entry to move in"
        )))
    }
}
