// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Structural verification of a table block.

use super::{integrity_fault, FlatHashTable};
use crate::slot::SlotKind;

impl<B: AsRef<[u8]>> FlatHashTable<B> {
    /// Checks the whole slot structure for consistency.
    ///
    /// Verifies that
    /// - the header counters match the slot contents,
    /// - every home slot counts exactly the entries that hash to it,
    /// - every collision entry points to a home slot,
    /// - every value chain is correctly back-linked, and
    /// - every extension block belongs to exactly one chain.
    ///
    /// Runs in _O(capacity)_ time and allocates two bitmaps of capacity size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IntegrityFault`](crate::Error::IntegrityFault)
    /// describing the first violation found.
    pub fn verify(&self) -> crate::Result<()> {
        let capacity = self.capacity();

        let mut members = vec![0_usize; capacity];
        let mut reached = vec![false; capacity];

        let mut used = 0;
        let mut entries = 0;

        for idx in 0..self.capacity {
            let kind = self.kind_of(idx)?;

            if kind == SlotKind::Empty {
                continue;
            }
            used += 1;

            if !kind.is_pair() {
                continue;
            }
            entries += 1;

            let slot = self.slot(idx);
            let home = self.checked_index(slot.home())?;

            if let Some(count) = members.get_mut(home as usize) {
                *count += 1;
            }

            match kind {
                SlotKind::Home { .. } if home != idx => {
                    return Err(integrity_fault(format!(
                        "home slot {idx} claims home index {home}"
                    )));
                }
                SlotKind::Collision if !matches!(self.kind_of(home)?, SlotKind::Home { .. }) => {
                    return Err(integrity_fault(format!(
                        "collision slot {idx} points to non-home slot {home}"
                    )));
                }
                _ => {}
            }

            if slot.key_len() == 0 {
                return Err(integrity_fault(format!("pair slot {idx} has an empty key")));
            }

            let mut prev = idx;
            let mut next = slot.link();

            while let Some(current) = next {
                let current = self.checked_index(current)?;

                if self.kind_of(current)? != SlotKind::Extension {
                    return Err(integrity_fault(format!(
                        "slot {current} linked from slot {prev} is not an extension block"
                    )));
                }

                let block = self.slot(current);

                if block.home() != prev {
                    return Err(integrity_fault(format!(
                        "extension block {current} links back to {} instead of {prev}",
                        block.home()
                    )));
                }

                match reached.get_mut(current as usize) {
                    Some(seen) if !*seen => *seen = true,
                    _ => {
                        return Err(integrity_fault(format!(
                            "extension block {current} is reached twice"
                        )));
                    }
                }

                prev = current;
                next = block.link();
            }
        }

        for idx in 0..self.capacity {
            let expected = members.get(idx as usize).copied().unwrap_or_default();

            match self.kind_of(idx)? {
                SlotKind::Home { collisions } if usize::from(collisions) != expected => {
                    return Err(integrity_fault(format!(
                        "home slot {idx} counts {collisions} entries, found {expected}"
                    )));
                }
                SlotKind::Extension if !reached.get(idx as usize).copied().unwrap_or_default() => {
                    return Err(integrity_fault(format!(
                        "extension block {idx} is not part of any chain"
                    )));
                }
                _ => {}
            }
        }

        let size = self.size();

        if size.used_slots != used {
            return Err(integrity_fault(format!(
                "header counts {} used slots, found {used}",
                size.used_slots
            )));
        }

        if size.entries != entries {
            return Err(integrity_fault(format!(
                "header counts {} entries, found {entries}",
                size.entries
            )));
        }

        Ok(())
    }
}
