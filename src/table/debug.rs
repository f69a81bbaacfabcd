// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use super::FlatHashTable;
use crate::slot::{Slot, SlotKind};
use std::io::Write;

/// Maximum number of value bytes printed per entry
const MAX_HUMAN_OUTPUT: usize = 60;

/// Writes bytes as text, replacing non-printable bytes by `?`.
fn write_human<W: Write>(out: &mut W, bytes: &[u8], max: usize) -> std::io::Result<()> {
    let shown: String = bytes
        .iter()
        .take(max)
        .map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                char::from(b)
            } else {
                '?'
            }
        })
        .collect();

    write!(out, "{shown}")?;

    if bytes.len() > max {
        write!(out, "...")?;
    }

    Ok(())
}

impl<B: AsRef<[u8]>> FlatHashTable<B> {
    /// Writes every entry as `name=value (size)`, for troubleshooting.
    ///
    /// Truncated keys are printed as `prefix...(length)=value (size)`.
    /// The output format is not stable.
    ///
    /// # Errors
    ///
    /// Returns error if writing fails or the slot structure is corrupted.
    pub fn debug<W: Write>(&self, out: &mut W) -> crate::Result<()> {
        for entry in self {
            let entry = entry?;

            write_human(out, &entry.key, entry.key.len())?;

            if entry.is_truncated() {
                write!(out, "...({})", entry.key_len)?;
            }

            write!(out, "=")?;
            write_human(out, &entry.value, MAX_HUMAN_OUTPUT)?;
            writeln!(out, " ({})", entry.value.len())?;
        }

        Ok(())
    }

    /// Writes the table counters and one line per non-empty slot.
    ///
    /// # Errors
    ///
    /// Returns error if writing fails or a slot has an invalid tag.
    pub fn debug_slots<W: Write>(&self, out: &mut W) -> crate::Result<()> {
        let size = self.size();

        writeln!(
            out,
            "{} elements (slot {} used/{} total)",
            size.entries, size.used_slots, size.capacity,
        )?;

        for idx in 0..self.capacity {
            let kind = self.kind_of(idx)?;
            let slot = self.slot(idx);

            match kind {
                SlotKind::Empty => continue,
                SlotKind::Extension => {
                    write!(
                        out,
                        "slot={idx},type=EXTEND,prev={},next={},data=",
                        slot.home(),
                        slot.raw_link(),
                    )?;
                }
                SlotKind::Home { .. } | SlotKind::Collision => {
                    let label = if kind == SlotKind::Collision {
                        "COLISN"
                    } else {
                        "NORMAL"
                    };

                    write!(
                        out,
                        "slot={idx},type={label},count={},hash={},key=",
                        slot.raw_count(),
                        slot.home(),
                    )?;
                    write_human(out, slot.stored_key(), MAX_HUMAN_OUTPUT)?;
                    write!(out, ",keylen={},next={},data=", slot.key_len(), slot.raw_link())?;
                }
            }

            write_chunk(out, &slot, kind)?;
            writeln!(out, ",size={}", slot.chunk_size())?;
        }

        Ok(())
    }
}

fn write_chunk<W: Write>(out: &mut W, slot: &Slot<'_>, kind: SlotKind) -> std::io::Result<()> {
    match slot.value_chunk(kind) {
        Some(chunk) => write_human(out, chunk, MAX_HUMAN_OUTPUT),
        None => write!(out, "<invalid>"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn human_output_masks_binary() -> std::io::Result<()> {
        let mut out = vec![];
        write_human(&mut out, b"ab\0c\n", 60)?;
        assert_eq!(b"ab?c?", &*out);
        Ok(())
    }

    #[test]
    fn human_output_is_capped() -> std::io::Result<()> {
        let mut out = vec![];
        write_human(&mut out, b"abcdef", 3)?;
        assert_eq!(b"abc...", &*out);
        Ok(())
    }
}
