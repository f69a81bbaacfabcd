// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Table header at the start of the memory block
//!
//! ```text
//! [0..3)   magic "QHA"
//! [3]      format version
//! [4..8)   capacity (u32)
//! [8..12)  used slots (u32)
//! [12..16) entries (u32)
//! ```

use crate::{format_version::FormatVersion, Error};
use byteorder::{ByteOrder, LittleEndian};

pub const MAGIC: &[u8; 3] = b"QHA";

/// Size of the table header in bytes
pub const HEADER_SIZE: usize = 16;

const VERSION_OFFSET: usize = 3;
const CAPACITY_OFFSET: usize = 4;
pub const USED_SLOTS_OFFSET: usize = 8;
pub const ENTRIES_OFFSET: usize = 12;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Header {
    pub version: FormatVersion,
    pub capacity: u32,
    pub used_slots: u32,
    pub entries: u32,
}

impl Header {
    pub fn new(capacity: u32) -> Self {
        Self {
            version: FormatVersion::V1,
            capacity,
            used_slots: 0,
            entries: 0,
        }
    }

    /// Writes the header into the first [`HEADER_SIZE`] bytes.
    #[allow(clippy::indexing_slicing)]
    pub fn write_into(&self, bytes: &mut [u8]) {
        let Some(header) = bytes.get_mut(..HEADER_SIZE) else {
            return;
        };

        let (magic, rest) = header.split_at_mut(MAGIC.len());
        magic.copy_from_slice(MAGIC);

        if let Some(version) = rest.first_mut() {
            *version = u8::from(self.version);
        }

        LittleEndian::write_u32(&mut header[CAPACITY_OFFSET..], self.capacity);
        LittleEndian::write_u32(&mut header[USED_SLOTS_OFFSET..], self.used_slots);
        LittleEndian::write_u32(&mut header[ENTRIES_OFFSET..], self.entries);
    }

    /// Reads and checks the header of an initialized block.
    pub fn read_from(bytes: &[u8]) -> crate::Result<Self> {
        let Some(header) = bytes.get(..HEADER_SIZE) else {
            return Err(Error::InvalidHeader("Header"));
        };

        if header.get(..MAGIC.len()) != Some(&MAGIC[..]) {
            return Err(Error::InvalidHeader("Magic"));
        }

        let version = header.get(VERSION_OFFSET).copied().unwrap_or_default();
        let version = FormatVersion::try_from(version).map_err(|()| Error::InvalidVersion(version))?;

        Ok(Self {
            version,
            capacity: read_u32(header, CAPACITY_OFFSET),
            used_slots: read_u32(header, USED_SLOTS_OFFSET),
            entries: read_u32(header, ENTRIES_OFFSET),
        })
    }
}

/// Reads a header counter; the block is known to hold a full header.
#[allow(clippy::indexing_slicing)]
pub fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    LittleEndian::read_u32(&bytes[offset..offset + 4])
}

/// Writes a header counter; the block is known to hold a full header.
#[allow(clippy::indexing_slicing)]
pub fn write_u32(bytes: &mut [u8], offset: usize, value: u32) {
    LittleEndian::write_u32(&mut bytes[offset..offset + 4], value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn header_write_read() -> crate::Result<()> {
        let mut bytes = [0; HEADER_SIZE];

        let mut header = Header::new(100);
        header.used_slots = 7;
        header.entries = 3;
        header.write_into(&mut bytes);

        assert_eq!(b"QHA\x01", &bytes[..4]);
        assert_eq!(header, Header::read_from(&bytes)?);

        Ok(())
    }

    #[test]
    fn header_bad_magic() {
        let bytes = [0; HEADER_SIZE];
        assert!(matches!(
            Header::read_from(&bytes),
            Err(Error::InvalidHeader("Magic"))
        ));
    }

    #[test]
    fn header_bad_version() {
        let mut bytes = [0; HEADER_SIZE];
        Header::new(1).write_into(&mut bytes);
        bytes[VERSION_OFFSET] = 9;

        assert!(matches!(
            Header::read_from(&bytes),
            Err(Error::InvalidVersion(9))
        ));
    }

    #[test]
    fn header_too_short() {
        assert!(matches!(
            Header::read_from(b"QHA"),
            Err(Error::InvalidHeader("Header"))
        ));
    }
}
