// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! A hash table that lives entirely inside a fixed, caller-provided memory block.
//!
//! ##### About
//!
//! This crate exports a [`FlatHashTable`] that maps byte-string keys to byte-string values
//! and keeps *all* of its state, including the header, keys and values, inside one flat
//! memory region. The region can come from anywhere: a `Vec<u8>`, a shared memory segment
//! or a memory-mapped file. Because slots reference each other by index instead of by
//! pointer, a block can be attached to by other processes at a different address
//! using [`FlatHashTable::open`].
//!
//! The memory is split into a small header and an array of fixed-size slots.
//! Keys are placed at their home slot (`hash(key) % capacity`), colliding keys are put
//! into the nearest free slot. Values that do not fit into one slot are chained across
//! extension slots; keys longer than [`KEY_CAPACITY`] bytes are stored truncated together
//! with a 128-bit fingerprint of the full key.
//!
//! The table never allocates table memory and never grows: the number of slots is
//! fixed when the table is created.
//!
//! ```
//! use hasharr::{calculate_required_size, FlatHashTable};
//!
//! let memory = vec![0; calculate_required_size(100).expect("should fit")];
//! let mut table = FlatHashTable::create(memory)?;
//!
//! table.put_str("e1", "a")?;
//! table.put_str("e2", "b")?;
//! table.put_str("e3", "c")?;
//!
//! assert_eq!("b", table.get_str("e2")?);
//! assert_eq!(3, table.len());
//! # Ok::<(), hasharr::Error>(())
//! ```
//!
//! ##### Block layout
//!
//! A block is a [`HEADER_SIZE`]-byte header followed by `capacity` slots of [`SLOT_SIZE`]
//! bytes each. The slot layout itself is internal, only its size constants are exported.
//!
//! ```compile_fail
//! use hasharr::slot::SlotKind;
//! ```
//!
//! ##### Concurrency
//!
//! The table performs no internal locking. Callers that share a block between processes
//! must serialize every call with their own cross-process lock.

#![deny(clippy::all, missing_docs, clippy::cargo)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::indexing_slicing)]
#![warn(clippy::pedantic, clippy::nursery)]
#![warn(clippy::expect_used)]
#![allow(clippy::missing_const_for_fn)]
#![warn(clippy::multiple_crate_versions)]
#![allow(clippy::option_if_let_else)]
#![warn(clippy::redundant_feature_names)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod coding;
mod config;
mod error;
mod fingerprint;
mod format_version;

/// Hash functions used for slot selection and key fingerprints
pub mod hash;

mod header;
mod slot;
mod table;

pub use {
    coding::DecodeError,
    config::Config,
    error::{Error, Result},
    fingerprint::Fingerprint,
    format_version::FormatVersion,
    header::HEADER_SIZE,
    slot::{EXTENSION_CAPACITY, KEY_CAPACITY, SLOT_SIZE, VALUE_CAPACITY},
    table::{calculate_required_size, Entry, FlatHashTable, Iter, TableSize},
};
