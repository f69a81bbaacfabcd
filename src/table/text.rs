// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use super::FlatHashTable;
use crate::coding::{decode_int, decode_str, encode_str};

impl<B: AsRef<[u8]> + AsMut<[u8]>> FlatHashTable<B> {
    /// Stores a string as a NUL-terminated value.
    ///
    /// # Errors
    ///
    /// Same as [`FlatHashTable::put`].
    pub fn put_str<K: AsRef<[u8]>>(&mut self, key: K, value: &str) -> crate::Result<()> {
        self.put(key, encode_str(value))
    }

    /// Stores a formatted string.
    ///
    /// ```
    /// # let mut table = hasharr::Config::new(10).create_in_memory()?;
    /// table.put_fmt("greeting", format_args!("hello {}", 42))?;
    /// assert_eq!("hello 42", table.get_str("greeting")?);
    /// # Ok::<(), hasharr::Error>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Same as [`FlatHashTable::put`].
    pub fn put_fmt<K: AsRef<[u8]>>(
        &mut self,
        key: K,
        args: std::fmt::Arguments<'_>,
    ) -> crate::Result<()> {
        self.put_str(key, &args.to_string())
    }

    /// Stores an integer as its decimal string.
    ///
    /// # Errors
    ///
    /// Same as [`FlatHashTable::put`].
    pub fn put_int<K: AsRef<[u8]>>(&mut self, key: K, value: i64) -> crate::Result<()> {
        self.put_str(key, &value.to_string())
    }
}

impl<B: AsRef<[u8]>> FlatHashTable<B> {
    /// Reads a value stored with [`FlatHashTable::put_str`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`](crate::Error::NotFound) if the key does not exist,
    /// or [`Error::Decode`](crate::Error::Decode) if the value is not UTF-8.
    pub fn get_str<K: AsRef<[u8]>>(&self, key: K) -> crate::Result<String> {
        Ok(decode_str(self.get(key)?)?)
    }

    /// Reads a value stored with [`FlatHashTable::put_int`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`](crate::Error::NotFound) if the key does not exist,
    /// or [`Error::Decode`](crate::Error::Decode) if the value is not a decimal integer.
    pub fn get_int<K: AsRef<[u8]>>(&self, key: K) -> crate::Result<i64> {
        Ok(decode_int(self.get(key)?)?)
    }
}
