// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

/// Error while decoding a stored value as a typed value
#[derive(Debug)]
pub enum DecodeError {
    /// Value is not valid UTF-8
    Utf8(std::string::FromUtf8Error),

    /// Value is not a decimal integer
    InvalidInteger(std::num::ParseIntError),
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "DecodeError({})",
            match self {
                Self::Utf8(e) => format!("Utf8: {e}"),
                Self::InvalidInteger(e) => format!("InvalidInteger: {e}"),
            }
        )
    }
}

impl From<std::string::FromUtf8Error> for DecodeError {
    fn from(value: std::string::FromUtf8Error) -> Self {
        Self::Utf8(value)
    }
}

impl From<std::num::ParseIntError> for DecodeError {
    fn from(value: std::num::ParseIntError) -> Self {
        Self::InvalidInteger(value)
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Utf8(e) => Some(e),
            Self::InvalidInteger(e) => Some(e),
        }
    }
}

/// Encodes a string value the way it is laid out in the table (NUL-terminated).
pub fn encode_str(s: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(s.len() + 1);
    bytes.extend_from_slice(s.as_bytes());
    bytes.push(0);
    bytes
}

/// Decodes a string value, dropping the terminating NUL if present.
pub fn decode_str(mut bytes: Vec<u8>) -> Result<String, DecodeError> {
    if bytes.last() == Some(&0) {
        bytes.pop();
    }
    Ok(String::from_utf8(bytes)?)
}

/// Decodes an integer value stored as a decimal string.
pub fn decode_int(bytes: Vec<u8>) -> Result<i64, DecodeError> {
    Ok(decode_str(bytes)?.trim().parse::<i64>()?)
}
