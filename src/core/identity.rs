//! Record identity: opaque row ids and human-facing DMT codes

use rand::Rng;
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Prefix carried by every generated DMT code
pub const RECORD_CODE_PREFIX: &str = "DMT";

/// Number of random base-36 characters at the end of a DMT code
const RANDOM_SUFFIX_LEN: usize = 5;

/// Length in bytes of an opaque id before hex encoding
const OPAQUE_ID_BYTES: usize = 16;

const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate an opaque lookup-row id: 32 lowercase hex characters.
///
/// No check against existing ids is made. A collision shows up later as a
/// primary-key constraint failure from storage.
pub fn new_opaque_id() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; OPAQUE_ID_BYTES] = rng.random();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Generate a new DMT code such as `DMT-LR3K9F2-A8X3Q`
pub fn new_record_code() -> String {
    RecordCode::generate().to_string()
}

/// Encode an unsigned integer in lowercase base 36
pub fn to_base36(mut value: u128) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// A human-legible DMT record code: `DMT-<timestamp base36>-<5 random base36>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordCode {
    timestamp: String,
    suffix: String,
}

impl RecordCode {
    /// Build a code from the current time and five random base-36 characters
    pub fn generate() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);

        let mut rng = rand::rng();
        let suffix: String = (0..RANDOM_SUFFIX_LEN)
            .map(|_| BASE36_DIGITS[rng.random_range(0..36)] as char)
            .collect();

        Self {
            timestamp: to_base36(millis).to_uppercase(),
            suffix: suffix.to_uppercase(),
        }
    }

    /// Parse a code string, case-insensitively
    pub fn parse(s: &str) -> Result<Self, IdParseError> {
        let upper = s.trim().to_uppercase();
        let mut parts = upper.splitn(3, '-');

        let prefix = parts.next().unwrap_or_default();
        if prefix != RECORD_CODE_PREFIX {
            return Err(IdParseError::InvalidPrefix(s.to_string()));
        }

        let (timestamp, suffix) = match (parts.next(), parts.next()) {
            (Some(ts), Some(sfx)) => (ts, sfx),
            _ => return Err(IdParseError::MissingDelimiter(s.to_string())),
        };

        let is_base36 = |part: &str| part.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase());

        if timestamp.is_empty() || !is_base36(timestamp) {
            return Err(IdParseError::InvalidTimestamp(s.to_string()));
        }
        if suffix.len() != RANDOM_SUFFIX_LEN || !is_base36(suffix) {
            return Err(IdParseError::InvalidSuffix(s.to_string()));
        }

        Ok(Self {
            timestamp: timestamp.to_string(),
            suffix: suffix.to_string(),
        })
    }

    /// Milliseconds since the Unix epoch encoded in the code
    pub fn timestamp_millis(&self) -> Option<u128> {
        u128::from_str_radix(&self.timestamp, 36).ok()
    }
}

impl fmt::Display for RecordCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", RECORD_CODE_PREFIX, self.timestamp, self.suffix)
    }
}

impl FromStr for RecordCode {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Errors when parsing a DMT code
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdParseError {
    #[error("code must start with 'DMT-': {0}")]
    InvalidPrefix(String),

    #[error("code must have the form DMT-<timestamp>-<suffix>: {0}")]
    MissingDelimiter(String),

    #[error("code timestamp is not base 36: {0}")]
    InvalidTimestamp(String),

    #[error("code suffix must be 5 base-36 characters: {0}")]
    InvalidSuffix(String),
}
