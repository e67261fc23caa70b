//! Generated key/value pairs.

use std::fmt;

/// One key/value pair destined for the remote map.
///
/// Entries are not kept after submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The number both key and value are derived from.
    pub n: u32,
    pub key: String,
    pub value: String,
}

impl Entry {
    pub fn new(n: u32) -> Self {
        Self {
            n,
            key: format!("key-{n}"),
            value: format!("value-{n}"),
        }
    }

    /// Recover `n` from a `key-<n>` string.
    pub fn parse_key(key: &str) -> Option<u32> {
        key.strip_prefix("key-")?.parse().ok()
    }

    /// Recover `n` from a `value-<n>` string.
    pub fn parse_value(value: &str) -> Option<u32> {
        value.strip_prefix("value-")?.parse().ok()
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.key, self.value)
    }
}
