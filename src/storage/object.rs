//! Stored Objects
//!
//! Every key in the store maps to exactly one [`Object`]: a typed payload
//! plus an optional absolute expiry time expressed in milliseconds since the
//! Unix epoch.
//!
//! Expiry is a pure function of the object and a clock reading, so the same
//! predicate backs both passive expiry (checked on every access) and the
//! background sweeper.

use crate::storage::set::MemberSet;
use crate::storage::zset::SortedSet;
use bytes::Bytes;
use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current wall-clock time in milliseconds since the Unix epoch.
///
/// A clock set before 1970 reads as `0` rather than panicking.
#[inline]
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// The payload of an object. Exactly one variant is active per key.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A binary-safe scalar string
    Str(Bytes),
    /// Members ordered by score
    SortedSet(SortedSet),
    /// Unique members
    Set(MemberSet),
}

impl Value {
    /// Name of the variant as it appears in logs.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::SortedSet(_) => "zset",
            Value::Set(_) => "set",
        }
    }
}

/// A value stored under a key, with optional expiry.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    /// The key this object is stored under
    pub key: Bytes,
    /// The stored payload
    pub value: Value,
    /// Absolute expiry in ms since the epoch (None = never expires)
    pub expires_at: Option<u64>,
}

impl Object {
    /// Creates a new object.
    ///
    /// A negative `ttl_ms` means the object never expires. Any other value
    /// sets the expiry to `now + ttl_ms`, so a TTL of zero produces an object
    /// that is already expired.
    pub fn new(key: Bytes, value: Value, ttl_ms: i64) -> Self {
        let expires_at = if ttl_ms < 0 {
            None
        } else {
            Some(now_ms().saturating_add(ttl_ms as u64))
        };

        Self {
            key,
            value,
            expires_at,
        }
    }

    /// Creates an object that never expires.
    pub fn persistent(key: Bytes, value: Value) -> Self {
        Self {
            key,
            value,
            expires_at: None,
        }
    }

    /// Returns true iff an expiry is set and `now` has reached it.
    #[inline]
    pub fn is_expired(&self, now: u64) -> bool {
        self.expires_at.map(|exp| now >= exp).unwrap_or(false)
    }
}
