//! Insertion-ordered context map attached to error values.
//!
//! [`ContextMap`] stores caller-supplied debugging metadata as ordered
//! `String -> serde_json::Value` pairs. Re-inserting an existing key replaces
//! the value in place, keeping the original position. The map carries a
//! structural byte estimator and a deterministic truncation policy used by the
//! creation pipeline when the configured size ceiling is exceeded.
//!
//! # Examples
//!
//! ```
//! use faultline::types::ContextMap;
//! use serde_json::json;
//!
//! let mut ctx = ContextMap::new();
//! ctx.insert("user_id", json!(42));
//! ctx.insert("endpoint", json!("/api/orders"));
//!
//! assert_eq!(ctx.len(), 2);
//! assert_eq!(ctx.get("user_id"), Some(&json!(42)));
//! ```

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use smallvec::SmallVec;

/// Inline capacity for context entries before spilling to the heap.
///
/// Most call sites attach a handful of entries, so four inline slots keep the
/// common case allocation-free.
pub(crate) const INLINE_ENTRIES: usize = 4;

/// An insertion-ordered mapping of `String -> serde_json::Value`.
///
/// Unlike a `HashMap`, iteration order is the insertion order, which keeps
/// serialized error payloads stable and makes truncation deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextMap {
    entries: SmallVec<[(String, Value); INLINE_ENTRIES]>,
}

impl ContextMap {
    /// Creates an empty context map.
    #[inline]
    pub fn new() -> Self {
        Self { entries: SmallVec::new() }
    }

    /// Inserts a key/value pair.
    ///
    /// If the key already exists, the value is replaced in place and the
    /// entry keeps its original position.
    pub fn insert<K: Into<String>>(&mut self, key: K, value: Value) {
        let key = key.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Returns the value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Returns `true` if `key` is present.
    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over entries in insertion order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Structural size estimate of the whole map, in bytes.
    ///
    /// This is a cheap recursive estimate (no serialization) used to enforce
    /// the configured context byte ceiling. The exact figures are not a wire
    /// size, only a stable ordering-friendly measure.
    pub fn estimated_bytes(&self) -> usize {
        self.entries.iter().map(|(k, v)| entry_estimate(k, v)).sum()
    }

    /// Applies the truncation policy: entries are considered in insertion
    /// order and kept while the entry count stays within `max_entries` and the
    /// running byte estimate stays within `max_bytes`. The first entry that
    /// would exceed either bound, and everything after it, is dropped
    /// wholesale. Returns the number of dropped entries.
    ///
    /// Nothing is synthesized into the map; callers must treat missing keys
    /// as "not captured".
    pub fn truncate_to(&mut self, max_entries: usize, max_bytes: usize) -> usize {
        let mut kept = 0usize;
        let mut bytes = 0usize;

        for (key, value) in &self.entries {
            if kept == max_entries {
                break;
            }
            let size = entry_estimate(key, value);
            if bytes + size > max_bytes {
                break;
            }
            bytes += size;
            kept += 1;
        }

        let dropped = self.entries.len() - kept;
        self.entries.truncate(kept);
        dropped
    }
}

/// Estimate for a single entry: key bytes plus separators plus value.
fn entry_estimate(key: &str, value: &Value) -> usize {
    key.len() + 3 + value_estimate(value)
}

/// Recursive structural estimate for a JSON value.
fn value_estimate(value: &Value) -> usize {
    match value {
        Value::Null => 4,
        Value::Bool(_) => 5,
        Value::Number(_) => 8,
        Value::String(s) => s.len() + 2,
        Value::Array(items) => 2 + items.iter().map(value_estimate).sum::<usize>(),
        Value::Object(fields) => {
            2 + fields.iter().map(|(k, v)| k.len() + 3 + value_estimate(v)).sum::<usize>()
        },
    }
}

impl FromIterator<(String, Value)> for ContextMap {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl IntoIterator for ContextMap {
    type Item = (String, Value);
    type IntoIter = smallvec::IntoIter<[(String, Value); INLINE_ENTRIES]>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for ContextMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ContextMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ContextMapVisitor;

        impl<'de> Visitor<'de> for ContextMapVisitor {
            type Value = ContextMap;

            fn expecting(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str("a map of string keys to JSON values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = ContextMap::new();
                while let Some((key, value)) = access.next_entry::<String, Value>()? {
                    map.insert(key, value);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(ContextMapVisitor)
    }
}
