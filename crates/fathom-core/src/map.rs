//! Keyed, owned collections of values — the unit exchanged at prediction
//! time.

use crate::buf;
use crate::error::{CoreError, Result};
use crate::value::Value;

/// An insertion-ordered mapping from parameter name to [`Value`].
///
/// The map owns every value placed into it; dropping the map drops all
/// contained values. Key enumeration via [`ValueMap::key_at`] follows
/// insertion order, which makes indexed iteration deterministic for a given
/// instance.
#[derive(Debug, Default)]
pub struct ValueMap {
    entries: Vec<(String, Value)>,
}

impl ValueMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// The key at `index` in insertion order.
    ///
    /// Fails with `InvalidArgument` when `index >= len()`.
    pub fn key_at(&self, index: usize) -> Result<&str> {
        self.entries
            .get(index)
            .map(|(k, _)| k.as_str())
            .ok_or_else(|| {
                CoreError::InvalidArgument(format!(
                    "key index {index} out of range for map of {}",
                    self.entries.len()
                ))
            })
    }

    /// Required destination size for [`ValueMap::copy_key_at`].
    pub fn key_at_size(&self, index: usize) -> Result<usize> {
        self.key_at(index).map(buf::required_size)
    }

    /// Copy the key at `index` into `dst` (negotiated-size convention).
    pub fn copy_key_at(&self, index: usize, dst: &mut [u8]) -> Result<usize> {
        let key = self.key_at(index)?;
        buf::fill(key, dst)
    }

    /// Copy the key at `index` into `dst`, truncating to fit (legacy
    /// convention). Returns the bytes written.
    pub fn copy_key_at_lossy(&self, index: usize, dst: &mut [u8]) -> Result<usize> {
        let key = self.key_at(index)?;
        Ok(buf::fill_lossy(key, dst))
    }

    /// The value for `key`.
    ///
    /// Fails with `NotFound` when the key is absent. A present key holding a
    /// null-kind value succeeds and yields that value.
    pub fn get(&self, key: &str) -> Result<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
            .ok_or_else(|| CoreError::NotFound(format!("no value for key \"{key}\"")))
    }

    /// Set or remove the entry for `key`.
    ///
    /// `Some(value)` takes ownership of `value`, dropping any prior entry in
    /// place (insertion order of an existing key is preserved). `None`
    /// removes and drops any existing entry; removing an absent key is a
    /// no-op.
    pub fn set(&mut self, key: impl Into<String>, value: Option<Value>) {
        let key = key.into();
        match value {
            Some(value) => {
                if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
                    slot.1 = value;
                } else {
                    self.entries.push((key, value));
                }
            }
            None => self.entries.retain(|(k, _)| *k != key),
        }
    }

    /// Remove and return the value for `key`, if present.
    pub fn take(&mut self, key: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}
