//! Publish-once side tables
//!
//! A phase collects its results in a [`ProviderTable`] and freezes it when the
//! phase ends. Later phases only ever see the [`Frozen`] view, so nothing can
//! read a table its own phase is still writing.

use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::error::{Result, provider_already_published};

/// Side table a phase is still writing
#[derive(Debug)]
pub struct ProviderTable<K, V> {
    phase: &'static str,
    entries: BTreeMap<K, V>,
}

impl<K: Ord + Debug, V> ProviderTable<K, V> {
    pub fn new(phase: &'static str) -> Self {
        Self {
            phase,
            entries: BTreeMap::new(),
        }
    }

    /// Publish the value for `key`
    ///
    /// # Errors
    ///
    /// Returns an error when `key` was already published in this phase.
    pub fn publish(&mut self, key: K, value: V) -> Result<()> {
        if self.entries.contains_key(&key) {
            return Err(provider_already_published(format!("{key:?}"), self.phase));
        }
        self.entries.insert(key, value);
        Ok(())
    }

    /// Mutable access for monotone merges within the owning phase
    pub fn entry_or_insert_with(&mut self, key: K, default: impl FnOnce() -> V) -> &mut V {
        self.entries.entry(key).or_insert_with(default)
    }

    pub fn freeze(self) -> Frozen<K, V> {
        Frozen {
            entries: self.entries,
        }
    }
}

/// Read-only view of a finished phase
#[derive(Debug, Clone)]
pub struct Frozen<K, V> {
    entries: BTreeMap<K, V>,
}

impl<K: Ord, V> Frozen<K, V> {
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<K: Ord, V> Default for Frozen<K, V> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ApexError;

    #[test]
    fn test_publish_once() {
        let mut table = ProviderTable::new("membership");
        table.publish("com.x.y".to_string(), 1).unwrap();
        let err = table.publish("com.x.y".to_string(), 2).unwrap_err();
        assert!(matches!(err, ApexError::ProviderAlreadyPublished { .. }));
        assert!(err.to_string().contains("membership"));

        let frozen = table.freeze();
        assert_eq!(frozen.get(&"com.x.y".to_string()), Some(&1));
        assert_eq!(frozen.len(), 1);
    }

    #[test]
    fn test_monotone_merge() {
        let mut table: ProviderTable<&str, Vec<u8>> = ProviderTable::new("marks");
        table.entry_or_insert_with("libfoo", Vec::new).push(1);
        table.entry_or_insert_with("libfoo", Vec::new).push(2);
        assert_eq!(table.freeze().get(&"libfoo"), Some(&vec![1, 2]));
    }
}
