//! Key/value settings entries and the per-owner collection holding them.
//!
//! # Invariants
//! - Keys are unique among live (non-`Delete`) entries of one collection.
//! - Failed mutations leave the collection untouched.
//! - Collection order is insertion order and is kept stable across updates.

use crate::error::{EntityKind, EnvError, EnvResult, Owner};
use crate::model::lifecycle::Lifecycle;
use std::collections::HashSet;

/// One `key=value` entry owned by a project or a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    key: String,
    value: String,
    lifecycle: Lifecycle,
}

impl Dataset {
    pub(crate) fn new(
        key: impl Into<String>,
        value: impl Into<String>,
        lifecycle: Lifecycle,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            lifecycle,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_live(&self) -> bool {
        !self.lifecycle.is_deleted()
    }
}

/// Ordered Dataset collection scoped to exactly one owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datasets {
    owner: Owner,
    entries: Vec<Dataset>,
}

impl Datasets {
    pub(crate) fn new(owner: Owner) -> Self {
        Self {
            owner,
            entries: Vec::new(),
        }
    }

    pub fn owner(&self) -> Owner {
        self.owner
    }

    /// Iterates live entries in collection order.
    pub fn iter(&self) -> impl Iterator<Item = &Dataset> {
        self.entries.iter().filter(|entry| entry.is_live())
    }

    /// Every entry including tombstones, in collection order.
    pub fn all(&self) -> &[Dataset] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_pending_changes(&self) -> bool {
        self.entries.iter().any(|entry| entry.lifecycle.is_pending())
    }

    /// Finds the live entry for `key`; linear scan, first match wins.
    pub fn find_by_key(&self, key: &str) -> EnvResult<&Dataset> {
        self.live_position(key)
            .map(|index| &self.entries[index])
            .ok_or_else(|| EnvError::not_found(EntityKind::Key, key))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.live_position(key).is_some()
    }

    /// Appends a new entry tagged `Insert`.
    ///
    /// A tombstone with the same key is revived as `Update` instead, so the
    /// next flush emits one modify rather than a delete/insert pair.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) -> EnvResult<()> {
        let key = key.into();
        if self.contains_key(&key) {
            return Err(EnvError::DuplicateKey {
                owner: self.owner,
                key,
            });
        }

        let value = value.into();
        match self.entries.iter().position(|entry| entry.key == key) {
            Some(index) => {
                let tombstone = &mut self.entries[index];
                tombstone.value = value;
                tombstone.lifecycle = Lifecycle::Update;
            }
            None => self.entries.push(Dataset::new(key, value, Lifecycle::Insert)),
        }
        Ok(())
    }

    /// Replaces the value of a live entry.
    pub fn set_value(&mut self, key: &str, value: impl Into<String>) -> EnvResult<()> {
        let index = self
            .live_position(key)
            .ok_or_else(|| EnvError::not_found(EntityKind::Key, key))?;
        let entry = &mut self.entries[index];
        entry.value = value.into();
        entry.lifecycle.touch();
        Ok(())
    }

    /// Removes a live entry.
    ///
    /// Entries still tagged `Insert` were never stored and are excised right
    /// away; stored entries are tombstoned until the next flush.
    pub fn remove(&mut self, key: &str) -> EnvResult<()> {
        let index = self
            .live_position(key)
            .ok_or_else(|| EnvError::not_found(EntityKind::Key, key))?;
        if self.entries[index].lifecycle == Lifecycle::Insert {
            self.entries.remove(index);
        } else {
            self.entries[index].lifecycle = Lifecycle::Delete;
        }
        Ok(())
    }

    /// Removes every live entry with the same rules as `remove`.
    pub fn remove_all(&mut self) {
        self.entries.retain(|entry| entry.lifecycle != Lifecycle::Insert);
        for entry in &mut self.entries {
            entry.lifecycle = Lifecycle::Delete;
        }
    }

    /// Replaces the whole collection with entries already in sync with
    /// their backing storage.
    ///
    /// Fails with `DuplicateKey` on the first repeated key and leaves the
    /// collection untouched.
    pub(crate) fn replace_unchanged<I>(&mut self, pairs: I) -> EnvResult<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for (key, value) in pairs {
            if !seen.insert(key.clone()) {
                return Err(EnvError::DuplicateKey {
                    owner: self.owner,
                    key,
                });
            }
            entries.push(Dataset::new(key, value, Lifecycle::Unchanged));
        }
        self.entries = entries;
        Ok(())
    }

    /// Purges tombstones and clears every remaining tag after a commit.
    pub(crate) fn commit(&mut self) {
        self.entries.retain(|entry| entry.is_live());
        for entry in &mut self.entries {
            entry.lifecycle = Lifecycle::Unchanged;
        }
    }

    fn live_position(&self, key: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.is_live() && entry.key == key)
    }
}
