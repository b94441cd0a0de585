//! Pending-change tag shared by all entity kinds.

use serde::{Deserialize, Serialize};

/// What the next flush must do with a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    /// In sync with the store.
    #[default]
    Unchanged,
    /// Created in memory, not yet stored.
    Insert,
    /// Stored, modified in memory since.
    Update,
    /// Stored, removed in memory; purged after the next flush.
    Delete,
}

impl Lifecycle {
    pub fn is_deleted(self) -> bool {
        self == Self::Delete
    }

    pub fn is_pending(self) -> bool {
        self != Self::Unchanged
    }

    /// Records a modification. `Insert` stays `Insert`.
    pub(crate) fn touch(&mut self) {
        if *self == Self::Unchanged {
            *self = Self::Update;
        }
    }
}
