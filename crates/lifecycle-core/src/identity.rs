//! # Identity Newtypes
//!
//! Identifiers handed out by a lifecycle registry. Observer ids are
//! allocated from a per-registry counter, so their numeric order is the
//! order in which observers were added.

use serde::{Deserialize, Serialize};

/// Identifier of an observer registered with one lifecycle registry.
///
/// Ids are never reused within a registry. Comparing ids from different
/// registries is meaningless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObserverId(u64);

impl ObserverId {
    /// Wrap a raw counter value.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw counter value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// The id allocated right after this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for ObserverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "observer:{}", self.0)
    }
}
