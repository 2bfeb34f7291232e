//! Type-safe identifier wrappers.
//!
//! Players are identified by their position in the balance vector, so
//! [`PlayerId`] wraps a `usize` index. Each simulation run gets a
//! [`RunId`] (UUID v7, time-ordered) so log lines and snapshots from
//! separate runs can be told apart.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Index of a player in the balance vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub usize);

impl PlayerId {
    /// Return the underlying vector index.
    pub const fn index(self) -> usize {
        self.0
    }
}

impl core::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for PlayerId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

/// Unique identifier for a single simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Create a new identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for RunId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RunId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_id_displays_bare_index() {
        assert_eq!(PlayerId(7).to_string(), "7");
        assert_eq!(PlayerId::from(3).index(), 3);
    }

    #[test]
    fn run_ids_are_unique_and_ordered() {
        let a = RunId::new();
        let b = RunId::new();
        assert_ne!(a, b);
        assert!(a < b);
    }
}
