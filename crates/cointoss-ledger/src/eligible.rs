//! Index of players eligible to trade.
//!
//! A player is eligible while their balance is strictly positive. The set
//! keeps a dense member vector (for uniform positional draws) and a
//! per-player position table (for O(1) membership and removal). Removal
//! swaps the last member into the vacated slot, so member order is not
//! stable across removals.

use cointoss_types::PlayerId;

use crate::{LedgerError, reserve_players};

/// Set of players with strictly positive balance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EligibleSet {
    /// Dense list of eligible players.
    members: Vec<PlayerId>,
    /// `positions[p]` is the slot of player `p` in `members`, if eligible.
    positions: Vec<Option<usize>>,
}

impl EligibleSet {
    /// Create an empty set able to track `player_count` players.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Allocation`] if the index cannot be allocated.
    pub fn new(player_count: usize) -> Result<Self, LedgerError> {
        let mut members = Vec::new();
        let mut positions = Vec::new();
        reserve_players(&mut members, player_count)?;
        reserve_players(&mut positions, player_count)?;
        positions.resize(player_count, None);
        Ok(Self { members, positions })
    }

    /// Create a set containing every player in `0..player_count`.
    ///
    /// # Errors
    ///
    /// As [`EligibleSet::new`].
    pub fn full(player_count: usize) -> Result<Self, LedgerError> {
        let mut members = Vec::new();
        let mut positions = Vec::new();
        reserve_players(&mut members, player_count)?;
        reserve_players(&mut positions, player_count)?;
        members.extend((0..player_count).map(PlayerId));
        positions.extend((0..player_count).map(Some));
        Ok(Self { members, positions })
    }

    /// Number of eligible players.
    pub const fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether no player is eligible.
    pub const fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether `player` is currently eligible.
    pub fn contains(&self, player: PlayerId) -> bool {
        matches!(self.positions.get(player.index()), Some(Some(_)))
    }

    /// The member stored at `position` (`0..len`).
    pub fn get(&self, position: usize) -> Option<PlayerId> {
        self.members.get(position).copied()
    }

    /// Add `player`. Returns `false` if already present or out of range.
    pub fn insert(&mut self, player: PlayerId) -> bool {
        let slot_index = self.members.len();
        let Some(slot) = self.positions.get_mut(player.index()) else {
            return false;
        };
        if slot.is_some() {
            return false;
        }
        *slot = Some(slot_index);
        self.members.push(player);
        true
    }

    /// Remove `player`. Returns `false` if not present.
    pub fn remove(&mut self, player: PlayerId) -> bool {
        let Some(position) = self
            .positions
            .get_mut(player.index())
            .and_then(Option::take)
        else {
            return false;
        };

        if position >= self.members.len() {
            return false;
        }
        self.members.swap_remove(position);

        // The former last member now lives in the vacated slot.
        if let Some(moved) = self.members.get(position).copied() {
            if let Some(slot) = self.positions.get_mut(moved.index()) {
                *slot = Some(position);
            }
        }
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn position_of(set: &EligibleSet, player: PlayerId) -> Option<usize> {
        set.positions.get(player.index()).copied().flatten()
    }

    #[test]
    fn unallocatable_player_count_is_an_error() {
        let huge = usize::MAX / 2;
        assert_eq!(
            EligibleSet::new(huge).err(),
            Some(LedgerError::Allocation { player_count: huge })
        );
        assert_eq!(
            EligibleSet::full(huge).err(),
            Some(LedgerError::Allocation { player_count: huge })
        );
    }

    #[test]
    fn full_set_contains_everyone() {
        let set = EligibleSet::full(4).unwrap();
        assert_eq!(set.len(), 4);
        for p in 0..4 {
            assert!(set.contains(PlayerId(p)));
            assert_eq!(position_of(&set, PlayerId(p)), Some(p));
        }
        assert!(!set.contains(PlayerId(4)));
    }

    #[test]
    fn remove_swaps_last_into_slot() {
        let mut set = EligibleSet::full(5).unwrap();
        assert!(set.remove(PlayerId(1)));
        assert_eq!(set.len(), 4);
        assert!(!set.contains(PlayerId(1)));
        // Player 4 moved into slot 1.
        assert_eq!(set.get(1), Some(PlayerId(4)));
        assert_eq!(position_of(&set, PlayerId(4)), Some(1));
    }

    #[test]
    fn remove_twice_is_noop() {
        let mut set = EligibleSet::full(3).unwrap();
        assert!(set.remove(PlayerId(2)));
        assert!(!set.remove(PlayerId(2)));
        assert!(!set.remove(PlayerId(99)));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn remove_last_member() {
        let mut set = EligibleSet::full(2).unwrap();
        assert!(set.remove(PlayerId(1)));
        assert!(set.remove(PlayerId(0)));
        assert!(set.is_empty());
        assert_eq!(set.get(0), None);
    }

    #[test]
    fn insert_after_remove() {
        let mut set = EligibleSet::new(3).unwrap();
        assert!(set.is_empty());
        assert!(set.insert(PlayerId(2)));
        assert!(!set.insert(PlayerId(2)));
        assert!(!set.insert(PlayerId(3)));
        assert!(set.insert(PlayerId(0)));
        assert!(set.remove(PlayerId(2)));
        assert_eq!(set.members.clone(), vec![PlayerId(0)]);
        assert_eq!(position_of(&set, PlayerId(0)), Some(0));
    }

    #[test]
    fn positions_stay_consistent_through_churn() {
        let mut set = EligibleSet::full(8).unwrap();
        for p in [3, 7, 0, 5] {
            assert!(set.remove(PlayerId(p)));
        }
        for (slot, &player) in set.members.iter().enumerate() {
            assert_eq!(position_of(&set, player), Some(slot));
        }
        let mut remaining: Vec<usize> = set.members.iter().map(|p| p.index()).collect();
        remaining.sort_unstable();
        assert_eq!(remaining, vec![1, 2, 4, 6]);
    }
}
