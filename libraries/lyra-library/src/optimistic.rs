//! Optimistic update bookkeeping
//!
//! Like toggles are applied to the in-memory view before the store confirms
//! them. Each song's most recent write is tracked here so callers can show
//! whether it is still in flight, went through, or was undone.

use lyra_core::types::SongId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle of an optimistic write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateStatus {
    /// Applied locally, store write in flight
    Pending,
    /// Store accepted the write
    Confirmed,
    /// Store rejected the write; local state restored
    RolledBack,
}

/// Result of a like toggle as seen by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeOutcome {
    pub song_id: SongId,
    pub liked: bool,
    pub likes: u64,
    pub status: UpdateStatus,
}

/// Per-song status of the latest optimistic write
#[derive(Debug, Clone, Default)]
pub struct UpdateLedger {
    statuses: HashMap<SongId, UpdateStatus>,
}

impl UpdateLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, song_id: SongId) {
        self.statuses.insert(song_id, UpdateStatus::Pending);
    }

    pub fn confirm(&mut self, song_id: SongId) {
        self.statuses.insert(song_id, UpdateStatus::Confirmed);
    }

    pub fn roll_back(&mut self, song_id: SongId) {
        self.statuses.insert(song_id, UpdateStatus::RolledBack);
    }

    pub fn status(&self, song_id: SongId) -> Option<UpdateStatus> {
        self.statuses.get(&song_id).copied()
    }

    /// Forget everything, e.g. after a reload
    pub fn clear(&mut self) {
        self.statuses.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_write_wins() {
        let mut ledger = UpdateLedger::new();
        let id = SongId::new(1);

        assert_eq!(ledger.status(id), None);
        ledger.begin(id);
        assert_eq!(ledger.status(id), Some(UpdateStatus::Pending));
        ledger.roll_back(id);
        assert_eq!(ledger.status(id), Some(UpdateStatus::RolledBack));
        ledger.begin(id);
        ledger.confirm(id);
        assert_eq!(ledger.status(id), Some(UpdateStatus::Confirmed));
    }

    #[test]
    fn clear_forgets_statuses() {
        let mut ledger = UpdateLedger::new();
        ledger.confirm(SongId::new(2));
        ledger.clear();
        assert_eq!(ledger.status(SongId::new(2)), None);
    }
}
