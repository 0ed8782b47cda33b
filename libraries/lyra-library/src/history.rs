//! Listening history tracking
//!
//! A single-slot state machine: at most one song is being timed at once.
//!
//! ```text
//! Idle ──record(s)──▶ Tracking(s) ──stop()──▶ Idle
//!                         │
//!                   record(s' ≠ s): finalize s, open s'
//! ```
//!
//! Finalizing adds the elapsed minutes to the `(user, song, day-of-start)`
//! entry. Writes that fail are parked in an outbox and replayed before the
//! next history operation, so listened time is not lost.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use lyra_core::types::{minutes_between, ListeningHistoryEntry, SongId, UserId};
use lyra_core::{DataStore, LyraError, Result};
use thiserror::Error;
use tracing::{debug, warn};

/// A history write that did not go through, tagged with the song it was for
#[derive(Debug, Error)]
#[error("listening history for song {song_id}: {source}")]
pub struct HistoryError {
    pub song_id: SongId,
    #[source]
    pub source: LyraError,
}

impl HistoryError {
    pub fn new(song_id: SongId, source: LyraError) -> Self {
        Self { song_id, source }
    }
}

impl From<HistoryError> for LyraError {
    fn from(err: HistoryError) -> Self {
        err.source
    }
}

pub type HistoryResult<T> = std::result::Result<T, HistoryError>;

/// Tracker state
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerState {
    Idle,
    Tracking {
        user_id: UserId,
        song_id: SongId,
        started_at: DateTime<Utc>,
    },
}

/// Listening time waiting to be merged into a history entry
#[derive(Debug, Clone, PartialEq)]
pub struct PendingListen {
    pub user_id: UserId,
    pub song_id: SongId,
    pub date: NaiveDate,
    pub last_time: NaiveTime,
    pub minutes: f64,
}

impl PendingListen {
    /// Merge into the stored entry for the day, creating it if absent
    async fn apply(&self, store: &dyn DataStore) -> Result<ListeningHistoryEntry> {
        let mut entry = store
            .find_history(&self.user_id, self.song_id, self.date)
            .await?
            .unwrap_or_else(|| ListeningHistoryEntry {
                id: None,
                user_id: self.user_id.clone(),
                song_id: self.song_id,
                last_date: self.date,
                last_time: self.last_time,
                minutes_listened: 0.0,
            });

        entry.last_time = self.last_time;
        entry.add_minutes(self.minutes);
        store.save_history(&entry).await
    }
}

/// Listening history state machine with a retry outbox
#[derive(Debug)]
pub struct HistoryTracker {
    state: TrackerState,
    outbox: Vec<PendingListen>,
}

impl Default for HistoryTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryTracker {
    pub fn new() -> Self {
        Self {
            state: TrackerState::Idle,
            outbox: Vec::new(),
        }
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    /// Song currently being timed
    pub fn current_song(&self) -> Option<SongId> {
        match &self.state {
            TrackerState::Tracking { song_id, .. } => Some(*song_id),
            TrackerState::Idle => None,
        }
    }

    /// Finalized listens whose write has not gone through yet
    pub fn outbox(&self) -> &[PendingListen] {
        &self.outbox
    }

    /// Start timing `song_id` for `user_id`
    ///
    /// Recording the song already being timed does nothing. A different
    /// open song is finalized first; when both writes fail the error names
    /// the finalized song.
    pub async fn record(
        &mut self,
        store: &dyn DataStore,
        user_id: &UserId,
        song_id: SongId,
        now: DateTime<Utc>,
    ) -> HistoryResult<()> {
        self.flush(store).await;

        if let TrackerState::Tracking {
            user_id: current_user,
            song_id: current,
            ..
        } = &self.state
        {
            if *current == song_id && current_user == user_id {
                debug!(song_id = %song_id, "Song already tracked");
                return Ok(());
            }
        }

        let closed = self.finalize(store, now).await;
        let opened = self.open(store, user_id, song_id, now).await;
        closed.and(opened)
    }

    /// Finalize the open song, if any, and return to idle
    pub async fn stop(&mut self, store: &dyn DataStore, now: DateTime<Utc>) -> HistoryResult<()> {
        self.flush(store).await;
        self.finalize(store, now).await
    }

    /// Replay parked writes; failures stay parked
    pub async fn flush(&mut self, store: &dyn DataStore) {
        if self.outbox.is_empty() {
            return;
        }

        let mut still_pending = Vec::new();
        for pending in std::mem::take(&mut self.outbox) {
            match pending.apply(store).await {
                Ok(_) => {
                    debug!(song_id = %pending.song_id, minutes = pending.minutes, "Replayed history entry");
                }
                Err(e) => {
                    warn!(song_id = %pending.song_id, error = %e, "History replay failed");
                    still_pending.push(pending);
                }
            }
        }
        self.outbox = still_pending;
    }

    async fn open(
        &mut self,
        store: &dyn DataStore,
        user_id: &UserId,
        song_id: SongId,
        now: DateTime<Utc>,
    ) -> HistoryResult<()> {
        // Timing starts even if the write fails; the minutes land on stop
        self.state = TrackerState::Tracking {
            user_id: user_id.clone(),
            song_id,
            started_at: now,
        };

        let stamp = PendingListen {
            user_id: user_id.clone(),
            song_id,
            date: now.date_naive(),
            last_time: now.time(),
            minutes: 0.0,
        };

        stamp
            .apply(store)
            .await
            .map(|_| {
                debug!(song_id = %song_id, "Started tracking");
            })
            .map_err(|e| HistoryError::new(song_id, e))
    }

    async fn finalize(&mut self, store: &dyn DataStore, now: DateTime<Utc>) -> HistoryResult<()> {
        let TrackerState::Tracking {
            user_id,
            song_id,
            started_at,
        } = std::mem::replace(&mut self.state, TrackerState::Idle)
        else {
            return Ok(());
        };

        let pending = PendingListen {
            user_id,
            song_id,
            date: started_at.date_naive(),
            last_time: now.time(),
            minutes: minutes_between(started_at, now),
        };

        match pending.apply(store).await {
            Ok(entry) => {
                debug!(
                    song_id = %song_id,
                    minutes = pending.minutes,
                    total = entry.minutes_listened,
                    "Finalized listening"
                );
                Ok(())
            }
            Err(e) => {
                warn!(song_id = %song_id, error = %e, "Parking history entry for retry");
                self.outbox.push(pending);
                Err(HistoryError::new(song_id, e))
            }
        }
    }
}
