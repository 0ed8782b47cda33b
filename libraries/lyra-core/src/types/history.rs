//! Listening history types

use super::ids::{HistoryId, SongId, UserId};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Time a user spent on one song during one day
///
/// The store keeps one row per (user, song, date); repeated listens on the
/// same day accumulate into `minutes_listened`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListeningHistoryEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<HistoryId>,
    pub user_id: UserId,
    pub song_id: SongId,
    pub last_date: NaiveDate,
    pub last_time: NaiveTime,
    pub minutes_listened: f64,
}

impl ListeningHistoryEntry {
    /// Fresh entry stamped at `at`, with nothing listened yet
    pub fn start(user_id: UserId, song_id: SongId, at: DateTime<Utc>) -> Self {
        Self {
            id: None,
            user_id,
            song_id,
            last_date: at.date_naive(),
            last_time: at.time(),
            minutes_listened: 0.0,
        }
    }

    /// Move the last-listened stamp forward
    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.last_time = at.time();
    }

    /// Accumulate listened time
    pub fn add_minutes(&mut self, minutes: f64) {
        if minutes.is_finite() && minutes > 0.0 {
            self.minutes_listened += minutes;
        }
    }
}

/// Minutes between two instants, clamped at zero
pub fn minutes_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let millis = (end - start).num_milliseconds().max(0);
    millis as f64 / 60_000.0
}
