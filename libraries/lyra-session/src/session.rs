//! Session controller
//!
//! Holds what the player shows: the current song, whether it is playing,
//! and whether the player is maximized. Navigation walks the active list
//! by index and every song change is forwarded to the library's listening
//! history.

use crate::events::SessionEvent;
use lyra_core::types::{Song, SongId};
use lyra_core::{LyraError, Result};
use lyra_library::{HistoryError, LikeOutcome, Library};
use tracing::{debug, info, warn};

/// Player session for one user
pub struct Session {
    library: Library,

    current_song: Option<Song>,
    is_playing: bool,
    is_maximized: bool,

    /// Overrides the full catalog for next/previous when set; songs are
    /// resolved through the library so flags and counters stay current
    active_list: Option<Vec<SongId>>,

    pending_events: Vec<SessionEvent>,
}

impl Session {
    pub fn new(library: Library) -> Self {
        Self {
            library,
            current_song: None,
            is_playing: false,
            is_maximized: false,
            active_list: None,
            pending_events: Vec::new(),
        }
    }

    // ===== State =====

    pub fn current_song(&self) -> Option<&Song> {
        self.current_song.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn is_maximized(&self) -> bool {
        self.is_maximized
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut Library {
        &mut self.library
    }

    /// Songs next/previous walk over
    ///
    /// Ids no longer in the catalog are skipped.
    pub fn active_list(&self) -> Vec<&Song> {
        match &self.active_list {
            Some(ids) => ids.iter().filter_map(|id| self.library.song(*id)).collect(),
            None => self.library.songs().iter().collect(),
        }
    }

    /// Scope navigation to a playlist, the liked songs, or search results
    pub fn set_active_list(&mut self, song_ids: impl IntoIterator<Item = SongId>) {
        let ids: Vec<SongId> = song_ids.into_iter().collect();
        debug!(len = ids.len(), "Active list set");
        self.active_list = Some(ids);
    }

    /// Navigate the full catalog again
    pub fn clear_active_list(&mut self) {
        self.active_list = None;
    }

    // ===== Lifecycle =====

    /// Load the library, then resume the last played song
    pub async fn load(&mut self) -> Result<()> {
        let result = self.library.load().await;
        self.resume_last_played();
        result
    }

    /// Adopt the user's last played song, paused, if nothing is current
    ///
    /// Returns whether a song was adopted.
    pub fn resume_last_played(&mut self) -> bool {
        if self.current_song.is_some() {
            return false;
        }

        let Some(song) = self.library.last_played().cloned() else {
            return false;
        };

        info!(song_id = %song.id, "Resuming last played song");
        self.pending_events.push(SessionEvent::Resumed { song_id: song.id });
        self.current_song = Some(song);
        self.is_playing = false;
        true
    }

    /// Close the player
    ///
    /// Listening time is flushed before the state is cleared.
    pub async fn close(&mut self) {
        if let Err(e) = self.library.stop_current_song_tracking().await {
            self.history_failed(e);
        }

        self.current_song = None;
        self.is_playing = false;
        self.is_maximized = false;
        self.pending_events.push(SessionEvent::Closed);
        debug!("Player closed");
    }

    // ===== Playback Control =====

    /// Make `song` current and start playing it
    pub async fn play(&mut self, song: Song) {
        let song_id = song.id;
        let previous_song_id = self.current_song.as_ref().map(|s| s.id);

        self.current_song = Some(song);
        if previous_song_id != Some(song_id) {
            self.pending_events.push(SessionEvent::SongChanged {
                song_id,
                previous_song_id,
            });
        }
        self.set_playing(true);

        if let Err(e) = self.library.record_listening_history(song_id).await {
            self.history_failed(e);
        }
    }

    /// Play a catalog song by id
    pub async fn play_song(&mut self, song_id: SongId) -> Result<()> {
        let song = self
            .library
            .song(song_id)
            .cloned()
            .ok_or_else(|| LyraError::not_found("Song", song_id))?;
        self.play(song).await;
        Ok(())
    }

    pub fn toggle_play(&mut self) {
        let playing = !self.is_playing;
        self.set_playing(playing);
    }

    pub fn toggle_maximize(&mut self) {
        self.is_maximized = !self.is_maximized;
        self.pending_events.push(SessionEvent::ViewChanged {
            is_maximized: self.is_maximized,
        });
    }

    /// Play the song after the current one, wrapping to the start
    pub async fn next(&mut self) {
        if let Some(song) = self.neighbor(Direction::Next) {
            self.play(song).await;
        }
    }

    /// Play the song before the current one, wrapping to the end
    pub async fn previous(&mut self) {
        if let Some(song) = self.neighbor(Direction::Previous) {
            self.play(song).await;
        }
    }

    fn neighbor(&self, direction: Direction) -> Option<Song> {
        let current = self.current_song.as_ref()?;
        let list = self.active_list();
        let len = list.len();
        if len == 0 {
            return None;
        }

        let position = list.iter().position(|s| s.id == current.id);
        let index = match (direction, position) {
            (Direction::Next, Some(i)) => (i + 1) % len,
            (Direction::Next, None) => 0,
            (Direction::Previous, Some(i)) => (i + len - 1) % len,
            (Direction::Previous, None) => len - 1,
        };

        list.get(index).map(|song| (*song).clone())
    }

    // ===== Likes =====

    /// Toggle the like on the current song
    ///
    /// Returns `None` when nothing is current. The current song snapshot
    /// is refreshed whether or not the write went through.
    pub async fn toggle_like_current(&mut self) -> Result<Option<LikeOutcome>> {
        let Some(song_id) = self.current_song.as_ref().map(|s| s.id) else {
            return Ok(None);
        };

        let result = self.library.toggle_like(song_id).await;
        self.refresh_snapshot(song_id);
        result.map(Some)
    }

    fn refresh_snapshot(&mut self, song_id: SongId) {
        let Some(fresh) = self.library.song(song_id).cloned() else {
            return;
        };

        if self.current_song.as_ref().is_some_and(|s| s.id == song_id) {
            self.current_song = Some(fresh);
        }
    }

    // ===== Events =====

    /// Take all queued events
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    fn set_playing(&mut self, playing: bool) {
        if self.is_playing != playing {
            self.is_playing = playing;
            self.pending_events
                .push(SessionEvent::PlayStateChanged { is_playing: playing });
        }
    }

    fn history_failed(&mut self, error: HistoryError) {
        warn!(song_id = %error.song_id, error = %error.source, "Listening history update failed");
        self.pending_events.push(SessionEvent::HistoryTrackingFailed {
            song_id: error.song_id,
            error: error.source.to_string(),
        });
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Next,
    Previous,
}
