//! Data store trait
//!
//! Abstracts the hosted database so the library can run against the REST
//! backend or an in-process store.

use crate::error::Result;
use crate::types::{
    ListeningHistoryEntry, PlaylistId, PlaylistRow, PlaylistSongRow, SongId, SongRow, UserId,
    UserRow,
};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Persistence for songs, playlists, likes, and listening history
///
/// Implementations return raw rows; validation into domain types happens in
/// the data access layer. Every method may fail with `TransientIo`.
#[async_trait]
pub trait DataStore: Send + Sync {
    // ========================================================================
    // Songs
    // ========================================================================

    /// List the public catalog
    async fn list_songs(&self) -> Result<Vec<SongRow>>;

    /// Add `delta` to a song's like counter, saturating at zero
    ///
    /// Returns the counter after the adjustment.
    async fn adjust_song_likes(&self, song_id: SongId, delta: i64) -> Result<u64>;

    // ========================================================================
    // Users
    // ========================================================================

    /// Get a user profile
    async fn get_user(&self, user_id: &UserId) -> Result<Option<UserRow>>;

    /// Remember the song to resume on next load
    async fn set_last_song(&self, user_id: &UserId, song_id: SongId) -> Result<()>;

    // ========================================================================
    // Playlists
    // ========================================================================

    /// Playlists owned by a user
    async fn list_playlists(&self, user_id: &UserId) -> Result<Vec<PlaylistRow>>;

    /// Get a playlist regardless of owner
    async fn get_playlist(&self, id: PlaylistId) -> Result<Option<PlaylistRow>>;

    /// Create a playlist owned by `user_id`
    async fn create_playlist(&self, user_id: &UserId, name: &str) -> Result<PlaylistRow>;

    /// Rename a playlist
    async fn rename_playlist(&self, id: PlaylistId, name: &str) -> Result<()>;

    /// Delete a playlist and its memberships
    async fn delete_playlist(&self, id: PlaylistId) -> Result<()>;

    /// Memberships of the given playlists
    async fn list_playlist_songs(&self, ids: &[PlaylistId]) -> Result<Vec<PlaylistSongRow>>;

    /// Insert a membership; an existing one may surface as `Conflict`
    async fn add_playlist_song(&self, id: PlaylistId, song_id: SongId) -> Result<()>;

    /// Delete a membership; deleting an absent one succeeds
    async fn remove_playlist_song(&self, id: PlaylistId, song_id: SongId) -> Result<()>;

    // ========================================================================
    // Likes
    // ========================================================================

    /// Songs the user has liked
    async fn list_likes(&self, user_id: &UserId) -> Result<Vec<SongId>>;

    /// Record a like relation
    async fn add_like(&self, user_id: &UserId, song_id: SongId) -> Result<()>;

    /// Remove a like relation
    async fn remove_like(&self, user_id: &UserId, song_id: SongId) -> Result<()>;

    // ========================================================================
    // Listening history
    // ========================================================================

    /// The (user, song, date) entry, if one exists
    async fn find_history(
        &self,
        user_id: &UserId,
        song_id: SongId,
        date: NaiveDate,
    ) -> Result<Option<ListeningHistoryEntry>>;

    /// Insert or update an entry keyed by (user, song, date)
    async fn save_history(&self, entry: &ListeningHistoryEntry) -> Result<ListeningHistoryEntry>;
}
