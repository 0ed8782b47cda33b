//! Request and response bodies for the hosted backend.

use lyra_core::types::{PlaylistId, SongId};
use lyra_core::AuthUser;
use serde::{Deserialize, Serialize};

// =============================================================================
// Authentication Types
// =============================================================================

/// Request body for the password grant.
#[derive(Debug, Serialize)]
pub struct PasswordGrantRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Request body for the refresh grant.
#[derive(Debug, Serialize)]
pub struct RefreshGrantRequest<'a> {
    pub refresh_token: &'a str,
}

/// Response from a successful token grant.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Token validity in seconds
    pub expires_in: u64,
    pub user: AuthUserPayload,
}

/// User object embedded in token responses.
#[derive(Debug, Deserialize)]
pub struct AuthUserPayload {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl From<AuthUserPayload> for AuthUser {
    fn from(payload: AuthUserPayload) -> Self {
        AuthUser::new(payload.id, payload.email.unwrap_or_default())
    }
}

/// Tokens and identity of a signed-in user.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user: AuthUser,
}

// =============================================================================
// Table Payloads
// =============================================================================

/// Projection of `songs.likes`.
#[derive(Debug, Deserialize)]
pub struct LikesCounter {
    pub likes: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct LikesUpdate {
    pub likes: i64,
}

/// Row of the `likes` table.
#[derive(Debug, Serialize)]
pub struct NewLike<'a> {
    pub user_id: &'a str,
    pub song_id: SongId,
}

/// Projection of `likes.song_id`.
#[derive(Debug, Deserialize)]
pub struct LikedSong {
    pub song_id: SongId,
}

#[derive(Debug, Serialize)]
pub struct NewPlaylist<'a> {
    pub user_id: &'a str,
    pub name: &'a str,
}

#[derive(Debug, Serialize)]
pub struct PlaylistRename<'a> {
    pub name: &'a str,
}

#[derive(Debug, Serialize)]
pub struct PlaylistMember {
    pub playlist_id: PlaylistId,
    pub song_id: SongId,
}

#[derive(Debug, Serialize)]
pub struct LastSongUpdate {
    pub last_song_file_id: SongId,
}
