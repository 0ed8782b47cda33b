/// Playlist domain types
use super::ids::{PlaylistId, SongId, UserId};
use crate::error::{LyraError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A user-owned set of songs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: PlaylistId,
    pub owner_id: UserId,
    pub name: String,
    /// Member songs; order is not significant
    pub song_ids: BTreeSet<SongId>,
}

impl Playlist {
    /// Create an empty playlist
    pub fn new(id: PlaylistId, owner_id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            owner_id,
            name: name.into(),
            song_ids: BTreeSet::new(),
        }
    }

    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.owner_id == user_id
    }

    pub fn contains(&self, song_id: SongId) -> bool {
        self.song_ids.contains(&song_id)
    }

    pub fn len(&self) -> usize {
        self.song_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.song_ids.is_empty()
    }
}

/// Normalize a user-supplied playlist name
///
/// Returns the trimmed name, or a validation error when nothing is left.
pub fn validate_playlist_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(LyraError::validation("playlist name cannot be empty"));
    }
    Ok(trimmed.to_string())
}

/// Row of the `playlists` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaylistRow {
    pub id: Option<i64>,
    pub user_id: Option<String>,
    pub name: Option<String>,
}

impl TryFrom<PlaylistRow> for Playlist {
    type Error = LyraError;

    fn try_from(row: PlaylistRow) -> Result<Self> {
        let id = row
            .id
            .map(PlaylistId::new)
            .ok_or_else(|| LyraError::validation("playlist row without id"))?;
        let owner_id = row
            .user_id
            .filter(|u| !u.is_empty())
            .map(UserId::new)
            .ok_or_else(|| LyraError::validation(format!("playlist {id} has no owner")))?;
        let name = row
            .name
            .ok_or_else(|| LyraError::validation(format!("playlist {id} has no name")))?;

        Ok(Self::new(id, owner_id, name))
    }
}

/// Row of the `playlist_songs` membership table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistSongRow {
    pub playlist_id: PlaylistId,
    pub song_id: SongId,
}
