/// User domain type
use super::ids::{SongId, UserId};
use crate::error::{LyraError, Result};
use serde::{Deserialize, Serialize};

/// User profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub username: Option<String>,
    pub avatar_url: Option<String>,

    /// Song to resume (paused) on the next load
    pub last_song_id: Option<SongId>,
}

impl User {
    /// Name to greet the user with
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| self.email.split('@').next().unwrap_or(&self.email))
    }
}

/// Row of the `users` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRow {
    pub id: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub last_song_file_id: Option<i64>,
}

impl TryFrom<UserRow> for User {
    type Error = LyraError;

    fn try_from(row: UserRow) -> Result<Self> {
        let id = row
            .id
            .filter(|id| !id.is_empty())
            .map(UserId::new)
            .ok_or_else(|| LyraError::validation("user row without id"))?;

        Ok(Self {
            id,
            email: row.email.unwrap_or_default(),
            username: row.username,
            avatar_url: row.avatar_url,
            last_song_id: row.last_song_file_id.map(SongId::new),
        })
    }
}
