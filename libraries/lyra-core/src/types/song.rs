//! Song domain type and its wire row

use super::ids::{ImageId, SongId};
use crate::error::{LyraError, Result};
use serde::{Deserialize, Serialize};

/// Artist shown when the store has none on record
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// A song in the shared catalog
///
/// Everything except `likes` and `is_liked` is read-only for clients.
/// `is_liked` is scoped to the signed-in user and derived at load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: SongId,
    pub name: String,
    pub artist: String,
    pub language: String,
    /// Free-form tags, deduplicated, first-seen order kept
    pub tags: Vec<String>,
    pub views: u64,
    pub likes: u64,
    pub is_liked: bool,
    pub artwork: ImageId,
}

impl Song {
    /// Create a song with minimal metadata
    pub fn new(id: SongId, name: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            artist: artist.into(),
            language: String::new(),
            tags: Vec::new(),
            views: 0,
            likes: 0,
            is_liked: false,
            artwork: ImageId::new(id.get()),
        }
    }

    /// Builder-style tag setter, applies the same dedup as row validation
    #[must_use]
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = dedup_tags(tags.into_iter().map(Into::into));
        self
    }

    /// Case-insensitive match against name, artist, or any tag
    pub fn matches(&self, needle_lowercase: &str) -> bool {
        self.name.to_lowercase().contains(needle_lowercase)
            || self.artist.to_lowercase().contains(needle_lowercase)
            || self
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(needle_lowercase))
    }
}

/// Row of the `songs` table as the store returns it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SongRow {
    pub file_id: Option<i64>,
    pub img_id: Option<i64>,
    pub name: Option<String>,
    pub artist: Option<String>,
    pub language: Option<String>,
    pub tags: Option<Vec<String>>,
    pub views: Option<i64>,
    pub likes: Option<i64>,
}

impl TryFrom<SongRow> for Song {
    type Error = LyraError;

    /// Rejects rows without identity or name, coerces everything else
    fn try_from(row: SongRow) -> Result<Self> {
        let id = row
            .file_id
            .map(SongId::new)
            .ok_or_else(|| LyraError::validation("song row without file_id"))?;

        let name = row
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| LyraError::validation(format!("song {id} has no name")))?;

        let artist = row
            .artist
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| UNKNOWN_ARTIST.to_string());

        Ok(Self {
            id,
            name,
            artist,
            language: row.language.unwrap_or_default(),
            tags: dedup_tags(row.tags.unwrap_or_default()),
            views: non_negative(row.views),
            likes: non_negative(row.likes),
            is_liked: false,
            artwork: ImageId::new(row.img_id.unwrap_or(id.get())),
        })
    }
}

fn non_negative(value: Option<i64>) -> u64 {
    value.map_or(0, |v| u64::try_from(v).unwrap_or(0))
}

fn dedup_tags(tags: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}
