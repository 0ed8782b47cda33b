//! `DataStore` over the hosted REST API.

use crate::client::{return_representation, BackendClient};
use crate::types::{
    LastSongUpdate, LikedSong, LikesCounter, LikesUpdate, NewLike, NewPlaylist, PlaylistMember,
    PlaylistRename,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use lyra_core::types::{
    ListeningHistoryEntry, PlaylistId, PlaylistRow, PlaylistSongRow, SongId, SongRow, UserId,
    UserRow,
};
use lyra_core::{DataStore, LyraError, Result};
use reqwest::header::HeaderValue;
use reqwest::Method;
use tracing::debug;

/// PostgREST `eq.` filter value
fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

/// Data store backed by the hosted database tables.
pub struct RestStore {
    client: BackendClient,
}

impl RestStore {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    async fn select<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        select: &str,
        filters: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let url = self.client.table_url(table);
        debug!(table = %table, filters = ?filters, "Selecting rows");

        let request = self
            .client
            .request(Method::GET, &url)
            .await
            .query(&[("select", select)])
            .query(filters);

        self.client.fetch(request).await
    }

    async fn insert<B, T>(&self, table: &str, body: &B) -> Result<Vec<T>>
    where
        B: serde::Serialize + Sync + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let url = self.client.table_url(table);
        debug!(table = %table, "Inserting row");

        let request = self
            .client
            .request(Method::POST, &url)
            .await
            .header("Prefer", return_representation())
            .json(body);

        self.client.fetch(request).await
    }

    async fn insert_no_return<B>(&self, table: &str, body: &B) -> Result<()>
    where
        B: serde::Serialize + Sync + ?Sized,
    {
        let url = self.client.table_url(table);
        debug!(table = %table, "Inserting row");

        let request = self.client.request(Method::POST, &url).await.json(body);
        self.client.execute(request).await.map(|_| ())
    }

    async fn update<B>(&self, table: &str, filters: &[(&str, String)], body: &B) -> Result<()>
    where
        B: serde::Serialize + Sync + ?Sized,
    {
        let url = self.client.table_url(table);
        debug!(table = %table, filters = ?filters, "Updating rows");

        let request = self
            .client
            .request(Method::PATCH, &url)
            .await
            .query(filters)
            .json(body);

        self.client.execute(request).await.map(|_| ())
    }

    async fn delete(&self, table: &str, filters: &[(&str, String)]) -> Result<()> {
        let url = self.client.table_url(table);
        debug!(table = %table, filters = ?filters, "Deleting rows");

        let request = self
            .client
            .request(Method::DELETE, &url)
            .await
            .query(filters);

        self.client.execute(request).await.map(|_| ())
    }
}

#[async_trait]
impl DataStore for RestStore {
    // Songs
    async fn list_songs(&self) -> Result<Vec<SongRow>> {
        self.select("songs", "*", &[("order", "file_id.asc".to_string())])
            .await
    }

    async fn adjust_song_likes(&self, song_id: SongId, delta: i64) -> Result<u64> {
        let filter = [("file_id", eq(song_id))];
        let current: Vec<LikesCounter> = self.select("songs", "likes", &filter).await?;
        let current = current
            .into_iter()
            .next()
            .ok_or_else(|| LyraError::not_found("Song", song_id))?;

        let likes = (current.likes.unwrap_or(0) + delta).max(0);
        self.update("songs", &filter, &LikesUpdate { likes }).await?;

        Ok(likes as u64)
    }

    // Users
    async fn get_user(&self, user_id: &UserId) -> Result<Option<UserRow>> {
        let rows: Vec<UserRow> = self.select("users", "*", &[("id", eq(user_id))]).await?;
        Ok(rows.into_iter().next())
    }

    async fn set_last_song(&self, user_id: &UserId, song_id: SongId) -> Result<()> {
        self.update(
            "users",
            &[("id", eq(user_id))],
            &LastSongUpdate {
                last_song_file_id: song_id,
            },
        )
        .await
    }

    // Playlists
    async fn list_playlists(&self, user_id: &UserId) -> Result<Vec<PlaylistRow>> {
        self.select(
            "playlists",
            "*",
            &[("user_id", eq(user_id)), ("order", "id.asc".to_string())],
        )
        .await
    }

    async fn get_playlist(&self, id: PlaylistId) -> Result<Option<PlaylistRow>> {
        let rows: Vec<PlaylistRow> = self.select("playlists", "*", &[("id", eq(id))]).await?;
        Ok(rows.into_iter().next())
    }

    async fn create_playlist(&self, user_id: &UserId, name: &str) -> Result<PlaylistRow> {
        let rows: Vec<PlaylistRow> = self
            .insert(
                "playlists",
                &NewPlaylist {
                    user_id: user_id.as_str(),
                    name,
                },
            )
            .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| LyraError::Malformed("insert returned no playlist row".into()))
    }

    async fn rename_playlist(&self, id: PlaylistId, name: &str) -> Result<()> {
        self.update("playlists", &[("id", eq(id))], &PlaylistRename { name })
            .await
    }

    async fn delete_playlist(&self, id: PlaylistId) -> Result<()> {
        self.delete("playlist_songs", &[("playlist_id", eq(id))])
            .await?;
        self.delete("playlists", &[("id", eq(id))]).await
    }

    async fn list_playlist_songs(&self, ids: &[PlaylistId]) -> Result<Vec<PlaylistSongRow>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let list = ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");

        self.select(
            "playlist_songs",
            "playlist_id,song_id",
            &[("playlist_id", format!("in.({list})"))],
        )
        .await
    }

    async fn add_playlist_song(&self, id: PlaylistId, song_id: SongId) -> Result<()> {
        self.insert_no_return(
            "playlist_songs",
            &PlaylistMember {
                playlist_id: id,
                song_id,
            },
        )
        .await
    }

    async fn remove_playlist_song(&self, id: PlaylistId, song_id: SongId) -> Result<()> {
        self.delete(
            "playlist_songs",
            &[("playlist_id", eq(id)), ("song_id", eq(song_id))],
        )
        .await
    }

    // Likes
    async fn list_likes(&self, user_id: &UserId) -> Result<Vec<SongId>> {
        let rows: Vec<LikedSong> = self
            .select("likes", "song_id", &[("user_id", eq(user_id))])
            .await?;
        Ok(rows.into_iter().map(|row| row.song_id).collect())
    }

    async fn add_like(&self, user_id: &UserId, song_id: SongId) -> Result<()> {
        let result = self
            .insert_no_return(
                "likes",
                &NewLike {
                    user_id: user_id.as_str(),
                    song_id,
                },
            )
            .await;

        match result {
            // Already liked
            Err(LyraError::Conflict(_)) => Ok(()),
            other => other,
        }
    }

    async fn remove_like(&self, user_id: &UserId, song_id: SongId) -> Result<()> {
        self.delete(
            "likes",
            &[("user_id", eq(user_id)), ("song_id", eq(song_id))],
        )
        .await
    }

    // Listening history
    async fn find_history(
        &self,
        user_id: &UserId,
        song_id: SongId,
        date: NaiveDate,
    ) -> Result<Option<ListeningHistoryEntry>> {
        let rows: Vec<ListeningHistoryEntry> = self
            .select(
                "listening_history",
                "*",
                &[
                    ("user_id", eq(user_id)),
                    ("song_id", eq(song_id)),
                    ("last_date", eq(date.format("%Y-%m-%d"))),
                ],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn save_history(&self, entry: &ListeningHistoryEntry) -> Result<ListeningHistoryEntry> {
        let url = self.client.table_url("listening_history");
        debug!(song_id = %entry.song_id, minutes = entry.minutes_listened, "Upserting history entry");

        let request = self
            .client
            .request(Method::POST, &url)
            .await
            .query(&[("on_conflict", "user_id,song_id,last_date")])
            .header(
                "Prefer",
                HeaderValue::from_static("resolution=merge-duplicates,return=representation"),
            )
            .json(entry);

        let rows: Vec<ListeningHistoryEntry> = self.client.fetch(request).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| LyraError::Malformed("upsert returned no history row".into()))
    }
}
