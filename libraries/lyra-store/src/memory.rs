//! In-process data store.
//!
//! Mirrors the hosted tables in memory. Used for guest sessions, demos, and
//! tests; failures can be injected to exercise rollback paths.

use async_trait::async_trait;
use chrono::NaiveDate;
use lyra_core::types::{
    HistoryId, ListeningHistoryEntry, PlaylistId, PlaylistRow, PlaylistSongRow, SongId, SongRow,
    UserId, UserRow,
};
use lyra_core::{DataStore, LyraError, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    songs: Vec<SongRow>,
    users: HashMap<UserId, UserRow>,
    playlists: BTreeMap<PlaylistId, PlaylistRow>,
    playlist_songs: BTreeSet<(PlaylistId, SongId)>,
    likes: BTreeSet<(UserId, SongId)>,
    history: Vec<ListeningHistoryEntry>,
    next_playlist_id: i64,
    next_history_id: i64,
}

impl Tables {
    fn song_mut(&mut self, song_id: SongId) -> Option<&mut SongRow> {
        self.songs
            .iter_mut()
            .find(|row| row.file_id == Some(song_id.get()))
    }
}

/// Data store held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    offline: AtomicBool,
    fail_next: AtomicUsize,
    failing_methods: Mutex<HashSet<&'static str>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with catalog rows
    pub fn with_songs(songs: impl IntoIterator<Item = SongRow>) -> Self {
        let mut store = Self::new();
        store.tables.get_mut().songs = songs.into_iter().collect();
        store
    }

    pub async fn insert_song(&self, row: SongRow) {
        self.tables.write().await.songs.push(row);
    }

    pub async fn insert_user(&self, row: UserRow) {
        let id = UserId::new(row.id.clone().unwrap_or_default());
        self.tables.write().await.users.insert(id, row);
    }

    /// Insert a playlist row with an explicit owner, bypassing any checks
    pub async fn insert_playlist(&self, owner: &UserId, name: &str) -> PlaylistId {
        let mut tables = self.tables.write().await;
        create_playlist_row(&mut tables, owner, name)
    }

    /// While offline every call fails with `TransientIo`
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Fail the next `n` calls with `TransientIo`
    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    /// Fail every call to the named `DataStore` method until cleared
    pub fn fail_method(&self, method: &'static str) {
        self.failing_methods
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(method);
    }

    pub fn clear_failures(&self) {
        self.failing_methods
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.fail_next.store(0, Ordering::SeqCst);
        self.offline.store(false, Ordering::SeqCst);
    }

    fn check_available(&self, method: &'static str) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(LyraError::transient("store offline"));
        }

        let failing = self
            .failing_methods
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(method);
        if failing {
            return Err(LyraError::transient(format!("{method} unavailable")));
        }

        let consumed = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if consumed.is_ok() {
            return Err(LyraError::transient("injected failure"));
        }

        Ok(())
    }

    // Inspection helpers

    pub async fn playlist_count(&self) -> usize {
        self.tables.read().await.playlists.len()
    }

    pub async fn has_playlist(&self, id: PlaylistId) -> bool {
        self.tables.read().await.playlists.contains_key(&id)
    }

    pub async fn playlist_members(&self, id: PlaylistId) -> BTreeSet<SongId> {
        self.tables
            .read()
            .await
            .playlist_songs
            .iter()
            .filter(|(pid, _)| *pid == id)
            .map(|(_, sid)| *sid)
            .collect()
    }

    pub async fn song_likes(&self, song_id: SongId) -> Option<i64> {
        self.tables
            .read()
            .await
            .songs
            .iter()
            .find(|row| row.file_id == Some(song_id.get()))
            .map(|row| row.likes.unwrap_or(0))
    }

    pub async fn is_liked(&self, user_id: &UserId, song_id: SongId) -> bool {
        self.tables
            .read()
            .await
            .likes
            .contains(&(user_id.clone(), song_id))
    }

    pub async fn history(&self) -> Vec<ListeningHistoryEntry> {
        self.tables.read().await.history.clone()
    }

    pub async fn last_song(&self, user_id: &UserId) -> Option<SongId> {
        self.tables
            .read()
            .await
            .users
            .get(user_id)
            .and_then(|row| row.last_song_file_id)
            .map(SongId::new)
    }
}

fn create_playlist_row(tables: &mut Tables, owner: &UserId, name: &str) -> PlaylistId {
    tables.next_playlist_id += 1;
    let id = PlaylistId::new(tables.next_playlist_id);
    tables.playlists.insert(
        id,
        PlaylistRow {
            id: Some(id.get()),
            user_id: Some(owner.as_str().to_string()),
            name: Some(name.to_string()),
        },
    );
    id
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn list_songs(&self) -> Result<Vec<SongRow>> {
        self.check_available("list_songs")?;
        Ok(self.tables.read().await.songs.clone())
    }

    async fn adjust_song_likes(&self, song_id: SongId, delta: i64) -> Result<u64> {
        self.check_available("adjust_song_likes")?;
        let mut tables = self.tables.write().await;
        let row = tables
            .song_mut(song_id)
            .ok_or_else(|| LyraError::not_found("Song", song_id))?;

        let likes = (row.likes.unwrap_or(0) + delta).max(0);
        row.likes = Some(likes);
        Ok(likes as u64)
    }

    async fn get_user(&self, user_id: &UserId) -> Result<Option<UserRow>> {
        self.check_available("get_user")?;
        Ok(self.tables.read().await.users.get(user_id).cloned())
    }

    async fn set_last_song(&self, user_id: &UserId, song_id: SongId) -> Result<()> {
        self.check_available("set_last_song")?;
        let mut tables = self.tables.write().await;
        let row = tables.users.entry(user_id.clone()).or_insert_with(|| UserRow {
            id: Some(user_id.as_str().to_string()),
            ..UserRow::default()
        });
        row.last_song_file_id = Some(song_id.get());
        Ok(())
    }

    async fn list_playlists(&self, user_id: &UserId) -> Result<Vec<PlaylistRow>> {
        self.check_available("list_playlists")?;
        Ok(self
            .tables
            .read()
            .await
            .playlists
            .values()
            .filter(|row| row.user_id.as_deref() == Some(user_id.as_str()))
            .cloned()
            .collect())
    }

    async fn get_playlist(&self, id: PlaylistId) -> Result<Option<PlaylistRow>> {
        self.check_available("get_playlist")?;
        Ok(self.tables.read().await.playlists.get(&id).cloned())
    }

    async fn create_playlist(&self, user_id: &UserId, name: &str) -> Result<PlaylistRow> {
        self.check_available("create_playlist")?;
        let mut tables = self.tables.write().await;
        let id = create_playlist_row(&mut tables, user_id, name);
        tables
            .playlists
            .get(&id)
            .cloned()
            .ok_or_else(|| LyraError::not_found("Playlist", id))
    }

    async fn rename_playlist(&self, id: PlaylistId, name: &str) -> Result<()> {
        self.check_available("rename_playlist")?;
        if let Some(row) = self.tables.write().await.playlists.get_mut(&id) {
            row.name = Some(name.to_string());
        }
        Ok(())
    }

    async fn delete_playlist(&self, id: PlaylistId) -> Result<()> {
        self.check_available("delete_playlist")?;
        let mut tables = self.tables.write().await;
        tables.playlist_songs.retain(|(pid, _)| *pid != id);
        tables.playlists.remove(&id);
        Ok(())
    }

    async fn list_playlist_songs(&self, ids: &[PlaylistId]) -> Result<Vec<PlaylistSongRow>> {
        self.check_available("list_playlist_songs")?;
        Ok(self
            .tables
            .read()
            .await
            .playlist_songs
            .iter()
            .filter(|(pid, _)| ids.contains(pid))
            .map(|&(playlist_id, song_id)| PlaylistSongRow {
                playlist_id,
                song_id,
            })
            .collect())
    }

    async fn add_playlist_song(&self, id: PlaylistId, song_id: SongId) -> Result<()> {
        self.check_available("add_playlist_song")?;
        let inserted = self.tables.write().await.playlist_songs.insert((id, song_id));
        if inserted {
            Ok(())
        } else {
            Err(LyraError::Conflict(format!(
                "song {song_id} already in playlist {id}"
            )))
        }
    }

    async fn remove_playlist_song(&self, id: PlaylistId, song_id: SongId) -> Result<()> {
        self.check_available("remove_playlist_song")?;
        self.tables
            .write()
            .await
            .playlist_songs
            .remove(&(id, song_id));
        Ok(())
    }

    async fn list_likes(&self, user_id: &UserId) -> Result<Vec<SongId>> {
        self.check_available("list_likes")?;
        Ok(self
            .tables
            .read()
            .await
            .likes
            .iter()
            .filter(|(uid, _)| uid == user_id)
            .map(|(_, sid)| *sid)
            .collect())
    }

    async fn add_like(&self, user_id: &UserId, song_id: SongId) -> Result<()> {
        self.check_available("add_like")?;
        self.tables
            .write()
            .await
            .likes
            .insert((user_id.clone(), song_id));
        Ok(())
    }

    async fn remove_like(&self, user_id: &UserId, song_id: SongId) -> Result<()> {
        self.check_available("remove_like")?;
        self.tables
            .write()
            .await
            .likes
            .remove(&(user_id.clone(), song_id));
        Ok(())
    }

    async fn find_history(
        &self,
        user_id: &UserId,
        song_id: SongId,
        date: NaiveDate,
    ) -> Result<Option<ListeningHistoryEntry>> {
        self.check_available("find_history")?;
        Ok(self
            .tables
            .read()
            .await
            .history
            .iter()
            .find(|e| &e.user_id == user_id && e.song_id == song_id && e.last_date == date)
            .cloned())
    }

    async fn save_history(&self, entry: &ListeningHistoryEntry) -> Result<ListeningHistoryEntry> {
        self.check_available("save_history")?;
        let mut tables = self.tables.write().await;

        let existing = tables.history.iter_mut().find(|e| {
            e.user_id == entry.user_id && e.song_id == entry.song_id && e.last_date == entry.last_date
        });

        if let Some(existing) = existing {
            let id = existing.id;
            *existing = ListeningHistoryEntry {
                id,
                ..entry.clone()
            };
            return Ok(existing.clone());
        }

        tables.next_history_id += 1;
        let saved = ListeningHistoryEntry {
            id: Some(HistoryId::new(tables.next_history_id)),
            ..entry.clone()
        };
        tables.history.push(saved.clone());
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(id: i64, likes: i64) -> SongRow {
        SongRow {
            file_id: Some(id),
            name: Some(format!("Song {id}")),
            likes: Some(likes),
            ..SongRow::default()
        }
    }

    #[tokio::test]
    async fn like_counter_saturates_at_zero() {
        let store = MemoryStore::with_songs([song(1, 0)]);
        assert_eq!(store.adjust_song_likes(SongId::new(1), -1).await.unwrap(), 0);
        assert_eq!(store.adjust_song_likes(SongId::new(1), 1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn adjusting_unknown_song_is_not_found() {
        let store = MemoryStore::new();
        let err = store.adjust_song_likes(SongId::new(9), 1).await.unwrap_err();
        assert!(matches!(err, LyraError::NotFound { .. }));
    }

    #[tokio::test]
    async fn fail_next_consumes_exactly_n_calls() {
        let store = MemoryStore::with_songs([song(1, 0)]);
        store.fail_next(2);

        assert!(store.list_songs().await.unwrap_err().is_transient());
        assert!(store.list_songs().await.unwrap_err().is_transient());
        assert_eq!(store.list_songs().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failing_method_only_affects_that_method() {
        let store = MemoryStore::with_songs([song(1, 0)]);
        store.fail_method("adjust_song_likes");

        assert!(store.adjust_song_likes(SongId::new(1), 1).await.is_err());
        assert!(store.list_songs().await.is_ok());

        store.clear_failures();
        assert!(store.adjust_song_likes(SongId::new(1), 1).await.is_ok());
    }

    #[tokio::test]
    async fn offline_store_rejects_everything() {
        let store = MemoryStore::with_songs([song(1, 0)]);
        store.set_offline(true);
        assert!(store.list_songs().await.is_err());

        store.set_offline(false);
        assert!(store.list_songs().await.is_ok());
    }

    #[tokio::test]
    async fn duplicate_membership_is_a_conflict() {
        let store = MemoryStore::new();
        let owner = UserId::new("u1");
        let pid = store.insert_playlist(&owner, "Mix").await;

        store.add_playlist_song(pid, SongId::new(1)).await.unwrap();
        let err = store.add_playlist_song(pid, SongId::new(1)).await.unwrap_err();
        assert!(matches!(err, LyraError::Conflict(_)));
        assert_eq!(store.playlist_members(pid).await.len(), 1);
    }

    #[tokio::test]
    async fn deleting_playlist_drops_memberships() {
        let store = MemoryStore::new();
        let owner = UserId::new("u1");
        let pid = store.insert_playlist(&owner, "Mix").await;
        store.add_playlist_song(pid, SongId::new(1)).await.unwrap();

        store.delete_playlist(pid).await.unwrap();
        assert!(!store.has_playlist(pid).await);
        assert!(store.playlist_members(pid).await.is_empty());
    }

    #[tokio::test]
    async fn save_history_upserts_by_day() {
        use chrono::{TimeZone, Utc};

        let store = MemoryStore::new();
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let mut entry = ListeningHistoryEntry::start(UserId::new("u1"), SongId::new(3), at);

        let first = store.save_history(&entry).await.unwrap();
        entry.add_minutes(2.5);
        let second = store.save_history(&entry).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.history().await.len(), 1);
        assert_eq!(store.history().await[0].minutes_listened, 2.5);
    }
}
