//! The data access layer
//!
//! `Library` mediates every read and write against the data store for the
//! signed-in user and keeps the in-memory view the player renders from.

use crate::catalog;
use crate::history::{HistoryError, HistoryResult, HistoryTracker, TrackerState};
use crate::optimistic::{LikeOutcome, UpdateLedger, UpdateStatus};
use lyra_core::types::{
    validate_playlist_name, Playlist, PlaylistId, Song, SongId, User, UserId,
};
use lyra_core::{AuthProvider, Clock, DataStore, LyraError, Result};
use chrono::Duration;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where the library is in its load cycle
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    NotLoaded,
    Loading,
    Loaded,
    /// Load failed; lists are empty
    Failed(String),
}

/// Everything fetched by one `load()`
struct Snapshot {
    user: Option<UserId>,
    profile: Option<User>,
    songs: Vec<Song>,
    playlists: Vec<Playlist>,
    liked: BTreeSet<SongId>,
}

/// Data access for one user session
pub struct Library {
    store: Arc<dyn DataStore>,
    auth: Arc<dyn AuthProvider>,
    clock: Arc<dyn Clock>,

    user: Option<UserId>,
    profile: Option<User>,
    songs: Vec<Song>,
    playlists: Vec<Playlist>,
    liked: BTreeSet<SongId>,
    last_played: Option<Song>,
    state: LoadState,

    likes: UpdateLedger,
    history: HistoryTracker,
}

impl Library {
    pub fn new(
        store: Arc<dyn DataStore>,
        auth: Arc<dyn AuthProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            auth,
            clock,
            user: None,
            profile: None,
            songs: Vec::new(),
            playlists: Vec::new(),
            liked: BTreeSet::new(),
            last_played: None,
            state: LoadState::NotLoaded,
            likes: UpdateLedger::new(),
            history: HistoryTracker::new(),
        }
    }

    // ===== Accessors =====

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn song(&self, id: SongId) -> Option<&Song> {
        self.songs.iter().find(|s| s.id == id)
    }

    pub fn playlists(&self) -> &[Playlist] {
        &self.playlists
    }

    pub fn playlist(&self, id: PlaylistId) -> Option<&Playlist> {
        self.playlists.iter().find(|p| p.id == id)
    }

    /// Songs the user has liked, in catalog order
    pub fn liked_songs(&self) -> Vec<&Song> {
        catalog::resolve(&self.songs, &self.liked)
    }

    /// Song to resume on startup, from the user's profile
    pub fn last_played(&self) -> Option<&Song> {
        self.last_played.as_ref()
    }

    pub fn load_state(&self) -> &LoadState {
        &self.state
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user.as_ref()
    }

    pub fn profile(&self) -> Option<&User> {
        self.profile.as_ref()
    }

    pub fn like_status(&self, song_id: SongId) -> Option<UpdateStatus> {
        self.likes.status(song_id)
    }

    pub fn history(&self) -> &HistoryTracker {
        &self.history
    }

    /// Time spent on the song being tracked, by the library's clock
    pub fn listening_elapsed(&self) -> Option<Duration> {
        match self.history.state() {
            TrackerState::Tracking { started_at, .. } => {
                Some((self.clock.now() - *started_at).max(Duration::zero()))
            }
            TrackerState::Idle => None,
        }
    }

    // ===== Catalog queries =====

    pub fn search(&self, query: &str) -> Vec<&Song> {
        catalog::search(&self.songs, query)
    }

    pub fn trending(&self, n: usize) -> Vec<&Song> {
        catalog::trending(&self.songs, n)
    }

    /// Member songs of a loaded playlist, in catalog order
    pub fn playlist_songs(&self, id: PlaylistId) -> Result<Vec<&Song>> {
        let playlist = self
            .playlist(id)
            .ok_or_else(|| LyraError::not_found("Playlist", id))?;
        Ok(catalog::resolve(&self.songs, &playlist.song_ids))
    }

    // ===== Loading =====

    /// Fetch songs, and for a signed-in user their playlists, likes, and
    /// last played song
    ///
    /// On failure every list is emptied and the state becomes `Failed`.
    pub async fn load(&mut self) -> Result<()> {
        self.state = LoadState::Loading;
        self.likes.clear();

        match self.fetch().await {
            Ok(snapshot) => {
                self.last_played = snapshot
                    .profile
                    .as_ref()
                    .and_then(|p| p.last_song_id)
                    .and_then(|id| snapshot.songs.iter().find(|s| s.id == id).cloned());

                self.user = snapshot.user;
                self.profile = snapshot.profile;
                self.songs = snapshot.songs;
                self.playlists = snapshot.playlists;
                self.liked = snapshot.liked;
                self.state = LoadState::Loaded;

                info!(
                    songs = self.songs.len(),
                    playlists = self.playlists.len(),
                    liked = self.liked.len(),
                    signed_in = self.user.is_some(),
                    "Library loaded"
                );
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Library load failed");
                self.profile = None;
                self.songs.clear();
                self.playlists.clear();
                self.liked.clear();
                self.last_played = None;
                self.state = LoadState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    async fn fetch(&self) -> Result<Snapshot> {
        let user = self.auth.current_user().await?.map(|u| u.id);

        let mut songs: Vec<Song> = self
            .store
            .list_songs()
            .await?
            .into_iter()
            .filter_map(|row| match Song::try_from(row) {
                Ok(song) => Some(song),
                Err(e) => {
                    warn!(error = %e, "Skipping invalid song row");
                    None
                }
            })
            .collect();

        let Some(user_id) = user else {
            debug!("No signed-in user, loading catalog only");
            return Ok(Snapshot {
                user: None,
                profile: None,
                songs,
                playlists: Vec::new(),
                liked: BTreeSet::new(),
            });
        };

        let mut playlists: Vec<Playlist> = self
            .store
            .list_playlists(&user_id)
            .await?
            .into_iter()
            .filter_map(|row| match Playlist::try_from(row) {
                Ok(playlist) => Some(playlist),
                Err(e) => {
                    warn!(error = %e, "Skipping invalid playlist row");
                    None
                }
            })
            .collect();

        let ids: Vec<PlaylistId> = playlists.iter().map(|p| p.id).collect();
        let mut members: HashMap<PlaylistId, BTreeSet<SongId>> = HashMap::new();
        for row in self.store.list_playlist_songs(&ids).await? {
            members.entry(row.playlist_id).or_default().insert(row.song_id);
        }
        for playlist in &mut playlists {
            playlist.song_ids = members.remove(&playlist.id).unwrap_or_default();
        }

        let liked: BTreeSet<SongId> = self.store.list_likes(&user_id).await?.into_iter().collect();
        for song in &mut songs {
            song.is_liked = liked.contains(&song.id);
        }

        let profile = match self.store.get_user(&user_id).await? {
            Some(row) => match User::try_from(row) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!(user_id = %user_id, error = %e, "Ignoring invalid profile row");
                    None
                }
            },
            None => None,
        };

        Ok(Snapshot {
            user: Some(user_id),
            profile,
            songs,
            playlists,
            liked,
        })
    }

    /// Signed-in user as the provider reports it right now
    async fn current_user(&mut self) -> Result<Option<UserId>> {
        let user = self.auth.current_user().await?.map(|u| u.id);
        if user != self.user {
            info!(
                previous = ?self.user,
                current = ?user,
                "Signed-in user changed since load"
            );
            self.user.clone_from(&user);
        }
        Ok(user)
    }

    async fn require_user(&mut self) -> Result<UserId> {
        self.current_user().await?.ok_or(LyraError::Unauthenticated)
    }

    // ===== Likes =====

    /// Flip the like on a song
    pub async fn toggle_like(&mut self, song_id: SongId) -> Result<LikeOutcome> {
        let liked = self
            .song(song_id)
            .map(|s| s.is_liked)
            .ok_or_else(|| LyraError::not_found("Song", song_id))?;
        self.set_like(song_id, !liked).await
    }

    /// Make the like state of a song equal `liked`
    ///
    /// Applied optimistically: the flag and counter change immediately and
    /// are restored if the store rejects the write. Does nothing when the
    /// song is already in the requested state.
    pub async fn set_like(&mut self, song_id: SongId, liked: bool) -> Result<LikeOutcome> {
        let user_id = self.require_user().await?;
        let index = self
            .songs
            .iter()
            .position(|s| s.id == song_id)
            .ok_or_else(|| LyraError::not_found("Song", song_id))?;

        let (was_liked, prior_likes) = {
            let song = &self.songs[index];
            (song.is_liked, song.likes)
        };

        if was_liked == liked {
            return Ok(LikeOutcome {
                song_id,
                liked,
                likes: prior_likes,
                status: self.likes.status(song_id).unwrap_or(UpdateStatus::Confirmed),
            });
        }

        // Optimistic apply
        self.likes.begin(song_id);
        self.apply_like(index, liked, optimistic_count(prior_likes, liked));

        match self.write_like(&user_id, song_id, liked).await {
            Ok(likes) => {
                self.songs[index].likes = likes;
                self.likes.confirm(song_id);
                debug!(song_id = %song_id, liked, likes, "Like confirmed");
                Ok(LikeOutcome {
                    song_id,
                    liked,
                    likes,
                    status: UpdateStatus::Confirmed,
                })
            }
            Err(e) => {
                warn!(song_id = %song_id, error = %e, "Like write failed, rolling back");
                self.apply_like(index, was_liked, prior_likes);
                self.likes.roll_back(song_id);
                Err(e)
            }
        }
    }

    fn apply_like(&mut self, index: usize, liked: bool, likes: u64) {
        let song = &mut self.songs[index];
        song.is_liked = liked;
        song.likes = likes;

        if liked {
            self.liked.insert(song.id);
        } else {
            self.liked.remove(&song.id);
        }
    }

    /// Write the relation, then the counter; undo the relation if the
    /// counter write fails
    async fn write_like(&self, user_id: &UserId, song_id: SongId, liked: bool) -> Result<u64> {
        let delta = if liked {
            self.store.add_like(user_id, song_id).await?;
            1
        } else {
            self.store.remove_like(user_id, song_id).await?;
            -1
        };

        match self.store.adjust_song_likes(song_id, delta).await {
            Ok(likes) => Ok(likes),
            Err(e) => {
                let undo = if liked {
                    self.store.remove_like(user_id, song_id).await
                } else {
                    self.store.add_like(user_id, song_id).await
                };
                if let Err(undo_err) = undo {
                    warn!(song_id = %song_id, error = %undo_err, "Could not undo like relation");
                }
                Err(e)
            }
        }
    }

    // ===== Playlists =====

    /// Create a playlist owned by the signed-in user
    pub async fn create_playlist(&mut self, name: &str) -> Result<Playlist> {
        let name = validate_playlist_name(name)?;
        let user_id = self.require_user().await?;

        let row = self.store.create_playlist(&user_id, &name).await?;
        let playlist = Playlist::try_from(row)?;

        info!(playlist_id = %playlist.id, name = %playlist.name, "Created playlist");
        self.playlists.push(playlist.clone());
        Ok(playlist)
    }

    pub async fn delete_playlist(&mut self, id: PlaylistId) -> Result<()> {
        let user_id = self.require_user().await?;
        self.authorize_playlist(&user_id, id).await?;

        self.store.delete_playlist(id).await?;
        self.playlists.retain(|p| p.id != id);

        info!(playlist_id = %id, "Deleted playlist");
        Ok(())
    }

    pub async fn rename_playlist(&mut self, id: PlaylistId, name: &str) -> Result<()> {
        let name = validate_playlist_name(name)?;
        let user_id = self.require_user().await?;
        self.authorize_playlist(&user_id, id).await?;

        self.store.rename_playlist(id, &name).await?;
        if let Some(playlist) = self.playlists.iter_mut().find(|p| p.id == id) {
            playlist.name = name;
        }

        debug!(playlist_id = %id, "Renamed playlist");
        Ok(())
    }

    /// Add a song to a playlist; adding a member again changes nothing
    pub async fn add_song_to_playlist(&mut self, id: PlaylistId, song_id: SongId) -> Result<()> {
        let user_id = self.require_user().await?;
        self.authorize_playlist(&user_id, id).await?;
        self.require_song(song_id)?;

        if self.playlist(id).is_some_and(|p| p.contains(song_id)) {
            return Ok(());
        }

        match self.store.add_playlist_song(id, song_id).await {
            Ok(()) => {}
            Err(LyraError::Conflict(_)) => {
                debug!(playlist_id = %id, song_id = %song_id, "Song already a member");
            }
            Err(e) => return Err(e),
        }

        if let Some(playlist) = self.playlists.iter_mut().find(|p| p.id == id) {
            playlist.song_ids.insert(song_id);
        }
        Ok(())
    }

    /// Remove a song from a playlist; removing a non-member changes nothing
    pub async fn remove_song_from_playlist(
        &mut self,
        id: PlaylistId,
        song_id: SongId,
    ) -> Result<()> {
        let user_id = self.require_user().await?;
        self.authorize_playlist(&user_id, id).await?;
        self.require_song(song_id)?;

        if self.playlist(id).is_some_and(|p| !p.contains(song_id)) {
            return Ok(());
        }

        self.store.remove_playlist_song(id, song_id).await?;
        if let Some(playlist) = self.playlists.iter_mut().find(|p| p.id == id) {
            playlist.song_ids.remove(&song_id);
        }
        Ok(())
    }

    fn require_song(&self, song_id: SongId) -> Result<()> {
        self.song(song_id)
            .map(|_| ())
            .ok_or_else(|| LyraError::not_found("Song", song_id))
    }

    /// Only the owner may mutate a playlist
    ///
    /// Playlists outside the loaded view are looked up in the store.
    async fn authorize_playlist(&self, user_id: &UserId, id: PlaylistId) -> Result<()> {
        let owner = match self.playlist(id) {
            Some(playlist) => playlist.owner_id.clone(),
            None => {
                let row = self
                    .store
                    .get_playlist(id)
                    .await?
                    .ok_or_else(|| LyraError::not_found("Playlist", id))?;
                Playlist::try_from(row)?.owner_id
            }
        };

        if &owner != user_id {
            warn!(playlist_id = %id, user_id = %user_id, "Rejected playlist mutation by non-owner");
            return Err(LyraError::unauthorized(format!(
                "playlist {id} belongs to another user"
            )));
        }
        Ok(())
    }

    // ===== Listening history =====

    /// Start timing `song_id`, finalizing any other open song
    ///
    /// Also remembers the song as the user's last played. Requires a
    /// signed-in user; the error names the song whose write failed.
    pub async fn record_listening_history(&mut self, song_id: SongId) -> HistoryResult<()> {
        let user_id = self
            .require_user()
            .await
            .map_err(|e| HistoryError::new(song_id, e))?;

        let changed = self.history.current_song() != Some(song_id);
        let now = self.clock.now();
        let result = self
            .history
            .record(self.store.as_ref(), &user_id, song_id, now)
            .await;

        if changed {
            match self.store.set_last_song(&user_id, song_id).await {
                Ok(()) => {
                    self.last_played = self.song(song_id).cloned();
                }
                Err(e) => {
                    warn!(song_id = %song_id, error = %e, "Failed to save last played song");
                }
            }
        }

        result
    }

    /// Finalize the open song; nothing happens when idle
    pub async fn stop_current_song_tracking(&mut self) -> HistoryResult<()> {
        let now = self.clock.now();
        self.history.stop(self.store.as_ref(), now).await
    }
}

fn optimistic_count(likes: u64, liked: bool) -> u64 {
    if liked {
        likes.saturating_add(1)
    } else {
        likes.saturating_sub(1)
    }
}
