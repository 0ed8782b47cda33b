mod history;
mod ids;
mod playlist;
mod song;
mod user;

pub use history::{minutes_between, ListeningHistoryEntry};
pub use ids::{HistoryId, ImageId, PlaylistId, SongId, UserId};
pub use playlist::{validate_playlist_name, Playlist, PlaylistRow, PlaylistSongRow};
pub use song::{Song, SongRow, UNKNOWN_ARTIST};
pub use user::{User, UserRow};
