//! Lyra Core
//!
//! Platform-agnostic core types, traits, and error handling for Lyra.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Song`, `Playlist`, `User`, `ListeningHistoryEntry`
//! - **Wire Rows**: `SongRow`, `PlaylistRow`, `UserRow`, validated into domain types
//! - **Core Traits**: `DataStore`, `AuthProvider`, `Clock`
//! - **Error Handling**: Unified `LyraError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use lyra_core::types::{Song, SongId, SongRow};
//!
//! let row = SongRow {
//!     file_id: Some(1),
//!     name: Some("Blue Hour".to_string()),
//!     ..SongRow::default()
//! };
//!
//! let song = Song::try_from(row).unwrap();
//! assert_eq!(song.id, SongId::new(1));
//! assert_eq!(song.artist, "Unknown Artist");
//! ```

#![forbid(unsafe_code)]

pub mod auth;
pub mod clock;
pub mod error;
pub mod format;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use auth::{AuthProvider, AuthUser, StaticAuth};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{LyraError, Result};
pub use store::DataStore;

pub use types::{
    ListeningHistoryEntry, Playlist, PlaylistId, PlaylistRow, PlaylistSongRow, Song, SongId,
    SongRow, User, UserId, UserRow,
};
