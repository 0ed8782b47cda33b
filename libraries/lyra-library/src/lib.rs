//! Lyra Library
//!
//! Data access for the Lyra player. Wraps a `DataStore` and keeps the
//! current user's view of the catalog, likes, and playlists in memory.
//!
//! This crate provides:
//! - Loading with graceful degradation (`LoadState`)
//! - Optimistic like toggles with rollback (`UpdateStatus`)
//! - Owner-checked playlist mutations
//! - Listening history tracking with a retry outbox
//! - Catalog search and trending
//!
//! # Example
//!
//! ```rust
//! use lyra_core::types::{SongId, SongRow};
//! use lyra_core::{AuthUser, StaticAuth, SystemClock};
//! use lyra_library::Library;
//! use lyra_store::MemoryStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> lyra_core::Result<()> {
//! let store = Arc::new(MemoryStore::with_songs([SongRow {
//!     file_id: Some(1),
//!     name: Some("Blue Hour".to_string()),
//!     likes: Some(3),
//!     ..SongRow::default()
//! }]));
//! let auth = Arc::new(StaticAuth::signed_in(AuthUser::new("u1", "u1@example.com")));
//!
//! let mut library = Library::new(store, auth, Arc::new(SystemClock));
//! library.load().await?;
//!
//! let outcome = library.toggle_like(SongId::new(1)).await?;
//! assert!(outcome.liked);
//! assert_eq!(outcome.likes, 4);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod catalog;
pub mod history;
pub mod library;
pub mod optimistic;

pub use history::{HistoryError, HistoryResult, HistoryTracker, PendingListen, TrackerState};
pub use library::{Library, LoadState};
pub use optimistic::{LikeOutcome, UpdateLedger, UpdateStatus};
