//! Lyra Session
//!
//! The player's session controller: current song, play/pause, and the
//! maximized/minimized view, driving listening history through a
//! [`lyra_library::Library`].
//!
//! Playback is visual only. No audio is decoded and no clock advances the
//! position; listening time is measured between song changes.
//!
//! # Example
//!
//! ```rust
//! use lyra_core::types::SongRow;
//! use lyra_core::{StaticAuth, SystemClock};
//! use lyra_library::Library;
//! use lyra_session::{Session, SessionEvent};
//! use lyra_store::MemoryStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> lyra_core::Result<()> {
//! let rows = (1..=3).map(|id| SongRow {
//!     file_id: Some(id),
//!     name: Some(format!("Song {id}")),
//!     ..SongRow::default()
//! });
//! let library = Library::new(
//!     Arc::new(MemoryStore::with_songs(rows)),
//!     Arc::new(StaticAuth::guest()),
//!     Arc::new(SystemClock),
//! );
//!
//! let mut session = Session::new(library);
//! session.load().await?;
//!
//! let first = session.library().songs()[0].clone();
//! session.play(first).await;
//! session.next().await;
//!
//! assert_eq!(session.current_song().map(|s| s.name.as_str()), Some("Song 2"));
//! assert!(session
//!     .drain_events()
//!     .iter()
//!     .any(|e| matches!(e, SessionEvent::SongChanged { .. })));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod events;
pub mod session;

pub use events::SessionEvent;
pub use session::Session;
