//! Session events
//!
//! Every state transition of a `Session` queues one of these. Front ends
//! drain the queue after each call and re-render from it.

use lyra_core::types::SongId;
use serde::{Deserialize, Serialize};

/// Events emitted by the session controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// A different song became current
    SongChanged {
        song_id: SongId,
        previous_song_id: Option<SongId>,
    },

    /// Playing/paused flag flipped
    PlayStateChanged { is_playing: bool },

    /// Player maximized or minimized
    ViewChanged { is_maximized: bool },

    /// Player closed and state cleared
    Closed,

    /// Last played song adopted on startup, paused
    Resumed { song_id: SongId },

    /// History write for `song_id` failed; playback is unaffected
    HistoryTrackingFailed { song_id: SongId, error: String },
}
