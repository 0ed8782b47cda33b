//! Offline demo catalog
//!
//! Lets the shell run without a backend: an in-memory store seeded with a
//! handful of songs and one listener.

use lyra_core::types::{SongRow, UserRow};
use lyra_core::AuthUser;
use lyra_store::MemoryStore;

pub const DEMO_USER: &str = "demo-listener";

const SONGS: &[(&str, &str, &str, &[&str], i64, i64)] = &[
    ("Blue Hour", "Nadia Reyes", "en", &["ambient", "evening"], 12_400, 830),
    ("Red Line", "The Commuters", "en", &["rock"], 98_200, 4_120),
    ("Night Drive", "Kai Moreno", "es", &["synthwave", "night"], 1_520_000, 61_300),
    ("Paper Boats", "Lowtide", "en", &["indie", "acoustic"], 7_300, 210),
    ("Kaze no Uta", "Hinata", "ja", &["j-pop"], 245_000, 9_870),
    ("Slow Orbit", "Nadia Reyes", "en", &["ambient"], 3_100, 95),
];

pub fn user() -> AuthUser {
    AuthUser::new(DEMO_USER, "demo@lyra.local")
}

/// Memory store holding the demo catalog and profile
pub async fn store() -> MemoryStore {
    let rows = SONGS
        .iter()
        .zip(1..)
        .map(|(&(name, artist, language, tags, views, likes), id)| SongRow {
            file_id: Some(id),
            img_id: Some(id),
            name: Some(name.to_string()),
            artist: Some(artist.to_string()),
            language: Some(language.to_string()),
            tags: Some(tags.iter().map(|t| t.to_string()).collect()),
            views: Some(views),
            likes: Some(likes),
        });

    let store = MemoryStore::with_songs(rows);
    store
        .insert_user(UserRow {
            id: Some(DEMO_USER.to_string()),
            email: Some("demo@lyra.local".to_string()),
            username: Some("Demo Listener".to_string()),
            avatar_url: None,
            last_song_file_id: Some(3),
        })
        .await;
    store
}
