//! Catalog queries over the loaded songs

use lyra_core::types::{Song, SongId};
use std::collections::BTreeSet;

/// Songs whose name, artist, or any tag contains `query`, ignoring case
///
/// A blank query matches nothing. Results keep catalog order.
pub fn search<'a>(songs: &'a [Song], query: &str) -> Vec<&'a Song> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    songs.iter().filter(|song| song.matches(&needle)).collect()
}

/// The first `n` catalog songs
pub fn trending(songs: &[Song], n: usize) -> Vec<&Song> {
    songs.iter().take(n).collect()
}

/// Resolve member ids to songs, in catalog order
///
/// Ids missing from the catalog are skipped.
pub fn resolve<'a>(songs: &'a [Song], ids: &BTreeSet<SongId>) -> Vec<&'a Song> {
    songs.iter().filter(|song| ids.contains(&song.id)).collect()
}
