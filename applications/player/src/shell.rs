//! Line-oriented command shell over a `Session`
//!
//! Reads one command per line, runs it, then prints whatever the session
//! queued as events. Library errors are printed and the shell keeps going;
//! only I/O failures end the loop.

use crate::commands::{Command, ListScope, HELP};
use lyra_core::format::{format_clock, format_count, format_minutes};
use lyra_core::types::{Song, SongId};
use lyra_core::Result as LyraResult;
use lyra_library::LoadState;
use lyra_session::{Session, SessionEvent};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

/// Whether the shell should keep reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Run commands from `input` until it ends or `quit` is entered
///
/// The player is closed on the way out so listening time is flushed.
pub async fn run<R, W>(session: &mut Session, input: R, out: &mut W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    write!(out, "> ")?;
    out.flush()?;

    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Ok(Some(command)) => {
                debug!(command = ?command, "Running command");
                let flow = execute(session, command, out).await?;
                print_events(session, out)?;
                if flow == Flow::Quit {
                    return Ok(());
                }
            }
            Ok(None) => {}
            Err(e) => writeln!(out, "{e}")?,
        }
        write!(out, "> ")?;
        out.flush()?;
    }

    writeln!(out)?;
    session.close().await;
    print_events(session, out)?;
    Ok(())
}

/// Run a single command
pub async fn execute<W: Write>(
    session: &mut Session,
    command: Command,
    out: &mut W,
) -> anyhow::Result<Flow> {
    match command {
        Command::Help => writeln!(out, "{HELP}")?,
        Command::Status => print_status(session, out)?,
        Command::Reload => {
            let result = session.load().await;
            report(out, result.map(|()| "library reloaded"))?;
        }
        Command::Quit => {
            session.close().await;
            return Ok(Flow::Quit);
        }

        Command::Songs => print_songs(out, session.library().songs().iter())?,
        Command::Search(query) => {
            let found = session.library().search(&query);
            if found.is_empty() {
                writeln!(out, "no songs match \"{query}\"")?;
            }
            print_songs(out, found.into_iter())?;
        }
        Command::Trending(n) => print_songs(out, session.library().trending(n).into_iter())?,
        Command::Liked => {
            let liked = session.library().liked_songs();
            if liked.is_empty() {
                writeln!(out, "no liked songs yet")?;
            }
            print_songs(out, liked.into_iter())?;
        }
        Command::Playlists => {
            let playlists = session.library().playlists();
            if playlists.is_empty() {
                writeln!(out, "no playlists")?;
            }
            for playlist in playlists {
                writeln!(
                    out,
                    "{:>4}  {} ({} songs)",
                    playlist.id,
                    playlist.name,
                    playlist.len()
                )?;
            }
        }
        Command::Playlist(id) => match session.library().playlist_songs(id) {
            Ok(songs) => print_songs(out, songs.into_iter())?,
            Err(e) => writeln!(out, "error: {e}")?,
        },

        Command::Play(id) => {
            let result = session.play_song(id).await;
            report(out, result.map(|()| ""))?;
        }
        Command::Toggle => session.toggle_play(),
        Command::Next => session.next().await,
        Command::Previous => session.previous().await,
        Command::Close => session.close().await,
        Command::Maximize => session.toggle_maximize(),
        Command::Like => match session.toggle_like_current().await {
            Ok(Some(outcome)) => writeln!(
                out,
                "{} ({} likes)",
                if outcome.liked { "liked" } else { "unliked" },
                format_count(outcome.likes)
            )?,
            Ok(None) => writeln!(out, "nothing is playing")?,
            Err(e) => writeln!(out, "error: {e}")?,
        },

        Command::NewPlaylist(name) => match session.library_mut().create_playlist(&name).await {
            Ok(playlist) => writeln!(out, "created playlist {} \"{}\"", playlist.id, playlist.name)?,
            Err(e) => writeln!(out, "error: {e}")?,
        },
        Command::RenamePlaylist(id, name) => {
            let result = session.library_mut().rename_playlist(id, &name).await;
            report(out, result.map(|()| "renamed"))?;
        }
        Command::DeletePlaylist(id) => {
            let result = session.library_mut().delete_playlist(id).await;
            report(out, result.map(|()| "deleted"))?;
        }
        Command::AddSong(playlist, song) => {
            let result = session
                .library_mut()
                .add_song_to_playlist(playlist, song)
                .await;
            report(out, result.map(|()| "added"))?;
        }
        Command::RemoveSong(playlist, song) => {
            let result = session
                .library_mut()
                .remove_song_from_playlist(playlist, song)
                .await;
            report(out, result.map(|()| "removed"))?;
        }

        Command::Use(scope) => use_scope(session, scope, out)?,
    }

    Ok(Flow::Continue)
}

fn use_scope<W: Write>(session: &mut Session, scope: ListScope, out: &mut W) -> anyhow::Result<()> {
    let songs: Vec<SongId> = match scope {
        ListScope::All => {
            session.clear_active_list();
            writeln!(out, "active list: all songs")?;
            return Ok(());
        }
        ListScope::Liked => ids(session.library().liked_songs()),
        ListScope::Search(query) => ids(session.library().search(&query)),
        ListScope::Playlist(id) => match session.library().playlist_songs(id) {
            Ok(songs) => ids(songs),
            Err(e) => {
                writeln!(out, "error: {e}")?;
                return Ok(());
            }
        },
    };

    writeln!(out, "active list: {} songs", songs.len())?;
    session.set_active_list(songs);
    Ok(())
}

fn ids(songs: Vec<&Song>) -> Vec<SongId> {
    songs.into_iter().map(|song| song.id).collect()
}

fn report<W: Write>(out: &mut W, result: LyraResult<&str>) -> std::io::Result<()> {
    match result {
        Ok("") => Ok(()),
        Ok(message) => writeln!(out, "{message}"),
        Err(e) => writeln!(out, "error: {e}"),
    }
}

fn song_line(song: &Song) -> String {
    format!(
        "{:>4}  {} - {}  {} likes  {} views{}",
        song.id,
        song.name,
        song.artist,
        format_count(song.likes),
        format_count(song.views),
        if song.is_liked { "  [liked]" } else { "" }
    )
}

fn print_songs<'a, W: Write>(
    out: &mut W,
    songs: impl Iterator<Item = &'a Song>,
) -> std::io::Result<()> {
    for song in songs {
        writeln!(out, "{}", song_line(song))?;
    }
    Ok(())
}

fn print_status<W: Write>(session: &Session, out: &mut W) -> std::io::Result<()> {
    let library = session.library();

    match library.load_state() {
        LoadState::Failed(message) => writeln!(out, "library: failed to load ({message})")?,
        LoadState::Loading | LoadState::NotLoaded => writeln!(out, "library: loading")?,
        LoadState::Loaded => writeln!(out, "library: {} songs", library.songs().len())?,
    }

    match library.profile() {
        Some(profile) => writeln!(out, "user: {}", profile.display_name())?,
        None => match library.user_id() {
            Some(id) => writeln!(out, "user: {id}")?,
            None => writeln!(out, "user: guest")?,
        },
    }

    match session.current_song() {
        Some(song) => writeln!(
            out,
            "{}: {} - {}",
            if session.is_playing() { "playing" } else { "paused" },
            song.name,
            song.artist
        )?,
        None => writeln!(out, "nothing playing")?,
    }

    if let Some(elapsed) = library.listening_elapsed() {
        writeln!(out, "listening for {}", format_clock(elapsed.num_seconds() as u64))?;
    }

    let pending: f64 = library.history().outbox().iter().map(|p| p.minutes).sum();
    if pending > 0.0 {
        writeln!(out, "unsaved listening time: {}", format_minutes(pending))?;
    }

    writeln!(
        out,
        "view: {}  active list: {} songs",
        if session.is_maximized() { "maximized" } else { "minimized" },
        session.active_list().len()
    )
}

fn print_events<W: Write>(session: &mut Session, out: &mut W) -> std::io::Result<()> {
    for event in session.drain_events() {
        match event {
            SessionEvent::SongChanged { song_id, .. } => {
                if let Some(song) = session.library().song(song_id) {
                    writeln!(out, "now playing: {}", song_line(song).trim_start())?;
                }
            }
            SessionEvent::PlayStateChanged { is_playing } => {
                writeln!(out, "{}", if is_playing { "playing" } else { "paused" })?;
            }
            SessionEvent::ViewChanged { is_maximized } => {
                writeln!(out, "{}", if is_maximized { "maximized" } else { "minimized" })?;
            }
            SessionEvent::Closed => writeln!(out, "player closed")?,
            SessionEvent::Resumed { song_id } => {
                if let Some(song) = session.library().song(song_id) {
                    writeln!(out, "resume where you left off: {} - {}", song.name, song.artist)?;
                }
            }
            SessionEvent::HistoryTrackingFailed { error, .. } => {
                writeln!(out, "warning: listening history not saved ({error})")?;
            }
        }
    }
    Ok(())
}
