//! Shell command parsing

use lyra_core::types::{PlaylistId, SongId};
use thiserror::Error;

/// Commands understood by the player shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Status,
    Reload,
    Quit,

    // Browsing
    Songs,
    Search(String),
    Trending(usize),
    Liked,
    Playlists,
    Playlist(PlaylistId),

    // Playback
    Play(SongId),
    Toggle,
    Next,
    Previous,
    Close,
    Maximize,
    Like,

    // Playlists
    NewPlaylist(String),
    RenamePlaylist(PlaylistId, String),
    DeletePlaylist(PlaylistId),
    AddSong(PlaylistId, SongId),
    RemoveSong(PlaylistId, SongId),

    /// Scope next/previous
    Use(ListScope),
}

/// What next/previous walk over
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListScope {
    All,
    Liked,
    Playlist(PlaylistId),
    Search(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command: {0} (try `help`)")]
    Unknown(String),

    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("not a number: {0}")]
    InvalidNumber(String),
}

pub const DEFAULT_TRENDING: usize = 3;

pub const HELP: &str = "\
commands:
  songs                     list the catalog
  search <text>             find songs by name, artist or tag
  trending [n]              top of the catalog
  liked                     your liked songs
  playlists                 your playlists
  playlist <id>             songs in a playlist
  play <song>               play a song
  toggle                    play/pause
  next | prev               skip within the active list
  use all|liked|playlist <id>|search <text>
                            choose the active list
  like                      like/unlike the current song
  max                       maximize/minimize the player
  close                     close the player
  new <name>                create a playlist
  rename <id> <name>        rename a playlist
  delete <id>               delete a playlist
  add <playlist> <song>     add a song to a playlist
  remove <playlist> <song>  remove a song from a playlist
  status                    show player state
  reload                    reload the library
  quit                      exit";

impl Command {
    /// Parse one input line; blank lines yield `None`
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_lowercase().as_str() {
            "help" | "?" => Command::Help,
            "status" => Command::Status,
            "reload" => Command::Reload,
            "quit" | "exit" | "q" => Command::Quit,

            "songs" | "ls" => Command::Songs,
            "search" | "find" => Command::Search(required_text(rest, "search text")?),
            "trending" | "top" => Command::Trending(if rest.is_empty() {
                DEFAULT_TRENDING
            } else {
                number(rest)?
            }),
            "liked" => Command::Liked,
            "playlists" => Command::Playlists,
            "playlist" => Command::Playlist(PlaylistId::new(id_arg(rest, "playlist id")?)),

            "play" => Command::Play(SongId::new(id_arg(rest, "song id")?)),
            "toggle" | "pause" | "resume" => Command::Toggle,
            "next" | "n" => Command::Next,
            "prev" | "previous" | "p" => Command::Previous,
            "close" => Command::Close,
            "max" | "maximize" | "min" | "minimize" => Command::Maximize,
            "like" | "unlike" => Command::Like,

            "new" => Command::NewPlaylist(required_text(rest, "playlist name")?),
            "rename" => {
                let (id, name) = split_first(rest, "playlist id")?;
                Command::RenamePlaylist(PlaylistId::new(number(id)?), required_text(name, "playlist name")?)
            }
            "delete" => Command::DeletePlaylist(PlaylistId::new(id_arg(rest, "playlist id")?)),
            "add" => {
                let (playlist, song) = two_ids(rest)?;
                Command::AddSong(playlist, song)
            }
            "remove" => {
                let (playlist, song) = two_ids(rest)?;
                Command::RemoveSong(playlist, song)
            }

            "use" => Command::Use(scope(rest)?),

            other => return Err(CommandError::Unknown(other.to_string())),
        };

        Ok(Some(command))
    }
}

fn scope(rest: &str) -> Result<ListScope, CommandError> {
    let (kind, arg) = match rest.split_once(char::is_whitespace) {
        Some((kind, arg)) => (kind, arg.trim()),
        None => (rest, ""),
    };

    match kind.to_lowercase().as_str() {
        "" => Err(CommandError::MissingArgument("list")),
        "all" => Ok(ListScope::All),
        "liked" => Ok(ListScope::Liked),
        "playlist" => Ok(ListScope::Playlist(PlaylistId::new(id_arg(arg, "playlist id")?))),
        "search" => Ok(ListScope::Search(required_text(arg, "search text")?)),
        other => Err(CommandError::Unknown(format!("use {other}"))),
    }
}

fn required_text(rest: &str, what: &'static str) -> Result<String, CommandError> {
    if rest.is_empty() {
        Err(CommandError::MissingArgument(what))
    } else {
        Ok(rest.to_string())
    }
}

fn split_first<'a>(rest: &'a str, what: &'static str) -> Result<(&'a str, &'a str), CommandError> {
    if rest.is_empty() {
        return Err(CommandError::MissingArgument(what));
    }
    Ok(match rest.split_once(char::is_whitespace) {
        Some((first, tail)) => (first, tail.trim()),
        None => (rest, ""),
    })
}

fn id_arg(rest: &str, what: &'static str) -> Result<i64, CommandError> {
    if rest.is_empty() {
        return Err(CommandError::MissingArgument(what));
    }
    number(rest)
}

fn two_ids(rest: &str) -> Result<(PlaylistId, SongId), CommandError> {
    let (playlist, song) = split_first(rest, "playlist id")?;
    let song = id_arg(song, "song id")?;
    Ok((PlaylistId::new(number(playlist)?), SongId::new(song)))
}

fn number<T: std::str::FromStr>(text: &str) -> Result<T, CommandError> {
    text.trim()
        .parse()
        .map_err(|_| CommandError::InvalidNumber(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Command {
        Command::parse(line).unwrap().unwrap()
    }

    #[test]
    fn test_blank_line_is_nothing() {
        assert_eq!(Command::parse("   ").unwrap(), None);
    }

    #[test]
    fn test_simple_commands_and_aliases() {
        assert_eq!(parse("next"), Command::Next);
        assert_eq!(parse("P"), Command::Previous);
        assert_eq!(parse("pause"), Command::Toggle);
        assert_eq!(parse("exit"), Command::Quit);
    }

    #[test]
    fn test_arguments() {
        assert_eq!(parse("play 12"), Command::Play(SongId::new(12)));
        assert_eq!(parse("search  night drive "), Command::Search("night drive".into()));
        assert_eq!(parse("trending"), Command::Trending(DEFAULT_TRENDING));
        assert_eq!(parse("trending 5"), Command::Trending(5));
        assert_eq!(
            parse("rename 3 Late Night Mix"),
            Command::RenamePlaylist(PlaylistId::new(3), "Late Night Mix".into())
        );
        assert_eq!(
            parse("add 3 9"),
            Command::AddSong(PlaylistId::new(3), SongId::new(9))
        );
    }

    #[test]
    fn test_scopes() {
        assert_eq!(parse("use all"), Command::Use(ListScope::All));
        assert_eq!(
            parse("use playlist 4"),
            Command::Use(ListScope::Playlist(PlaylistId::new(4)))
        );
        assert_eq!(
            parse("use search blue"),
            Command::Use(ListScope::Search("blue".into()))
        );
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            Command::parse("play"),
            Err(CommandError::MissingArgument("song id"))
        );
        assert_eq!(
            Command::parse("play abc"),
            Err(CommandError::InvalidNumber("abc".into()))
        );
        assert_eq!(
            Command::parse("add 3"),
            Err(CommandError::MissingArgument("song id"))
        );
        assert!(matches!(
            Command::parse("dance"),
            Err(CommandError::Unknown(_))
        ));
        assert_eq!(
            Command::parse("new"),
            Err(CommandError::MissingArgument("playlist name"))
        );
    }
}
