//! Integration tests for the session controller

use chrono::{Duration, TimeZone, Utc};
use lyra_core::types::{SongId, SongRow, UserId, UserRow};
use lyra_core::{AuthUser, ManualClock, StaticAuth};
use lyra_library::Library;
use lyra_session::{Session, SessionEvent};
use lyra_store::MemoryStore;
use std::sync::Arc;

const USER: &str = "listener";

fn rows(n: i64) -> Vec<SongRow> {
    (1..=n)
        .map(|id| SongRow {
            file_id: Some(id),
            name: Some(format!("Track {id}")),
            artist: Some("Artist".to_string()),
            likes: Some(id),
            ..SongRow::default()
        })
        .collect()
}

struct Fixture {
    session: Session,
    store: Arc<MemoryStore>,
    clock: Arc<ManualClock>,
}

async fn fixture(songs: i64, last_song: Option<i64>) -> Fixture {
    let store = Arc::new(MemoryStore::with_songs(rows(songs)));
    store
        .insert_user(UserRow {
            id: Some(USER.to_string()),
            email: Some("listener@example.com".to_string()),
            last_song_file_id: last_song,
            ..UserRow::default()
        })
        .await;

    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 6, 1, 20, 0, 0).unwrap(),
    ));
    let auth = Arc::new(StaticAuth::signed_in(AuthUser::new(
        USER,
        "listener@example.com",
    )));
    let library = Library::new(store.clone(), auth, clock.clone());

    let mut session = Session::new(library);
    session.load().await.unwrap();
    session.drain_events();

    Fixture {
        session,
        store,
        clock,
    }
}

fn current_id(session: &Session) -> Option<i64> {
    session.current_song().map(|s| s.id.get())
}

// ===== Playback Control =====

#[tokio::test]
async fn test_play_sets_current_and_playing() {
    let mut f = fixture(3, None).await;

    f.session.play_song(SongId::new(2)).await.unwrap();

    assert_eq!(current_id(&f.session), Some(2));
    assert!(f.session.is_playing());
    assert_eq!(
        f.session.drain_events(),
        vec![
            SessionEvent::SongChanged {
                song_id: SongId::new(2),
                previous_song_id: None
            },
            SessionEvent::PlayStateChanged { is_playing: true },
        ]
    );
}

#[tokio::test]
async fn test_play_unknown_song() {
    let mut f = fixture(3, None).await;
    assert!(f.session.play_song(SongId::new(77)).await.is_err());
    assert!(f.session.current_song().is_none());
}

#[tokio::test]
async fn test_toggle_play_has_no_history_effect() {
    let mut f = fixture(3, None).await;
    f.session.play_song(SongId::new(1)).await.unwrap();
    let before = f.store.history().await;

    f.session.toggle_play();
    assert!(!f.session.is_playing());
    f.session.toggle_play();
    assert!(f.session.is_playing());

    assert_eq!(f.store.history().await, before);
}

#[tokio::test]
async fn test_next_and_previous_wrap() {
    let mut f = fixture(3, None).await;

    f.session.play_song(SongId::new(3)).await.unwrap();
    f.session.next().await;
    assert_eq!(current_id(&f.session), Some(1));

    f.session.previous().await;
    assert_eq!(current_id(&f.session), Some(3));
    f.session.previous().await;
    assert_eq!(current_id(&f.session), Some(2));
}

#[tokio::test]
async fn test_next_without_current_song_is_noop() {
    let mut f = fixture(3, None).await;

    f.session.next().await;
    f.session.previous().await;

    assert!(f.session.current_song().is_none());
    assert!(f.session.drain_events().is_empty());
}

#[tokio::test]
async fn test_navigation_with_empty_list_is_noop() {
    let mut f = fixture(3, None).await;
    f.session.play_song(SongId::new(1)).await.unwrap();
    f.session.set_active_list(Vec::new());

    f.session.next().await;
    assert_eq!(current_id(&f.session), Some(1));
}

#[tokio::test]
async fn test_current_song_outside_active_list() {
    let mut f = fixture(5, None).await;
    f.session.play_song(SongId::new(1)).await.unwrap();

    let subset: Vec<SongId> = f.session.library().songs()[2..]
        .iter()
        .map(|s| s.id)
        .collect();
    f.session.set_active_list(subset);
    f.session.next().await;
    assert_eq!(current_id(&f.session), Some(3));

    f.session.play_song(SongId::new(1)).await.unwrap();
    f.session.previous().await;
    assert_eq!(current_id(&f.session), Some(5));

    f.session.clear_active_list();
    f.session.next().await;
    assert_eq!(current_id(&f.session), Some(1));
}

#[tokio::test]
async fn test_active_list_plays_current_library_state() {
    let mut f = fixture(3, None).await;
    let library = f.session.library_mut();
    library.toggle_like(SongId::new(1)).await.unwrap();
    library.toggle_like(SongId::new(2)).await.unwrap();

    let liked: Vec<SongId> = f.session.library().liked_songs().iter().map(|s| s.id).collect();
    f.session.set_active_list(liked);
    f.session.play_song(SongId::new(1)).await.unwrap();

    // Unliked after the list was scoped
    f.session
        .library_mut()
        .toggle_like(SongId::new(2))
        .await
        .unwrap();
    f.session.next().await;

    let current = f.session.current_song().unwrap();
    let in_library = f.session.library().song(SongId::new(2)).unwrap();
    assert_eq!(current.id, SongId::new(2));
    assert!(!current.is_liked);
    assert_eq!(current.likes, in_library.likes);
    assert_eq!(current.likes, 2);
}

#[tokio::test]
async fn test_toggle_maximize_is_view_only() {
    let mut f = fixture(2, None).await;

    f.session.toggle_maximize();
    assert!(f.session.is_maximized());
    assert_eq!(
        f.session.drain_events(),
        vec![SessionEvent::ViewChanged { is_maximized: true }]
    );
    assert!(f.store.history().await.is_empty());
}

// ===== History =====

#[tokio::test]
async fn test_skipping_records_listening_time() {
    let mut f = fixture(3, None).await;

    f.session.play_song(SongId::new(1)).await.unwrap();
    f.clock.advance(Duration::minutes(3));
    f.session.next().await;

    let history = f.store.history().await;
    let first = history.iter().find(|e| e.song_id == SongId::new(1)).unwrap();
    assert_eq!(first.minutes_listened, 3.0);
    assert_eq!(
        f.store.last_song(&UserId::new(USER)).await,
        Some(SongId::new(2))
    );
}

#[tokio::test]
async fn test_close_flushes_history_then_clears() {
    let mut f = fixture(3, None).await;
    f.session.play_song(SongId::new(2)).await.unwrap();
    f.session.toggle_maximize();
    f.clock.advance(Duration::seconds(30));

    f.session.close().await;

    assert!(f.session.current_song().is_none());
    assert!(!f.session.is_playing());
    assert!(!f.session.is_maximized());
    assert_eq!(f.store.history().await[0].minutes_listened, 0.5);
    assert_eq!(f.session.drain_events().last(), Some(&SessionEvent::Closed));
}

#[tokio::test]
async fn test_history_failure_does_not_stop_playback() {
    let mut f = fixture(3, None).await;
    f.store.set_offline(true);

    f.session.play_song(SongId::new(1)).await.unwrap();

    assert!(f.session.is_playing());
    assert!(f
        .session
        .drain_events()
        .iter()
        .any(|e| matches!(e, SessionEvent::HistoryTrackingFailed { .. })));
}

#[tokio::test]
async fn test_failed_finalize_reports_the_previous_song() {
    let mut f = fixture(3, None).await;
    f.session.play_song(SongId::new(1)).await.unwrap();
    f.clock.advance(Duration::minutes(2));
    f.session.drain_events();

    // Only the write closing song 1 fails
    f.store.fail_next(1);
    f.session.next().await;

    let failures: Vec<SongId> = f
        .session
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            SessionEvent::HistoryTrackingFailed { song_id, .. } => Some(song_id),
            _ => None,
        })
        .collect();
    assert_eq!(failures, vec![SongId::new(1)]);
    assert_eq!(current_id(&f.session), Some(2));
}

// ===== Resume =====

#[tokio::test]
async fn test_load_resumes_last_played_paused() {
    let mut f = fixture(4, Some(3)).await;

    // fixture drained the load events; state is what matters here
    assert_eq!(current_id(&f.session), Some(3));
    assert!(!f.session.is_playing());
    assert!(f.store.history().await.is_empty());

    // Nothing more to adopt once a song is current
    assert!(!f.session.resume_last_played());
}

#[tokio::test]
async fn test_resume_emits_event() {
    let store = Arc::new(MemoryStore::with_songs(rows(2)));
    store
        .insert_user(UserRow {
            id: Some(USER.to_string()),
            last_song_file_id: Some(2),
            ..UserRow::default()
        })
        .await;
    let library = Library::new(
        store,
        Arc::new(StaticAuth::signed_in(AuthUser::new(USER, ""))),
        Arc::new(ManualClock::new(Utc::now())),
    );
    let mut session = Session::new(library);

    session.load().await.unwrap();

    assert_eq!(
        session.drain_events(),
        vec![SessionEvent::Resumed {
            song_id: SongId::new(2)
        }]
    );
}

// ===== Likes =====

#[tokio::test]
async fn test_toggle_like_current_refreshes_snapshot() {
    let mut f = fixture(3, None).await;
    f.session.play_song(SongId::new(2)).await.unwrap();

    let outcome = f.session.toggle_like_current().await.unwrap().unwrap();

    assert!(outcome.liked);
    let current = f.session.current_song().unwrap();
    assert!(current.is_liked);
    assert_eq!(current.likes, 3);
}

#[tokio::test]
async fn test_toggle_like_without_current_song() {
    let mut f = fixture(3, None).await;
    assert_eq!(f.session.toggle_like_current().await.unwrap(), None);
}
