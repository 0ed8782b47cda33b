//! Tests for the REST data store against a mock backend.

use chrono::{NaiveDate, NaiveTime};
use lyra_core::types::{ListeningHistoryEntry, PlaylistId, SongId, UserId};
use lyra_core::{DataStore, LyraError};
use lyra_store::{BackendClient, BackendConfig, RestStore};
use serde_json::json;
use wiremock::matchers::{body_json, header, headers, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ANON_KEY: &str = "anon-test-key";

fn store_for(server: &MockServer) -> RestStore {
    let client = BackendClient::new(BackendConfig::new(server.uri(), ANON_KEY)).unwrap();
    RestStore::new(client)
}

// =============================================================================
// Songs
// =============================================================================

mod songs {
    use super::*;

    #[tokio::test]
    async fn test_list_songs_sends_api_key_and_order() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/songs"))
            .and(query_param("select", "*"))
            .and(query_param("order", "file_id.asc"))
            .and(header("apikey", ANON_KEY))
            .and(header("authorization", format!("Bearer {ANON_KEY}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"file_id": 1, "img_id": 10, "name": "Blue Hour", "artist": "Nadia",
                 "language": "en", "tags": ["ambient"], "views": 120, "likes": 4},
                {"file_id": 2, "name": "Untitled"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let rows = store_for(&server).list_songs().await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].file_id, Some(1));
        assert_eq!(rows[0].tags.as_deref(), Some(&["ambient".to_string()][..]));
        assert_eq!(rows[1].artist, None);
    }

    #[tokio::test]
    async fn test_adjust_likes_reads_then_writes() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/songs"))
            .and(query_param("select", "likes"))
            .and(query_param("file_id", "eq.7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"likes": 2}])))
            .mount(&server)
            .await;

        Mock::given(method("PATCH"))
            .and(path("/rest/v1/songs"))
            .and(query_param("file_id", "eq.7"))
            .and(body_json(json!({"likes": 3})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let likes = store_for(&server)
            .adjust_song_likes(SongId::new(7), 1)
            .await
            .unwrap();
        assert_eq!(likes, 3);
    }

    #[tokio::test]
    async fn test_adjust_likes_never_goes_negative() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/songs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"likes": 0}])))
            .mount(&server)
            .await;

        Mock::given(method("PATCH"))
            .and(path("/rest/v1/songs"))
            .and(body_json(json!({"likes": 0})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let likes = store_for(&server)
            .adjust_song_likes(SongId::new(7), -1)
            .await
            .unwrap();
        assert_eq!(likes, 0);
    }

    #[tokio::test]
    async fn test_adjust_likes_unknown_song() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/songs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let err = store_for(&server)
            .adjust_song_likes(SongId::new(99), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, LyraError::NotFound { .. }));
    }
}

// =============================================================================
// Playlists
// =============================================================================

mod playlists {
    use super::*;

    #[tokio::test]
    async fn test_create_playlist_returns_row() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/playlists"))
            .and(header("prefer", "return=representation"))
            .and(body_json(json!({"user_id": "u1", "name": "Road Trip"})))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!([{"id": 5, "user_id": "u1", "name": "Road Trip"}])),
            )
            .mount(&server)
            .await;

        let row = store_for(&server)
            .create_playlist(&UserId::new("u1"), "Road Trip")
            .await
            .unwrap();
        assert_eq!(row.id, Some(5));
        assert_eq!(row.name.as_deref(), Some("Road Trip"));
    }

    #[tokio::test]
    async fn test_list_playlist_songs_uses_in_filter() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/playlist_songs"))
            .and(query_param("playlist_id", "in.(1,2)"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"playlist_id": 1, "song_id": 10},
                {"playlist_id": 2, "song_id": 11}
            ])))
            .mount(&server)
            .await;

        let rows = store_for(&server)
            .list_playlist_songs(&[PlaylistId::new(1), PlaylistId::new(2)])
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].song_id, SongId::new(11));
    }

    #[tokio::test]
    async fn test_list_playlist_songs_empty_input_skips_request() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let rows = store_for(&server).list_playlist_songs(&[]).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_delete_playlist_removes_members_first() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/rest/v1/playlist_songs"))
            .and(query_param("playlist_id", "eq.3"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/rest/v1/playlists"))
            .and(query_param("id", "eq.3"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        store_for(&server)
            .delete_playlist(PlaylistId::new(3))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_member_is_conflict() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/playlist_songs"))
            .respond_with(ResponseTemplate::new(409).set_body_string("duplicate key"))
            .mount(&server)
            .await;

        let err = store_for(&server)
            .add_playlist_song(PlaylistId::new(1), SongId::new(2))
            .await
            .unwrap_err();
        assert!(matches!(err, LyraError::Conflict(_)));
    }
}

// =============================================================================
// Likes
// =============================================================================

mod likes {
    use super::*;

    #[tokio::test]
    async fn test_add_like_tolerates_existing_row() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/likes"))
            .and(body_json(json!({"user_id": "u1", "song_id": 4})))
            .respond_with(ResponseTemplate::new(409))
            .mount(&server)
            .await;

        store_for(&server)
            .add_like(&UserId::new("u1"), SongId::new(4))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_list_likes() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/likes"))
            .and(query_param("user_id", "eq.u1"))
            .and(query_param("select", "song_id"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"song_id": 4}, {"song_id": 9}])),
            )
            .mount(&server)
            .await;

        let liked = store_for(&server)
            .list_likes(&UserId::new("u1"))
            .await
            .unwrap();
        assert_eq!(liked, vec![SongId::new(4), SongId::new(9)]);
    }
}

// =============================================================================
// Listening History
// =============================================================================

mod history {
    use super::*;

    fn entry() -> ListeningHistoryEntry {
        ListeningHistoryEntry {
            id: None,
            user_id: UserId::new("u1"),
            song_id: SongId::new(3),
            last_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            last_time: NaiveTime::from_hms_opt(10, 15, 0).unwrap(),
            minutes_listened: 2.5,
        }
    }

    #[tokio::test]
    async fn test_find_history_filters_by_day() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/listening_history"))
            .and(query_param("user_id", "eq.u1"))
            .and(query_param("song_id", "eq.3"))
            .and(query_param("last_date", "eq.2024-05-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": 8, "user_id": "u1", "song_id": 3,
                "last_date": "2024-05-01", "last_time": "10:15:00",
                "minutes_listened": 2.5
            }])))
            .mount(&server)
            .await;

        let found = store_for(&server)
            .find_history(
                &UserId::new("u1"),
                SongId::new(3),
                NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.minutes_listened, 2.5);
        assert!(found.id.is_some());
    }

    #[tokio::test]
    async fn test_save_history_upserts() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/listening_history"))
            .and(query_param("on_conflict", "user_id,song_id,last_date"))
            .and(headers(
                "prefer",
                vec!["resolution=merge-duplicates", "return=representation"],
            ))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
                "id": 8, "user_id": "u1", "song_id": 3,
                "last_date": "2024-05-01", "last_time": "10:15:00",
                "minutes_listened": 2.5
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let saved = store_for(&server).save_history(&entry()).await.unwrap();
        assert_eq!(saved.song_id, SongId::new(3));
        assert!(saved.id.is_some());
    }
}

// =============================================================================
// Error Mapping
// =============================================================================

mod errors {
    use super::*;

    #[tokio::test]
    async fn test_unauthorized_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = store_for(&server).list_songs().await.unwrap_err();
        assert_eq!(err, LyraError::Unauthenticated);
    }

    #[tokio::test]
    async fn test_row_level_security_denial() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(403).set_body_string("permission denied"))
            .mount(&server)
            .await;

        let err = store_for(&server)
            .rename_playlist(PlaylistId::new(1), "Mine now")
            .await
            .unwrap_err();
        assert!(matches!(err, LyraError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = store_for(&server).list_songs().await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_garbage_body_is_malformed() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = store_for(&server).list_songs().await.unwrap_err();
        assert!(matches!(err, LyraError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transient() {
        // Nothing listens on port 9 in the test environment
        let client =
            BackendClient::new(BackendConfig::new("http://127.0.0.1:9", ANON_KEY)).unwrap();
        let err = RestStore::new(client).list_songs().await.unwrap_err();
        assert!(err.is_transient());
    }
}
