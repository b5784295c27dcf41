//! Integration tests for the storage facade
//!
//! Remote calls go to a wiremock server; nothing here needs a live backend.

use dialstore::models::{get_path_name_id, Conversation, Message, Prompt};
use dialstore::storage::local::LocalStore;
use dialstore::{BackendOptions, DataService, StorageType, UploadEvent, UploadFile};
use futures::StreamExt;
use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn service_with(storage_type: StorageType, base_url: &str) -> DataService {
    DataService::new(
        LocalStore::open_in_memory().unwrap(),
        storage_type,
        BackendOptions::new(base_url),
    )
    .unwrap()
}

#[tokio::test]
async fn test_browser_storage_sidebar_flags() {
    let service = service_with(StorageType::BrowserStorage, "http://127.0.0.1:9");

    service.set_show_chatbar(false).await.unwrap();
    assert!(!service.get_show_chatbar().await);
    assert!(service.get_show_promptbar().await);
}

#[tokio::test]
async fn test_upload_through_facade_matches_listing_id() {
    let mock_server = MockServer::start().await;
    let created = json!({
        "path": "/docs/readme.txt",
        "name": "readme.txt",
        "contentLength": 120,
        "contentType": "text/plain"
    });

    Mock::given(method("POST"))
        .and(path("/api/files"))
        .and(query_param("path", "/docs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(created.clone()))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/files/listing"))
        .and(query_param("filter", "FILE"))
        .and(query_param("path", "/docs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([created])))
        .mount(&mock_server)
        .await;

    let service = service_with(StorageType::Api, &mock_server.uri());
    let upload = UploadFile::new("readme.txt", vec![b'a'; 120]).with_content_type("text/plain");

    let mut seen_result = false;
    let mut events = service.send_file(upload, Some("/docs"));
    let mut uploaded = None;
    while let Some(event) = events.next().await {
        match event.unwrap() {
            UploadEvent::Progress { percent } => {
                assert!(!seen_result, "progress after result");
                assert!((0.0..=100.0).contains(&percent));
            }
            UploadEvent::Result(file) => {
                assert!(!seen_result, "second result");
                seen_result = true;
                uploaded = Some(file);
            }
        }
    }

    let uploaded = uploaded.expect("upload produced a result");
    assert_eq!(uploaded.id, get_path_name_id("readme.txt", Some("/docs")));
    assert!(uploaded.server_synced);

    let listed = service.get_files(Some("/docs")).await.unwrap();
    assert_eq!(listed[0].id, uploaded.id);
}

#[tokio::test]
async fn test_browser_storage_uses_remote_file_api() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/files/listing"))
        .and(query_param("filter", "FOLDER"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "docs", "path": "/docs"}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = service_with(StorageType::BrowserStorage, &mock_server.uri());
    let folders = service.get_file_folders(None).await.unwrap();
    assert_eq!(folders.len(), 1);
    assert!(folders[0].server_synced);
}

#[tokio::test]
async fn test_backend_errors_are_not_translated() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/conversations"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&mock_server)
        .await;

    let service = service_with(StorageType::Api, &mock_server.uri());
    let err = service.get_conversations().await.unwrap_err();
    assert_eq!(err.status(), Some(503));
}

#[tokio::test]
async fn test_switching_backends_has_no_bleed() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("store.sqlite");

    let mut service = DataService::new(
        LocalStore::open(&db_path).unwrap(),
        StorageType::BrowserStorage,
        BackendOptions::new("http://127.0.0.1:9"),
    )
    .unwrap();

    let conv = Conversation::new("local-1", "Local chat", "gpt-4", "", 1.0);
    service.set_conversations(&[conv.clone()]).await.unwrap();
    service.set_recent_models_ids(&["gpt-4".to_string()]).await.unwrap();

    service.reinit(StorageType::ApiMock).unwrap();
    assert_eq!(service.backend_name(), "apiMock");
    assert!(service.get_conversations().await.unwrap().is_empty());

    let prompt = Prompt::new("p1", "Mock prompt", "text");
    service.set_prompts(&[prompt]).await.unwrap();

    // preferences stay in the local store whatever the backend
    assert_eq!(service.get_recent_models_ids().await, vec!["gpt-4".to_string()]);

    service.reinit(StorageType::BrowserStorage).unwrap();
    assert_eq!(service.get_conversations().await.unwrap(), vec![conv]);
    assert!(service.get_prompts().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_new_conversation_detection_survives_storage() {
    let service = service_with(StorageType::BrowserStorage, "http://127.0.0.1:9");

    let fresh = Conversation::new("c-new", "New chat", "gpt-4", "", 1.0);
    let mut started = Conversation::new("c-old", "Old chat", "gpt-4", "", 1.0);
    started.push_message(Message::user("hello")).unwrap();

    service.set_conversations(&[fresh, started]).await.unwrap();
    let loaded = service.get_conversations().await.unwrap();

    let new_ids: Vec<&str> = loaded
        .iter()
        .filter(|c| c.is_new())
        .map(|c| c.id.as_str())
        .collect();
    assert_eq!(new_ids, vec!["c-new"]);
}

#[tokio::test]
async fn test_every_preference_key_round_trips() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("prefs.sqlite");
    let ids = vec!["x".to_string(), "y".to_string()];

    {
        let service = DataService::new(
            LocalStore::open(&db_path).unwrap(),
            StorageType::BrowserStorage,
            BackendOptions::new("http://127.0.0.1:9"),
        )
        .unwrap();
        service.set_selected_conversations_ids(&ids).await.unwrap();
        service.set_recent_addons_ids(&ids).await.unwrap();
        service.set_opened_folder_ids(&ids).await.unwrap();
        service.set_show_promptbar(false).await.unwrap();
    }

    let service = DataService::new(
        LocalStore::open(&db_path).unwrap(),
        StorageType::ApiMock,
        BackendOptions::new("http://127.0.0.1:9"),
    )
    .unwrap();
    assert_eq!(service.get_selected_conversations_ids().await, ids);
    assert_eq!(service.get_recent_addons_ids().await, ids);
    assert_eq!(service.get_opened_folder_ids().await, ids);
    assert!(!service.get_show_promptbar().await);
    assert!(service.get_show_chatbar().await);
}
