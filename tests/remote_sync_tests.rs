// File: remote_sync_tests.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

mod common;

use common::*;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, ResponseTemplate};

use geoprint::storage::{HistoryStore, LocalHistory, MemoryStorage, RemoteError, RemoteStore};
use geoprint::RemoteLeg;

#[tokio::test]
async fn test_pull_without_history_file_is_empty() {
    let server = setup_mock_server().await;
    mount_existing_folder(&server).await;
    mount_file_lookup(&server, false).await;

    let remote = drive_remote(&server);
    let records = remote.pull().await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_pull_downloads_history_document() {
    let server = setup_mock_server().await;
    mount_existing_folder(&server).await;
    mount_file_lookup(&server, true).await;
    let published = vec![sample_record("b", "s1", 20), sample_record("a", "s1", 10)];
    mount_download(&server, &published).await;

    let remote = drive_remote(&server);
    let records = remote.pull().await.unwrap();
    assert_eq!(records, published);
}

#[tokio::test]
async fn test_missing_folder_is_created_once() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .and(folder_query())
        .respond_with(create_json_response(json!({ "files": [] })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/drive/v3/files"))
        .and(body_string_contains("GeoPrint_Data"))
        .respond_with(create_json_response(json!({ "id": FOLDER_ID })))
        .expect(1)
        .mount(&server)
        .await;
    mount_file_lookup(&server, false).await;

    let remote = drive_remote(&server);
    assert!(remote.pull().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_push_creates_file_inside_folder() {
    let server = setup_mock_server().await;
    mount_existing_folder(&server).await;
    mount_file_lookup(&server, false).await;
    Mock::given(method("POST"))
        .and(path("/upload/drive/v3/files"))
        .and(QueryContains("uploadType", "multipart".to_string()))
        .and(body_string_contains("parents"))
        .and(body_string_contains(FOLDER_ID))
        .respond_with(create_json_response(json!({ "id": FILE_ID })))
        .expect(1)
        .mount(&server)
        .await;

    let remote = drive_remote(&server);
    remote.push(&[sample_record("a", "s1", 0)]).await.unwrap();
}

#[tokio::test]
async fn test_push_updates_existing_file() {
    let server = setup_mock_server().await;
    mount_existing_folder(&server).await;
    mount_file_lookup(&server, true).await;
    Mock::given(method("PATCH"))
        .and(path(format!("/upload/drive/v3/files/{}", FILE_ID)))
        .and(body_string_contains("\"id\": \"a\""))
        .respond_with(create_json_response(json!({ "id": FILE_ID })))
        .expect(1)
        .mount(&server)
        .await;

    let remote = drive_remote(&server);
    remote.push(&[sample_record("a", "s1", 0)]).await.unwrap();
}

#[tokio::test]
async fn test_clear_deletes_history_file() {
    let server = setup_mock_server().await;
    mount_existing_folder(&server).await;
    mount_file_lookup(&server, true).await;
    Mock::given(method("DELETE"))
        .and(path(format!("/drive/v3/files/{}", FILE_ID)))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let remote = drive_remote(&server);
    remote.clear().await.unwrap();
}

#[tokio::test]
async fn test_server_error_is_reported_with_status() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let remote = drive_remote(&server);
    match remote.pull().await {
        Err(RemoteError::Status { status, .. }) => assert_eq!(status, 500),
        other => panic!("expected a status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_save_with_reachable_remote_is_synced() {
    let server = setup_mock_server().await;
    mount_existing_folder(&server).await;
    mount_file_lookup(&server, true).await;
    mount_upload(&server, None).await;

    let remote: Arc<dyn RemoteStore> = Arc::new(drive_remote(&server));
    let store = store_with_remote(remote, Duration::from_secs(5));

    let outcome = store.save(sample_record("a", "s1", 0)).await.unwrap();
    assert_eq!(outcome.remote, RemoteLeg::Synced);
    assert_eq!(outcome.retained, 1);
    assert_eq!(store.snapshot().unwrap().len(), 1);
}

#[tokio::test]
async fn test_failing_remote_keeps_local_history() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let remote: Arc<dyn RemoteStore> = Arc::new(drive_remote(&server));
    let store = store_with_remote(remote, Duration::from_secs(5));

    let outcome = store.save(sample_record("a", "s1", 0)).await.unwrap();
    assert!(matches!(outcome.remote, RemoteLeg::Failed(_)));

    let listed = store.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, "a");
}

#[tokio::test]
async fn test_empty_remote_does_not_wipe_local_history() {
    let storage = Arc::new(MemoryStorage::new());
    let offline = HistoryStore::new(LocalHistory::new(storage.clone()));
    offline.save(sample_record("a", "s1", 0)).await.unwrap();
    offline.save(sample_record("b", "s1", 10)).await.unwrap();

    let server = setup_mock_server().await;
    mount_existing_folder(&server).await;
    mount_file_lookup(&server, false).await;

    let online = HistoryStore::new(LocalHistory::new(storage))
        .with_remote(Arc::new(drive_remote(&server)));
    let listed = online.list().await.unwrap();
    let ids: Vec<&str> = listed.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a"]);
}

#[tokio::test]
async fn test_remote_history_replaces_local_cache() {
    let storage = Arc::new(MemoryStorage::new());
    let offline = HistoryStore::new(LocalHistory::new(storage.clone()));
    offline.save(sample_record("local-only", "s1", 0)).await.unwrap();

    let server = setup_mock_server().await;
    mount_existing_folder(&server).await;
    mount_file_lookup(&server, true).await;
    let published = vec![sample_record("r2", "s2", 30), sample_record("r1", "s2", 20)];
    mount_download(&server, &published).await;

    let online = HistoryStore::new(LocalHistory::new(storage.clone()))
        .with_remote(Arc::new(drive_remote(&server)));
    assert_eq!(online.list().await.unwrap(), published);

    // The refreshed cache is what an offline reader sees afterwards.
    let reread = HistoryStore::new(LocalHistory::new(storage));
    assert_eq!(reread.snapshot().unwrap(), published);
}

#[tokio::test]
async fn test_slow_remote_leaves_write_pending() {
    let server = setup_mock_server().await;
    mount_existing_folder(&server).await;
    mount_file_lookup(&server, true).await;
    mount_upload(&server, Some(Duration::from_secs(2))).await;

    let remote: Arc<dyn RemoteStore> = Arc::new(drive_remote(&server));
    let store = store_with_remote(remote, Duration::from_millis(100));

    let outcome = store.save(sample_record("a", "s1", 0)).await.unwrap();
    assert_eq!(outcome.remote, RemoteLeg::Pending);
    assert_eq!(store.snapshot().unwrap().len(), 1);
}
