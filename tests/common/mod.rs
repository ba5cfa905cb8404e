// File: common/mod.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

use geoprint::storage::{DriveRemote, HistoryStore, LocalHistory, MemoryStorage, RemoteStore};
use geoprint::{CaptureRecord, DeviceFingerprint, GeoPosition, PermissionStatus};

pub const TOKEN: &str = "test-token";
pub const FOLDER_ID: &str = "folder-1";
pub const FILE_ID: &str = "file-1";

/// Matches when query parameter `key` contains `needle` after decoding.
pub struct QueryContains(pub &'static str, pub String);

impl Match for QueryContains {
    fn matches(&self, request: &Request) -> bool {
        request
            .url
            .query_pairs()
            .any(|(key, value)| key == self.0 && value.contains(self.1.as_str()))
    }
}

pub fn folder_query() -> QueryContains {
    QueryContains("q", "mimeType='application/vnd.google-apps.folder'".to_string())
}

pub fn file_query(folder_id: &str) -> QueryContains {
    QueryContains("q", format!("'{}' in parents", folder_id))
}

pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

pub fn create_json_response(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(data.to_string())
        .append_header("content-type", "application/json")
}

pub fn drive_remote(server: &MockServer) -> DriveRemote {
    DriveRemote::new(Some(TOKEN.to_string())).with_base_url(&server.uri())
}

pub async fn mount_existing_folder(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .and(header("authorization", format!("Bearer {}", TOKEN).as_str()))
        .and(folder_query())
        .respond_with(create_json_response(json!({
            "files": [{ "id": FOLDER_ID, "name": "GeoPrint_Data" }]
        })))
        .mount(server)
        .await;
}

pub async fn mount_file_lookup(server: &MockServer, exists: bool) {
    let files = if exists {
        json!({ "files": [{ "id": FILE_ID, "name": "locations.json" }] })
    } else {
        json!({ "files": [] })
    };
    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .and(file_query(FOLDER_ID))
        .respond_with(create_json_response(files))
        .mount(server)
        .await;
}

pub async fn mount_download(server: &MockServer, records: &[CaptureRecord]) {
    Mock::given(method("GET"))
        .and(path(format!("/drive/v3/files/{}", FILE_ID)))
        .and(QueryContains("alt", "media".to_string()))
        .respond_with(create_json_response(json!(records)))
        .mount(server)
        .await;
}

pub async fn mount_upload(server: &MockServer, delay: Option<Duration>) {
    let mut response = create_json_response(json!({ "id": FILE_ID }));
    if let Some(delay) = delay {
        response = response.set_delay(delay);
    }
    Mock::given(method("PATCH"))
        .and(path(format!("/upload/drive/v3/files/{}", FILE_ID)))
        .and(QueryContains("uploadType", "multipart".to_string()))
        .respond_with(response)
        .mount(server)
        .await;
}

pub fn sample_record(id: &str, session_id: &str, seconds: i64) -> CaptureRecord {
    CaptureRecord {
        id: id.to_string(),
        session_id: session_id.to_string(),
        timestamp: Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap(),
        position: GeoPosition::new(51.5074, -0.1278, 20.0),
        device: DeviceFingerprint {
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15".to_string(),
            browser_name: "Safari".to_string(),
            browser_version: "17.1".to_string(),
            os_name: "Mac OS".to_string(),
            os_version: "10.15.7".to_string(),
            ..DeviceFingerprint::default()
        },
        permission_status: PermissionStatus::Granted,
    }
}

pub fn store_with_remote(remote: Arc<dyn RemoteStore>, remote_timeout: Duration) -> HistoryStore {
    HistoryStore::new(LocalHistory::new(Arc::new(MemoryStorage::new())))
        .with_remote(remote)
        .with_remote_timeout(remote_timeout)
}

pub fn environment_json() -> String {
    json!({
        "permission": "granted",
        "position": { "latitude": 35.6762, "longitude": 139.6503, "accuracy": 8.5, "altitude": 40.0 },
        "battery": { "level": 0.5, "charging": false },
        "connection": { "effectiveType": "wifi", "downlink": 0 },
        "canvas": { "gpu": "Adreno 740", "driver": "Vulkan", "fonts": ["Roboto"] },
        "webgl": { "vendor": "Qualcomm", "renderer": "" },
        "navigator": {
            "userAgent": "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.6167.101 Mobile Safari/537.36",
            "platform": "Linux armv81",
            "language": "ja-JP",
            "timezone": "Asia/Tokyo",
            "timezoneOffset": -540,
            "hardwareConcurrency": 8,
            "maxTouchPoints": 5,
            "cookieEnabled": true,
            "online": true
        },
        "display": {
            "screenWidth": 412, "screenHeight": 915, "availWidth": 412, "availHeight": 915,
            "innerWidth": 412, "innerHeight": 800, "pixelRatio": 2.625, "colorDepth": 24,
            "orientation": "portrait-primary"
        },
        "page": { "referrer": "", "currentUrl": "https://geo.example/track?id=abcd1234" },
        "localStorage": {},
        "sessionStorage": { "geoprint_session": "session-from-browser" },
        "indexedDb": true
    })
    .to_string()
}
