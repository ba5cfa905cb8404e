// File: remote.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use async_trait::async_trait;
use log::{debug, info};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use thiserror::Error;

use crate::record::CaptureRecord;

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com";
pub const FOLDER_NAME: &str = "GeoPrint_Data";
pub const FILE_NAME: &str = "locations.json";
const FOLDER_MIME: &str = "application/vnd.google-apps.folder";
const JSON_MIME: &str = "application/json";

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Remote store used without an authenticated session")]
    NotAuthenticated,
    #[error("Remote request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Remote store answered {status} while trying to {action}")]
    Status { status: u16, action: &'static str },
    #[error("Invalid history document: {0}")]
    Document(#[from] serde_json::Error),
    #[error("Remote task did not finish: {0}")]
    Task(String),
}

/// A remote mirror of the whole history document.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// `Ok(vec![])` when no history has been published yet.
    async fn pull(&self) -> Result<Vec<CaptureRecord>, RemoteError>;

    /// Replaces the remote document with `records`.
    async fn push(&self, records: &[CaptureRecord]) -> Result<(), RemoteError>;

    async fn clear(&self) -> Result<(), RemoteError>;
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<FileEntry>,
}

#[derive(Debug, Deserialize)]
struct FileEntry {
    id: String,
}

/// Drive v3 style document store: one named folder holding one JSON file.
/// Folder and file are looked up by name before they are created, so repeated
/// calls never produce duplicates.
#[derive(Debug, Clone)]
pub struct DriveRemote {
    client: Client,
    api_base: String,
    access_token: Option<String>,
    folder_name: String,
    file_name: String,
}

impl DriveRemote {
    pub fn new(access_token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            access_token,
            folder_name: FOLDER_NAME.to_string(),
            file_name: FILE_NAME.to_string(),
        }
    }

    pub fn with_base_url(mut self, base: &str) -> Self {
        self.api_base = base.trim_end_matches('/').to_string();
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    fn token(&self) -> Result<&str, RemoteError> {
        self.access_token
            .as_deref()
            .filter(|token| !token.is_empty())
            .ok_or(RemoteError::NotAuthenticated)
    }

    fn request(&self, method: Method, path: &str, token: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.api_base, path))
            .bearer_auth(token)
    }

    fn check(response: Response, action: &'static str) -> Result<Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(RemoteError::Status {
                status: status.as_u16(),
                action,
            })
        }
    }

    async fn find_one(&self, token: &str, query: String, action: &'static str) -> Result<Option<String>, RemoteError> {
        let response = self
            .request(Method::GET, "/drive/v3/files", token)
            .query(&[
                ("q", query.as_str()),
                ("spaces", "drive"),
                ("fields", "files(id, name)"),
            ])
            .send()
            .await?;
        let listing: FileList = Self::check(response, action)?.json().await?;
        Ok(listing.files.into_iter().next().map(|entry| entry.id))
    }

    async fn folder_id(&self, token: &str) -> Result<String, RemoteError> {
        let query = format!(
            "name='{}' and mimeType='{}' and trashed=false",
            self.folder_name, FOLDER_MIME
        );
        if let Some(id) = self.find_one(token, query, "look up the data folder").await? {
            return Ok(id);
        }

        debug!("Creating remote folder {}", self.folder_name);
        let response = self
            .request(Method::POST, "/drive/v3/files", token)
            .query(&[("fields", "id")])
            .json(&serde_json::json!({
                "name": self.folder_name,
                "mimeType": FOLDER_MIME,
            }))
            .send()
            .await?;
        let created: FileEntry = Self::check(response, "create the data folder")?.json().await?;
        Ok(created.id)
    }

    async fn file_id(&self, token: &str, folder_id: &str) -> Result<Option<String>, RemoteError> {
        let query = format!(
            "name='{}' and '{}' in parents and trashed=false",
            self.file_name, folder_id
        );
        self.find_one(token, query, "look up the history file").await
    }

    fn upload_form(&self, folder_id: Option<&str>, content: String) -> Result<Form, RemoteError> {
        let mut metadata = serde_json::json!({
            "name": self.file_name,
            "mimeType": JSON_MIME,
        });
        // Parents can only be set on creation.
        if let Some(folder_id) = folder_id {
            metadata["parents"] = serde_json::json!([folder_id]);
        }

        let metadata_part = Part::text(metadata.to_string()).mime_str(JSON_MIME)?;
        let file_part = Part::text(content)
            .file_name(self.file_name.clone())
            .mime_str(JSON_MIME)?;
        Ok(Form::new()
            .part("metadata", metadata_part)
            .part("file", file_part))
    }
}

#[async_trait]
impl RemoteStore for DriveRemote {
    async fn pull(&self) -> Result<Vec<CaptureRecord>, RemoteError> {
        let token = self.token()?;
        let folder_id = self.folder_id(token).await?;
        let Some(file_id) = self.file_id(token, &folder_id).await? else {
            return Ok(Vec::new());
        };

        let response = self
            .request(Method::GET, &format!("/drive/v3/files/{}", file_id), token)
            .query(&[("alt", "media")])
            .send()
            .await?;
        let body = Self::check(response, "download the history file")?.text().await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn push(&self, records: &[CaptureRecord]) -> Result<(), RemoteError> {
        let token = self.token()?;
        let folder_id = self.folder_id(token).await?;
        let file_id = self.file_id(token, &folder_id).await?;
        let content = serde_json::to_string_pretty(records)?;

        let request = match &file_id {
            Some(id) => self
                .request(
                    Method::PATCH,
                    &format!("/upload/drive/v3/files/{}", id),
                    token,
                )
                .multipart(self.upload_form(None, content)?),
            None => self
                .request(Method::POST, "/upload/drive/v3/files", token)
                .multipart(self.upload_form(Some(&folder_id), content)?),
        };
        let response = request.query(&[("uploadType", "multipart")]).send().await?;
        Self::check(response, "upload the history file")?;

        info!("Published {} captures to the remote store", records.len());
        Ok(())
    }

    async fn clear(&self) -> Result<(), RemoteError> {
        let token = self.token()?;
        let folder_id = self.folder_id(token).await?;
        if let Some(file_id) = self.file_id(token, &folder_id).await? {
            let response = self
                .request(Method::DELETE, &format!("/drive/v3/files/{}", file_id), token)
                .send()
                .await?;
            Self::check(response, "delete the history file")?;
            info!("Remote history cleared");
        }
        Ok(())
    }
}
