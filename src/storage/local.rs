// File: local.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use log::error;
use std::sync::Arc;

use super::errors::StorageResult;
use super::kv::WebStorage;
use crate::record::CaptureRecord;

pub const HISTORY_KEY: &str = "geoprint_locations";
const REMOTE_STALE_SUFFIX: &str = "_remote_stale";

/// The history array as one serialized value in web storage.
pub struct LocalHistory {
    storage: Arc<dyn WebStorage>,
    key: String,
}

impl LocalHistory {
    pub fn new(storage: Arc<dyn WebStorage>) -> Self {
        Self::with_key(storage, HISTORY_KEY)
    }

    pub fn with_key(storage: Arc<dyn WebStorage>, key: &str) -> Self {
        Self {
            storage,
            key: key.to_string(),
        }
    }

    /// An unreadable document is reported and treated as an empty history;
    /// the next successful write replaces it.
    pub fn load(&self) -> StorageResult<Vec<CaptureRecord>> {
        let Some(raw) = self.storage.get_item(&self.key)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(records) => Ok(records),
            Err(e) => {
                error!("Failed to load cached history: {}", e);
                Ok(Vec::new())
            }
        }
    }

    pub fn store(&self, records: &[CaptureRecord]) -> StorageResult<()> {
        let raw = serde_json::to_string(records)?;
        self.storage.set_item(&self.key, &raw)
    }

    pub fn clear(&self) -> StorageResult<()> {
        self.storage.remove_item(&self.key)
    }

    /// Size in bytes of the serialized snapshot as stored.
    pub fn footprint(&self) -> StorageResult<u64> {
        Ok(self
            .storage
            .get_item(&self.key)?
            .map_or(0, |raw| raw.len() as u64))
    }

    pub fn remote_stale(&self) -> bool {
        matches!(
            self.storage.get_item(&self.stale_key()),
            Ok(Some(ref flag)) if flag == "1"
        )
    }

    pub fn set_remote_stale(&self, stale: bool) -> StorageResult<()> {
        if stale {
            self.storage.set_item(&self.stale_key(), "1")
        } else {
            self.storage.remove_item(&self.stale_key())
        }
    }

    fn stale_key(&self) -> String {
        format!("{}{}", self.key, REMOTE_STALE_SUFFIX)
    }
}
