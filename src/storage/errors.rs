// File: errors.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Quota exceeded writing '{key}': {requested} bytes needed, quota is {quota} bytes")]
    QuotaExceeded {
        key: String,
        requested: u64,
        quota: u64,
    },
    #[error("Storage quota exceeded. Please clear old data.")]
    CapacityExceeded,
    #[error("Capture {0} is already stored")]
    DuplicateId(String),
}

impl StorageError {
    pub fn is_quota(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. } | Self::CapacityExceeded)
    }
}

impl From<sled::Error> for StorageError {
    fn from(error: sled::Error) -> Self {
        Self::Database(error.to_string())
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
