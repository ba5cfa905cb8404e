// File: kv.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use sled::{Config, Db, Tree};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use super::errors::{StorageError, StorageResult};

/// String key/value storage with the semantics of browser web storage:
/// whole values are replaced on write and a write may be refused once the
/// backend's quota is reached.
pub trait WebStorage: Send + Sync {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;
    fn remove_item(&self, key: &str) -> StorageResult<()>;
}

fn check_quota(key: &str, used_by_others: u64, value: &str, quota: Option<u64>) -> StorageResult<()> {
    let Some(quota) = quota else {
        return Ok(());
    };
    let requested = used_by_others + key.len() as u64 + value.len() as u64;
    if requested > quota {
        return Err(StorageError::QuotaExceeded {
            key: key.to_string(),
            requested,
            quota,
        });
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
    quota: Option<u64>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: u64) -> Self {
        Self {
            items: Mutex::new(HashMap::new()),
            quota: Some(quota_bytes),
        }
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.items
            .lock()
            .map_err(|_| StorageError::Database("memory storage lock poisoned".to_string()))
    }

    pub fn used_bytes(&self) -> StorageResult<u64> {
        Ok(self
            .lock()?
            .iter()
            .map(|(k, v)| (k.len() + v.len()) as u64)
            .sum())
    }
}

impl WebStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut items = self.lock()?;
        let used_by_others: u64 = items
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| (k.len() + v.len()) as u64)
            .sum();
        check_quota(key, used_by_others, value, self.quota)?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

pub fn open_database<P: AsRef<Path>>(path: P) -> StorageResult<Db> {
    std::fs::create_dir_all(path.as_ref())?;
    let db = Config::default()
        .path(path.as_ref())
        .compression_factor(9)
        .open()?;
    Ok(db)
}

/// Web storage persisted in one `sled` tree.
#[derive(Debug, Clone)]
pub struct SledStorage {
    tree: Tree,
    quota: Option<u64>,
}

impl SledStorage {
    pub fn open_tree(db: &Db, name: &str, quota: Option<u64>) -> StorageResult<Self> {
        let tree = db.open_tree(name.as_bytes())?;
        Ok(Self { tree, quota })
    }

    pub fn used_bytes(&self) -> StorageResult<u64> {
        let mut total = 0u64;
        for entry in self.tree.iter() {
            let (key, value) = entry?;
            total += (key.len() + value.len()) as u64;
        }
        Ok(total)
    }
}

impl WebStorage for SledStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        match self.tree.get(key.as_bytes())? {
            Some(raw) => {
                let value = String::from_utf8(raw.to_vec())
                    .map_err(|e| StorageError::Database(format!("Invalid UTF-8 under '{}': {}", key, e)))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        if self.quota.is_some() {
            let existing = self
                .tree
                .get(key.as_bytes())?
                .map_or(0, |v| (key.len() + v.len()) as u64);
            let used_by_others = self.used_bytes()?.saturating_sub(existing);
            check_quota(key, used_by_others, value, self.quota)?;
        }
        self.tree.insert(key.as_bytes(), value.as_bytes())?;
        self.tree.flush()?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.tree.remove(key.as_bytes())?;
        self.tree.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get_item("k").unwrap(), None);
        storage.set_item("k", "v1").unwrap();
        storage.set_item("k", "v2").unwrap();
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("v2"));
        storage.remove_item("k").unwrap();
        assert_eq!(storage.get_item("k").unwrap(), None);
    }

    #[test]
    fn test_memory_quota_counts_replacement_not_accumulation() {
        let storage = MemoryStorage::with_quota(10);
        storage.set_item("k", "123456789").unwrap();
        storage.set_item("k", "abcdefghi").unwrap();
        let err = storage.set_item("k", "0123456789").unwrap_err();
        assert!(err.is_quota());
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("abcdefghi"));
        assert_eq!(storage.used_bytes().unwrap(), 10);
    }

    #[test]
    fn test_sled_trees_are_isolated() {
        let temp_dir = TempDir::new().unwrap();
        let db = open_database(temp_dir.path()).unwrap();
        let local = SledStorage::open_tree(&db, "local", None).unwrap();
        let session = SledStorage::open_tree(&db, "session", None).unwrap();

        local.set_item("history", "[]").unwrap();
        assert_eq!(local.get_item("history").unwrap().as_deref(), Some("[]"));
        assert_eq!(session.get_item("history").unwrap(), None);

        local.remove_item("history").unwrap();
        assert_eq!(local.get_item("history").unwrap(), None);
    }

    #[test]
    fn test_sled_storage_quota() {
        let temp_dir = TempDir::new().unwrap();
        let db = open_database(temp_dir.path()).unwrap();
        let storage = SledStorage::open_tree(&db, "local", Some(16)).unwrap();
        storage.set_item("a", "0123456789").unwrap();
        assert!(storage.set_item("b", "0123456789").unwrap_err().is_quota());
        storage.set_item("a", "01234567890123").unwrap();
        assert_eq!(storage.used_bytes().unwrap(), 15);
    }
}
