// File: session.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use log::{debug, warn};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::probes::{CapabilityProvider, StorageKind};
use crate::storage::WebStorage;

pub const SESSION_KEY: &str = "geoprint_session";

/// Identifier shared by every capture taken in one browser session.
///
/// Backed by session storage when it is available. Without it the id only
/// lives as long as this value, which still keeps it stable across captures.
pub struct SessionIdentity {
    storage: Option<Arc<dyn WebStorage>>,
    fallback: Mutex<Option<String>>,
}

impl SessionIdentity {
    pub fn new(storage: Option<Arc<dyn WebStorage>>) -> Self {
        Self {
            storage,
            fallback: Mutex::new(None),
        }
    }

    pub fn from_provider(provider: &dyn CapabilityProvider) -> Self {
        match provider.web_storage(StorageKind::Session) {
            Ok(storage) => Self::new(storage),
            Err(e) => {
                debug!("Session storage not reachable: {}", e);
                Self::new(None)
            }
        }
    }

    pub fn get_or_create(&self) -> String {
        if let Some(storage) = &self.storage {
            match storage.get_item(SESSION_KEY) {
                Ok(Some(id)) if !id.is_empty() => return id,
                Ok(_) => {
                    let id = self.fallback_id();
                    if let Err(e) = storage.set_item(SESSION_KEY, &id) {
                        warn!("Failed to persist session id: {}", e);
                    }
                    return id;
                }
                Err(e) => warn!("Failed to read session id: {}", e),
            }
        }
        self.fallback_id()
    }

    fn fallback_id(&self) -> String {
        let mut guard = match self.fallback.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard
            .get_or_insert_with(|| Uuid::new_v4().to_string())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probes::tests::FakeProvider;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_reuses_stored_id() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item(SESSION_KEY, "existing-session").unwrap();
        let identity = SessionIdentity::new(Some(storage));
        assert_eq!(identity.get_or_create(), "existing-session");
    }

    #[test]
    fn test_creates_and_persists_id_once() {
        let storage = Arc::new(MemoryStorage::new());
        let identity = SessionIdentity::new(Some(storage.clone()));

        let first = identity.get_or_create();
        assert!(Uuid::parse_str(&first).is_ok());
        assert_eq!(identity.get_or_create(), first);
        assert_eq!(storage.get_item(SESSION_KEY).unwrap(), Some(first.clone()));

        // A second identity over the same session sees the same id.
        assert_eq!(SessionIdentity::new(Some(storage)).get_or_create(), first);
    }

    #[test]
    fn test_without_session_storage_id_is_stable() {
        let identity = SessionIdentity::from_provider(&FakeProvider::default());
        let first = identity.get_or_create();
        assert_eq!(identity.get_or_create(), first);
    }

    #[test]
    fn test_from_provider_uses_session_storage() {
        let provider = FakeProvider::fully_equipped();
        let identity = SessionIdentity::from_provider(&provider);
        let id = identity.get_or_create();
        let stored = provider
            .session
            .as_ref()
            .unwrap()
            .get_item(SESSION_KEY)
            .unwrap();
        assert_eq!(stored, Some(id));
    }
}
