// File: links.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use chrono::{DateTime, SubsecRound, Utc};
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::record::iso_millis;
use crate::storage::{StorageError, StorageResult, WebStorage};

pub const CONFIG_KEY: &str = "geoprint_config";
pub const DEFAULT_TARGET_URL: &str = "https://facebook.com";
const LINK_ID_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
    Auto,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::Auto => "auto",
        };
        write!(f, "{}", label)
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            "auto" => Ok(Self::Auto),
            other => Err(format!("Unknown theme: {}", other)),
        }
    }
}

/// A shareable link whose visits trigger a capture before redirecting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingLink {
    id: String,
    target_url: String,
    #[serde(with = "iso_millis")]
    created_at: DateTime<Utc>,
    clicks: u64,
    captures: u64,
    active: bool,
}

impl TrackingLink {
    fn new(target_url: String) -> Self {
        let mut id = Uuid::new_v4().to_string();
        id.truncate(LINK_ID_LEN);
        Self {
            id,
            target_url,
            // Stored with millisecond precision.
            created_at: Utc::now().trunc_subsecs(3),
            clicks: 0,
            captures: 0,
            active: true,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn clicks(&self) -> u64 {
        self.clicks
    }

    pub fn captures(&self) -> u64 {
        self.captures
    }

    pub fn active(&self) -> bool {
        self.active
    }
}

/// Stored fields are merged over the defaults, so older or partial documents
/// stay loadable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub default_target_url: String,
    pub tracking_links: Vec<TrackingLink>,
    pub theme: Theme,
    pub auto_refresh: bool,
    /// Milliseconds.
    pub refresh_interval: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_target_url: DEFAULT_TARGET_URL.to_string(),
            tracking_links: Vec::new(),
            theme: Theme::default(),
            auto_refresh: false,
            refresh_interval: 30_000,
        }
    }
}

/// Persisted application configuration and tracking links. Kept under its own
/// key, apart from the capture history.
pub struct LinkRegistry {
    storage: Arc<dyn WebStorage>,
    lock: Mutex<()>,
}

impl LinkRegistry {
    pub fn new(storage: Arc<dyn WebStorage>) -> Self {
        Self {
            storage,
            lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> StorageResult<AppConfig> {
        let Some(raw) = self.storage.get_item(CONFIG_KEY)? else {
            return Ok(AppConfig::default());
        };
        match serde_json::from_str(&raw) {
            Ok(config) => Ok(config),
            Err(e) => {
                error!("Failed to load config: {}", e);
                Ok(AppConfig::default())
            }
        }
    }

    pub fn set_default_target_url(&self, url: &str) -> StorageResult<()> {
        self.update(|config| config.default_target_url = url.to_string())
    }

    pub fn set_theme(&self, theme: Theme) -> StorageResult<()> {
        self.update(|config| config.theme = theme)
    }

    pub fn set_auto_refresh(&self, enabled: bool, interval_ms: Option<u64>) -> StorageResult<()> {
        self.update(|config| {
            config.auto_refresh = enabled;
            if let Some(interval) = interval_ms {
                config.refresh_interval = interval;
            }
        })
    }

    /// New link to `target_url`, or to the default target when none is given.
    pub fn create(&self, target_url: Option<&str>) -> StorageResult<TrackingLink> {
        let mut created = None;
        self.update(|config| {
            let target = target_url
                .filter(|url| !url.is_empty())
                .unwrap_or(config.default_target_url.as_str())
                .to_string();
            let link = TrackingLink::new(target);
            config.tracking_links.push(link.clone());
            created = Some(link);
        })?;
        created.ok_or_else(|| StorageError::Database("tracking link was not created".to_string()))
    }

    pub fn list(&self) -> StorageResult<Vec<TrackingLink>> {
        Ok(self.config()?.tracking_links)
    }

    pub fn get(&self, id: &str) -> StorageResult<Option<TrackingLink>> {
        Ok(self.list()?.into_iter().find(|link| link.id == id))
    }

    pub fn increment_clicks(&self, id: &str) -> StorageResult<()> {
        self.update_link(id, |link| link.clicks += 1)
    }

    pub fn increment_captures(&self, id: &str) -> StorageResult<()> {
        self.update_link(id, |link| link.captures += 1)
    }

    pub fn toggle_active(&self, id: &str) -> StorageResult<()> {
        self.update_link(id, |link| link.active = !link.active)
    }

    pub fn delete(&self, id: &str) -> StorageResult<()> {
        self.update(|config| config.tracking_links.retain(|link| link.id != id))
    }

    fn update_link<F>(&self, id: &str, change: F) -> StorageResult<()>
    where
        F: FnOnce(&mut TrackingLink),
    {
        self.update(|config| match config.tracking_links.iter_mut().find(|link| link.id == id) {
            Some(link) => change(link),
            None => debug!("No tracking link with id {}", id),
        })
    }

    fn update<F>(&self, change: F) -> StorageResult<()>
    where
        F: FnOnce(&mut AppConfig),
    {
        let _guard = self.guard();
        let mut config = self.config()?;
        change(&mut config);
        let raw = serde_json::to_string(&config)?;
        self.storage.set_item(CONFIG_KEY, &raw)
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        match self.lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
