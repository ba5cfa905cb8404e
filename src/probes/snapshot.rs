// File: snapshot.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::{
    BatteryReading, CanvasDrawing, CapabilityProvider, CaptureError, ConnectionReading,
    DisplayReading, NavigatorReading, PageReading, PositionOptions, ProbeError, ProbeResult,
    StorageKind, WebGlReading,
};
use crate::record::{GeoPosition, PermissionStatus};
use crate::storage::{MemoryStorage, WebStorage};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to read environment file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid environment description: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
enum PositionFailure {
    PermissionDenied,
    Timeout,
    PositionUnavailable,
    Unsupported,
}

impl From<PositionFailure> for CaptureError {
    fn from(failure: PositionFailure) -> Self {
        match failure {
            PositionFailure::PermissionDenied => CaptureError::PermissionDenied,
            PositionFailure::Timeout => CaptureError::Timeout,
            PositionFailure::PositionUnavailable => CaptureError::PositionUnavailable,
            PositionFailure::Unsupported => CaptureError::Unsupported,
        }
    }
}

/// The parts of the rendering stack that influence canvas output.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct CanvasStack {
    gpu: String,
    driver: String,
    fonts: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct EnvironmentDescription {
    permission: Option<PermissionStatus>,
    position: Option<GeoPosition>,
    position_error: Option<PositionFailure>,
    position_delay_ms: Option<u64>,
    battery: Option<BatteryReading>,
    connection: Option<ConnectionReading>,
    canvas: Option<CanvasStack>,
    webgl: Option<WebGlReading>,
    navigator: Option<NavigatorReading>,
    display: Option<DisplayReading>,
    page: Option<PageReading>,
    local_storage: Option<HashMap<String, String>>,
    session_storage: Option<HashMap<String, String>>,
    indexed_db: bool,
}

/// A recorded browser environment, e.g. posted by a tracking page or written
/// by hand for testing. Sections that are missing from the description are
/// treated as subsystems the browser does not expose.
pub struct SnapshotEnvironment {
    description: EnvironmentDescription,
    local: Option<Arc<dyn WebStorage>>,
    session: Option<Arc<dyn WebStorage>>,
}

impl SnapshotEnvironment {
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let description: EnvironmentDescription = serde_json::from_str(json)?;
        Ok(Self::from_description(description))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SnapshotError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// A browser that exposes nothing beyond its bare existence.
    pub fn bare() -> Self {
        Self::from_description(EnvironmentDescription::default())
    }

    fn from_description(description: EnvironmentDescription) -> Self {
        let seeded = |items: &Option<HashMap<String, String>>| {
            items.as_ref().map(|items| {
                let storage = MemoryStorage::new();
                for (key, value) in items {
                    // Unbounded in-memory storage accepts every write.
                    let _ = storage.set_item(key, value);
                }
                Arc::new(storage) as Arc<dyn WebStorage>
            })
        };

        Self {
            local: seeded(&description.local_storage),
            session: seeded(&description.session_storage),
            description,
        }
    }

    fn render_canvas(stack: &CanvasStack, drawing: &CanvasDrawing) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", drawing).as_bytes());
        hasher.update(stack.gpu.as_bytes());
        hasher.update(stack.driver.as_bytes());
        for font in &stack.fonts {
            hasher.update(font.as_bytes());
        }
        format!("data:image/png;base64,{:x}", hasher.finalize())
    }
}

#[async_trait]
impl CapabilityProvider for SnapshotEnvironment {
    async fn permission_state(&self) -> ProbeResult<PermissionStatus> {
        self.description
            .permission
            .ok_or_else(|| ProbeError::Unavailable("permissions".to_string()))
    }

    async fn get_position(&self, _options: &PositionOptions) -> Result<GeoPosition, CaptureError> {
        if let Some(delay) = self.description.position_delay_ms {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if let Some(failure) = self.description.position_error {
            return Err(failure.into());
        }
        self.description
            .position
            .clone()
            .ok_or(CaptureError::Unsupported)
    }

    async fn get_battery_status(&self) -> ProbeResult<Option<BatteryReading>> {
        Ok(self.description.battery.clone())
    }

    fn get_connection_info(&self) -> ProbeResult<Option<ConnectionReading>> {
        Ok(self.description.connection.clone())
    }

    fn get_canvas_signature(&self, drawing: &CanvasDrawing) -> ProbeResult<Option<String>> {
        Ok(self
            .description
            .canvas
            .as_ref()
            .map(|stack| Self::render_canvas(stack, drawing)))
    }

    fn get_webgl_info(&self) -> ProbeResult<Option<WebGlReading>> {
        Ok(self.description.webgl.clone())
    }

    fn navigator(&self) -> ProbeResult<NavigatorReading> {
        self.description
            .navigator
            .clone()
            .ok_or_else(|| ProbeError::Unavailable("navigator".to_string()))
    }

    fn display(&self) -> ProbeResult<DisplayReading> {
        self.description
            .display
            .clone()
            .ok_or_else(|| ProbeError::Unavailable("screen".to_string()))
    }

    fn page(&self) -> ProbeResult<PageReading> {
        self.description
            .page
            .clone()
            .ok_or_else(|| ProbeError::Unavailable("document".to_string()))
    }

    fn web_storage(&self, kind: StorageKind) -> ProbeResult<Option<Arc<dyn WebStorage>>> {
        Ok(match kind {
            StorageKind::Local => self.local.clone(),
            StorageKind::Session => self.session.clone(),
        })
    }

    fn indexed_db_present(&self) -> ProbeResult<bool> {
        Ok(self.description.indexed_db)
    }
}
