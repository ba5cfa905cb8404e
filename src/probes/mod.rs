// File: mod.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

//! Best-effort reads of individual browser subsystems.
//!
//! Browser globals are reached through a [`CapabilityProvider`], so every
//! subsystem can be absent or failing independently. Each `probe_*` function
//! normalizes one subsystem and absorbs its failure into a sentinel value.
//! The position probe is the exception: its failure is returned to the caller.

pub mod snapshot;

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::record::{GeoPosition, PermissionStatus, CANVAS_UNAVAILABLE, UNKNOWN, UNKNOWN_LOWER};
use crate::storage::WebStorage;

pub use snapshot::SnapshotEnvironment;

const CANVAS_SIGNATURE_LEN: usize = 50;
const STORAGE_TEST_KEY: &str = "__storage_test__";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location information is unavailable")]
    PositionUnavailable,
    #[error("Geolocation is not supported by this browser")]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("subsystem not exposed: {0}")]
    Unavailable(String),
    #[error("subsystem failed: {0}")]
    Failed(String),
}

pub type ProbeResult<T> = Result<T, ProbeError>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    Local,
    Session,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BatteryReading {
    /// Charge between 0.0 and 1.0.
    pub level: f64,
    pub charging: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionReading {
    pub effective_type: Option<String>,
    pub downlink: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebGlReading {
    pub vendor: Option<String>,
    pub renderer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NavigatorReading {
    pub user_agent: String,
    pub platform: String,
    pub language: String,
    pub languages: Vec<String>,
    pub timezone: Option<String>,
    pub timezone_offset: i32,
    pub hardware_concurrency: Option<u32>,
    pub device_memory: Option<f64>,
    pub max_touch_points: Option<u32>,
    pub cookie_enabled: bool,
    pub do_not_track: Option<String>,
    pub online: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DisplayReading {
    pub screen_width: u32,
    pub screen_height: u32,
    pub avail_width: u32,
    pub avail_height: u32,
    pub inner_width: u32,
    pub inner_height: u32,
    pub pixel_ratio: f64,
    pub color_depth: u32,
    pub orientation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageReading {
    pub referrer: String,
    pub current_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CanvasOp {
    FillRect {
        color: &'static str,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    FillText {
        color: &'static str,
        x: f64,
        y: f64,
    },
}

/// A fixed 2D drawing. Rendering it on different GPU/driver/font stacks yields
/// slightly different pixels, which is what makes the signature discriminating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasDrawing {
    pub text: &'static str,
    pub font: &'static str,
    pub baseline: &'static str,
    pub ops: &'static [CanvasOp],
}

pub const FINGERPRINT_DRAWING: CanvasDrawing = CanvasDrawing {
    text: "GeoPrint Canvas Fingerprint",
    font: "16px Arial",
    baseline: "alphabetic",
    ops: &[
        CanvasOp::FillRect {
            color: "#f39c12",
            x: 0.0,
            y: 0.0,
            width: 200.0,
            height: 50.0,
        },
        CanvasOp::FillText {
            color: "#3498db",
            x: 2.0,
            y: 15.0,
        },
        CanvasOp::FillText {
            color: "rgba(255, 0, 255, 0.5)",
            x: 4.0,
            y: 17.0,
        },
    ],
};

/// Access to the ambient browser context.
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    async fn permission_state(&self) -> ProbeResult<PermissionStatus>;

    async fn get_position(&self, options: &PositionOptions) -> Result<GeoPosition, CaptureError>;

    /// `Ok(None)` when the Battery API is not exposed.
    async fn get_battery_status(&self) -> ProbeResult<Option<BatteryReading>>;

    /// `Ok(None)` when the Network Information API is not exposed.
    fn get_connection_info(&self) -> ProbeResult<Option<ConnectionReading>>;

    /// Encoded output of the rendered drawing, `Ok(None)` without a 2D context.
    fn get_canvas_signature(&self, drawing: &CanvasDrawing) -> ProbeResult<Option<String>>;

    /// `Ok(None)` when there is no WebGL context or no debug-info extension.
    fn get_webgl_info(&self) -> ProbeResult<Option<WebGlReading>>;

    fn navigator(&self) -> ProbeResult<NavigatorReading>;

    fn display(&self) -> ProbeResult<DisplayReading>;

    fn page(&self) -> ProbeResult<PageReading>;

    fn web_storage(&self, kind: StorageKind) -> ProbeResult<Option<Arc<dyn WebStorage>>>;

    fn indexed_db_present(&self) -> ProbeResult<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BatteryStatus {
    pub level: Option<u8>,
    pub charging: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionStatus {
    pub effective_type: String,
    pub downlink: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebGlInfo {
    pub vendor: String,
    pub renderer: String,
}

pub async fn probe_permission(provider: &dyn CapabilityProvider) -> PermissionStatus {
    match provider.permission_state().await {
        Ok(status) => status,
        Err(e) => {
            debug!("Permission query failed: {}", e);
            PermissionStatus::Unsupported
        }
    }
}

pub async fn probe_position(
    provider: &dyn CapabilityProvider,
    options: &PositionOptions,
) -> Result<GeoPosition, CaptureError> {
    match tokio::time::timeout(options.timeout, provider.get_position(options)).await {
        Ok(result) => result,
        Err(_) => Err(CaptureError::Timeout),
    }
}

pub async fn probe_battery(provider: &dyn CapabilityProvider) -> BatteryStatus {
    match provider.get_battery_status().await {
        Ok(Some(reading)) if reading.level.is_finite() => BatteryStatus {
            level: Some((reading.level * 100.0).round().clamp(0.0, 100.0) as u8),
            charging: Some(reading.charging),
        },
        Ok(_) => BatteryStatus::default(),
        Err(e) => {
            debug!("Battery probe failed: {}", e);
            BatteryStatus::default()
        }
    }
}

pub fn probe_connection(provider: &dyn CapabilityProvider) -> ConnectionStatus {
    let reading = match provider.get_connection_info() {
        Ok(reading) => reading.unwrap_or_default(),
        Err(e) => {
            debug!("Connection probe failed: {}", e);
            ConnectionReading::default()
        }
    };

    ConnectionStatus {
        effective_type: reading
            .effective_type
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNKNOWN_LOWER.to_string()),
        // A zero estimate means the browser did not report one.
        downlink: reading.downlink.filter(|d| *d > 0.0),
    }
}

pub fn probe_canvas(provider: &dyn CapabilityProvider) -> String {
    match provider.get_canvas_signature(&FINGERPRINT_DRAWING) {
        Ok(Some(encoded)) => tail_chars(&encoded, CANVAS_SIGNATURE_LEN),
        Ok(None) => CANVAS_UNAVAILABLE.to_string(),
        Err(e) => {
            debug!("Canvas probe failed: {}", e);
            CANVAS_UNAVAILABLE.to_string()
        }
    }
}

pub fn probe_webgl(provider: &dyn CapabilityProvider) -> WebGlInfo {
    let reading = match provider.get_webgl_info() {
        Ok(reading) => reading.unwrap_or_default(),
        Err(e) => {
            debug!("WebGL probe failed: {}", e);
            WebGlReading::default()
        }
    };

    let or_unknown = |value: Option<String>| {
        value
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| UNKNOWN.to_string())
    };

    WebGlInfo {
        vendor: or_unknown(reading.vendor),
        renderer: or_unknown(reading.renderer),
    }
}

pub fn probe_storage(provider: &dyn CapabilityProvider, kind: StorageKind) -> bool {
    let storage = match provider.web_storage(kind) {
        Ok(Some(storage)) => storage,
        Ok(None) => return false,
        Err(e) => {
            debug!("{:?} storage not reachable: {}", kind, e);
            return false;
        }
    };

    storage
        .set_item(STORAGE_TEST_KEY, STORAGE_TEST_KEY)
        .and_then(|_| storage.remove_item(STORAGE_TEST_KEY))
        .map_err(|e| debug!("{:?} storage write test failed: {}", kind, e))
        .is_ok()
}

pub fn probe_indexed_db(provider: &dyn CapabilityProvider) -> bool {
    provider.indexed_db_present().unwrap_or(false)
}

fn tail_chars(value: &str, count: usize) -> String {
    let total = value.chars().count();
    value.chars().skip(total.saturating_sub(count)).collect()
}
