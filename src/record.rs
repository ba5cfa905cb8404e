// File: record.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const UNKNOWN: &str = "Unknown";
pub const UNKNOWN_LOWER: &str = "unknown";
pub const CANVAS_UNAVAILABLE: &str = "unavailable";

static MOBILE_UA: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Mobile|Android|iPhone").unwrap());
static TABLET_UA: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Tablet|iPad").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Granted,
    Denied,
    Prompt,
    #[default]
    Unsupported,
}

impl fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Granted => "granted",
            Self::Denied => "denied",
            Self::Prompt => "prompt",
            Self::Unsupported => "unsupported",
        };
        write!(f, "{}", label)
    }
}

/// A single position fix as reported by the geolocation subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPosition {
    pub latitude: f64,
    pub longitude: f64,
    /// Meters.
    pub accuracy: f64,
    pub altitude: Option<f64>,
    pub altitude_accuracy: Option<f64>,
    pub heading: Option<f64>,
    pub speed: Option<f64>,
}

impl GeoPosition {
    pub fn new(latitude: f64, longitude: f64, accuracy: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy,
            altitude: None,
            altitude_accuracy: None,
            heading: None,
            speed: None,
        }
    }
}

/// Everything the fingerprint assembler collects about the device. Field names
/// are kept identical to the stored JSON document so records written by older
/// captures stay readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceFingerprint {
    pub user_agent: String,
    pub browser_name: String,
    pub browser_version: String,
    pub os_name: String,
    pub os_version: String,
    pub platform: String,
    pub language: String,
    pub languages: Vec<String>,
    pub timezone: String,
    pub timezone_offset: i32,

    pub screen_width: u32,
    pub screen_height: u32,
    pub avail_width: u32,
    pub avail_height: u32,
    pub inner_width: u32,
    pub inner_height: u32,
    pub pixel_ratio: f64,
    pub color_depth: u32,
    pub orientation: String,

    pub cpu_cores: u32,
    pub device_memory: Option<f64>,
    pub max_touch_points: u32,

    pub battery_level: Option<u8>,
    pub battery_charging: Option<bool>,

    pub connection_type: String,
    pub connection_downlink: Option<f64>,

    pub cookie_enabled: bool,
    pub do_not_track: Option<String>,
    pub online: bool,
    #[serde(rename = "webGLVendor")]
    pub webgl_vendor: String,
    #[serde(rename = "webGLRenderer")]
    pub webgl_renderer: String,
    pub canvas_fingerprint: String,

    pub local_storage_available: bool,
    pub session_storage_available: bool,
    #[serde(rename = "indexedDBAvailable")]
    pub indexed_db_available: bool,

    pub referrer: String,
    #[serde(rename = "currentURL")]
    pub current_url: String,
}

impl Default for DeviceFingerprint {
    fn default() -> Self {
        Self {
            user_agent: String::new(),
            browser_name: UNKNOWN.to_string(),
            browser_version: UNKNOWN.to_string(),
            os_name: UNKNOWN.to_string(),
            os_version: UNKNOWN.to_string(),
            platform: String::new(),
            language: String::new(),
            languages: Vec::new(),
            timezone: String::new(),
            timezone_offset: 0,
            screen_width: 0,
            screen_height: 0,
            avail_width: 0,
            avail_height: 0,
            inner_width: 0,
            inner_height: 0,
            pixel_ratio: 1.0,
            color_depth: 0,
            orientation: UNKNOWN_LOWER.to_string(),
            cpu_cores: 0,
            device_memory: None,
            max_touch_points: 0,
            battery_level: None,
            battery_charging: None,
            connection_type: UNKNOWN_LOWER.to_string(),
            connection_downlink: None,
            cookie_enabled: false,
            do_not_track: None,
            online: false,
            webgl_vendor: UNKNOWN.to_string(),
            webgl_renderer: UNKNOWN.to_string(),
            canvas_fingerprint: CANVAS_UNAVAILABLE.to_string(),
            local_storage_available: false,
            session_storage_available: false,
            indexed_db_available: false,
            referrer: String::new(),
            current_url: String::new(),
        }
    }
}

/// One fingerprinted location event. Records are only ever appended to or
/// removed from the history as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureRecord {
    pub id: String,
    pub session_id: String,
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub position: GeoPosition,
    #[serde(flatten)]
    pub device: DeviceFingerprint,
    #[serde(default)]
    pub permission_status: PermissionStatus,
}

impl CaptureRecord {
    pub fn device_type(&self) -> &'static str {
        if TABLET_UA.is_match(&self.device.user_agent) {
            "Tablet"
        } else if MOBILE_UA.is_match(&self.device.user_agent) {
            "Mobile"
        } else {
            "Desktop"
        }
    }
}

/// ISO-8601 with millisecond precision and a `Z` suffix, e.g.
/// `2025-03-01T09:15:00.250Z`.
pub mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&timestamp.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
