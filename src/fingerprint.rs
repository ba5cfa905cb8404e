// File: fingerprint.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use chrono::Utc;
use log::{debug, info};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::probes::{
    self, CapabilityProvider, CaptureError, DisplayReading, NavigatorReading, PageReading,
    PositionOptions, StorageKind,
};
use crate::record::{CaptureRecord, DeviceFingerprint, UNKNOWN, UNKNOWN_LOWER};
use crate::session::SessionIdentity;
use crate::storage::{HistoryStore, StorageError, WriteOutcome};
use crate::useragent;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Capture failed: {0}")]
    Capture(#[from] CaptureError),
    #[error("Storage failed: {0}")]
    Storage(#[from] StorageError),
    #[error("Capture task aborted: {0}")]
    Aborted(String),
}

/// Readings that the provider answers synchronously.
struct HostReadings {
    navigator: NavigatorReading,
    display: DisplayReading,
    page: PageReading,
    connection: probes::ConnectionStatus,
    webgl: probes::WebGlInfo,
    canvas_fingerprint: String,
    local_storage_available: bool,
    session_storage_available: bool,
    indexed_db_available: bool,
}

fn read_host(provider: &dyn CapabilityProvider) -> HostReadings {
    HostReadings {
        navigator: provider.navigator().unwrap_or_else(|e| {
            debug!("Navigator read failed: {}", e);
            NavigatorReading::default()
        }),
        display: provider.display().unwrap_or_else(|e| {
            debug!("Screen read failed: {}", e);
            DisplayReading::default()
        }),
        page: provider.page().unwrap_or_else(|e| {
            debug!("Document read failed: {}", e);
            PageReading::default()
        }),
        connection: probes::probe_connection(provider),
        webgl: probes::probe_webgl(provider),
        canvas_fingerprint: probes::probe_canvas(provider),
        local_storage_available: probes::probe_storage(provider, StorageKind::Local),
        session_storage_available: probes::probe_storage(provider, StorageKind::Session),
        indexed_db_available: probes::probe_indexed_db(provider),
    }
}

/// Collects every device attribute the provider exposes. Never fails: each
/// unavailable subsystem contributes its sentinel. The battery manager is
/// queried while the synchronous reads run.
pub async fn assemble(provider: &dyn CapabilityProvider) -> DeviceFingerprint {
    let (battery, host) = futures::join!(probes::probe_battery(provider), async {
        read_host(provider)
    });
    let HostReadings {
        navigator,
        display,
        page,
        connection,
        webgl,
        canvas_fingerprint,
        local_storage_available,
        session_storage_available,
        indexed_db_available,
    } = host;
    let agent = useragent::parse(&navigator.user_agent);

    let languages = if navigator.languages.is_empty() && !navigator.language.is_empty() {
        vec![navigator.language.clone()]
    } else {
        navigator.languages
    };

    DeviceFingerprint {
        user_agent: navigator.user_agent,
        browser_name: agent.browser_name,
        browser_version: agent.browser_version,
        os_name: agent.os_name,
        os_version: agent.os_version,
        platform: navigator.platform,
        language: navigator.language,
        languages,
        timezone: navigator
            .timezone
            .filter(|tz| !tz.is_empty())
            .unwrap_or_else(|| UNKNOWN.to_string()),
        timezone_offset: navigator.timezone_offset,

        screen_width: display.screen_width,
        screen_height: display.screen_height,
        avail_width: display.avail_width,
        avail_height: display.avail_height,
        inner_width: display.inner_width,
        inner_height: display.inner_height,
        pixel_ratio: if display.pixel_ratio > 0.0 {
            display.pixel_ratio
        } else {
            1.0
        },
        color_depth: display.color_depth,
        orientation: display
            .orientation
            .filter(|o| !o.is_empty())
            .unwrap_or_else(|| UNKNOWN_LOWER.to_string()),

        cpu_cores: navigator.hardware_concurrency.unwrap_or(0),
        device_memory: navigator.device_memory,
        max_touch_points: navigator.max_touch_points.unwrap_or(0),

        battery_level: battery.level,
        battery_charging: battery.charging,

        connection_type: connection.effective_type,
        connection_downlink: connection.downlink,

        cookie_enabled: navigator.cookie_enabled,
        do_not_track: navigator.do_not_track,
        online: navigator.online,
        webgl_vendor: webgl.vendor,
        webgl_renderer: webgl.renderer,
        canvas_fingerprint,

        local_storage_available,
        session_storage_available,
        indexed_db_available,

        referrer: page.referrer,
        current_url: page.current_url,
    }
}

/// Takes one position fix and merges it with the device fingerprint into a
/// new record. Only the position can make this fail.
pub async fn capture(
    provider: &dyn CapabilityProvider,
    session: &SessionIdentity,
    options: &PositionOptions,
) -> Result<CaptureRecord, CaptureError> {
    let permission_status = probes::probe_permission(provider).await;
    let (position, device) = futures::join!(
        probes::probe_position(provider, options),
        assemble(provider)
    );
    let position = position?;

    Ok(CaptureRecord {
        id: Uuid::new_v4().to_string(),
        session_id: session.get_or_create(),
        timestamp: Utc::now(),
        position,
        device,
        permission_status,
    })
}

/// Capture followed by a save into the history.
pub struct CapturePipeline {
    provider: Arc<dyn CapabilityProvider>,
    session: SessionIdentity,
    store: Arc<HistoryStore>,
    options: PositionOptions,
}

impl CapturePipeline {
    pub fn new(
        provider: Arc<dyn CapabilityProvider>,
        session: SessionIdentity,
        store: Arc<HistoryStore>,
    ) -> Self {
        Self {
            provider,
            session,
            store,
            options: PositionOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PositionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn store(&self) -> &Arc<HistoryStore> {
        &self.store
    }

    pub async fn capture(&self) -> Result<CaptureRecord, CaptureError> {
        capture(self.provider.as_ref(), &self.session, &self.options).await
    }

    /// A failed capture leaves the history untouched.
    pub async fn capture_and_save(&self) -> Result<(CaptureRecord, WriteOutcome), PipelineError> {
        let record = self.capture().await?;
        let outcome = self.store.save(record.clone()).await?;
        info!(
            "Captured {} at {:.5}, {:.5} (remote: {:?})",
            record.id, record.position.latitude, record.position.longitude, outcome.remote
        );
        Ok((record, outcome))
    }
}
