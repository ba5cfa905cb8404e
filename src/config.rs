// File: config.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::probes::PositionOptions;
use crate::storage::MAX_HISTORY;

const DATA_DIR_NAME: &str = "geoprint";
/// Typical browser web-storage allowance per origin.
const DEFAULT_LOCAL_QUOTA: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ConfigParameter {
    data_dir: PathBuf,
    capture_timeout: u64,
    redirect_delay: u64,
    remote_timeout: u64,
    max_history: usize,
    local_quota: Option<u64>,
    high_accuracy: bool,
}

impl Default for ConfigParameter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigParameter {
    pub fn new() -> Self {
        Self {
            data_dir: default_data_dir(),
            capture_timeout: 10_000,
            redirect_delay: 2_500,
            remote_timeout: 5_000,
            max_history: MAX_HISTORY,
            local_quota: Some(DEFAULT_LOCAL_QUOTA),
            high_accuracy: true,
        }
    }

    pub fn set_data_dir<P: AsRef<Path>>(&mut self, data_dir: P) {
        self.data_dir = data_dir.as_ref().to_path_buf();
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("store")
    }

    /// Milliseconds.
    pub fn set_capture_timeout(&mut self, capture_timeout: u64) {
        self.capture_timeout = capture_timeout;
    }

    pub fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout)
    }

    /// Milliseconds.
    pub fn set_redirect_delay(&mut self, redirect_delay: u64) {
        self.redirect_delay = redirect_delay;
    }

    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.redirect_delay)
    }

    /// Milliseconds.
    pub fn set_remote_timeout(&mut self, remote_timeout: u64) {
        self.remote_timeout = remote_timeout;
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout)
    }

    /// Clamped to `1..=MAX_HISTORY`.
    pub fn set_max_history(&mut self, max_history: usize) {
        self.max_history = max_history.clamp(1, MAX_HISTORY);
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    pub fn set_local_quota(&mut self, local_quota: Option<u64>) {
        self.local_quota = local_quota;
    }

    pub fn local_quota(&self) -> Option<u64> {
        self.local_quota
    }

    pub fn set_high_accuracy(&mut self, high_accuracy: bool) {
        self.high_accuracy = high_accuracy;
    }

    pub fn high_accuracy(&self) -> bool {
        self.high_accuracy
    }

    pub fn position_options(&self) -> PositionOptions {
        PositionOptions {
            high_accuracy: self.high_accuracy,
            timeout: self.capture_timeout(),
            maximum_age: Duration::ZERO,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATA_DIR_NAME)
}
