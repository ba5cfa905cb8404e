// File: stats.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::record::CaptureRecord;

const BATTERY_BUCKETS: [&str; 5] = ["0-20%", "20-40%", "40-60%", "60-80%", "80-100%"];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStats {
    pub total_captures: usize,
    pub unique_sessions: usize,
    pub latest_capture: Option<DateTime<Utc>>,
    /// Size of the serialized local snapshot.
    pub storage_bytes: u64,
}

impl HistoryStats {
    pub fn derive(records: &[CaptureRecord], storage_bytes: u64) -> Self {
        let unique_sessions = records
            .iter()
            .map(|r| r.session_id.as_str())
            .collect::<HashSet<_>>()
            .len();

        Self {
            total_captures: records.len(),
            unique_sessions,
            latest_capture: records.iter().map(|r| r.timestamp).max(),
            storage_bytes,
        }
    }

    pub fn storage_usage(&self) -> String {
        format!("{:.2} KB", self.storage_bytes as f64 / 1024.0)
    }

    pub fn latest_capture_display(&self) -> String {
        self.latest_capture
            .map(|ts| ts.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "Never".to_string())
    }
}

/// Distribution of captures over the most telling fingerprint attributes.
/// Each list is sorted by descending count, then by label.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
    pub browsers: Vec<(String, usize)>,
    pub operating_systems: Vec<(String, usize)>,
    pub device_types: Vec<(String, usize)>,
    pub connection_types: Vec<(String, usize)>,
    pub battery_levels: Vec<(String, usize)>,
}

impl Breakdown {
    pub fn from_records(records: &[CaptureRecord]) -> Self {
        Self {
            browsers: count_by(records, |r| r.device.browser_name.clone()),
            operating_systems: count_by(records, |r| r.device.os_name.clone()),
            device_types: count_by(records, |r| r.device_type().to_string()),
            connection_types: count_by(records, |r| r.device.connection_type.clone()),
            battery_levels: battery_distribution(records),
        }
    }
}

fn count_by<F>(records: &[CaptureRecord], label: F) -> Vec<(String, usize)>
where
    F: Fn(&CaptureRecord) -> String,
{
    let counts = records.iter().fold(HashMap::new(), |mut acc, record| {
        *acc.entry(label(record)).or_insert(0) += 1;
        acc
    });
    sorted(counts)
}

fn sorted(counts: HashMap<String, usize>) -> Vec<(String, usize)> {
    let mut entries: Vec<(String, usize)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries
}

/// Bucket order is kept fixed so charts line up between runs. Records without
/// a battery reading are left out.
fn battery_distribution(records: &[CaptureRecord]) -> Vec<(String, usize)> {
    let mut counts = [0usize; BATTERY_BUCKETS.len()];
    for level in records.iter().filter_map(|r| r.device.battery_level) {
        let index = (level as usize / 20).min(BATTERY_BUCKETS.len() - 1);
        counts[index] += 1;
    }
    BATTERY_BUCKETS
        .iter()
        .zip(counts)
        .map(|(label, count)| (label.to_string(), count))
        .collect()
}
