// File: csv.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use anyhow::Result;

use super::{ExportData, ReportGenerator};

const HEADERS: [&str; 18] = [
    "Timestamp",
    "Latitude",
    "Longitude",
    "Accuracy",
    "Device Type",
    "Browser",
    "Browser Version",
    "OS",
    "OS Version",
    "Screen Width",
    "Screen Height",
    "Battery Level",
    "Battery Charging",
    "Connection Type",
    "Session ID",
    "Language",
    "Timezone",
    "Platform",
];

/// Flattened subset of each capture, one row per record.
pub struct CsvGenerator;

impl CsvGenerator {
    pub fn new() -> Self {
        Self
    }

    fn escape_csv(&self, field: &str) -> String {
        if field.contains(',') || field.contains('"') || field.contains('\n') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }
}

impl ReportGenerator for CsvGenerator {
    fn generate(&self, data: &ExportData) -> Result<String> {
        let mut csv = String::new();
        csv.push_str(&HEADERS.join(","));
        csv.push('\n');

        for record in &data.records {
            let device = &record.device;
            let battery_level = device
                .battery_level
                .map_or_else(|| "N/A".to_string(), |level| format!("{}%", level));
            let battery_charging = match device.battery_charging {
                Some(true) => "Yes",
                Some(false) => "No",
                None => "N/A",
            };

            let row = [
                record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                record.position.latitude.to_string(),
                record.position.longitude.to_string(),
                record.position.accuracy.to_string(),
                record.device_type().to_string(),
                device.browser_name.clone(),
                device.browser_version.clone(),
                device.os_name.clone(),
                device.os_version.clone(),
                device.screen_width.to_string(),
                device.screen_height.to_string(),
                battery_level,
                battery_charging.to_string(),
                device.connection_type.clone(),
                record.session_id.clone(),
                device.language.clone(),
                device.timezone.clone(),
                device.platform.clone(),
            ];

            let escaped: Vec<String> = row.iter().map(|field| self.escape_csv(field)).collect();
            csv.push_str(&escaped.join(","));
            csv.push('\n');
        }

        Ok(csv)
    }

    fn file_extension(&self) -> &'static str {
        "csv"
    }

    fn content_type(&self) -> &'static str {
        "text/csv"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::sample_record;

    #[test]
    fn test_header_and_row_shape() {
        let csv = CsvGenerator::new()
            .generate(&ExportData::new(vec![sample_record("a", "s-1", 0)]))
            .unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Timestamp,Latitude,Longitude,Accuracy,Device Type"));
        assert!(lines[1].starts_with("2023-11-14 22:13:20,52.52,13.405,25,Desktop,Chrome,"));
        assert!(lines[1].contains(",N/A,N/A,unknown,s-1,"));
    }

    #[test]
    fn test_battery_and_escaping() {
        let mut record = sample_record("a", "s", 0);
        record.device.battery_level = Some(42);
        record.device.battery_charging = Some(false);
        record.device.platform = "Linux, \"x86_64\"".to_string();

        let csv = CsvGenerator::new()
            .generate(&ExportData::new(vec![record]))
            .unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert!(row.contains(",42%,No,"));
        assert!(row.ends_with(",\"Linux, \"\"x86_64\"\"\""));
    }

    #[test]
    fn test_empty_history_is_header_only() {
        let csv = CsvGenerator::new().generate(&ExportData::new(Vec::new())).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }
}
