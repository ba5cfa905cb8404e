// File: json.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use anyhow::Result;

use super::{ExportData, ReportGenerator};

/// The history as the same pretty-printed array the remote document holds.
pub struct JsonGenerator;

impl JsonGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl ReportGenerator for JsonGenerator {
    fn generate(&self, data: &ExportData) -> Result<String> {
        let json = serde_json::to_string_pretty(&data.records)
            .map_err(|e| anyhow::anyhow!("Failed to serialize captures to JSON: {}", e))?;
        Ok(json)
    }

    fn file_extension(&self) -> &'static str {
        "json"
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }
}
