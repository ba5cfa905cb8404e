// File: mod.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::Path;

use crate::record::CaptureRecord;

pub mod csv;
pub mod json;

#[derive(Debug, Clone)]
pub struct ExportData {
    pub generated_at: DateTime<Utc>,
    pub records: Vec<CaptureRecord>,
}

impl ExportData {
    pub fn new(records: Vec<CaptureRecord>) -> Self {
        Self {
            generated_at: Utc::now(),
            records,
        }
    }

    /// File name in the form `geoprint-data-2025-03-01.csv`.
    pub fn default_file_name(&self, extension: &str) -> String {
        format!(
            "geoprint-data-{}.{}",
            self.generated_at.format("%Y-%m-%d"),
            extension
        )
    }
}

pub trait ReportGenerator {
    fn generate(&self, data: &ExportData) -> Result<String>;
    fn file_extension(&self) -> &'static str;
    fn content_type(&self) -> &'static str;
}

pub struct ReportEngine;

impl Default for ReportEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn generate_report<P: AsRef<Path>>(
        &self,
        format: &str,
        data: &ExportData,
        output_path: Option<P>,
    ) -> Result<String> {
        let generator = self.get_generator(format)?;
        let content = generator.generate(data)?;

        if let Some(path) = output_path {
            std::fs::write(path, &content)?;
        }

        Ok(content)
    }

    pub fn get_generator(&self, format: &str) -> Result<Box<dyn ReportGenerator>> {
        match format.to_lowercase().as_str() {
            "json" => Ok(Box::new(json::JsonGenerator::new())),
            "csv" => Ok(Box::new(csv::CsvGenerator::new())),
            _ => Err(anyhow::anyhow!("Unsupported export format: {}", format)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::sample_record;
    use tempfile::TempDir;

    #[test]
    fn test_unknown_format_is_rejected() {
        let engine = ReportEngine::new();
        assert!(engine.get_generator("xml").is_err());
        assert_eq!(engine.get_generator("CSV").unwrap().file_extension(), "csv");
    }

    #[test]
    fn test_report_written_to_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.json");
        let data = ExportData::new(vec![sample_record("a", "s", 0)]);

        let content = ReportEngine::new()
            .generate_report("json", &data, Some(&path))
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), content);
        assert!(data.default_file_name("json").starts_with("geoprint-data-"));
    }
}
