// File: output.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use anyhow::Result;
use std::path::PathBuf;

use super::{format_file_size, print_info, print_success, print_warning, AppContext};
use crate::cli::ExportArgs;
use crate::reports::{ExportData, ReportEngine};

pub async fn execute(args: &ExportArgs, context: &AppContext) -> Result<()> {
    let engine = ReportEngine::new();
    let generator = engine.get_generator(&args.format)?;

    let records = context.store().list().await?;
    if records.is_empty() {
        print_warning("No captures stored, the export will be empty");
    }
    let data = ExportData::new(records);

    if args.stdout {
        print!("{}", generator.generate(&data)?);
        return Ok(());
    }

    print_info(&format!(
        "Exporting {} captures as {}",
        data.records.len(),
        generator.content_type()
    ));

    let output_path = determine_output_path(args, &data, generator.file_extension());
    let content = engine.generate_report(&args.format, &data, Some(&output_path))?;

    print_success(&format!(
        "Export written: {} ({})",
        output_path.display(),
        format_file_size(content.len() as u64)
    ));
    Ok(())
}

fn determine_output_path(args: &ExportArgs, data: &ExportData, extension: &str) -> PathBuf {
    match args.output {
        Some(ref path) => path.clone(),
        None => PathBuf::from(data.default_file_name(extension)),
    }
}
