// File: stats.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use anyhow::Result;
use colored::*;

use super::{format_file_size, print_error, print_info, AppContext};
use crate::cli::StatsArgs;
use crate::stats::{Breakdown, HistoryStats};

pub async fn execute(args: &StatsArgs, context: &AppContext) -> Result<()> {
    print_info("Generating history statistics...");

    let stats = context.store().stats().await?;
    let breakdown = if args.breakdown {
        Some(Breakdown::from_records(&context.store().snapshot()?))
    } else {
        None
    };

    match args.format.to_lowercase().as_str() {
        "table" => display_stats_table(&stats, breakdown.as_ref()),
        "json" => display_stats_json(&stats, breakdown.as_ref())?,
        _ => print_error(&format!("Unsupported format: {}", args.format)),
    }

    Ok(())
}

fn display_stats_table(stats: &HistoryStats, breakdown: Option<&Breakdown>) {
    println!();
    println!("{}", "═".repeat(60).bright_black());
    println!("{:^60}", "CAPTURE STATISTICS".bold().bright_white());
    println!("{}", "═".repeat(60).bright_black());

    println!(
        "Total Captures:    {}",
        stats.total_captures.to_string().bold().green()
    );
    println!(
        "Unique Sessions:   {}",
        stats.unique_sessions.to_string().bold().blue()
    );
    println!("Latest Capture:    {}", stats.latest_capture_display());
    println!(
        "Storage Used:      {} ({})",
        stats.storage_usage().bold(),
        format_file_size(stats.storage_bytes).dimmed()
    );

    if let Some(breakdown) = breakdown {
        print_distribution("BROWSERS", &breakdown.browsers, stats.total_captures);
        print_distribution("OPERATING SYSTEMS", &breakdown.operating_systems, stats.total_captures);
        print_distribution("DEVICE TYPES", &breakdown.device_types, stats.total_captures);
        print_distribution("CONNECTION TYPES", &breakdown.connection_types, stats.total_captures);
        print_distribution("BATTERY LEVELS", &breakdown.battery_levels, stats.total_captures);
    }

    println!("{}", "═".repeat(60).bright_black());
}

fn print_distribution(title: &str, entries: &[(String, usize)], total: usize) {
    println!("\n{}", title.bold().cyan());
    println!("{}", "─".repeat(40).bright_black());
    for (label, count) in entries {
        let share = if total > 0 {
            *count as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        println!(
            "  {:<24} {:>5} ({:.1}%)",
            label,
            count.to_string().yellow(),
            share
        );
    }
}

fn display_stats_json(stats: &HistoryStats, breakdown: Option<&Breakdown>) -> Result<()> {
    let json = serde_json::json!({
        "summary": stats,
        "storageUsage": stats.storage_usage(),
        "breakdown": breakdown,
    });
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
