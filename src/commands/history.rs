// File: history.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use anyhow::Result;
use colored::*;
use std::io::{self, Write};

use super::{
    format_coordinates, print_info, print_remote_leg, print_success, print_warning, AppContext,
};
use crate::cli::{ClearArgs, DeleteArgs, ListArgs};
use crate::record::CaptureRecord;

pub async fn execute_list(args: &ListArgs, context: &AppContext) -> Result<()> {
    let records = if args.local {
        context.store().snapshot()?
    } else {
        context.store().list().await?
    };

    let filtered: Vec<&CaptureRecord> = records
        .iter()
        .filter(|r| args.session.as_ref().map_or(true, |s| &r.session_id == s))
        .collect();

    if filtered.is_empty() {
        print_warning("No captures stored");
        return Ok(());
    }

    print_success(&format!(
        "Showing {} of {} captures",
        filtered.len().min(args.limit),
        filtered.len()
    ));
    display_history_table(&filtered, args.limit);
    Ok(())
}

pub async fn execute_delete(args: &DeleteArgs, context: &AppContext) -> Result<()> {
    let before = context.store().snapshot()?.len();
    let outcome = context.store().delete(&args.id).await?;

    if outcome.retained == before {
        print_warning(&format!("No capture with id {}", args.id));
    } else {
        print_success(&format!(
            "Deleted {} ({} captures left)",
            args.id, outcome.retained
        ));
        print_remote_leg(&outcome.remote);
    }
    Ok(())
}

pub async fn execute_clear(args: &ClearArgs, context: &AppContext) -> Result<()> {
    let count = context.store().snapshot()?.len();
    if !args.confirm && !confirm_clear(count)? {
        print_warning("Operation cancelled by user");
        return Ok(());
    }

    let outcome = context.store().clear().await?;
    print_success(&format!("Cleared {} captures", count));
    print_remote_leg(&outcome.remote);
    Ok(())
}

fn display_history_table(records: &[&CaptureRecord], limit: usize) {
    println!();
    println!(
        "{:<38} {:<20} {:<24} {:<8} {:<18} {:<10}",
        "ID".bold(),
        "Timestamp".bold(),
        "Coordinates".bold(),
        "Acc (m)".bold(),
        "Browser / OS".bold(),
        "Device".bold()
    );
    println!("{}", "─".repeat(122).bright_black());

    for record in records.iter().take(limit) {
        let accuracy = format!("{:.0}", record.position.accuracy);
        let accuracy = if record.position.accuracy < 20.0 {
            accuracy.green()
        } else if record.position.accuracy < 50.0 {
            accuracy.yellow()
        } else {
            accuracy.red()
        };

        println!(
            "{:<38} {:<20} {:<24} {:<8} {:<18} {:<10}",
            record.id,
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            format_coordinates(record.position.latitude, record.position.longitude),
            accuracy,
            format!("{} / {}", record.device.browser_name, record.device.os_name),
            record.device_type()
        );
    }

    if records.len() > limit {
        print_info(&format!("... and {} more", records.len() - limit));
    }
}

fn confirm_clear(count: usize) -> Result<bool> {
    println!();
    print_warning("This operation will permanently delete all captures!");
    println!(
        "{} captures will be removed locally and from the remote store",
        count.to_string().red()
    );
    println!();

    loop {
        print!("Are you sure you want to continue? [y/N]: ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        match input.trim().to_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" | "" => return Ok(false),
            _ => {
                println!("Please enter 'y' for yes or 'n' for no");
                continue;
            }
        }
    }
}
