// File: capture.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use anyhow::{Context, Result};
use colored::*;
use std::sync::Arc;
use std::time::Duration;

use super::{
    format_coordinates, print_error, print_info, print_remote_leg, print_success, print_warning,
    spinner, AppContext,
};
use crate::cli::{CaptureArgs, TrackArgs};
use crate::fingerprint::PipelineError;
use crate::record::CaptureRecord;
use crate::storage::WriteOutcome;
use crate::track::Tracker;

pub async fn execute_capture(args: &CaptureArgs, context: &mut AppContext) -> Result<()> {
    context.config_mut().set_capture_timeout(args.timeout);
    context.config_mut().set_high_accuracy(!args.low_accuracy);
    let pipeline = context.pipeline(&args.environment)?;

    let pb = spinner("Requesting location...");
    let result = pipeline.capture_and_save().await;
    pb.finish_and_clear();

    match result {
        Ok((record, outcome)) => {
            print_capture(&record, &outcome);
            Ok(())
        }
        Err(e) => {
            print_error(&e.to_string());
            Err(e).context("Capture was not stored")
        }
    }
}

pub async fn execute_track(args: &TrackArgs, context: &mut AppContext) -> Result<()> {
    let pipeline = Arc::new(context.pipeline(&args.environment)?);
    let tracker = Tracker::new(pipeline, Arc::clone(context.links()))
        .with_redirect_delay(Duration::from_millis(args.redirect_delay));

    let pb = spinner("Loading content...");
    let outcome = tracker.track(args.link.as_deref(), args.url.as_deref()).await;
    pb.finish_and_clear();

    print_success(&format!("Redirecting to {}", outcome.target_url.bold()));

    if outcome.capture.is_pending() {
        print_info("Capture still running after redirect, waiting for it to settle");
    }
    match outcome.capture.finish().await {
        Ok((record, write)) => print_capture(&record, &write),
        // A visit without a capture is still a successful redirect.
        Err(PipelineError::Capture(e)) => print_warning(&format!("No capture taken: {}", e)),
        Err(e) => print_error(&e.to_string()),
    }

    Ok(())
}

fn print_capture(record: &CaptureRecord, outcome: &WriteOutcome) {
    print_success(&format!("Captured {}", record.id.bold()));
    println!(
        "  Position:   {} (±{:.0} m)",
        format_coordinates(record.position.latitude, record.position.longitude).cyan(),
        record.position.accuracy
    );
    println!(
        "  Device:     {} {} on {} {} ({})",
        record.device.browser_name,
        record.device.browser_version,
        record.device.os_name,
        record.device.os_version,
        record.device_type()
    );
    println!("  Session:    {}", record.session_id.dimmed());
    println!("  Permission: {}", record.permission_status);
    println!("  History:    {} captures", outcome.retained);

    if outcome.reduced {
        print_warning("Local storage was full, older captures were dropped");
    }
    print_remote_leg(&outcome.remote);
}
