// File: main.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use clap::Parser;
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::process::ExitCode;

use geoprint::cli::Cli;
use geoprint::commands;

fn parse_level(level: &str) -> LevelFilter {
    level.parse().unwrap_or(LevelFilter::Warn)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = SimpleLogger::new()
        .with_level(parse_level(&cli.log_level))
        .init()
    {
        eprintln!("Failed to initialize logger: {}", e);
    }

    match commands::dispatch(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
