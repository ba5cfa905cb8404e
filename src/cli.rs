// File: cli.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::links::Theme;

#[derive(Parser, Debug)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = env!("CARGO_PKG_DESCRIPTION"),
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, help = "Directory holding the local cache")]
    pub data_dir: Option<PathBuf>,

    #[arg(long = "log-level", default_value = "warn", global = true)]
    pub log_level: String,

    #[arg(
        long = "remote-token",
        global = true,
        help = "Access token for the remote document store"
    )]
    pub remote_token: Option<String>,

    #[arg(
        long = "remote-base",
        global = true,
        help = "Base URL of the remote document store API"
    )]
    pub remote_base: Option<String>,

    #[arg(
        long = "remote-timeout",
        default_value_t = 5000,
        global = true,
        help = "Milliseconds to wait for the remote store on each write"
    )]
    pub remote_timeout: u64,

    #[arg(
        long = "local-quota",
        global = true,
        help = "Byte quota of the local cache (default 5 MiB, 0 disables it)"
    )]
    pub local_quota: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Take one capture from a recorded browser environment and store it
    Capture(CaptureArgs),
    /// Show the stored history, most recent first
    List(ListArgs),
    /// Delete one capture by id
    Delete(DeleteArgs),
    /// Remove every stored capture
    Clear(ClearArgs),
    /// Show history statistics
    Stats(StatsArgs),
    /// Export the history as JSON or CSV
    Export(ExportArgs),
    /// Manage tracking links and redirect settings
    Links(LinksArgs),
    /// Simulate a tracking-link visit: capture, then redirect
    Track(TrackArgs),
}

#[derive(Args, Debug)]
pub struct CaptureArgs {
    #[arg(short = 'e', long = "environment", help = "JSON description of the browser environment")]
    pub environment: PathBuf,

    #[arg(short = 't', long = "timeout", default_value_t = 10_000, help = "Position timeout in milliseconds")]
    pub timeout: u64,

    #[arg(long = "low-accuracy", help = "Do not request a high-accuracy fix")]
    pub low_accuracy: bool,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    #[arg(short = 'l', long = "limit", default_value_t = 20)]
    pub limit: usize,

    #[arg(long = "session", help = "Only show captures of this session")]
    pub session: Option<String>,

    #[arg(long = "local", help = "Read the local cache without contacting the remote store")]
    pub local: bool,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    #[arg(help = "Id of the capture to delete")]
    pub id: String,
}

#[derive(Args, Debug)]
pub struct ClearArgs {
    #[arg(long = "confirm", help = "Confirm deletion without interactive prompt")]
    pub confirm: bool,
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    #[arg(long = "breakdown", help = "Show distributions by browser, OS, device and more")]
    pub breakdown: bool,

    #[arg(long = "format", default_value = "table")]
    pub format: String,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    #[arg(short = 'f', long = "format", default_value = "json")]
    pub format: String,

    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    #[arg(long = "stdout", help = "Print the export instead of writing a file")]
    pub stdout: bool,
}

#[derive(Args, Debug)]
pub struct LinksArgs {
    #[command(subcommand)]
    pub action: LinkAction,
}

#[derive(Subcommand, Debug)]
pub enum LinkAction {
    /// List tracking links and the current settings
    List,
    /// Create a tracking link
    Create {
        #[arg(help = "Redirect target, defaults to the configured default target")]
        target: Option<String>,
    },
    /// Enable or disable a tracking link
    Toggle { id: String },
    /// Delete a tracking link
    Delete { id: String },
    /// Record a click on a tracking link
    Click { id: String },
    /// Change the default redirect target
    SetDefault { url: String },
    /// Change the dashboard theme
    SetTheme { theme: Theme },
    /// Configure dashboard auto-refresh
    SetRefresh {
        #[arg(long = "enabled")]
        enabled: bool,
        #[arg(long = "interval", help = "Refresh interval in milliseconds")]
        interval: Option<u64>,
    },
}

#[derive(Args, Debug)]
pub struct TrackArgs {
    #[arg(short = 'e', long = "environment", help = "JSON description of the visiting browser")]
    pub environment: PathBuf,

    #[arg(long = "link", help = "Tracking link id")]
    pub link: Option<String>,

    #[arg(long = "url", help = "Redirect target overriding the default")]
    pub url: Option<String>,

    #[arg(long = "redirect-delay", default_value_t = 2500, help = "Milliseconds before redirecting")]
    pub redirect_delay: u64,
}

impl Cli {
    /// `None` when no quota applies.
    pub fn parse_local_quota(&self, default_quota: Option<u64>) -> Option<u64> {
        match self.local_quota {
            Some(0) => None,
            Some(quota) => Some(quota),
            None => default_quota,
        }
    }

    pub fn remote_configured(&self) -> bool {
        self.remote_token.is_some() || self.remote_base.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_capture_with_globals() {
        let cli = Cli::parse_from([
            "geoprint",
            "--data-dir",
            "/tmp/gp",
            "capture",
            "--environment",
            "env.json",
            "--remote-token",
            "abc",
        ]);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/gp")));
        assert_eq!(cli.remote_token.as_deref(), Some("abc"));
        assert!(cli.remote_configured());
        match cli.command {
            Commands::Capture(args) => {
                assert_eq!(args.environment, PathBuf::from("env.json"));
                assert_eq!(args.timeout, 10_000);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_local_quota_zero_disables() {
        let cli = Cli::parse_from(["geoprint", "--local-quota", "0", "list"]);
        assert_eq!(cli.parse_local_quota(Some(10)), None);

        let cli = Cli::parse_from(["geoprint", "list"]);
        assert_eq!(cli.parse_local_quota(Some(10)), Some(10));
    }

    #[test]
    fn test_parse_link_theme() {
        let cli = Cli::parse_from(["geoprint", "links", "set-theme", "light"]);
        match cli.command {
            Commands::Links(LinksArgs {
                action: LinkAction::SetTheme { theme },
            }) => assert_eq!(theme, Theme::Light),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
