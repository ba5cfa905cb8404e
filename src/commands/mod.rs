// File: mod.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use anyhow::{Context, Result};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::{Cli, Commands};
use crate::config::ConfigParameter;
use crate::fingerprint::CapturePipeline;
use crate::links::LinkRegistry;
use crate::probes::SnapshotEnvironment;
use crate::session::SessionIdentity;
use crate::storage::{
    open_database, DriveRemote, HistoryStore, LocalHistory, RemoteLeg, RemoteStore, SledStorage,
};

pub mod capture;
pub mod history;
pub mod links;
pub mod output;
pub mod stats;

const LOCAL_TREE: &str = "local";

/// Everything a command needs, opened once per invocation.
pub struct AppContext {
    config: ConfigParameter,
    store: Arc<HistoryStore>,
    links: Arc<LinkRegistry>,
}

impl AppContext {
    pub fn open(config: ConfigParameter, remote: Option<Arc<dyn RemoteStore>>) -> Result<Self> {
        let db = open_database(config.database_path()).with_context(|| {
            format!(
                "Failed to open local cache at {}",
                config.database_path().display()
            )
        })?;
        let local = Arc::new(SledStorage::open_tree(&db, LOCAL_TREE, config.local_quota())?);

        let mut store = HistoryStore::new(LocalHistory::new(local.clone()))
            .with_max_entries(config.max_history())
            .with_remote_timeout(config.remote_timeout());
        if let Some(remote) = remote {
            store = store.with_remote(remote);
        }

        Ok(Self {
            config,
            store: Arc::new(store),
            links: Arc::new(LinkRegistry::new(local)),
        })
    }

    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut config = ConfigParameter::new();
        if let Some(ref data_dir) = cli.data_dir {
            config.set_data_dir(data_dir);
        }
        config.set_remote_timeout(cli.remote_timeout);
        config.set_local_quota(cli.parse_local_quota(config.local_quota()));

        let remote = if cli.remote_configured() {
            let mut drive = DriveRemote::new(cli.remote_token.clone());
            if let Some(ref base) = cli.remote_base {
                drive = drive.with_base_url(base);
            }
            Some(Arc::new(drive) as Arc<dyn RemoteStore>)
        } else {
            debug!("No remote store configured, using the local cache only");
            None
        };

        Self::open(config, remote)
    }

    pub fn config(&self) -> &ConfigParameter {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ConfigParameter {
        &mut self.config
    }

    pub fn store(&self) -> &Arc<HistoryStore> {
        &self.store
    }

    pub fn links(&self) -> &Arc<LinkRegistry> {
        &self.links
    }

    /// Capture pipeline over a recorded browser environment. The session id
    /// comes from the environment's own session storage.
    pub fn pipeline(&self, environment: &Path) -> Result<CapturePipeline> {
        let provider = SnapshotEnvironment::from_file(environment).with_context(|| {
            format!("Failed to load environment from {}", environment.display())
        })?;
        let session = SessionIdentity::from_provider(&provider);
        Ok(CapturePipeline::new(Arc::new(provider), session, Arc::clone(&self.store))
            .with_options(self.config.position_options()))
    }
}

pub async fn dispatch(cli: &Cli) -> Result<()> {
    let mut context = AppContext::from_cli(cli)?;

    match &cli.command {
        Commands::Capture(args) => capture::execute_capture(args, &mut context).await,
        Commands::Track(args) => capture::execute_track(args, &mut context).await,
        Commands::List(args) => history::execute_list(args, &context).await,
        Commands::Delete(args) => history::execute_delete(args, &context).await,
        Commands::Clear(args) => history::execute_clear(args, &context).await,
        Commands::Stats(args) => stats::execute(args, &context).await,
        Commands::Export(args) => output::execute(args, &context).await,
        Commands::Links(args) => links::execute(args, &context),
    }
}

fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

fn print_remote_leg(leg: &RemoteLeg) {
    match leg {
        RemoteLeg::Synced => print_success("Remote store updated"),
        RemoteLeg::Skipped => {}
        RemoteLeg::Pending => {
            print_warning("Remote store is slow, the update continues in the background")
        }
        RemoteLeg::Failed(reason) => print_warning(&format!(
            "Remote store not updated ({}), it will be republished on the next list",
            reason
        )),
    }
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

fn format_coordinates(latitude: f64, longitude: f64) -> String {
    format!("{:.6}, {:.6}", latitude, longitude)
}
