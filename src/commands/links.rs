// File: links.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use anyhow::Result;
use colored::*;

use super::{print_info, print_success, print_warning, AppContext};
use crate::cli::{LinkAction, LinksArgs};
use crate::links::{AppConfig, TrackingLink};

pub fn execute(args: &LinksArgs, context: &AppContext) -> Result<()> {
    let registry = context.links();

    match &args.action {
        LinkAction::List => display_links(&registry.config()?),
        LinkAction::Create { target } => {
            let link = registry.create(target.as_deref())?;
            print_success(&format!(
                "Created link {} -> {}",
                link.id().bold(),
                link.target_url()
            ));
            print_info(&format!("Share it as /track?id={}", link.id()));
        }
        LinkAction::Toggle { id } => {
            registry.toggle_active(id)?;
            match registry.get(id)? {
                Some(link) => print_success(&format!(
                    "Link {} is now {}",
                    id,
                    if link.active() { "active" } else { "inactive" }
                )),
                None => print_warning(&format!("No tracking link with id {}", id)),
            }
        }
        LinkAction::Delete { id } => {
            let existed = registry.get(id)?.is_some();
            registry.delete(id)?;
            if existed {
                print_success(&format!("Deleted link {}", id));
            } else {
                print_warning(&format!("No tracking link with id {}", id));
            }
        }
        LinkAction::Click { id } => {
            registry.increment_clicks(id)?;
            match registry.get(id)? {
                Some(link) => print_success(&format!(
                    "Recorded click on {} ({} total)",
                    id,
                    link.clicks()
                )),
                None => print_warning(&format!("No tracking link with id {}", id)),
            }
        }
        LinkAction::SetDefault { url } => {
            registry.set_default_target_url(url)?;
            print_success(&format!("Default redirect target set to {}", url));
        }
        LinkAction::SetTheme { theme } => {
            registry.set_theme(*theme)?;
            print_success(&format!("Theme set to {}", theme));
        }
        LinkAction::SetRefresh { enabled, interval } => {
            registry.set_auto_refresh(*enabled, *interval)?;
            print_success(&format!(
                "Auto-refresh {}",
                if *enabled { "enabled" } else { "disabled" }
            ));
        }
    }

    Ok(())
}

fn display_links(config: &AppConfig) {
    println!();
    println!("Default target:  {}", config.default_target_url.cyan());
    println!("Theme:           {}", config.theme);
    println!(
        "Auto-refresh:    {} (every {} s)",
        if config.auto_refresh { "on" } else { "off" },
        config.refresh_interval / 1000
    );
    println!();

    if config.tracking_links.is_empty() {
        print_warning("No tracking links yet");
        return;
    }

    println!(
        "{:<10} {:<40} {:>7} {:>9} {:<8} {}",
        "ID".bold(),
        "Target".bold(),
        "Clicks".bold(),
        "Captures".bold(),
        "Active".bold(),
        "Created".bold()
    );
    println!("{}", "─".repeat(100).bright_black());
    for link in &config.tracking_links {
        print_link(link);
    }
}

fn print_link(link: &TrackingLink) {
    let target = if link.target_url().len() > 40 {
        format!("{}...", link.target_url().chars().take(37).collect::<String>())
    } else {
        link.target_url().to_string()
    };
    let active = if link.active() {
        "yes".green()
    } else {
        "no".red()
    };

    println!(
        "{:<10} {:<40} {:>7} {:>9} {:<8} {}",
        link.id(),
        target,
        link.clicks(),
        link.captures(),
        active,
        link.created_at().format("%Y-%m-%d %H:%M")
    );
}
