//! allowlist-sync entry point.
//!
//! Keeps the managed part of a GitHub Enterprise IP allow list in line with
//! the address prefixes Azure publishes for a service tag.

use log::{error, info};
use tokio::signal;

mod config;
mod error;
mod executor;
mod github;
mod reconcile;
mod run;
mod scheduler;
mod tags;
mod types;

use config::{Config, ExecutionMode};
use github::GraphQlClient;
use run::{run_cycle, LogReporter, RunSettings};
use scheduler::run_periodically;
use tags::AzureServiceTags;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Load configuration; a missing setting stops here, before any network call
    let cfg = Config::load()?;
    let settings = RunSettings::from(&cfg);
    info!(
        "Starting allowlist-sync for enterprise {} in region {}",
        settings.account_slug, settings.region
    );

    match cfg.ip_allow_list_mode {
        ExecutionMode::WhatIf => info!(
            "Execution mode is: whatif - to run actual operation set env variable IP_ALLOW_LIST_MODE to execution"
        ),
        ExecutionMode::Execution => info!("** NOTICE: REAL MODE EXECUTION **"),
    }

    let client = GraphQlClient::new(cfg.github_graphql_url.clone(), cfg.github_token.clone())?;
    let provider = AzureServiceTags::new(
        cfg.azure_management_url.clone(),
        cfg.azure_subscription_id.clone(),
        cfg.azure_access_token.clone(),
    )?;
    let reporter = LogReporter;

    if cfg.run_once {
        run_cycle(&settings, &client, &provider, &reporter).await;
        return Ok(());
    }

    // Graceful Shutdown
    tokio::select! {
        _ = run_periodically(&settings, cfg.run_interval(), &client, &provider, &reporter) => {}
        result = signal::ctrl_c() => match result {
            Ok(()) => info!("Received Ctrl+C, shutting down..."),
            Err(err) => error!("Unable to listen for shutdown signal: {}", err),
        },
    }

    info!("Shutdown complete.");
    Ok(())
}
