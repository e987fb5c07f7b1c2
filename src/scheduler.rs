//! Periodic driver for [`run_cycle`].

use std::time::Duration;

use log::info;
use tokio::time::{interval, MissedTickBehavior};

use crate::github::AllowListClient;
use crate::run::{run_cycle, Reporter, RunSettings};
use crate::tags::DesiredSetProvider;

/// Runs a cycle immediately, then once per `every`. Never returns.
///
/// A cycle is awaited before the next tick is considered, so runs never
/// overlap; a cycle slower than `every` delays the following one.
pub async fn run_periodically(
    settings: &RunSettings,
    every: Duration,
    client: &dyn AllowListClient,
    provider: &dyn DesiredSetProvider,
    reporter: &dyn Reporter,
) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(
        "Scheduler started, running every {} minutes.",
        every.as_secs() / 60
    );

    loop {
        ticker.tick().await;
        info!("Running scheduled job...");
        run_cycle(settings, client, provider, reporter).await;
    }
}
