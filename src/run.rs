//! One reconciliation cycle, end to end.
//!
//! fetch account -> list every entry -> fetch desired ranges -> plan ->
//! apply -> report. Errors before the apply stage abort the cycle; they are
//! handed to the [`Reporter`] and never escape [`run_cycle`], so the
//! scheduler always gets a fresh attempt on the next tick.

use std::time::{Duration, Instant};

use log::{error, info, warn};

use crate::config::{Config, ExecutionMode};
use crate::error::{SyncError, SyncResult};
use crate::executor;
use crate::github::{list_all_entries, AllowListClient};
use crate::reconcile::{compute_plan, managed_entries};
use crate::tags::DesiredSetProvider;
use crate::types::{AccountInfo, DesiredEntry, ExecutionSummary, ReconciliationPlan};

/// Per-run parameters derived from the configuration.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub account_slug: String,
    pub region: String,
    /// Service tag whose prefixes are desired, e.g. `powerbi.eastus`.
    pub service_tag_id: String,
    /// Namespace of the managed entries, e.g. `fabric.eastus`.
    pub tag_prefix: String,
    pub max_pages: usize,
    pub mode: ExecutionMode,
}

impl From<&Config> for RunSettings {
    fn from(config: &Config) -> Self {
        Self {
            account_slug: config.github_enterprise.clone(),
            region: config.fabric_region.clone(),
            service_tag_id: config.service_tag_id(),
            tag_prefix: config.tag_prefix(),
            max_pages: config.max_pages,
            mode: config.ip_allow_list_mode,
        }
    }
}

#[derive(Debug)]
pub enum RunOutcome {
    Completed {
        account: AccountInfo,
        summary: ExecutionSummary,
    },
    Aborted(SyncError),
}

/// Receives the progress of each run.
pub trait Reporter: Send + Sync {
    fn started(&self, settings: &RunSettings);

    /// Called once the plan is known, before anything is applied.
    fn planned(
        &self,
        account: &AccountInfo,
        remote_total: usize,
        managed_total: usize,
        plan: &ReconciliationPlan,
    );

    /// Called exactly once per run, whatever the outcome.
    fn finished(&self, outcome: &RunOutcome, elapsed: Duration);
}

/// Writes run progress through the `log` facade.
pub struct LogReporter;

impl Reporter for LogReporter {
    fn started(&self, settings: &RunSettings) {
        info!(
            "Start allow list update for {} ({} -> {})",
            settings.account_slug, settings.service_tag_id, settings.tag_prefix
        );
    }

    fn planned(
        &self,
        account: &AccountInfo,
        remote_total: usize,
        managed_total: usize,
        plan: &ReconciliationPlan,
    ) {
        info!(
            "Enterprise: {} ({}) Enterprise ID: {}",
            account.name, account.slug, account.id
        );
        info!("Current count of IP allow list entries configured: {}", remote_total);
        info!("Current count of managed IP allow list entries: {}", managed_total);
        info!("Unchanged {} managed IP allow list entries", plan.unchanged);
        info!("Need to add: {} managed IP allow list entries", plan.to_create.len());
        info!("Need to delete: {} managed IP allow list entries", plan.to_delete.len());
        if plan.is_empty() {
            info!("Managed entries already match the desired ranges");
        }
    }

    fn finished(&self, outcome: &RunOutcome, elapsed: Duration) {
        match outcome {
            RunOutcome::Completed { account, summary } => {
                let label = if summary.dry_run { "planned (whatif)" } else { "updated" };
                info!("IP allow list of {} {}", account.slug, label);
                info!("   Unchanged: {}", summary.unchanged);
                info!("   Added: {} Failed: {}", summary.created, summary.failed);
                info!("   Removed: {} Failed: {}", summary.deleted, summary.delete_failed);
                for failed in &summary.failed_creates {
                    warn!(
                        "   Not added: {} - {} ({})",
                        failed.name, failed.value, failed.reason
                    );
                }
                for failed in &summary.failed_deletes {
                    warn!(
                        "   Not removed: {} - {} ({})",
                        failed.name, failed.value, failed.reason
                    );
                }
            }
            RunOutcome::Aborted(err) => {
                error!("Error updating IP allow list: {}", err);
                info!("   Unchanged: 0");
                info!("   Added: 0 Failed: 0");
                info!("   Removed: 0 Failed: 0");
            }
        }
        info!("End allow list update after {:.1}s", elapsed.as_secs_f64());
    }
}

/// Runs one cycle; every error ends up in the returned outcome.
pub async fn run_cycle(
    settings: &RunSettings,
    client: &dyn AllowListClient,
    provider: &dyn DesiredSetProvider,
    reporter: &dyn Reporter,
) -> RunOutcome {
    let started = Instant::now();
    reporter.started(settings);

    let outcome = match reconcile(settings, client, provider, reporter).await {
        Ok((account, summary)) => RunOutcome::Completed { account, summary },
        Err(e) => RunOutcome::Aborted(e),
    };

    reporter.finished(&outcome, started.elapsed());
    outcome
}

async fn reconcile(
    settings: &RunSettings,
    client: &dyn AllowListClient,
    provider: &dyn DesiredSetProvider,
    reporter: &dyn Reporter,
) -> SyncResult<(AccountInfo, ExecutionSummary)> {
    let account = client.fetch_account_info(&settings.account_slug).await?;
    let remote = list_all_entries(client, &settings.account_slug, settings.max_pages).await?;
    let mut desired: Vec<DesiredEntry> = provider
        .desired_ranges(&settings.region, &settings.service_tag_id)
        .await?
        .into_iter()
        .map(DesiredEntry::new)
        .collect();

    let plan = compute_plan(&mut desired, &remote, &settings.tag_prefix);
    let managed_total = managed_entries(&remote, &settings.tag_prefix).len();
    reporter.planned(&account, remote.len(), managed_total, &plan);

    let summary = executor::apply(&plan, &account, client, settings.mode).await;
    Ok((account, summary))
}
