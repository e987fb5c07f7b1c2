//! Applies a [`ReconciliationPlan`] through an [`AllowListClient`].
//!
//! Deletions run before creations, each in plan order. A failed mutation is
//! recorded and the batch continues; nothing is retried within a run since
//! the next run's plan proposes the same mutation again.

use log::{error, info};

use crate::config::ExecutionMode;
use crate::github::AllowListClient;
use crate::types::{AccountInfo, ExecutionSummary, FailedMutation, ReconciliationPlan};

pub async fn apply(
    plan: &ReconciliationPlan,
    account: &AccountInfo,
    client: &dyn AllowListClient,
    mode: ExecutionMode,
) -> ExecutionSummary {
    if mode.is_dry_run() {
        for stale in &plan.to_delete {
            info!(
                "[whatif] Would delete entry: {} - {}",
                stale.entry.name(),
                stale.entry.value
            );
        }
        for planned in &plan.to_create {
            info!("[whatif] Would add IP range: {} - {}", planned.name, planned.ip);
        }
        return ExecutionSummary {
            created: plan.to_create.len(),
            deleted: plan.to_delete.len(),
            unchanged: plan.unchanged,
            dry_run: true,
            ..Default::default()
        };
    }

    let mut summary = ExecutionSummary {
        unchanged: plan.unchanged,
        ..Default::default()
    };

    for stale in &plan.to_delete {
        let entry = &stale.entry;
        info!("Deleting existing entry: {} - {}", entry.name(), entry.value);
        match client.delete_entry(&entry.id).await {
            Ok(()) => {
                info!("Successfully deleted: {}", entry.value);
                summary.deleted += 1;
            }
            Err(e) => {
                error!("Error deleting entry {}: {}", entry.name(), e);
                summary.delete_failed += 1;
                summary.failed_deletes.push(FailedMutation {
                    name: entry.name().to_string(),
                    value: entry.value.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    for planned in &plan.to_create {
        info!("Adding IP range: {} - {}", planned.name, planned.ip);
        match client
            .create_entry(&account.id, &planned.ip, &planned.name, true)
            .await
        {
            Ok(created) => {
                info!("Successfully added: {} ({})", created.value, created.id);
                summary.created += 1;
            }
            Err(e) => {
                error!("Error adding IP range {}: {}", planned.ip, e);
                summary.failed += 1;
                summary.failed_creates.push(FailedMutation {
                    name: planned.name.clone(),
                    value: planned.ip.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    summary
}
