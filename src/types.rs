//! Data structures shared by the reconciliation engine.
//!
//! Remote records are deserialised straight from the GitHub GraphQL
//! responses; everything else lives for a single reconciliation run and
//! is never persisted. The remote allow-list is the only source of truth
//! for prior state.

use serde::Deserialize;

/// The GitHub Enterprise account that owns the allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountInfo {
    /// Global node id, used as `ownerId` when creating entries.
    pub id: String,
    pub name: String,
    pub slug: String,
}

/// An allow-list entry as stored by the remote.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteEntry {
    pub id: String,
    /// Entries created outside this tool may carry no name at all.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "allowListValue")]
    pub value: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl RemoteEntry {
    /// Returns the entry name, or an empty string for unnamed entries.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

/// A remote entry inside the managed namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedEntry {
    pub entry: RemoteEntry,
    /// Set once a desired range with the same value claims this entry.
    pub matched: bool,
}

impl ManagedEntry {
    /// Wraps a remote entry, trimming its value for comparison.
    pub fn new(mut entry: RemoteEntry) -> Self {
        entry.value = entry.value.trim().to_string();
        Self {
            entry,
            matched: false,
        }
    }
}

/// A range the allow-list should contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredEntry {
    pub ip: String,
    /// Set once a managed remote entry with the same value is found.
    pub matched: bool,
}

impl DesiredEntry {
    pub fn new(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            matched: false,
        }
    }
}

/// A desired range that has to be created, with its assigned name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedEntry {
    pub ip: String,
    pub name: String,
    /// 1-based position in the full desired ordering.
    pub index: usize,
}

/// The mutations needed to make the managed namespace match the desired set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationPlan {
    pub to_delete: Vec<ManagedEntry>,
    pub to_create: Vec<PlannedEntry>,
    pub unchanged: usize,
}

impl ReconciliationPlan {
    pub fn is_empty(&self) -> bool {
        self.to_delete.is_empty() && self.to_create.is_empty()
    }
}

/// Per-entry failure recorded by the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedMutation {
    pub name: String,
    pub value: String,
    pub reason: String,
}

/// Counts reported after the plan was applied (or simulated).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionSummary {
    pub created: usize,
    pub failed: usize,
    pub deleted: usize,
    pub delete_failed: usize,
    pub unchanged: usize,
    /// True when nothing was sent to the remote.
    pub dry_run: bool,
    pub failed_creates: Vec<FailedMutation>,
    pub failed_deletes: Vec<FailedMutation>,
}
