use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::SyncError;

/// Environment variables read without a prefix, kept compatible with the
/// container deployments that already set them.
const ENV_KEYS: &[&str] = &[
    "AZURE_SUBSCRIPTION_ID",
    "AZURE_ACCESS_TOKEN",
    "AZURE_MANAGEMENT_URL",
    "FABRIC_REGION",
    "GITHUB_ENTERPRISE",
    "GITHUB_TOKEN",
    "GITHUB_GRAPHQL_URL",
    "IP_ALLOW_LIST_MODE",
    "RUN_INTERVAL_MINUTES",
    "RUN_ONCE",
    "SERVICE_TAG",
    "ENTRY_PREFIX",
    "MAX_PAGES",
];

/// Whether mutations are sent to the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ExecutionMode {
    /// Compute and log the plan only.
    #[default]
    WhatIf,
    /// Apply the plan.
    Execution,
}

impl From<String> for ExecutionMode {
    fn from(value: String) -> Self {
        if value.trim().eq_ignore_ascii_case("execution") {
            ExecutionMode::Execution
        } else {
            ExecutionMode::WhatIf
        }
    }
}

impl ExecutionMode {
    pub fn is_dry_run(self) -> bool {
        self == ExecutionMode::WhatIf
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Subscription used to query the service tag catalog.
    pub azure_subscription_id: String,
    #[serde(skip_serializing, default)]
    pub azure_access_token: String,
    pub azure_management_url: String,
    pub fabric_region: String,
    pub github_enterprise: String,
    #[serde(skip_serializing, default)]
    pub github_token: String,
    pub github_graphql_url: String,
    pub ip_allow_list_mode: ExecutionMode,
    pub run_interval_minutes: u64,
    pub run_once: bool,
    pub service_tag: String,
    pub entry_prefix: String,
    pub max_pages: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            azure_subscription_id: String::new(),
            azure_access_token: String::new(),
            azure_management_url: "https://management.azure.com".into(),
            fabric_region: String::new(),
            github_enterprise: String::new(),
            github_token: String::new(),
            github_graphql_url: "https://api.github.com/graphql".into(),
            ip_allow_list_mode: ExecutionMode::WhatIf,
            run_interval_minutes: 60,
            run_once: false,
            service_tag: "PowerBI".into(),
            entry_prefix: "Fabric".into(),
            max_pages: 1000,
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("allowlist-sync.toml"))
            .merge(Json::file("allowlist-sync.json"))
            .merge(Env::raw().only(ENV_KEYS));

        let mut config = Self::from_figment(figment)?;

        // Support Docker-style secrets
        if let Ok(secret_file) = std::env::var("GITHUB_TOKEN_FILE") {
            config.github_token = std::fs::read_to_string(secret_file)?.trim().to_string();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_figment(figment: Figment) -> anyhow::Result<Self> {
        figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
    }

    /// Rejects a configuration that cannot drive a single run.
    pub fn validate(&self) -> Result<(), SyncError> {
        let required = [
            (
                &self.azure_subscription_id,
                "AZURE_SUBSCRIPTION_ID environment variable is required.",
            ),
            (
                &self.fabric_region,
                "FABRIC_REGION environment variable is required - your fabric home tenant region.",
            ),
            (
                &self.github_enterprise,
                "GITHUB_ENTERPRISE environment variable is required - your GitHub Enterprise slug, e.g. 'my-company'.",
            ),
            (
                &self.github_token,
                "GITHUB_TOKEN environment variable is required. PAT scope require: admin:enterprise, read:org",
            ),
            (
                &self.azure_access_token,
                "AZURE_ACCESS_TOKEN environment variable is required - a Resource Manager bearer token.",
            ),
        ];
        for (value, message) in required {
            if value.trim().is_empty() {
                return Err(SyncError::Configuration(message.into()));
            }
        }
        if self.run_interval_minutes == 0 {
            return Err(SyncError::Configuration(
                "RUN_INTERVAL_MINUTES must be at least 1".into(),
            ));
        }
        if self.max_pages == 0 {
            return Err(SyncError::Configuration(
                "MAX_PAGES must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Service tag id whose prefixes form the desired set, e.g. `powerbi.eastus`.
    pub fn service_tag_id(&self) -> String {
        format!("{}.{}", self.service_tag, self.fabric_region).to_lowercase()
    }

    /// Name prefix of the entries this tool owns, e.g. `fabric.eastus`.
    pub fn tag_prefix(&self) -> String {
        format!("{}.{}", self.entry_prefix, self.fabric_region).to_lowercase()
    }

    pub fn run_interval(&self) -> Duration {
        Duration::from_secs(self.run_interval_minutes * 60)
    }
}
