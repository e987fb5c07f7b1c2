//! Azure Resource Manager service tag lookup.
//!
//! Calls the `Microsoft.Network/locations/{region}/serviceTags` endpoint and
//! picks the address prefixes of the tag whose id matches, ignoring case.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::Deserialize;

use super::DesiredSetProvider;
use crate::error::{SyncError, SyncResult};

const API_VERSION: &str = "2023-09-01";

#[derive(Debug, Deserialize)]
struct ServiceTagList {
    values: Vec<ServiceTag>,
}

#[derive(Debug, Deserialize)]
struct ServiceTag {
    id: String,
    properties: ServiceTagProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceTagProperties {
    #[serde(default)]
    address_prefixes: Vec<String>,
}

pub struct AzureServiceTags {
    http_client: reqwest::Client,
    management_url: String,
    subscription_id: String,
    token: String,
}

impl AzureServiceTags {
    pub fn new(
        management_url: impl Into<String>,
        subscription_id: impl Into<String>,
        token: impl Into<String>,
    ) -> SyncResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SyncError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            management_url: management_url.into().trim_end_matches('/').to_string(),
            subscription_id: subscription_id.into(),
            token: token.into(),
        })
    }

    fn url(&self, region: &str) -> String {
        format!(
            "{}/subscriptions/{}/providers/Microsoft.Network/locations/{}/serviceTags",
            self.management_url, self.subscription_id, region
        )
    }
}

#[async_trait]
impl DesiredSetProvider for AzureServiceTags {
    async fn desired_ranges(&self, region: &str, tag_id: &str) -> SyncResult<Vec<String>> {
        info!("Fetching {} IP ranges from Azure Service Tags...", tag_id);
        let response = self
            .http_client
            .get(self.url(region))
            .query(&[("api-version", API_VERSION)])
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SyncError::Transport(format!(
                "Azure API error: {} - {}",
                status, body
            )));
        }
        let list: ServiceTagList = serde_json::from_str(&body)
            .map_err(|e| SyncError::Protocol(format!("unexpected service tag response: {}", e)))?;

        let ranges: Vec<String> = list
            .values
            .into_iter()
            .filter(|tag| tag.id.eq_ignore_ascii_case(tag_id))
            .flat_map(|tag| tag.properties.address_prefixes)
            .collect();

        if ranges.is_empty() {
            warn!("Service tag {} publishes no address prefixes in {}", tag_id, region);
        } else {
            info!("Found {} {} IP ranges", ranges.len(), tag_id);
            for range in &ranges {
                debug!("  - {}", range);
            }
        }
        Ok(ranges)
    }
}
