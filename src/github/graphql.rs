//! GitHub GraphQL implementation of [`AllowListClient`].
//!
//! Every call is a `POST` of `{query, variables}` to the GraphQL endpoint.
//! Responses are decoded in two steps: the raw body must be JSON (otherwise
//! the call failed in transport), then the `data` member must match the
//! typed records below (otherwise the remote broke the protocol). The
//! account lookup is the exception: a malformed enterprise record counts as
//! a transport failure there.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{AllowListClient, EntryListing, EntryPage, PAGE_SIZE};
use crate::error::{OperationError, RemoteError, SyncError, SyncResult};
use crate::types::{AccountInfo, RemoteEntry};

/// Timeout applied to every request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const ACCOUNT_QUERY: &str = r#"
query($slug: String!) {
  enterprise(slug: $slug) {
    id
    slug
    name
  }
}
"#;

const LIST_QUERY: &str = r#"
query($slug: String!, $first: Int!, $cursor: String) {
  enterprise(slug: $slug) {
    ownerInfo {
      ipAllowListEntries(first: $first, after: $cursor) {
        pageInfo {
          endCursor
          hasNextPage
        }
        nodes {
          id
          name
          createdAt
          updatedAt
          isActive
          allowListValue
        }
      }
    }
  }
}
"#;

const CREATE_MUTATION: &str = r#"
mutation($input: CreateIpAllowListEntryInput!) {
  createIpAllowListEntry(input: $input) {
    ipAllowListEntry {
      id
      allowListValue
      name
      isActive
      createdAt
      updatedAt
    }
  }
}
"#;

const DELETE_MUTATION: &str = r#"
mutation($input: DeleteIpAllowListEntryInput!) {
  deleteIpAllowListEntry(input: $input) {
    ipAllowListEntry {
      id
    }
  }
}
"#;

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<RemoteError>>,
}

#[derive(Debug, Deserialize)]
struct AccountData {
    enterprise: Option<AccountInfo>,
}

#[derive(Debug, Deserialize)]
struct ListData {
    enterprise: Option<ListEnterprise>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListEnterprise {
    #[serde(default)]
    owner_info: Option<OwnerInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OwnerInfo {
    ip_allow_list_entries: EntryConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntryConnection {
    page_info: PageInfo,
    nodes: Vec<RemoteEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    end_cursor: Option<String>,
    has_next_page: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateData {
    create_ip_allow_list_entry: Option<EntryPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntryPayload {
    ip_allow_list_entry: Option<RemoteEntry>,
}

pub struct GraphQlClient {
    http_client: reqwest::Client,
    endpoint: String,
    token: String,
}

impl GraphQlClient {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> SyncResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SyncError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
            token: token.into(),
        })
    }

    /// Sends one GraphQL document and returns the decoded envelope.
    async fn execute(&self, query: &str, variables: Value) -> SyncResult<Envelope> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SyncError::Transport(format!(
                "GitHub API error: {} - {}",
                status, body
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| SyncError::Transport(format!("malformed GitHub API response: {}", e)))
    }
}

fn decode<T: DeserializeOwned>(data: Option<Value>, what: &str) -> SyncResult<T> {
    let data = data.ok_or_else(|| SyncError::Protocol(format!("{} response has no data", what)))?;
    serde_json::from_value(data)
        .map_err(|e| SyncError::Protocol(format!("unexpected {} response shape: {}", what, e)))
}

fn describe(errors: &[RemoteError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

#[async_trait]
impl AllowListClient for GraphQlClient {
    async fn fetch_account_info(&self, account_slug: &str) -> SyncResult<AccountInfo> {
        let envelope = self
            .execute(ACCOUNT_QUERY, json!({ "slug": account_slug }))
            .await?;
        let errors = envelope.errors.unwrap_or_default();

        let account = match envelope.data {
            Some(data) => serde_json::from_value::<AccountData>(data)
                .map_err(|e| {
                    SyncError::Transport(format!("malformed enterprise response: {}", e))
                })?
                .enterprise,
            None => None,
        };
        match account {
            Some(account) if errors.is_empty() => Ok(account),
            Some(_) => Err(SyncError::Protocol(format!(
                "GraphQL errors: {}",
                describe(&errors)
            ))),
            None => {
                let mut message = format!(
                    "Enterprise '{}' not found or you don't have access to it",
                    account_slug
                );
                if !errors.is_empty() {
                    message = format!("{} ({})", message, describe(&errors));
                }
                Err(SyncError::NotFound(message))
            }
        }
    }

    async fn list_entries(
        &self,
        account_slug: &str,
        cursor: Option<&str>,
    ) -> SyncResult<EntryListing> {
        debug!("Listing allow-list entries after cursor {:?}", cursor);
        let envelope = self
            .execute(
                LIST_QUERY,
                json!({ "slug": account_slug, "first": PAGE_SIZE, "cursor": cursor }),
            )
            .await?;
        if let Some(errors) = envelope.errors.filter(|e| !e.is_empty()) {
            return Err(SyncError::Protocol(format!(
                "GraphQL errors: {}",
                describe(&errors)
            )));
        }

        let data: ListData = decode(envelope.data, "allow-list")?;
        let enterprise = data.enterprise.ok_or_else(|| {
            SyncError::Protocol("allow-list response has no enterprise".into())
        })?;
        let Some(owner_info) = enterprise.owner_info else {
            return Ok(EntryListing::Unavailable);
        };

        let connection = owner_info.ip_allow_list_entries;
        Ok(EntryListing::Page(EntryPage {
            nodes: connection.nodes,
            end_cursor: connection.page_info.end_cursor,
            has_next_page: connection.page_info.has_next_page,
        }))
    }

    async fn create_entry(
        &self,
        account_id: &str,
        value: &str,
        name: &str,
        active: bool,
    ) -> SyncResult<RemoteEntry> {
        let envelope = self
            .execute(
                CREATE_MUTATION,
                json!({
                    "input": {
                        "ownerId": account_id,
                        "allowListValue": value,
                        "name": name,
                        "isActive": active,
                    }
                }),
            )
            .await?;
        if let Some(errors) = envelope.errors.filter(|e| !e.is_empty()) {
            return Err(OperationError::new(errors).into());
        }

        let data: CreateData = decode(envelope.data, "createIpAllowListEntry")?;
        data.create_ip_allow_list_entry
            .and_then(|payload| payload.ip_allow_list_entry)
            .ok_or_else(|| SyncError::Protocol("createIpAllowListEntry returned no entry".into()))
    }

    async fn delete_entry(&self, entry_id: &str) -> SyncResult<()> {
        let envelope = self
            .execute(
                DELETE_MUTATION,
                json!({ "input": { "ipAllowListEntryId": entry_id } }),
            )
            .await?;
        if let Some(errors) = envelope.errors.filter(|e| !e.is_empty()) {
            return Err(OperationError::new(errors).into());
        }
        Ok(())
    }
}
