use async_trait::async_trait;
use log::{info, warn};

use crate::error::{SyncError, SyncResult};
use crate::types::{AccountInfo, RemoteEntry};

pub mod graphql;
pub use graphql::GraphQlClient;

/// Entries requested per listing call.
pub const PAGE_SIZE: usize = 100;

/// One page of the remote allow-list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryPage {
    pub nodes: Vec<RemoteEntry>,
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

/// Result of a single listing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryListing {
    Page(EntryPage),
    /// The account exposes no allow-list: the feature is disabled or the
    /// credential may not read it.
    Unavailable,
}

/// Transport to the remote allow-list.
#[async_trait]
pub trait AllowListClient: Send + Sync {
    /// Resolves the account slug to its id and display name.
    async fn fetch_account_info(&self, account_slug: &str) -> SyncResult<AccountInfo>;

    /// Fetches one page of at most [`PAGE_SIZE`] entries after `cursor`.
    async fn list_entries(
        &self,
        account_slug: &str,
        cursor: Option<&str>,
    ) -> SyncResult<EntryListing>;

    /// Creates an active entry. A rejection comes back as
    /// [`SyncError::Operation`].
    async fn create_entry(
        &self,
        account_id: &str,
        value: &str,
        name: &str,
        active: bool,
    ) -> SyncResult<RemoteEntry>;

    async fn delete_entry(&self, entry_id: &str) -> SyncResult<()>;
}

/// Follows the listing cursor until the remote reports no further page.
///
/// Nodes are returned in page order. Fails with [`SyncError::Protocol`] once
/// `max_pages` pages were read and the remote still claims more.
pub async fn list_all_entries(
    client: &dyn AllowListClient,
    account_slug: &str,
    max_pages: usize,
) -> SyncResult<Vec<RemoteEntry>> {
    let mut entries = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0;

    loop {
        if pages == max_pages {
            return Err(SyncError::Protocol(format!(
                "allow-list pagination did not terminate after {} pages",
                max_pages
            )));
        }

        let page = match client.list_entries(account_slug, cursor.as_deref()).await? {
            EntryListing::Page(page) => page,
            EntryListing::Unavailable => {
                warn!(
                    "No ownerInfo found for {} - the IP allow list might not be enabled or the token lacks permission",
                    account_slug
                );
                break;
            }
        };
        pages += 1;

        let fetched = page.nodes.len();
        entries.extend(page.nodes);
        info!(
            "Fetched {} entries, total so far: {}",
            fetched,
            entries.len()
        );

        if !page.has_next_page {
            break;
        }
        match page.end_cursor {
            Some(next) => cursor = Some(next),
            None => {
                return Err(SyncError::Protocol(
                    "page reports more entries but carries no end cursor".into(),
                ))
            }
        }
    }

    Ok(entries)
}
