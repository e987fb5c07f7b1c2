use async_trait::async_trait;

use crate::error::SyncResult;

pub mod azure;
pub use azure::AzureServiceTags;

/// Source of truth for the ranges the allow-list should contain.
#[async_trait]
pub trait DesiredSetProvider: Send + Sync {
    /// Returns every address prefix currently published under `tag_id`
    /// (e.g. `powerbi.eastus`) in `region`, in publication order.
    async fn desired_ranges(&self, region: &str, tag_id: &str) -> SyncResult<Vec<String>>;
}
