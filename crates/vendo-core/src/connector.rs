//! The seam between the sync orchestrator and provider clients.

use crate::error::Result;
use crate::provider::{ProviderKind, SyncCategory};

/// Core trait for provider clients driven by the sync orchestrator.
///
/// Implementations execute authenticated API calls against one provider.
/// The orchestrator never talks to a provider directly; it only sees this
/// trait, which keeps the per-category failure handling provider-agnostic
/// and makes scripted test doubles straightforward.
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    /// Which provider this connector talks to.
    fn provider(&self) -> ProviderKind;

    /// Whether this provider has a fetch operation for the category.
    fn supports(&self, category: SyncCategory) -> bool;

    /// Pull every item of one category from the provider.
    ///
    /// Returns the number of items retrieved. Errors are caught by the
    /// orchestrator and recorded per category; they never abort the run.
    async fn pull_category(&self, category: SyncCategory) -> Result<u64>;

    /// Cheap read-only connectivity probe.
    ///
    /// Never errors: any underlying failure maps to `false`.
    async fn test_connection(&self) -> bool;
}
