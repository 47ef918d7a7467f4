//! The sync orchestrator: sequential, partial-failure-tolerant category
//! runs.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};
use vendo_core::{Connector, IntegrationConfig, SyncResult};

use crate::SYNC_TARGET;

/// Default overall budget for one sync run.
pub const DEFAULT_SYNC_BUDGET: Duration = Duration::from_secs(300);

/// Drives one connector through every enabled sync category.
///
/// Categories run strictly sequentially, in the order the provider's
/// settings declare. A category failure is caught locally, recorded as a
/// human-readable string, and never aborts the remaining categories. The
/// whole run is bounded by a wall-clock budget: once it is spent, the
/// remaining categories are marked failed instead of hanging.
#[derive(Debug, Clone)]
pub struct SyncOrchestrator {
    budget: Duration,
}

impl SyncOrchestrator {
    /// Create an orchestrator with the default sync budget.
    pub fn new() -> Self {
        Self {
            budget: DEFAULT_SYNC_BUDGET,
        }
    }

    /// Set the overall wall-clock budget for one run.
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    /// Run every enabled category of `config` against `connector`.
    ///
    /// Never errors: failures are aggregated into the returned
    /// [`SyncResult`]. `success` is true only when every category
    /// succeeded; `synced_items` counts what the succeeding categories
    /// pulled either way.
    pub async fn sync_with(
        &self,
        connector: &dyn Connector,
        config: &IntegrationConfig,
    ) -> SyncResult {
        let categories = config.settings.enabled_categories();
        let deadline = Instant::now() + self.budget;

        debug!(
            target: SYNC_TARGET,
            provider = %connector.provider(),
            categories = categories.len(),
            "Starting sync run"
        );

        let mut synced_items = 0u64;
        let mut errors = Vec::new();

        for category in categories {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!(
                    target: SYNC_TARGET,
                    category = %category,
                    "Sync budget exhausted before category started"
                );
                errors.push(format!(
                    "{} sync failed: sync budget exhausted",
                    category.label()
                ));
                continue;
            }

            match tokio::time::timeout(remaining, connector.pull_category(category)).await {
                Ok(Ok(count)) => {
                    debug!(
                        target: SYNC_TARGET,
                        category = %category,
                        count,
                        "Category synced"
                    );
                    synced_items += count;
                }
                Ok(Err(err)) => {
                    warn!(
                        target: SYNC_TARGET,
                        category = %category,
                        error = %err,
                        "Category sync failed"
                    );
                    errors.push(format!("{} sync failed: {}", category.label(), err.detail()));
                }
                Err(_) => {
                    warn!(
                        target: SYNC_TARGET,
                        category = %category,
                        "Category sync exceeded the remaining budget"
                    );
                    errors.push(format!(
                        "{} sync failed: sync budget exhausted",
                        category.label()
                    ));
                }
            }
        }

        let result = SyncResult::from_run(synced_items, errors);
        if result.success {
            info!(
                target: SYNC_TARGET,
                provider = %connector.provider(),
                synced_items = result.synced_items,
                "Sync run completed"
            );
        } else {
            warn!(
                target: SYNC_TARGET,
                provider = %connector.provider(),
                synced_items = result.synced_items,
                failed_categories = result.errors.len(),
                "Sync run completed with errors"
            );
        }

        result
    }
}

impl Default for SyncOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}
