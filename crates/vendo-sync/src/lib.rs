#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

//! # vendo-sync
//!
//! Registry, orchestrator, and service facade.
//!
//! ## Quick Start
//!
//! ```ignore
//! use vendo_core::ProviderKind;
//! use vendo_sync::{IntegrationRegistry, IntegrationService, IntegrationStore};
//!
//! #[tokio::main]
//! async fn main() -> vendo_core::Result<()> {
//!     let store = IntegrationStore::new("integrations.json");
//!     let registry = IntegrationRegistry::load(store).await?;
//!     let service = IntegrationService::new(registry);
//!
//!     let result = service.sync(ProviderKind::Shopify).await?;
//!     println!("synced {} items", result.synced_items);
//!
//!     Ok(())
//! }
//! ```

// Tracing targets for observability
/// Logging target for store persistence operations.
pub const STORE_TARGET: &str = "vendo_sync::store";

/// Logging target for registry mutations.
pub const REGISTRY_TARGET: &str = "vendo_sync::registry";

/// Logging target for sync runs.
pub const SYNC_TARGET: &str = "vendo_sync::orchestrator";

/// Logging target for the service facade.
pub const SERVICE_TARGET: &str = "vendo_sync::service";

pub mod orchestrator;
pub mod registry;
pub mod service;
pub mod store;

pub use orchestrator::SyncOrchestrator;
pub use registry::IntegrationRegistry;
pub use service::{ConnectCredentials, IntegrationService, ServiceConfig};
pub use store::{IntegrationStore, StoreDocument, STORE_VERSION};

pub use vendo_core::{Error, Result};
