#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

//! # vendo-quickbooks
//!
//! QuickBooks Online (accounting) connector.
//!
//! ## Quick Start
//!
//! ```ignore
//! use vendo_quickbooks::{QbClient, QbConfig};
//!
//! #[tokio::main]
//! async fn main() -> vendo_core::Result<()> {
//!     let config = QbConfig::new()
//!         .with_client_id("app-id")
//!         .with_client_secret("app-secret")
//!         .with_access_token("at")
//!         .with_refresh_token("rt")
//!         .with_realm_id("9130357849");
//!
//!     let client = QbClient::new(config)?;
//!     let customers = client.fetch_customers().await?;
//!     println!("{} customers", customers.len());
//!
//!     Ok(())
//! }
//! ```

// Tracing targets for observability
/// Logging target for QuickBooks API client operations.
pub const QUICKBOOKS_TARGET: &str = "vendo_quickbooks::client";

/// Logging target for OAuth2 token operations.
pub const AUTH_TARGET: &str = "vendo_quickbooks::auth";

pub mod auth;
pub mod client;

pub use auth::QbAuthorizer;
pub use client::{QbClient, QbConfig, QbPager};

pub use vendo_core::{Error, Result};
