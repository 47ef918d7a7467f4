#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

//! # vendo-shopify
//!
//! Shopify (commerce) connector.
//!
//! ## Quick Start
//!
//! ```ignore
//! use vendo_shopify::{ShopClient, ShopConfig};
//!
//! #[tokio::main]
//! async fn main() -> vendo_core::Result<()> {
//!     let config = ShopConfig::new()
//!         .with_shop_domain("demo-store.myshopify.com")
//!         .with_access_token("shpat_...");
//!
//!     let client = ShopClient::new(config)?;
//!     let products = client.fetch_products().await?;
//!     println!("{} products", products.len());
//!
//!     Ok(())
//! }
//! ```

// Tracing targets for observability
/// Logging target for Shopify Admin API client operations.
pub const SHOPIFY_TARGET: &str = "vendo_shopify::client";

/// Logging target for OAuth2 token operations.
pub const AUTH_TARGET: &str = "vendo_shopify::auth";

pub mod auth;
pub mod client;

pub use auth::ShopAuthorizer;
pub use client::{ShopClient, ShopConfig, ShopPager};

pub use vendo_core::{Error, Result};
