#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod connector;
pub mod error;
pub mod integration;
pub mod provider;
pub mod token;

pub use connector::Connector;
pub use error::{BoxedError, Error, Result};
pub use integration::{
    IntegrationConfig, ProviderSettings, QuickbooksCategories, QuickbooksSettings,
    ShopifyCategories, ShopifySettings, SyncResult,
};
pub use provider::{Environment, ProviderKind, SyncCategory};
pub use token::TokenSet;
