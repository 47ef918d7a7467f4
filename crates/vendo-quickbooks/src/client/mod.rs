//! QuickBooks API client, configuration, and pagination.

mod qb_client;
mod qb_config;
mod qb_pager;

pub use qb_client::QbClient;
pub use qb_config::QbConfig;
pub use qb_pager::QbPager;
