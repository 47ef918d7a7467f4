//! Shopify Admin API client, configuration, and pagination.

mod shop_client;
mod shop_config;
mod shop_pager;

pub use shop_client::ShopClient;
pub use shop_config::ShopConfig;
pub use shop_pager::ShopPager;
