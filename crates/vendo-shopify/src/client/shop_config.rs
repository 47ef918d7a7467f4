//! Configuration for the Shopify Admin API client.

use std::time::Duration;

use url::Url;
use vendo_core::{Error, Result, ShopifySettings};

/// Admin API version the client speaks by default.
pub const DEFAULT_API_VERSION: &str = "2024-01";

/// Configuration for [`ShopClient`](crate::ShopClient).
#[derive(Debug, Clone)]
pub struct ShopConfig {
    /// Shop domain, e.g. `demo-store.myshopify.com`
    shop_domain: Option<String>,

    /// App API key
    api_key: Option<String>,

    /// App API secret
    api_secret: Option<String>,

    /// Offline access token
    access_token: Option<String>,

    /// Admin API version segment
    api_version: String,

    /// Base URL override (test servers)
    base_url: Option<Url>,

    /// Request timeout duration
    timeout: Duration,

    /// Items requested per page
    page_size: u32,

    /// Safety cap on pages fetched per resource
    max_pages: u32,

    /// User agent string for HTTP requests
    user_agent: String,
}

impl ShopConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self {
            shop_domain: None,
            api_key: None,
            api_secret: None,
            access_token: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            base_url: None,
            timeout: Duration::from_secs(30),
            page_size: 50,
            max_pages: 10,
            user_agent: format!("vendo-shopify/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Build a configuration from stored integration settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when a field required for
    /// authenticated API access is missing.
    pub fn from_settings(settings: &ShopifySettings) -> Result<Self> {
        let required = |field: &Option<String>, name: &str| -> Result<String> {
            field
                .clone()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| Error::configuration(format!("Shopify {name} is not set")))
        };

        Ok(Self::new()
            .with_shop_domain(required(&settings.shop_domain, "shop domain")?)
            .with_api_key(required(&settings.api_key, "api key")?)
            .with_api_secret(required(&settings.api_secret, "api secret")?)
            .with_access_token(required(&settings.access_token, "access token")?))
    }

    /// Get the shop domain.
    pub fn shop_domain(&self) -> Option<&str> {
        self.shop_domain.as_deref()
    }

    /// Get the app API key.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Get the app API secret.
    pub fn api_secret(&self) -> Option<&str> {
        self.api_secret.as_deref()
    }

    /// Get the offline access token.
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Get the Admin API version segment.
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Resolve the base URL for API calls.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when no override is set and the
    /// shop domain is missing or unparsable.
    pub fn base_url(&self) -> Result<Url> {
        if let Some(base) = &self.base_url {
            return Ok(base.clone());
        }

        let domain = self
            .shop_domain
            .as_deref()
            .ok_or_else(|| Error::configuration("Shopify shop domain is not set"))?;

        Url::parse(&format!("https://{domain}"))
            .map_err(|e| Error::configuration(format!("invalid shop domain '{domain}': {e}")))
    }

    /// Get the request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Get the page size for paged retrieval.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Get the safety cap on pages fetched per resource.
    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    /// Get the user agent string.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Set the shop domain.
    pub fn with_shop_domain(mut self, shop_domain: impl Into<String>) -> Self {
        self.shop_domain = Some(shop_domain.into());
        self
    }

    /// Set the app API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the app API secret.
    pub fn with_api_secret(mut self, api_secret: impl Into<String>) -> Self {
        self.api_secret = Some(api_secret.into());
        self
    }

    /// Set the offline access token.
    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }

    /// Select a specific Admin API version.
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Override the base URL (test servers).
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the page size for paged retrieval.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the safety cap on pages fetched per resource.
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Set a custom user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self::new()
    }
}
