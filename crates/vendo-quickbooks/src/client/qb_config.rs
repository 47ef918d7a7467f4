//! Configuration for the QuickBooks API client.

use std::time::Duration;

use url::Url;
use vendo_core::{Environment, Error, QuickbooksSettings, Result};

/// Sandbox API host.
pub const SANDBOX_API_URL: &str = "https://sandbox-quickbooks.api.intuit.com";

/// Production API host.
pub const PRODUCTION_API_URL: &str = "https://quickbooks.api.intuit.com";

/// Configuration for [`QbClient`](crate::QbClient).
///
/// # Examples
///
/// ```ignore
/// use vendo_quickbooks::QbConfig;
/// use std::time::Duration;
///
/// let config = QbConfig::new()
///     .with_client_id("app-id")
///     .with_client_secret("app-secret")
///     .with_access_token("at")
///     .with_refresh_token("rt")
///     .with_realm_id("9130357849")
///     .with_timeout(Duration::from_secs(60));
/// ```
#[derive(Debug, Clone)]
pub struct QbConfig {
    /// OAuth2 client id
    client_id: Option<String>,

    /// OAuth2 client secret
    client_secret: Option<String>,

    /// Current access token
    access_token: Option<String>,

    /// Long-lived refresh token
    refresh_token: Option<String>,

    /// Company realm id scoping every API path
    realm_id: Option<String>,

    /// Sandbox or production host selection
    environment: Environment,

    /// API host override (test servers)
    api_base: Option<Url>,

    /// Token endpoint override (test servers)
    token_url: Option<Url>,

    /// Request timeout duration
    timeout: Duration,

    /// Items requested per page
    page_size: u32,

    /// Safety cap on pages fetched per resource
    max_pages: u32,

    /// User agent string for HTTP requests
    user_agent: String,
}

impl QbConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            access_token: None,
            refresh_token: None,
            realm_id: None,
            environment: Environment::default(),
            api_base: None,
            token_url: None,
            timeout: Duration::from_secs(30),
            page_size: 100,
            max_pages: 10,
            user_agent: format!("vendo-quickbooks/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Build a configuration from stored integration settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when a field required for
    /// authenticated API access is missing.
    pub fn from_settings(settings: &QuickbooksSettings) -> Result<Self> {
        let required = |field: &Option<String>, name: &str| -> Result<String> {
            field
                .clone()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| Error::configuration(format!("QuickBooks {name} is not set")))
        };

        Ok(Self::new()
            .with_client_id(required(&settings.client_id, "client id")?)
            .with_client_secret(required(&settings.client_secret, "client secret")?)
            .with_access_token(required(&settings.access_token, "access token")?)
            .with_refresh_token(required(&settings.refresh_token, "refresh token")?)
            .with_realm_id(required(&settings.realm_id, "realm id")?)
            .with_environment(settings.environment))
    }

    /// Get the OAuth2 client id.
    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    /// Get the OAuth2 client secret.
    pub fn client_secret(&self) -> Option<&str> {
        self.client_secret.as_deref()
    }

    /// Get the current access token.
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Get the refresh token.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Get the company realm id.
    pub fn realm_id(&self) -> Option<&str> {
        self.realm_id.as_deref()
    }

    /// Get the configured environment.
    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Get the API base URL for the configured environment.
    pub fn api_base(&self) -> Url {
        if let Some(base) = &self.api_base {
            return base.clone();
        }

        let host = match self.environment {
            Environment::Sandbox => SANDBOX_API_URL,
            Environment::Production => PRODUCTION_API_URL,
        };
        Url::parse(host).expect("static API host is valid")
    }

    /// Get the token endpoint override, if any.
    pub fn token_url(&self) -> Option<&Url> {
        self.token_url.as_ref()
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

    /// Set the OAuth2 client id.
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set the OAuth2 client secret.
    pub fn with_client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into());
        self
    }

    /// Set the access token.
    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }

    /// Set the refresh token.
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Set the company realm id.
    pub fn with_realm_id(mut self, realm_id: impl Into<String>) -> Self {
        self.realm_id = Some(realm_id.into());
        self
    }

    /// Select the sandbox or production host.
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Override the API base URL (test servers).
    pub fn with_api_base(mut self, api_base: Url) -> Self {
        self.api_base = Some(api_base);
        self
    }

    /// Override the token endpoint (test servers).
    pub fn with_token_url(mut self, token_url: Url) -> Self {
        self.token_url = Some(token_url);
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

impl Default for QbConfig {
    fn default() -> Self {
        Self::new()
    }
}
