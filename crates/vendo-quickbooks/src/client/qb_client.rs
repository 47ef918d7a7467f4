//! QuickBooks Online HTTP client implementation.

use std::sync::Arc;

use reqwest::{Client, Method};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use vendo_core::{Connector, Error, ProviderKind, Result, SyncCategory};

use crate::auth::QbAuthorizer;
use crate::client::{QbConfig, QbPager};
use crate::QUICKBOOKS_TARGET;

/// Token material that can rotate while the client is in use.
#[derive(Debug, Clone)]
struct TokenState {
    access_token: String,
    refresh_token: Option<String>,
}

struct QbClientInner {
    http: Client,
    config: QbConfig,
    authorizer: QbAuthorizer,
    tokens: RwLock<TokenState>,
}

impl std::fmt::Debug for QbClientInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QbClientInner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Authenticated client for the QuickBooks Online accounting API.
///
/// Requests carry the stored access token as a bearer credential. When a
/// data endpoint answers 401 the client refreshes the token once, stores
/// the rotated tokens, and retries the original request exactly once; a
/// second 401 propagates as an API error. The retry is an explicit bounded
/// wrapper, never a loop.
///
/// # Examples
///
/// ```ignore
/// use vendo_quickbooks::{QbClient, QbConfig};
///
/// let config = QbConfig::new()
///     .with_client_id("app-id")
///     .with_client_secret("app-secret")
///     .with_access_token("at")
///     .with_refresh_token("rt")
///     .with_realm_id("9130357849");
/// let client = QbClient::new(config)?;
///
/// let invoices = client.fetch_invoices().await?;
/// ```
#[derive(Clone, Debug)]
pub struct QbClient {
    inner: Arc<QbClientInner>,
}

impl QbClient {
    /// Create a new client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when the access token or realm id
    /// is missing, or when the HTTP client cannot be constructed.
    pub fn new(config: QbConfig) -> Result<Self> {
        let access_token = config
            .access_token()
            .ok_or_else(|| Error::configuration("QuickBooks access token is not set"))?
            .to_string();

        if config.realm_id().is_none() {
            return Err(Error::configuration("QuickBooks realm id is not set"));
        }

        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent())
            .build()
            .map_err(|e| Error::configuration(format!("failed to build HTTP client: {e}")))?;

        let mut authorizer = QbAuthorizer::new(
            config.client_id().map(str::to_string),
            config.client_secret().map(str::to_string),
        );
        if let Some(token_url) = config.token_url() {
            authorizer = authorizer.with_token_url(token_url.clone());
        }

        let tokens = TokenState {
            access_token,
            refresh_token: config.refresh_token().map(str::to_string),
        };

        debug!(
            target: QUICKBOOKS_TARGET,
            environment = %config.environment(),
            realm_id = config.realm_id().unwrap_or_default(),
            "QuickBooks client initialized"
        );

        Ok(Self {
            inner: Arc::new(QbClientInner {
                http,
                config,
                authorizer,
                tokens: RwLock::new(tokens),
            }),
        })
    }

    /// Get a reference to the client configuration.
    pub fn config(&self) -> &QbConfig {
        &self.inner.config
    }

    /// Current access token (test observability).
    pub async fn access_token(&self) -> String {
        self.inner.tokens.read().await.access_token.clone()
    }

    /// Execute an authenticated request against a company-scoped path.
    ///
    /// On a 401 response the client performs exactly one
    /// refresh-and-retry; any further auth failure propagates.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value> {
        self.request_with_query(method, path, &[], body).await
    }

    pub(crate) async fn request_with_query(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value> {
        match self.execute(method.clone(), path, query, body).await {
            Err(err) if err.is_auth_expired() => {
                info!(
                    target: QUICKBOOKS_TARGET,
                    path,
                    "Access token expired, refreshing and retrying once"
                );
                self.refresh_tokens().await?;
                self.execute(method, path, query, body).await
            }
            result => result,
        }
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = self
            .inner
            .config
            .api_base()
            .join(path)
            .map_err(|e| Error::configuration(format!("invalid API path '{path}': {e}")))?;

        let access_token = self.inner.tokens.read().await.access_token.clone();

        let mut request = self
            .inner
            .http
            .request(method, url)
            .bearer_auth(access_token)
            .header(reqwest::header::ACCEPT, "application/json");

        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            debug!(
                target: QUICKBOOKS_TARGET,
                status = status.as_u16(),
                path,
                "QuickBooks API returned an error"
            );
            return Err(Error::api(status.as_u16(), text));
        }

        if text.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Refresh the stored tokens once.
    async fn refresh_tokens(&self) -> Result<()> {
        let refresh_token = self
            .inner
            .tokens
            .read()
            .await
            .refresh_token
            .clone()
            .ok_or_else(|| Error::configuration("QuickBooks refresh token is not set"))?;

        let fresh = self.inner.authorizer.refresh(&refresh_token).await?;

        let mut tokens = self.inner.tokens.write().await;
        tokens.access_token = fresh.access_token;
        if fresh.refresh_token.is_some() {
            tokens.refresh_token = fresh.refresh_token;
        }

        info!(target: QUICKBOOKS_TARGET, "Stored tokens rotated after refresh");
        Ok(())
    }

    fn company_path(&self, tail: &str) -> String {
        let realm = self.inner.config.realm_id().unwrap_or_default();
        format!("/v3/company/{realm}/{tail}")
    }

    /// Run one page of a query-endpoint request.
    pub(crate) async fn query_page(
        &self,
        entity: &str,
        start_position: u64,
        page_size: u32,
    ) -> Result<Vec<Value>> {
        let statement =
            format!("SELECT * FROM {entity} STARTPOSITION {start_position} MAXRESULTS {page_size}");
        let path = self.company_path("query");

        let payload = self
            .request_with_query(Method::GET, &path, &[("query", statement.as_str())], None)
            .await?;

        let items = payload
            .get("QueryResponse")
            .and_then(|r| r.get(entity))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Ok(items)
    }

    /// Walk every page of one query entity.
    pub fn query(&self, entity: impl Into<String>) -> QbPager {
        QbPager::new(self.clone(), entity.into())
    }

    /// Fetch all customer records.
    pub async fn fetch_customers(&self) -> Result<Vec<Value>> {
        self.query("Customer").collect_all().await
    }

    /// Fetch all invoices.
    pub async fn fetch_invoices(&self) -> Result<Vec<Value>> {
        self.query("Invoice").collect_all().await
    }

    /// Fetch all received payments.
    pub async fn fetch_payments(&self) -> Result<Vec<Value>> {
        self.query("Payment").collect_all().await
    }

    /// Fetch all inventory items.
    pub async fn fetch_items(&self) -> Result<Vec<Value>> {
        self.query("Item").collect_all().await
    }

    /// Create a customer, returning the provider's canonical record.
    pub async fn create_customer(&self, customer: &Value) -> Result<Value> {
        let path = self.company_path("customer");
        let payload = self.request(Method::POST, &path, Some(customer)).await?;

        Ok(payload.get("Customer").cloned().unwrap_or(payload))
    }

    /// Update a customer. The object must carry `Id` and `SyncToken`.
    pub async fn update_customer(&self, customer: &Value) -> Result<Value> {
        if customer.get("Id").is_none() {
            return Err(Error::configuration("customer update requires an Id"));
        }

        let path = self.company_path("customer");
        let payload = self.request(Method::POST, &path, Some(customer)).await?;

        Ok(payload.get("Customer").cloned().unwrap_or(payload))
    }

    /// Cheap read-only connectivity probe against the company info
    /// endpoint. Never errors; any failure maps to `false`.
    pub async fn test_connection(&self) -> bool {
        let realm = self.inner.config.realm_id().unwrap_or_default().to_string();
        let path = self.company_path(&format!("companyinfo/{realm}"));

        match self.request(Method::GET, &path, None).await {
            Ok(_) => true,
            Err(err) => {
                warn!(
                    target: QUICKBOOKS_TARGET,
                    error = %err,
                    "QuickBooks connection probe failed"
                );
                false
            }
        }
    }
}

#[async_trait::async_trait]
impl Connector for QbClient {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Quickbooks
    }

    fn supports(&self, category: SyncCategory) -> bool {
        matches!(
            category,
            SyncCategory::Customers
                | SyncCategory::Invoices
                | SyncCategory::Payments
                | SyncCategory::Inventory
        )
    }

    async fn pull_category(&self, category: SyncCategory) -> Result<u64> {
        let items = match category {
            SyncCategory::Customers => self.fetch_customers().await?,
            SyncCategory::Invoices => self.fetch_invoices().await?,
            SyncCategory::Payments => self.fetch_payments().await?,
            SyncCategory::Inventory => self.fetch_items().await?,
            other => {
                return Err(Error::configuration(format!(
                    "QuickBooks has no fetch operation for {}",
                    other.label()
                )));
            }
        };

        Ok(items.len() as u64)
    }

    async fn test_connection(&self) -> bool {
        QbClient::test_connection(self).await
    }
}
