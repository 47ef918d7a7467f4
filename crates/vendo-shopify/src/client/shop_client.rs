//! Shopify Admin API HTTP client implementation.

use std::sync::Arc;

use reqwest::{Client, Method};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;
use vendo_core::{Connector, Error, ProviderKind, Result, SyncCategory};

use crate::client::shop_pager::next_page_info;
use crate::client::{ShopConfig, ShopPager};
use crate::SHOPIFY_TARGET;

/// Header carrying the shop's access token on every request.
pub const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

struct ShopClientInner {
    http: Client,
    config: ShopConfig,
    base_url: Url,
}

impl std::fmt::Debug for ShopClientInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopClientInner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Authenticated client for the Shopify Admin API.
///
/// Every request carries the shop's offline token in the
/// `X-Shopify-Access-Token` header. Shopify has no refresh grant, so a 401
/// propagates immediately as an API error; recovery means reconnecting the
/// integration.
///
/// # Examples
///
/// ```ignore
/// use vendo_shopify::{ShopClient, ShopConfig};
///
/// let config = ShopConfig::new()
///     .with_shop_domain("demo-store.myshopify.com")
///     .with_access_token("shpat_...");
/// let client = ShopClient::new(config)?;
///
/// let orders = client.fetch_orders().await?;
/// ```
#[derive(Clone, Debug)]
pub struct ShopClient {
    inner: Arc<ShopClientInner>,
}

impl ShopClient {
    /// Create a new client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when the access token or shop
    /// domain is missing, or when the HTTP client cannot be constructed.
    pub fn new(config: ShopConfig) -> Result<Self> {
        let access_token = config
            .access_token()
            .ok_or_else(|| Error::configuration("Shopify access token is not set"))?;

        let base_url = config.base_url()?;

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            ACCESS_TOKEN_HEADER,
            reqwest::header::HeaderValue::from_str(access_token)
                .map_err(|e| Error::configuration(format!("invalid access token: {e}")))?,
        );

        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent())
            .default_headers(headers)
            .build()
            .map_err(|e| Error::configuration(format!("failed to build HTTP client: {e}")))?;

        debug!(
            target: SHOPIFY_TARGET,
            shop_domain = config.shop_domain().unwrap_or_default(),
            api_version = config.api_version(),
            "Shopify client initialized"
        );

        Ok(Self {
            inner: Arc::new(ShopClientInner {
                http,
                config,
                base_url,
            }),
        })
    }

    /// Get a reference to the client configuration.
    pub fn config(&self) -> &ShopConfig {
        &self.inner.config
    }

    /// Execute an authenticated request against an Admin API path.
    ///
    /// A 401 propagates as an API error without a retry: Shopify tokens
    /// cannot be refreshed.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value> {
        let (payload, _) = self.execute(method, path, &[], body).await?;
        Ok(payload)
    }

    /// Fetch one page of a list endpoint, returning the payload and the
    /// `rel="next"` cursor from the `Link` response header, if any.
    pub(crate) async fn list_page(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<(Value, Option<String>)> {
        self.execute(Method::GET, path, query, None).await
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<(Value, Option<String>)> {
        let url = self
            .inner
            .base_url
            .join(path)
            .map_err(|e| Error::configuration(format!("invalid API path '{path}': {e}")))?;

        let mut request = self
            .inner
            .http
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");

        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        let next_cursor = response
            .headers()
            .get(reqwest::header::LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(next_page_info);

        let text = response.text().await?;

        if !status.is_success() {
            debug!(
                target: SHOPIFY_TARGET,
                status = status.as_u16(),
                path,
                "Shopify API returned an error"
            );
            return Err(Error::api(status.as_u16(), text));
        }

        if text.is_empty() {
            return Ok((Value::Null, next_cursor));
        }
        Ok((serde_json::from_str(&text)?, next_cursor))
    }

    fn api_path(&self, tail: &str) -> String {
        format!("/admin/api/{}/{}", self.inner.config.api_version(), tail)
    }

    /// Walk every page of one list resource.
    ///
    /// `resource` is the endpoint tail (e.g. `products.json`) and `key` the
    /// field the items live under in each page payload.
    pub fn list(&self, resource: impl Into<String>, key: impl Into<String>) -> ShopPager {
        let resource = resource.into();
        let path = self.api_path(&resource);
        ShopPager::new(self.clone(), path, key.into())
    }

    /// Fetch the full product catalog.
    pub async fn fetch_products(&self) -> Result<Vec<Value>> {
        self.list("products.json", "products").collect_all().await
    }

    /// Fetch all customer records.
    pub async fn fetch_customers(&self) -> Result<Vec<Value>> {
        self.list("customers.json", "customers").collect_all().await
    }

    /// Fetch all orders.
    pub async fn fetch_orders(&self) -> Result<Vec<Value>> {
        self.list("orders.json", "orders").collect_all().await
    }

    /// Fetch inventory levels.
    pub async fn fetch_inventory_levels(&self) -> Result<Vec<Value>> {
        self.list("inventory_levels.json", "inventory_levels")
            .collect_all()
            .await
    }

    /// Create a product, returning the provider's canonical record.
    pub async fn create_product(&self, product: &Value) -> Result<Value> {
        let path = self.api_path("products.json");
        let body = serde_json::json!({ "product": product });
        let payload = self.request(Method::POST, &path, Some(&body)).await?;

        Ok(payload.get("product").cloned().unwrap_or(payload))
    }

    /// Update a product. The object must carry its `id`.
    pub async fn update_product(&self, product: &Value) -> Result<Value> {
        let id = product
            .get("id")
            .and_then(Value::as_i64)
            .ok_or_else(|| Error::configuration("product update requires an id"))?;

        let path = self.api_path(&format!("products/{id}.json"));
        let body = serde_json::json!({ "product": product });
        let payload = self.request(Method::PUT, &path, Some(&body)).await?;

        Ok(payload.get("product").cloned().unwrap_or(payload))
    }

    /// Cheap read-only connectivity probe against the shop endpoint.
    /// Never errors; any failure maps to `false`.
    pub async fn test_connection(&self) -> bool {
        let path = self.api_path("shop.json");

        match self.request(Method::GET, &path, None).await {
            Ok(_) => true,
            Err(err) => {
                warn!(
                    target: SHOPIFY_TARGET,
                    error = %err,
                    "Shopify connection probe failed"
                );
                false
            }
        }
    }
}

#[async_trait::async_trait]
impl Connector for ShopClient {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Shopify
    }

    fn supports(&self, category: SyncCategory) -> bool {
        matches!(
            category,
            SyncCategory::Products
                | SyncCategory::Customers
                | SyncCategory::Orders
                | SyncCategory::Inventory
        )
    }

    async fn pull_category(&self, category: SyncCategory) -> Result<u64> {
        let items = match category {
            SyncCategory::Products => self.fetch_products().await?,
            SyncCategory::Customers => self.fetch_customers().await?,
            SyncCategory::Orders => self.fetch_orders().await?,
            SyncCategory::Inventory => self.fetch_inventory_levels().await?,
            other => {
                return Err(Error::configuration(format!(
                    "Shopify has no fetch operation for {}",
                    other.label()
                )));
            }
        };

        Ok(items.len() as u64)
    }

    async fn test_connection(&self) -> bool {
        ShopClient::test_connection(self).await
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn test_client(server: &MockServer) -> ShopClient {
        let config = ShopConfig::new()
            .with_shop_domain("demo.myshopify.com")
            .with_api_key("key")
            .with_api_secret("secret")
            .with_access_token("shpat_token")
            .with_base_url(Url::parse(&server.uri()).unwrap());
        ShopClient::new(config).unwrap()
    }

    #[test]
    fn test_new_requires_access_token() {
        let config = ShopConfig::new().with_shop_domain("demo.myshopify.com");
        assert!(matches!(
            ShopClient::new(config),
            Err(Error::Configuration { .. })
        ));
    }

    #[tokio::test]
    async fn test_requests_carry_the_access_token_header() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/admin/api/2024-01/shop.json"))
            .and(header("x-shopify-access-token", "shpat_token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"shop": {"name": "Demo"}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        assert!(client.test_connection().await);
    }

    #[tokio::test]
    async fn test_expired_auth_propagates_without_retry() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/admin/api/2024-01/products.json"))
            .respond_with(
                ResponseTemplate::new(401).set_body_string(r#"{"errors":"Invalid API key"}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client.fetch_products().await.unwrap_err();

        match err {
            Error::Api { status: 401, body } => assert!(body.contains("Invalid API key")),
            other => panic!("expected Api 401, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_product_returns_canonical_record() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/admin/api/2024-01/products.json"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "product": {"id": 632910392, "title": "Canvas Tote"}
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let created = client
            .create_product(&serde_json::json!({"title": "Canvas Tote"}))
            .await
            .unwrap();

        assert_eq!(created["id"], 632910392);
        assert_eq!(created["title"], "Canvas Tote");
    }

    #[tokio::test]
    async fn test_update_product_requires_id() {
        let server = MockServer::start().await;
        let client = test_client(&server);

        let err = client
            .update_product(&serde_json::json!({"title": "No Id"}))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_connection_probe_never_errors() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/admin/api/2024-01/shop.json"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let client = test_client(&server);
        assert!(!client.test_connection().await);
    }

    #[tokio::test]
    async fn test_connector_pull_counts_items() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/admin/api/2024-01/orders.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "orders": [{"id": 1}, {"id": 2}]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let count = client.pull_category(SyncCategory::Orders).await.unwrap();
        assert_eq!(count, 2);

        assert!(client.supports(SyncCategory::Products));
        assert!(!client.supports(SyncCategory::Invoices));
    }
}
