//! OAuth2 authorization and token exchange for Shopify.
//!
//! Shopify's Authorization Code grant produces a long-lived offline access
//! token scoped to one shop. There is no refresh-token grant: a 401 from
//! the Admin API means the merchant uninstalled the app or the token was
//! revoked, and the integration has to be reconnected.

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;
use vendo_core::{Error, Result, TokenSet};

use crate::AUTH_TARGET;

/// Path of the per-shop authorize endpoint.
pub const AUTHORIZE_PATH: &str = "/admin/oauth/authorize";

/// Path of the per-shop token endpoint.
pub const TOKEN_PATH: &str = "/admin/oauth/access_token";

/// OAuth2 authorizer for Shopify.
#[derive(Debug, Clone)]
pub struct ShopAuthorizer {
    http_client: Client,
    api_key: Option<String>,
    api_secret: Option<String>,
    base_url: Option<Url>,
}

impl ShopAuthorizer {
    /// Create an authorizer for the given app credentials.
    ///
    /// Missing credentials are reported as a configuration error by
    /// [`exchange_code`](Self::exchange_code), before any network call.
    pub fn new(api_key: Option<String>, api_secret: Option<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key,
            api_secret,
            base_url: None,
        }
    }

    /// Override the per-shop base URL (test servers).
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Build the authorize-redirect URL for a shop.
    ///
    /// Pure and deterministic. Shopify expects scopes **comma-joined** in a
    /// single `scope` parameter (`read_products,read_orders`), unlike the
    /// space-joined convention other providers use.
    pub fn authorize_url(
        shop_domain: &str,
        api_key: &str,
        redirect_uri: &str,
        scopes: &[&str],
        state: &str,
    ) -> Result<Url> {
        let mut url = Url::parse(&format!("https://{shop_domain}{AUTHORIZE_PATH}"))
            .map_err(|e| Error::configuration(format!("invalid shop domain '{shop_domain}': {e}")))?;

        url.query_pairs_mut().extend_pairs([
            ("client_id", api_key),
            ("scope", &scopes.join(",")),
            ("redirect_uri", redirect_uri),
            ("state", state),
        ]);

        Ok(url)
    }

    /// Exchange an authorization code for the shop's offline token.
    ///
    /// The token endpoint takes the client credentials in a **JSON body**
    /// rather than a Basic authorization header. The returned token is
    /// long-lived; `refresh_token` is always `None` and `account_id` is
    /// the shop domain.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] when the api key or secret is absent
    /// (checked before any network call); [`Error::Authorization`] when
    /// the provider rejects the exchange.
    pub async fn exchange_code(&self, shop_domain: &str, code: &str) -> Result<TokenSet> {
        let (api_key, api_secret) = self.credentials()?;

        let token_url = match &self.base_url {
            Some(base) => base
                .join(TOKEN_PATH)
                .map_err(|e| Error::configuration(format!("invalid token URL: {e}")))?,
            None => Url::parse(&format!("https://{shop_domain}{TOKEN_PATH}")).map_err(|e| {
                Error::configuration(format!("invalid shop domain '{shop_domain}': {e}"))
            })?,
        };

        debug!(target: AUTH_TARGET, shop_domain, "Exchanging authorization code");

        let response = self
            .http_client
            .post(token_url)
            .json(&serde_json::json!({
                "client_id": api_key,
                "client_secret": api_secret,
                "code": code,
            }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(
                target: AUTH_TARGET,
                status = status.as_u16(),
                shop_domain,
                "Token endpoint rejected the request"
            );
            return Err(Error::authorization(format!(
                "token request failed ({}): {}",
                status, body
            )));
        }

        let payload: Value = serde_json::from_str(&body)?;
        let access_token = payload
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::authorization("token response is missing access_token"))?;

        Ok(TokenSet::new(access_token).with_account_id(shop_domain))
    }

    /// Shopify issues no refresh tokens; this always fails.
    pub async fn refresh(&self, _refresh_token: &str) -> Result<TokenSet> {
        Err(Error::configuration(
            "Shopify does not issue refresh tokens; reconnect the integration instead",
        ))
    }

    fn credentials(&self) -> Result<(&str, &str)> {
        match (self.api_key.as_deref(), self.api_secret.as_deref()) {
            (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => {
                Ok((key, secret))
            }
            _ => Err(Error::configuration(
                "Shopify api key and secret are required",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn test_authorize_url_comma_joins_scopes() {
        let url = ShopAuthorizer::authorize_url(
            "demo-store.myshopify.com",
            "key-123",
            "https://app.example.com/callback",
            &["read_products", "read_orders", "read_customers"],
            "state-9",
        )
        .unwrap();

        assert_eq!(url.host_str(), Some("demo-store.myshopify.com"));
        assert_eq!(url.path(), "/admin/oauth/authorize");
        assert!(url.as_str().contains("client_id=key-123"));
        assert!(
            url.as_str()
                .contains("scope=read_products%2Cread_orders%2Cread_customers")
        );
        // no offline-access parameter: the grant is already offline
        assert!(!url.as_str().contains("access_type"));
    }

    #[test]
    fn test_authorize_url_is_deterministic() {
        let build = || {
            ShopAuthorizer::authorize_url(
                "demo-store.myshopify.com",
                "key",
                "https://cb",
                &["read_products"],
                "s",
            )
            .unwrap()
        };
        assert_eq!(build(), build());
    }

    #[tokio::test]
    async fn test_exchange_without_credentials_fails_before_network() {
        let authorizer = ShopAuthorizer::new(Some("key".into()), None);
        let err = authorizer
            .exchange_code("demo.myshopify.com", "code")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_exchange_code_returns_offline_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/admin/oauth/access_token"))
            .and(body_json(serde_json::json!({
                "client_id": "key",
                "client_secret": "secret",
                "code": "auth-code",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "shpat_abc",
                "scope": "read_products,read_orders"
            })))
            .mount(&server)
            .await;

        let authorizer = ShopAuthorizer::new(Some("key".into()), Some("secret".into()))
            .with_base_url(Url::parse(&server.uri()).unwrap());

        let tokens = authorizer
            .exchange_code("demo.myshopify.com", "auth-code")
            .await
            .unwrap();

        assert_eq!(tokens.access_token, "shpat_abc");
        assert_eq!(tokens.refresh_token, None);
        assert_eq!(tokens.account_id.as_deref(), Some("demo.myshopify.com"));
    }

    #[tokio::test]
    async fn test_rejected_exchange_carries_provider_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(400).set_body_string(r#"{"error":"invalid_request"}"#),
            )
            .mount(&server)
            .await;

        let authorizer = ShopAuthorizer::new(Some("key".into()), Some("secret".into()))
            .with_base_url(Url::parse(&server.uri()).unwrap());

        let err = authorizer
            .exchange_code("demo.myshopify.com", "bad")
            .await
            .unwrap_err();

        match err {
            Error::Authorization { message } => assert!(message.contains("invalid_request")),
            other => panic!("expected Authorization, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_refresh_is_a_configuration_error() {
        let authorizer = ShopAuthorizer::new(Some("key".into()), Some("secret".into()));
        let err = authorizer.refresh("anything").await.unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }
}
