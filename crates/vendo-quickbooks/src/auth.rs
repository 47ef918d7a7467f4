//! OAuth2 authorization and token lifecycle for QuickBooks Online.
//!
//! QuickBooks uses the Authorization Code grant with a refresh-token grant
//! on top: the token endpoint authenticates the app with HTTP Basic client
//! credentials, and access tokens are short-lived, so the client refreshes
//! transparently when a request comes back 401.

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;
use vendo_core::{Error, Result, TokenSet};

use crate::AUTH_TARGET;

/// Intuit OAuth2 authorize endpoint.
pub const AUTHORIZE_URL: &str = "https://appcenter.intuit.com/connect/oauth2";

/// Intuit OAuth2 token endpoint (exchange and refresh).
pub const TOKEN_URL: &str = "https://oauth.platform.intuit.com/oauth2/v1/tokens/bearer";

/// Scope covering the accounting API.
pub const ACCOUNTING_SCOPE: &str = "com.intuit.quickbooks.accounting";

/// OAuth2 authorizer and token manager for QuickBooks.
#[derive(Debug, Clone)]
pub struct QbAuthorizer {
    http_client: Client,
    client_id: Option<String>,
    client_secret: Option<String>,
    token_url: Url,
}

impl QbAuthorizer {
    /// Create an authorizer for the given app credentials.
    ///
    /// Missing credentials are not an error here; they are reported as a
    /// configuration error by the token operations, before any network
    /// call is made.
    pub fn new(client_id: Option<String>, client_secret: Option<String>) -> Self {
        Self {
            http_client: Client::new(),
            client_id,
            client_secret,
            token_url: Url::parse(TOKEN_URL).expect("static token URL is valid"),
        }
    }

    /// Override the token endpoint (test servers).
    pub fn with_token_url(mut self, token_url: Url) -> Self {
        self.token_url = token_url;
        self
    }

    /// Build the authorize-redirect URL for the Authorization Code grant.
    ///
    /// Pure and deterministic: no network call, no side effects. QuickBooks
    /// expects scopes **space-joined** in a single `scope` parameter.
    pub fn authorize_url(
        client_id: &str,
        redirect_uri: &str,
        scopes: &[&str],
        state: &str,
    ) -> Url {
        let mut url = Url::parse(AUTHORIZE_URL).expect("static authorize URL is valid");

        url.query_pairs_mut().extend_pairs([
            ("client_id", client_id),
            ("response_type", "code"),
            ("scope", &scopes.join(" ")),
            ("redirect_uri", redirect_uri),
            ("state", state),
        ]);

        url
    }

    /// Exchange an authorization code for tokens.
    ///
    /// The company realm id arrives alongside the code on the redirect, not
    /// in the token response; pass it through so the returned [`TokenSet`]
    /// is complete.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] when the client id or secret is absent
    /// (checked before any network call); [`Error::Authorization`] when the
    /// provider rejects the exchange.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        realm_id: Option<&str>,
    ) -> Result<TokenSet> {
        let (client_id, client_secret) = self.credentials()?;

        debug!(target: AUTH_TARGET, "Exchanging authorization code");

        let response = self
            .http_client
            .post(self.token_url.clone())
            .basic_auth(client_id, Some(client_secret))
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
            ])
            .send()
            .await?;

        let mut tokens = Self::parse_token_response(response).await?;
        if let Some(realm) = realm_id {
            tokens.account_id = Some(realm.to_string());
        }

        Ok(tokens)
    }

    /// Trade a refresh token for a fresh access token.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] when the client id or secret is absent;
    /// [`Error::Authorization`] when the provider rejects the refresh.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenSet> {
        let (client_id, client_secret) = self.credentials()?;

        debug!(target: AUTH_TARGET, "Refreshing access token");

        let response = self
            .http_client
            .post(self.token_url.clone())
            .basic_auth(client_id, Some(client_secret))
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await?;

        Self::parse_token_response(response).await
    }

    fn credentials(&self) -> Result<(&str, &str)> {
        match (self.client_id.as_deref(), self.client_secret.as_deref()) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
                Ok((id, secret))
            }
            _ => Err(Error::configuration(
                "QuickBooks client id and secret are required",
            )),
        }
    }

    async fn parse_token_response(response: reqwest::Response) -> Result<TokenSet> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(
                target: AUTH_TARGET,
                status = status.as_u16(),
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

        let mut tokens = TokenSet::new(access_token);
        if let Some(refresh) = payload.get("refresh_token").and_then(Value::as_str) {
            tokens.refresh_token = Some(refresh.to_string());
        }
        if let Some(expires) = payload.get("expires_in").and_then(Value::as_i64) {
            tokens.expires_in = Some(expires);
        }

        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_string_contains, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn test_authorize_url_is_deterministic() {
        let a = QbAuthorizer::authorize_url(
            "app-id",
            "https://app.example.com/callback",
            &[ACCOUNTING_SCOPE],
            "xyz",
        );
        let b = QbAuthorizer::authorize_url(
            "app-id",
            "https://app.example.com/callback",
            &[ACCOUNTING_SCOPE],
            "xyz",
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_authorize_url_space_joins_scopes() {
        let url = QbAuthorizer::authorize_url(
            "app-id",
            "https://app.example.com/callback",
            &["com.intuit.quickbooks.accounting", "openid"],
            "state-1",
        );

        assert_eq!(url.host_str(), Some("appcenter.intuit.com"));
        assert!(url.as_str().contains("response_type=code"));
        assert!(url.as_str().contains("client_id=app-id"));
        // space-joined, percent-encoded
        assert!(
            url.as_str()
                .contains("scope=com.intuit.quickbooks.accounting+openid")
                || url
                    .as_str()
                    .contains("scope=com.intuit.quickbooks.accounting%20openid")
        );
        assert!(url.as_str().contains("state=state-1"));
    }

    #[tokio::test]
    async fn test_exchange_without_credentials_fails_before_network() {
        let authorizer = QbAuthorizer::new(None, None);
        let err = authorizer
            .exchange_code("code", "https://cb", None)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_exchange_code_parses_tokens_and_threads_realm() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth2/v1/tokens/bearer"))
            .and(header_exists("authorization"))
            .and(body_string_contains("grant_type=authorization_code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "at-1",
                "refresh_token": "rt-1",
                "expires_in": 3600,
                "token_type": "bearer"
            })))
            .mount(&server)
            .await;

        let token_url = Url::parse(&format!("{}/oauth2/v1/tokens/bearer", server.uri())).unwrap();
        let authorizer = QbAuthorizer::new(Some("id".into()), Some("secret".into()))
            .with_token_url(token_url);

        let tokens = authorizer
            .exchange_code("auth-code", "https://cb", Some("9130357849"))
            .await
            .unwrap();

        assert_eq!(tokens.access_token, "at-1");
        assert_eq!(tokens.refresh_token.as_deref(), Some("rt-1"));
        assert_eq!(tokens.expires_in, Some(3600));
        assert_eq!(tokens.account_id.as_deref(), Some("9130357849"));
    }

    #[tokio::test]
    async fn test_rejected_exchange_is_authorization_error_with_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_string(r#"{"error":"invalid_grant"}"#),
            )
            .mount(&server)
            .await;

        let authorizer = QbAuthorizer::new(Some("id".into()), Some("secret".into()))
            .with_token_url(Url::parse(&server.uri()).unwrap());

        let err = authorizer
            .exchange_code("bad-code", "https://cb", None)
            .await
            .unwrap_err();

        match err {
            Error::Authorization { message } => assert!(message.contains("invalid_grant")),
            other => panic!("expected Authorization, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_refresh_parses_rotated_tokens() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "at-2",
                "refresh_token": "rt-2",
                "expires_in": 3600
            })))
            .mount(&server)
            .await;

        let authorizer = QbAuthorizer::new(Some("id".into()), Some("secret".into()))
            .with_token_url(Url::parse(&server.uri()).unwrap());

        let tokens = authorizer.refresh("rt-1").await.unwrap();
        assert_eq!(tokens.access_token, "at-2");
        assert_eq!(tokens.refresh_token.as_deref(), Some("rt-2"));
    }
}
