//! The consumer-facing integration service.
//!
//! [`IntegrationService`] is the entire surface the rest of the
//! application may use: `connect`, `sync`, `disconnect`, `toggle`, and
//! `get`. It wires the registry, the provider authorizers/clients, and
//! the orchestrator together, and enforces the one-sync-per-integration
//! guarantee with an in-flight marker.

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use tracing::{info, warn};
use url::Url;
use vendo_core::{
    Connector, Error, IntegrationConfig, ProviderKind, ProviderSettings, Result, SyncResult,
};
use vendo_quickbooks::{QbAuthorizer, QbClient, QbConfig};
use vendo_shopify::{ShopAuthorizer, ShopClient, ShopConfig};

use crate::orchestrator::SyncOrchestrator;
use crate::registry::IntegrationRegistry;
use crate::SERVICE_TARGET;

/// Credentials a consumer supplies when connecting an integration.
///
/// Each variant carries the app credentials plus the one-time
/// authorization code (and the provider account identifier delivered with
/// the redirect).
#[derive(Debug, Clone)]
pub enum ConnectCredentials {
    /// QuickBooks: app credentials plus the code and realm id from the
    /// OAuth redirect.
    Quickbooks {
        /// OAuth2 client id
        client_id: String,
        /// OAuth2 client secret
        client_secret: String,
        /// One-time authorization code
        code: String,
        /// Redirect URI the code was issued for
        redirect_uri: String,
        /// Company realm id from the redirect query
        realm_id: String,
    },
    /// Shopify: app credentials plus the shop domain and the code from
    /// the OAuth redirect.
    Shopify {
        /// App API key
        api_key: String,
        /// App API secret
        api_secret: String,
        /// Shop domain (e.g. `demo-store.myshopify.com`)
        shop_domain: String,
        /// One-time authorization code
        code: String,
    },
}

impl ConnectCredentials {
    /// Which provider these credentials are for.
    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::Quickbooks { .. } => ProviderKind::Quickbooks,
            Self::Shopify { .. } => ProviderKind::Shopify,
        }
    }
}

/// Configuration for [`IntegrationService`].
///
/// The endpoint overrides exist for test servers; production leaves them
/// unset and the providers' real hosts are used.
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    quickbooks_api_base: Option<Url>,
    quickbooks_token_url: Option<Url>,
    shopify_base_url: Option<Url>,
    sync_budget: Option<Duration>,
}

impl ServiceConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the QuickBooks API host (test servers).
    pub fn with_quickbooks_api_base(mut self, url: Url) -> Self {
        self.quickbooks_api_base = Some(url);
        self
    }

    /// Override the QuickBooks token endpoint (test servers).
    pub fn with_quickbooks_token_url(mut self, url: Url) -> Self {
        self.quickbooks_token_url = Some(url);
        self
    }

    /// Override the per-shop Shopify base URL (test servers).
    pub fn with_shopify_base_url(mut self, url: Url) -> Self {
        self.shopify_base_url = Some(url);
        self
    }

    /// Set the overall wall-clock budget for one sync run.
    pub fn with_sync_budget(mut self, budget: Duration) -> Self {
        self.sync_budget = Some(budget);
        self
    }
}

/// The five-call consumer contract over the sync engine.
///
/// # Examples
///
/// ```ignore
/// use vendo_core::ProviderKind;
/// use vendo_sync::{IntegrationRegistry, IntegrationService, IntegrationStore};
///
/// let store = IntegrationStore::new("integrations.json");
/// let registry = IntegrationRegistry::load(store).await?;
/// let service = IntegrationService::new(registry);
///
/// service.connect(ProviderKind::Shopify, credentials).await?;
/// let result = service.sync(ProviderKind::Shopify).await?;
/// ```
#[derive(Debug)]
pub struct IntegrationService {
    registry: IntegrationRegistry,
    orchestrator: SyncOrchestrator,
    config: ServiceConfig,
    in_flight: Mutex<HashSet<ProviderKind>>,
}

impl IntegrationService {
    /// Create a service over the given registry with default settings.
    pub fn new(registry: IntegrationRegistry) -> Self {
        Self::with_config(registry, ServiceConfig::default())
    }

    /// Create a service with explicit configuration.
    pub fn with_config(registry: IntegrationRegistry, config: ServiceConfig) -> Self {
        let mut orchestrator = SyncOrchestrator::new();
        if let Some(budget) = config.sync_budget {
            orchestrator = orchestrator.with_budget(budget);
        }

        Self {
            registry,
            orchestrator,
            config,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Get a snapshot of one integration's configuration.
    pub async fn get(&self, provider: ProviderKind) -> IntegrationConfig {
        self.registry.get(provider).await
    }

    /// Connect an integration: exchange the authorization code, merge the
    /// issued tokens into the stored settings, and mark it connected.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] when the credentials do not match the
    /// provider or required fields are missing (before any network call);
    /// [`Error::Authorization`] when the provider rejects the exchange.
    /// On any failure the integration remains disconnected.
    pub async fn connect(
        &self,
        provider: ProviderKind,
        credentials: ConnectCredentials,
    ) -> Result<()> {
        if credentials.kind() != provider {
            return Err(Error::configuration(format!(
                "credentials are for {}, not {}",
                credentials.kind(),
                provider
            )));
        }

        let current = self.registry.get(provider).await;
        let mut settings = current.settings;

        match credentials {
            ConnectCredentials::Quickbooks {
                client_id,
                client_secret,
                code,
                redirect_uri,
                realm_id,
            } => {
                let mut authorizer =
                    QbAuthorizer::new(Some(client_id.clone()), Some(client_secret.clone()));
                if let Some(url) = &self.config.quickbooks_token_url {
                    authorizer = authorizer.with_token_url(url.clone());
                }

                let tokens = authorizer
                    .exchange_code(&code, &redirect_uri, Some(&realm_id))
                    .await?;

                let ProviderSettings::Quickbooks(qb) = &mut settings else {
                    return Err(Error::configuration("stored settings are not QuickBooks"));
                };
                qb.client_id = Some(client_id);
                qb.client_secret = Some(client_secret);
                settings.merge_tokens(&tokens);
            }
            ConnectCredentials::Shopify {
                api_key,
                api_secret,
                shop_domain,
                code,
            } => {
                let mut authorizer =
                    ShopAuthorizer::new(Some(api_key.clone()), Some(api_secret.clone()));
                if let Some(base) = &self.config.shopify_base_url {
                    authorizer = authorizer.with_base_url(base.clone());
                }

                let tokens = authorizer.exchange_code(&shop_domain, &code).await?;

                let ProviderSettings::Shopify(shop) = &mut settings else {
                    return Err(Error::configuration("stored settings are not Shopify"));
                };
                shop.api_key = Some(api_key);
                shop.api_secret = Some(api_secret);
                settings.merge_tokens(&tokens);
            }
        }

        self.registry.connect(provider, settings).await?;

        info!(target: SERVICE_TARGET, provider = %provider, "Integration connected");
        Ok(())
    }

    /// Run one sync for an integration.
    ///
    /// Rejects with [`Error::SyncInFlight`] while a run for the same
    /// integration is active; the returned [`SyncResult`] may carry
    /// per-category errors without the call itself failing ("completed
    /// with errors" is distinct from total failure).
    pub async fn sync(&self, provider: ProviderKind) -> Result<SyncResult> {
        let config = self.registry.get(provider).await;
        if !config.connected {
            return Err(Error::configuration(format!(
                "integration '{}' is not connected",
                config.id
            )));
        }

        {
            let mut in_flight = self.in_flight.lock().expect("in-flight set poisoned");
            if !in_flight.insert(provider) {
                return Err(Error::sync_in_flight(config.id));
            }
        }

        let run = async {
            let connector = self.build_connector(&config)?;
            let result = self.orchestrator.sync_with(connector.as_ref(), &config).await;
            self.registry.record_sync(provider, &result).await?;
            Ok::<SyncResult, Error>(result)
        }
        .await;

        self.in_flight
            .lock()
            .expect("in-flight set poisoned")
            .remove(&provider);

        let result = run?;
        if let Some(err) = result.as_error() {
            warn!(
                target: SERVICE_TARGET,
                provider = %provider,
                error = %err,
                "Sync completed with errors"
            );
        }

        Ok(result)
    }

    /// Disconnect an integration, clearing its credentials but keeping
    /// its category toggle preferences.
    pub async fn disconnect(&self, provider: ProviderKind) -> Result<()> {
        self.registry.disconnect(provider).await?;
        Ok(())
    }

    /// Enable or disable an integration. Rejected while disconnected.
    pub async fn toggle(&self, provider: ProviderKind, enabled: bool) -> Result<()> {
        self.registry.toggle(provider, enabled).await?;
        Ok(())
    }

    /// Probe the provider with a cheap read-only call.
    ///
    /// Never errors: a disconnected integration, an unbuildable client,
    /// or any API failure all map to `false`.
    pub async fn test_connection(&self, provider: ProviderKind) -> bool {
        let config = self.registry.get(provider).await;

        match self.build_connector(&config) {
            Ok(connector) => connector.test_connection().await,
            Err(err) => {
                warn!(
                    target: SERVICE_TARGET,
                    provider = %provider,
                    error = %err,
                    "Connection probe could not build a client"
                );
                false
            }
        }
    }

    /// Build the provider client for an integration's stored settings.
    fn build_connector(&self, config: &IntegrationConfig) -> Result<Box<dyn Connector>> {
        match &config.settings {
            ProviderSettings::Quickbooks(settings) => {
                let mut qb = QbConfig::from_settings(settings)?;
                if let Some(base) = &self.config.quickbooks_api_base {
                    qb = qb.with_api_base(base.clone());
                }
                if let Some(url) = &self.config.quickbooks_token_url {
                    qb = qb.with_token_url(url.clone());
                }
                Ok(Box::new(QbClient::new(qb)?))
            }
            ProviderSettings::Shopify(settings) => {
                let mut shop = ShopConfig::from_settings(settings)?;
                if let Some(base) = &self.config.shopify_base_url {
                    shop = shop.with_base_url(base.clone());
                }
                Ok(Box::new(ShopClient::new(shop)?))
            }
        }
    }
}
