//! The integration registry: owner of per-provider configuration state.
//!
//! The registry holds one [`IntegrationConfig`] per known provider and is
//! the only component that survives across sync runs. Every mutation is an
//! atomic read-merge-write behind one lock, followed by a persist, so
//! concurrent toggle/settings/sync-completion updates targeting the same
//! integration serialize instead of losing writes.

use std::collections::HashMap;

use jiff::Timestamp;
use strum::IntoEnumIterator;
use tokio::sync::Mutex;
use tracing::{debug, info};
use vendo_core::{
    Error, IntegrationConfig, ProviderKind, ProviderSettings, Result, SyncResult,
};

use crate::store::{IntegrationStore, StoreDocument};
use crate::REGISTRY_TARGET;

/// Registry of integration configurations, backed by an injected store.
///
/// State machine per integration:
/// `Disconnected → Connecting → ConnectedIdle ⇄ ConnectedSyncing`, with
/// `ConnectedIdle → Disconnected` on disconnect and `Connecting →
/// Disconnected` when the exchange fails (the registry is only flipped to
/// connected after a successful exchange). Configurations are never
/// deleted; [`reset`](Self::reset) returns one to its seeded default.
#[derive(Debug)]
pub struct IntegrationRegistry {
    store: IntegrationStore,
    state: Mutex<HashMap<ProviderKind, IntegrationConfig>>,
}

impl IntegrationRegistry {
    /// Load persisted state, seeding a default config for every known
    /// provider that has none yet.
    pub async fn load(store: IntegrationStore) -> Result<Self> {
        let document = store.load().await?;

        let mut state: HashMap<ProviderKind, IntegrationConfig> = HashMap::new();
        for config in document.integrations {
            state.insert(config.provider, config);
        }

        let mut seeded = false;
        for provider in ProviderKind::iter() {
            if !state.contains_key(&provider) {
                debug!(
                    target: REGISTRY_TARGET,
                    provider = %provider,
                    "Seeding default integration config"
                );
                state.insert(provider, IntegrationConfig::seeded(provider));
                seeded = true;
            }
        }

        if seeded {
            store.save(&Self::document(&state)).await?;
        }

        Ok(Self {
            store,
            state: Mutex::new(state),
        })
    }

    fn document(state: &HashMap<ProviderKind, IntegrationConfig>) -> StoreDocument {
        let mut document = StoreDocument::default();
        for provider in ProviderKind::iter() {
            if let Some(config) = state.get(&provider) {
                document.integrations.push(config.clone());
            }
        }
        document
    }

    /// Get a snapshot of one integration's configuration.
    pub async fn get(&self, provider: ProviderKind) -> IntegrationConfig {
        self.state
            .lock()
            .await
            .get(&provider)
            .cloned()
            .expect("every provider is seeded at load")
    }

    /// Get a snapshot of every integration, in provider order.
    pub async fn list(&self) -> Vec<IntegrationConfig> {
        let state = self.state.lock().await;
        ProviderKind::iter()
            .filter_map(|p| state.get(&p).cloned())
            .collect()
    }

    /// Apply one atomic read-merge-write mutation, then persist.
    ///
    /// The lock is held across the persist, so mutations (and their
    /// on-disk order) serialize.
    async fn mutate<F>(&self, provider: ProviderKind, apply: F) -> Result<IntegrationConfig>
    where
        F: FnOnce(&mut IntegrationConfig) -> Result<()>,
    {
        let mut state = self.state.lock().await;
        let entry = state
            .get_mut(&provider)
            .expect("every provider is seeded at load");

        let mut updated = entry.clone();
        apply(&mut updated)?;
        *entry = updated.clone();

        let document = Self::document(&state);
        self.store.save(&document).await?;

        Ok(updated)
    }

    /// Replace an integration's settings (read-merge-write, then persist).
    ///
    /// Credential invariants still apply: settings that drop the
    /// credentials of a connected integration are rejected.
    pub async fn update_settings(
        &self,
        provider: ProviderKind,
        settings: ProviderSettings,
    ) -> Result<IntegrationConfig> {
        self.mutate(provider, |config| {
            if settings.kind() != provider {
                return Err(Error::configuration(format!(
                    "settings are for {}, not {}",
                    settings.kind(),
                    provider
                )));
            }
            if config.connected && !settings.has_credentials() {
                return Err(Error::configuration(
                    "cannot drop credentials of a connected integration; disconnect instead",
                ));
            }
            config.settings = settings;
            Ok(())
        })
        .await
    }

    /// Mark an integration connected with the given settings.
    ///
    /// The settings must carry every credential field the provider
    /// requires; `connected_at` is stamped with the current time.
    pub async fn connect(
        &self,
        provider: ProviderKind,
        settings: ProviderSettings,
    ) -> Result<IntegrationConfig> {
        let config = self
            .mutate(provider, |config| {
                if settings.kind() != provider {
                    return Err(Error::configuration(format!(
                        "settings are for {}, not {}",
                        settings.kind(),
                        provider
                    )));
                }
                if !settings.has_credentials() {
                    return Err(Error::configuration(
                        "cannot connect without complete credentials",
                    ));
                }
                config.settings = settings;
                config.connected = true;
                config.enabled = true;
                config.connected_at = Some(Timestamp::now());
                Ok(())
            })
            .await?;

        info!(target: REGISTRY_TARGET, provider = %provider, "Integration connected");
        Ok(config)
    }

    /// Disconnect an integration: clear every credential field, keep the
    /// category toggles and sync preferences.
    pub async fn disconnect(&self, provider: ProviderKind) -> Result<IntegrationConfig> {
        let config = self
            .mutate(provider, |config| {
                config.settings.clear_credentials();
                config.connected = false;
                config.enabled = false;
                config.connected_at = None;
                Ok(())
            })
            .await?;

        info!(target: REGISTRY_TARGET, provider = %provider, "Integration disconnected");
        Ok(config)
    }

    /// Enable or disable an integration.
    ///
    /// Rejected while disconnected: `enabled` is meaningless without a
    /// connection.
    pub async fn toggle(
        &self,
        provider: ProviderKind,
        enabled: bool,
    ) -> Result<IntegrationConfig> {
        self.mutate(provider, |config| {
            if !config.connected {
                return Err(Error::configuration(format!(
                    "integration '{}' is not connected",
                    config.id
                )));
            }
            config.enabled = enabled;
            Ok(())
        })
        .await
    }

    /// Record a finished sync run against the integration.
    pub async fn record_sync(
        &self,
        provider: ProviderKind,
        result: &SyncResult,
    ) -> Result<IntegrationConfig> {
        self.mutate(provider, |config| {
            config.last_sync = Some(result.timestamp);
            Ok(())
        })
        .await
    }

    /// Return an integration to its seeded default.
    pub async fn reset(&self, provider: ProviderKind) -> Result<IntegrationConfig> {
        self.mutate(provider, |config| {
            *config = IntegrationConfig::seeded(provider);
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use vendo_core::{QuickbooksSettings, ShopifyCategories, ShopifySettings};

    use super::*;

    fn connected_shopify_settings() -> ProviderSettings {
        ProviderSettings::Shopify(ShopifySettings {
            api_key: Some("key".into()),
            api_secret: Some("secret".into()),
            access_token: Some("shpat_x".into()),
            shop_domain: Some("demo.myshopify.com".into()),
            categories: ShopifyCategories {
                products: true,
                customers: false,
                orders: true,
                inventory: false,
            },
            ..ShopifySettings::default()
        })
    }

    async fn fresh_registry(dir: &tempfile::TempDir) -> IntegrationRegistry {
        let store = IntegrationStore::new(dir.path().join("integrations.json"));
        IntegrationRegistry::load(store).await.unwrap()
    }

    #[tokio::test]
    async fn test_load_seeds_every_provider_and_persists() {
        let dir = tempfile::TempDir::new().unwrap();
        let registry = fresh_registry(&dir).await;

        let all = registry.list().await;
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|c| !c.connected));

        // The seeded state survives a reload from the same store.
        drop(registry);
        let registry = fresh_registry(&dir).await;
        assert_eq!(registry.list().await.len(), 2);
    }

    #[tokio::test]
    async fn test_connect_requires_complete_credentials() {
        let dir = tempfile::TempDir::new().unwrap();
        let registry = fresh_registry(&dir).await;

        let incomplete = ProviderSettings::Shopify(ShopifySettings {
            api_key: Some("key".into()),
            ..ShopifySettings::default()
        });

        let err = registry
            .connect(ProviderKind::Shopify, incomplete)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(!registry.get(ProviderKind::Shopify).await.connected);
    }

    #[tokio::test]
    async fn test_connect_rejects_mismatched_settings_variant() {
        let dir = tempfile::TempDir::new().unwrap();
        let registry = fresh_registry(&dir).await;

        let err = registry
            .connect(
                ProviderKind::Quickbooks,
                connected_shopify_settings(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_disconnect_clears_credentials_and_keeps_toggles() {
        let dir = tempfile::TempDir::new().unwrap();
        let registry = fresh_registry(&dir).await;

        registry
            .connect(ProviderKind::Shopify, connected_shopify_settings())
            .await
            .unwrap();

        let connected = registry.get(ProviderKind::Shopify).await;
        assert!(connected.connected);
        assert!(connected.enabled);
        assert!(connected.connected_at.is_some());

        let disconnected = registry.disconnect(ProviderKind::Shopify).await.unwrap();
        assert!(!disconnected.connected);
        assert!(!disconnected.enabled);
        assert!(disconnected.connected_at.is_none());
        assert!(!disconnected.settings.has_credentials());

        // toggle preferences survive the disconnect
        let ProviderSettings::Shopify(s) = &disconnected.settings else {
            panic!("variant changed");
        };
        assert!(s.categories.products);
        assert!(!s.categories.customers);
        assert!(s.categories.orders);
    }

    #[tokio::test]
    async fn test_toggle_rejected_while_disconnected() {
        let dir = tempfile::TempDir::new().unwrap();
        let registry = fresh_registry(&dir).await;

        let err = registry
            .toggle(ProviderKind::Quickbooks, true)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_update_settings_cannot_strip_connected_credentials() {
        let dir = tempfile::TempDir::new().unwrap();
        let registry = fresh_registry(&dir).await;

        registry
            .connect(ProviderKind::Shopify, connected_shopify_settings())
            .await
            .unwrap();

        let err = registry
            .update_settings(
                ProviderKind::Shopify,
                ProviderSettings::Shopify(ShopifySettings::default()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_record_sync_stamps_last_sync() {
        let dir = tempfile::TempDir::new().unwrap();
        let registry = fresh_registry(&dir).await;

        let result = SyncResult::from_run(7, vec![]);
        let config = registry
            .record_sync(ProviderKind::Quickbooks, &result)
            .await
            .unwrap();

        assert_eq!(config.last_sync, Some(result.timestamp));
    }

    #[tokio::test]
    async fn test_reset_returns_to_seeded_default() {
        let dir = tempfile::TempDir::new().unwrap();
        let registry = fresh_registry(&dir).await;

        registry
            .connect(ProviderKind::Shopify, connected_shopify_settings())
            .await
            .unwrap();
        let config = registry.reset(ProviderKind::Shopify).await.unwrap();

        assert_eq!(config, IntegrationConfig::seeded(ProviderKind::Shopify));
    }

    #[tokio::test]
    async fn test_concurrent_mutations_serialize_without_lost_updates() {
        let dir = tempfile::TempDir::new().unwrap();
        let registry = Arc::new(fresh_registry(&dir).await);

        registry
            .connect(ProviderKind::Shopify, connected_shopify_settings())
            .await
            .unwrap();

        let mut handles = Vec::new();
        for i in 0..8u32 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                registry
                    .toggle(ProviderKind::Shopify, i % 2 == 0)
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // Still exactly one Shopify config, still connected, and the store
        // reloads cleanly after interleaved persists.
        let reloaded = fresh_registry(&dir).await;
        let config = reloaded.get(ProviderKind::Shopify).await;
        assert!(config.connected);
    }

    #[tokio::test]
    async fn test_quickbooks_default_is_sparse() {
        let dir = tempfile::TempDir::new().unwrap();
        let registry = fresh_registry(&dir).await;

        let config = registry.get(ProviderKind::Quickbooks).await;
        let ProviderSettings::Quickbooks(settings) = &config.settings else {
            panic!("wrong variant");
        };
        assert_eq!(settings, &QuickbooksSettings::default());
    }
}
