//! Integration configuration model and sync results.
//!
//! One [`IntegrationConfig`] exists per [`ProviderKind`]. Its
//! [`ProviderSettings`] are a tagged union, so each provider's credential
//! fields and category toggles are statically known; there is no
//! stringly-typed settings bag.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::provider::{Environment, ProviderKind, SyncCategory};
use crate::token::TokenSet;

fn default_true() -> bool {
    true
}

fn default_sync_interval() -> u32 {
    60
}

/// Persistent configuration and connection state for one integration.
///
/// Invariants are enforced by the registry, not here: `enabled` implies
/// `connected`, and `connected` implies the provider's required credential
/// fields are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationConfig {
    /// Stable provider key (`"quickbooks"`, `"shopify"`).
    pub id: String,
    /// Human-facing name shown by consumers.
    pub display_name: String,
    /// Which provider this integration talks to.
    pub provider: ProviderKind,
    /// Whether automatic syncing is enabled. Meaningless unless connected.
    #[serde(default)]
    pub enabled: bool,
    /// Whether the integration holds live credentials.
    #[serde(default)]
    pub connected: bool,
    /// When the current connection was established.
    #[serde(default)]
    pub connected_at: Option<Timestamp>,
    /// When the last sync run finished, successfully or not.
    #[serde(default)]
    pub last_sync: Option<Timestamp>,
    /// Provider-specific credentials and preferences.
    pub settings: ProviderSettings,
}

impl IntegrationConfig {
    /// Default configuration seeded for a provider on first load.
    pub fn seeded(provider: ProviderKind) -> Self {
        Self {
            id: provider.id().to_string(),
            display_name: provider.display_name().to_string(),
            provider,
            enabled: false,
            connected: false,
            connected_at: None,
            last_sync: None,
            settings: ProviderSettings::seeded(provider),
        }
    }
}

/// Provider-specific settings, one variant per supported provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum ProviderSettings {
    /// QuickBooks Online settings.
    Quickbooks(QuickbooksSettings),
    /// Shopify settings.
    Shopify(ShopifySettings),
}

impl ProviderSettings {
    /// Default settings for a provider.
    pub fn seeded(provider: ProviderKind) -> Self {
        match provider {
            ProviderKind::Quickbooks => Self::Quickbooks(QuickbooksSettings::default()),
            ProviderKind::Shopify => Self::Shopify(ShopifySettings::default()),
        }
    }

    /// Which provider these settings belong to.
    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::Quickbooks(_) => ProviderKind::Quickbooks,
            Self::Shopify(_) => ProviderKind::Shopify,
        }
    }

    /// Enabled sync categories, in the provider's declared run order.
    pub fn enabled_categories(&self) -> Vec<SyncCategory> {
        match self {
            Self::Quickbooks(s) => s.categories.enabled(),
            Self::Shopify(s) => s.categories.enabled(),
        }
    }

    /// Whether every credential field required to hold a connection is set.
    pub fn has_credentials(&self) -> bool {
        match self {
            Self::Quickbooks(s) => {
                s.client_id.is_some()
                    && s.client_secret.is_some()
                    && s.access_token.is_some()
                    && s.refresh_token.is_some()
                    && s.realm_id.is_some()
            }
            Self::Shopify(s) => {
                s.api_key.is_some()
                    && s.api_secret.is_some()
                    && s.access_token.is_some()
                    && s.shop_domain.is_some()
            }
        }
    }

    /// Merge freshly-issued tokens into the stored credentials.
    pub fn merge_tokens(&mut self, tokens: &TokenSet) {
        match self {
            Self::Quickbooks(s) => {
                s.access_token = Some(tokens.access_token.clone());
                if tokens.refresh_token.is_some() {
                    s.refresh_token = tokens.refresh_token.clone();
                }
                if tokens.account_id.is_some() {
                    s.realm_id = tokens.account_id.clone();
                }
            }
            Self::Shopify(s) => {
                s.access_token = Some(tokens.access_token.clone());
                if tokens.account_id.is_some() {
                    s.shop_domain = tokens.account_id.clone();
                }
            }
        }
    }

    /// Clear every credential field, preserving category toggles and sync
    /// preferences. Configuration intent survives reconnection.
    pub fn clear_credentials(&mut self) {
        match self {
            Self::Quickbooks(s) => {
                s.client_id = None;
                s.client_secret = None;
                s.access_token = None;
                s.refresh_token = None;
                s.realm_id = None;
            }
            Self::Shopify(s) => {
                s.api_key = None;
                s.api_secret = None;
                s.access_token = None;
                s.shop_domain = None;
            }
        }
    }
}

/// QuickBooks Online credentials and preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickbooksSettings {
    /// OAuth2 client id issued by the Intuit developer portal.
    #[serde(default)]
    pub client_id: Option<String>,
    /// OAuth2 client secret.
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Current access token.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Long-lived refresh token.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Company realm id the session is scoped to.
    #[serde(default)]
    pub realm_id: Option<String>,
    /// Sandbox or production API host.
    #[serde(default)]
    pub environment: Environment,
    /// Per-category sync toggles.
    #[serde(default)]
    pub categories: QuickbooksCategories,
    /// Whether background syncing is wanted.
    #[serde(default)]
    pub auto_sync: bool,
    /// Minutes between automatic syncs.
    #[serde(default = "default_sync_interval")]
    pub sync_interval_minutes: u32,
}

impl Default for QuickbooksSettings {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            access_token: None,
            refresh_token: None,
            realm_id: None,
            environment: Environment::default(),
            categories: QuickbooksCategories::default(),
            auto_sync: false,
            sync_interval_minutes: default_sync_interval(),
        }
    }
}

/// Category toggles for QuickBooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickbooksCategories {
    /// Sync customer records.
    #[serde(default = "default_true")]
    pub customers: bool,
    /// Sync invoices.
    #[serde(default = "default_true")]
    pub invoices: bool,
    /// Sync received payments.
    #[serde(default = "default_true")]
    pub payments: bool,
    /// Sync inventory items.
    #[serde(default)]
    pub inventory: bool,
}

impl Default for QuickbooksCategories {
    fn default() -> Self {
        Self {
            customers: true,
            invoices: true,
            payments: true,
            inventory: false,
        }
    }
}

impl QuickbooksCategories {
    /// Declared run order for QuickBooks categories.
    pub const ORDER: [SyncCategory; 4] = [
        SyncCategory::Customers,
        SyncCategory::Invoices,
        SyncCategory::Payments,
        SyncCategory::Inventory,
    ];

    /// Whether the given category is toggled on.
    pub fn is_enabled(&self, category: SyncCategory) -> bool {
        match category {
            SyncCategory::Customers => self.customers,
            SyncCategory::Invoices => self.invoices,
            SyncCategory::Payments => self.payments,
            SyncCategory::Inventory => self.inventory,
            _ => false,
        }
    }

    /// Enabled categories in declared run order.
    pub fn enabled(&self) -> Vec<SyncCategory> {
        Self::ORDER
            .into_iter()
            .filter(|c| self.is_enabled(*c))
            .collect()
    }
}

/// Shopify credentials and preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopifySettings {
    /// App API key from the Shopify partner dashboard.
    #[serde(default)]
    pub api_key: Option<String>,
    /// App API secret.
    #[serde(default)]
    pub api_secret: Option<String>,
    /// Long-lived offline access token.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Shop domain the session is scoped to (e.g. `my-store.myshopify.com`).
    #[serde(default)]
    pub shop_domain: Option<String>,
    /// Per-category sync toggles.
    #[serde(default)]
    pub categories: ShopifyCategories,
    /// Whether background syncing is wanted.
    #[serde(default)]
    pub auto_sync: bool,
    /// Minutes between automatic syncs.
    #[serde(default = "default_sync_interval")]
    pub sync_interval_minutes: u32,
}

impl Default for ShopifySettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_secret: None,
            access_token: None,
            shop_domain: None,
            categories: ShopifyCategories::default(),
            auto_sync: false,
            sync_interval_minutes: default_sync_interval(),
        }
    }
}

/// Category toggles for Shopify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopifyCategories {
    /// Sync the product catalog.
    #[serde(default = "default_true")]
    pub products: bool,
    /// Sync customer records.
    #[serde(default = "default_true")]
    pub customers: bool,
    /// Sync orders.
    #[serde(default = "default_true")]
    pub orders: bool,
    /// Sync inventory levels.
    #[serde(default)]
    pub inventory: bool,
}

impl Default for ShopifyCategories {
    fn default() -> Self {
        Self {
            products: true,
            customers: true,
            orders: true,
            inventory: false,
        }
    }
}

impl ShopifyCategories {
    /// Declared run order for Shopify categories.
    pub const ORDER: [SyncCategory; 4] = [
        SyncCategory::Products,
        SyncCategory::Customers,
        SyncCategory::Orders,
        SyncCategory::Inventory,
    ];

    /// Whether the given category is toggled on.
    pub fn is_enabled(&self, category: SyncCategory) -> bool {
        match category {
            SyncCategory::Products => self.products,
            SyncCategory::Customers => self.customers,
            SyncCategory::Orders => self.orders,
            SyncCategory::Inventory => self.inventory,
            _ => false,
        }
    }

    /// Enabled categories in declared run order.
    pub fn enabled(&self) -> Vec<SyncCategory> {
        Self::ORDER
            .into_iter()
            .filter(|c| self.is_enabled(*c))
            .collect()
    }
}

/// Outcome of one sync run.
///
/// `success` is false whenever any category failed; `synced_items` still
/// counts what the succeeding categories pulled, so a partially-failed run
/// is distinguishable from a total failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncResult {
    /// True when no category failed.
    pub success: bool,
    /// Total items pulled across all succeeding categories.
    pub synced_items: u64,
    /// One entry per failed category, in run order.
    #[serde(default)]
    pub errors: Vec<String>,
    /// When the run finished.
    pub timestamp: Timestamp,
}

impl SyncResult {
    /// Build a result from a finished run, stamping the current time.
    pub fn from_run(synced_items: u64, errors: Vec<String>) -> Self {
        Self {
            success: errors.is_empty(),
            synced_items,
            errors,
            timestamp: Timestamp::now(),
        }
    }

    /// Whether some categories succeeded while others failed.
    pub fn is_partial(&self) -> bool {
        !self.success && self.synced_items > 0
    }

    /// The aggregated error form of a run with failed categories, or
    /// `None` when every category succeeded.
    pub fn as_error(&self) -> Option<crate::Error> {
        if self.success {
            None
        } else {
            Some(crate::Error::PartialSync {
                errors: self.errors.clone(),
                synced_items: self.synced_items,
            })
        }
    }
}
