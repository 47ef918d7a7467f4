//! Provider and sync-category classification.
//!
//! This module provides the [`ProviderKind`] enum identifying the supported
//! external platforms, the [`Environment`] selector for providers with
//! distinct sandbox and production hosts, and the [`SyncCategory`] enum
//! naming the classes of domain data that can be independently enabled for
//! synchronization.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// The external platforms the engine can connect to.
///
/// The lowercase serialized form doubles as the stable integration id:
/// exactly one integration exists per provider kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString, EnumIter)]
#[derive(Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// QuickBooks Online (accounting)
    Quickbooks,
    /// Shopify (commerce)
    Shopify,
}

impl ProviderKind {
    /// Stable integration id for this provider.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Quickbooks => "quickbooks",
            Self::Shopify => "shopify",
        }
    }

    /// Human-facing provider name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Quickbooks => "QuickBooks",
            Self::Shopify => "Shopify",
        }
    }

    /// Whether this provider issues refresh tokens.
    ///
    /// Shopify's authorization-code grant produces a long-lived offline
    /// token instead; a 401 from its API cannot be recovered by refresh.
    #[must_use]
    pub fn supports_refresh(&self) -> bool {
        matches!(self, Self::Quickbooks)
    }

    /// Parse an integration id back into a provider kind.
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "quickbooks" => Some(Self::Quickbooks),
            "shopify" => Some(Self::Shopify),
            _ => None,
        }
    }
}

/// Deployment environment for providers with separate sandbox hosts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString)]
#[derive(Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Sandbox/development host
    #[default]
    Sandbox,
    /// Production host
    Production,
}

/// A named class of domain data that can be independently synchronized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString, EnumIter)]
#[derive(Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SyncCategory {
    /// Product catalog entries
    Products,
    /// Customer records
    Customers,
    /// Sales orders
    Orders,
    /// Inventory levels / stock items
    Inventory,
    /// Invoices
    Invoices,
    /// Received payments
    Payments,
}

impl SyncCategory {
    /// Human form used in per-category error strings.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Products => "Products",
            Self::Customers => "Customers",
            Self::Orders => "Orders",
            Self::Inventory => "Inventory",
            Self::Invoices => "Invoices",
            Self::Payments => "Payments",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_ids_round_trip() {
        assert_eq!(ProviderKind::from_id("quickbooks"), Some(ProviderKind::Quickbooks));
        assert_eq!(ProviderKind::from_id("shopify"), Some(ProviderKind::Shopify));
        assert_eq!(ProviderKind::from_id("stripe"), None);
        assert_eq!(ProviderKind::Quickbooks.id(), "quickbooks");
    }

    #[test]
    fn test_refresh_support() {
        assert!(ProviderKind::Quickbooks.supports_refresh());
        assert!(!ProviderKind::Shopify.supports_refresh());
    }

    #[test]
    fn test_serialized_form_is_lowercase() {
        let json = serde_json::to_string(&ProviderKind::Quickbooks).unwrap();
        assert_eq!(json, "\"quickbooks\"");
        let env = serde_json::to_string(&Environment::Production).unwrap();
        assert_eq!(env, "\"production\"");
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(SyncCategory::Customers.label(), "Customers");
        assert_eq!(SyncCategory::Inventory.label(), "Inventory");
    }
}
