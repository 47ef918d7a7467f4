//! JSON-backed persistence for integration configurations.
//!
//! The store owns one JSON document holding every [`IntegrationConfig`].
//! It is an explicit instance injected wherever persistence is needed;
//! there is no ambient singleton, so tests construct isolated stores over
//! temporary directories.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use vendo_core::{IntegrationConfig, Result};

use crate::STORE_TARGET;

/// Current schema version of the persisted document.
///
/// Documents without a `version` field deserialize as version 0 (the
/// legacy unversioned blob) and are migrated in place on load.
pub const STORE_VERSION: u32 = 1;

/// The persisted document: schema version plus every integration config.
///
/// Unknown fields are tolerated and missing fields defaulted, so documents
/// written by other versions load without error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreDocument {
    /// Schema version of this document.
    #[serde(default)]
    pub version: u32,
    /// One entry per known provider.
    #[serde(default)]
    pub integrations: Vec<IntegrationConfig>,
}

impl Default for StoreDocument {
    fn default() -> Self {
        Self {
            version: STORE_VERSION,
            integrations: Vec::new(),
        }
    }
}

impl StoreDocument {
    /// Upgrade an older document to the current schema in place.
    ///
    /// Returns whether anything changed. Version 0 documents carry the
    /// same integration records without a version field; the tolerant
    /// deserialization already filled any gaps, so migration only stamps
    /// the version.
    pub fn migrate(&mut self) -> bool {
        if self.version < STORE_VERSION {
            debug!(
                target: STORE_TARGET,
                from = self.version,
                to = STORE_VERSION,
                "Migrating store document"
            );
            self.version = STORE_VERSION;
            return true;
        }
        false
    }
}

/// File-backed store for the integration document.
#[derive(Debug, Clone)]
pub struct IntegrationStore {
    path: PathBuf,
}

impl IntegrationStore {
    /// Create a store over the given file path.
    ///
    /// The file does not need to exist yet; loading a missing file yields
    /// an empty document.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and migrate the persisted document.
    pub async fn load(&self) -> Result<StoreDocument> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(
                    target: STORE_TARGET,
                    path = %self.path.display(),
                    "No store file yet, starting empty"
                );
                return Ok(StoreDocument::default());
            }
            Err(err) => return Err(err.into()),
        };

        let mut document: StoreDocument = serde_json::from_slice(&bytes)?;

        if document.version > STORE_VERSION {
            warn!(
                target: STORE_TARGET,
                version = document.version,
                supported = STORE_VERSION,
                "Store document was written by a newer version"
            );
        }
        document.migrate();

        Ok(document)
    }

    /// Persist the document atomically.
    ///
    /// Writes to a sibling temp file and renames it over the target, so a
    /// crash mid-write never leaves a truncated document behind.
    pub async fn save(&self, document: &StoreDocument) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let bytes = serde_json::to_vec_pretty(document)?;
        let staging = self.path.with_extension("json.tmp");

        tokio::fs::write(&staging, &bytes).await?;
        tokio::fs::rename(&staging, &self.path).await?;

        debug!(
            target: STORE_TARGET,
            path = %self.path.display(),
            integrations = document.integrations.len(),
            "Store document saved"
        );

        Ok(())
    }
}
