//! Error types shared across the sync engine.

use thiserror::Error;

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for all sync-engine operations.
///
/// This is a convenience type alias that defaults to using [`Error`] as the
/// error type. Most functions in this workspace return this type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Comprehensive error type for sync-engine operations.
///
/// The variants map one-to-one onto the failure classes of the engine:
/// missing configuration detected before any network call, a provider
/// rejecting a token exchange or refresh, a non-2xx data-endpoint response,
/// a transport-level failure, and the aggregated per-category failures of a
/// partially-successful sync run.
#[derive(Debug, Error)]
pub enum Error {
    /// A required credential or setting is absent.
    ///
    /// Always raised before any network call is attempted.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the missing or invalid setting
        message: String,
    },

    /// The provider rejected a token exchange or refresh.
    #[error("authorization rejected: {message}")]
    Authorization {
        /// Provider response describing the rejection
        message: String,
    },

    /// A data endpoint returned a non-2xx status.
    #[error("API error (status {status}): {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Raw provider response text
        body: String,
    },

    /// Transport-level failure (connection, DNS, timeout).
    #[error("connectivity error: {message}")]
    Connectivity {
        /// Description of the transport failure
        message: String,
        /// Underlying error, when available
        #[source]
        source: Option<BoxedError>,
    },

    /// A sync run completed, but one or more categories failed.
    ///
    /// `synced_items` still reflects the categories that succeeded.
    #[error("sync completed with {} failed categories", .errors.len())]
    PartialSync {
        /// One human-readable entry per failed category, in run order
        errors: Vec<String>,
        /// Items synced by the categories that succeeded
        synced_items: u64,
    },

    /// A sync was requested for an integration that is already syncing.
    #[error("a sync for integration '{id}' is already in flight")]
    SyncInFlight {
        /// Integration id of the running sync
        id: String,
    },

    /// Serialization/deserialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an authorization error.
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
        }
    }

    /// Create an API error from a status code and raw response body.
    pub fn api(status: u16, body: impl Into<String>) -> Self {
        Self::Api {
            status,
            body: body.into(),
        }
    }

    /// Create a connectivity error without an underlying source.
    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::Connectivity {
            message: message.into(),
            source: None,
        }
    }

    /// Create a sync-in-flight error for the given integration id.
    pub fn sync_in_flight(id: impl Into<String>) -> Self {
        Self::SyncInFlight { id: id.into() }
    }

    /// Check whether this error is an expired-auth response (HTTP 401).
    ///
    /// The provider clients use this to decide whether a single
    /// refresh-and-retry is warranted.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Error::Api { status: 401, .. })
    }

    /// Check if this error indicates a temporary failure that might succeed
    /// on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Connectivity { .. } => true,
            Error::Api { status, .. } => matches!(*status, 429 | 500..=599),
            Error::Configuration { .. }
            | Error::Authorization { .. }
            | Error::PartialSync { .. }
            | Error::SyncInFlight { .. }
            | Error::Serialization(_)
            | Error::Io(_) => false,
        }
    }

    /// The bare failure message, without the classification prefix.
    ///
    /// Used where the message is embedded into another sentence, such as
    /// the per-category entries of a sync result.
    pub fn detail(&self) -> String {
        match self {
            Error::Configuration { message }
            | Error::Authorization { message }
            | Error::Connectivity { message, .. } => message.clone(),
            Error::Api { body, .. } => body.clone(),
            other => other.to_string(),
        }
    }

    /// Get the HTTP status code if this is an API error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Get a user-friendly message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            Error::Configuration { message } => format!("Configuration error: {message}"),
            Error::Authorization { message } => format!("Authorization failed: {message}"),
            Error::Api { status, body } => format!("Provider error ({status}): {body}"),
            Error::Connectivity { .. } => {
                "Network error occurred. Please check your connection.".to_string()
            }
            Error::PartialSync { errors, .. } => {
                format!("Sync completed with errors: {}", errors.join("; "))
            }
            Error::SyncInFlight { id } => {
                format!("A sync for '{id}' is already running. Please wait for it to finish.")
            }
            _ => "An unexpected error occurred. Please try again.".to_string(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "request timed out".to_string()
        } else if err.is_connect() {
            "connection failed".to_string()
        } else {
            err.to_string()
        };

        Self::Connectivity {
            message,
            source: Some(Box::new(err)),
        }
    }
}
