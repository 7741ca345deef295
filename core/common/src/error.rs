//! Common error types for CloudKit.

use thiserror::Error;

/// Boxed collaborator error kept as the source of a wrapped failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for CloudKit operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No constructor is registered under the requested provider name.
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    /// Missing or malformed configuration.
    #[error("Argument invalid: {0}")]
    ArgumentInvalid(String),

    /// Constructing the vendor client or preparing the root failed.
    #[error("Provider init error: {detail}")]
    ProviderInit {
        detail: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The collaborator reported that the object does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other failure reported by a vendor SDK.
    #[error("{provider} error: {source}")]
    Backend {
        provider: &'static str,
        #[source]
        source: BoxError,
    },

    /// Resource already exists.
    #[error("Already exists: {0}")]
    AlreadyExists(String),
}

impl Error {
    /// Wrap a construction failure together with its cause.
    pub fn provider_init(detail: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::ProviderInit {
            detail: detail.into(),
            source: Some(source.into()),
        }
    }

    /// Wrap a collaborator failure that is not a missing object.
    pub fn backend(provider: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Backend {
            provider,
            source: source.into(),
        }
    }

    /// Short, stable reason string for this error.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::ProviderNotFound(_) => "provider not found",
            Self::ArgumentInvalid(_) => "argument invalid",
            Self::ProviderInit { .. } => "provider init error",
            Self::NotFound(_) => "not found",
            Self::Io(_) => "io error",
            Self::Backend { .. } => "backend error",
            Self::AlreadyExists(_) => "already exists",
        }
    }

    /// Human-readable detail, when the variant carries one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::ProviderNotFound(d)
            | Self::ArgumentInvalid(d)
            | Self::NotFound(d)
            | Self::AlreadyExists(d) => Some(d),
            Self::ProviderInit { detail, .. } => Some(detail),
            Self::Io(_) | Self::Backend { .. } => None,
        }
    }

    /// Whether the collaborator classified this failure as a missing object.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Io(err) => err.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
