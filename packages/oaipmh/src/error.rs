//! Error types for the OAI-PMH provider.
//!
//! Protocol errors carry the OAI-PMH error code they are rendered with.
//! Everything else is a fault of the catalog or the environment and is
//! propagated to the caller untouched.

use thiserror::Error;

/// Main error type for the provider.
#[derive(Debug, Error)]
pub enum OaiError {
    /// No dataset exists with the requested identifier.
    #[error("No dataset with id {0}")]
    IdDoesNotExist(String),

    /// The verb argument is missing, repeated or not an OAI-PMH verb.
    #[error("Illegal OAI verb: {0}")]
    BadVerb(String),

    /// The request carries an illegal, missing or malformed argument.
    #[error("{0}")]
    BadArgument(String),

    /// The resumption token is invalid or expired.
    #[error("Invalid resumption token: {0}")]
    BadResumptionToken(String),

    /// The metadata prefix is not one of the advertised formats.
    #[error("Unsupported metadata prefix: {0}")]
    CannotDisseminateFormat(String),

    /// A list request matched no records.
    #[error("No records match the request")]
    NoRecordsMatch,

    /// The repository does not expose any sets.
    #[error("This repository does not support sets")]
    NoSetHierarchy,

    /// Catalog query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Catalog file could not be parsed.
    #[error("catalog file error: {0}")]
    CatalogFile(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl OaiError {
    /// The OAI-PMH error code for protocol errors, `None` for faults.
    #[must_use]
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::IdDoesNotExist(_) => Some("idDoesNotExist"),
            Self::BadVerb(_) => Some("badVerb"),
            Self::BadArgument(_) => Some("badArgument"),
            Self::BadResumptionToken(_) => Some("badResumptionToken"),
            Self::CannotDisseminateFormat(_) => Some("cannotDisseminateFormat"),
            Self::NoRecordsMatch => Some("noRecordsMatch"),
            Self::NoSetHierarchy => Some("noSetHierarchy"),
            Self::Database(_) | Self::CatalogFile(_) | Self::Io(_) | Self::Config(_) => None,
        }
    }

    /// Whether the error is rendered as an OAI-PMH error response.
    #[must_use]
    pub fn is_protocol_error(&self) -> bool {
        self.code().is_some()
    }
}

/// Result type alias for provider operations.
pub type Result<T> = std::result::Result<T, OaiError>;
