use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Stage of a connection attempt that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Configuration,
    Authentication,
    CredentialMint,
    Connection,
    Query,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Configuration => "configuration",
            Stage::Authentication => "authentication",
            Stage::CredentialMint => "credential_mint",
            Stage::Connection => "connection",
            Stage::Query => "query",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug)]
pub enum ProviderError {
    /// Malformed or incomplete configuration. Not retryable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Identity backend unreachable, rejected the caller or answered with an
    /// empty response.
    #[error("authentication error: {0}")]
    Authentication(String),

    /// The cluster credential-issuing API rejected the request.
    #[error("credential mint error: {0}")]
    CredentialMint(String),

    /// Database unreachable or rejected the credentials.
    #[error("connection error: {0}")]
    Connection(String),

    /// A query on an open connection failed.
    #[error("query error: {0}")]
    Query(String),

    /// The database answered `current_namespace` with something that is not a UUID.
    #[error("invalid namespace {value:?}: {reason}")]
    InvalidNamespace { value: String, reason: String },
}

impl ProviderError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    pub fn credential_mint(msg: impl Into<String>) -> Self {
        Self::CredentialMint(msg.into())
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Build the error kind that belongs to `stage`.
    pub fn at_stage(stage: Stage, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        match stage {
            Stage::Configuration => Self::Configuration(msg),
            Stage::Authentication => Self::Authentication(msg),
            Stage::CredentialMint => Self::CredentialMint(msg),
            Stage::Connection => Self::Connection(msg),
            Stage::Query => Self::Query(msg),
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            Self::Configuration(_) => Stage::Configuration,
            Self::Authentication(_) => Stage::Authentication,
            Self::CredentialMint(_) => Stage::CredentialMint,
            Self::Connection(_) => Stage::Connection,
            Self::Query(_) | Self::InvalidNamespace { .. } => Stage::Query,
        }
    }

    /// True when the failure means "no usable cloud identity here" rather than
    /// "the configuration is wrong". Callers such as acceptance tests skip on
    /// this instead of failing.
    pub fn is_environment_unavailable(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }
}

pub type Result<T, E = ProviderError> = std::result::Result<T, E>;
