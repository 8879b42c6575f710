//! Crate-wide error hierarchy for scm-engine.
//!
//! Three layers:
//! - [`TransportError`]: the request never produced an HTTP response.
//! - [`ScmError`]: the root error returned by every public operation.
//! - [`ConfigError`]: problems building a client (base URL, env values).

use std::fmt;
use std::string::FromUtf8Error;

use thiserror::Error;

use crate::git_providers::types::{ProviderKind, Response};

/// Convenient alias for crate-wide results.
pub type ScmResult<T> = Result<T, ScmError>;

/// Root error type for the scm-engine crate.
#[derive(Debug, Error)]
pub enum ScmError {
    /// The transport failed before any HTTP status was received.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The provider answered with a non-success status.
    ///
    /// The normalized response is kept so callers can inspect headers and
    /// rate limit state.
    #[error("{provider} responded with status {status}: {message}")]
    Status {
        provider: ProviderKind,
        status: u16,
        message: String,
        response: Box<Response>,
    },

    /// The payload was present but did not match the expected JSON shape.
    #[error("invalid {target} payload from {provider}: {source}")]
    Decode {
        provider: ProviderKind,
        target: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A plain-text payload was not valid UTF-8.
    #[error("invalid {target} text from {provider}: {source}")]
    InvalidText {
        provider: ProviderKind,
        target: &'static str,
        #[source]
        source: FromUtf8Error,
    },

    /// The provider answered successfully but nothing matched the lookup.
    #[error("{what} not found on {provider}")]
    NotFound { provider: ProviderKind, what: String },

    /// The identity probe succeeded but named no user (anonymous credentials).
    #[error("{provider} did not identify an authenticated user")]
    Unauthenticated { provider: ProviderKind },

    /// The provider has no equivalent for this operation.
    #[error("{operation} is not supported by {provider}")]
    Unsupported {
        provider: ProviderKind,
        operation: &'static str,
    },

    /// One step of a multi-request identity resolution failed.
    #[error("{step} failed: {source}")]
    Identity {
        step: IdentityStep,
        #[source]
        source: Box<ScmError>,
    },

    /// Configuration problems (bad base URL, unknown provider, etc.).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Input rejected before any request was sent.
    #[error("validation error: {0}")]
    Validation(String),
}

/// Step of a multi-request identity resolution, attached to failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityStep {
    /// Lightweight "who am I" probe returning only a login.
    Probe,
    /// Full profile lookup.
    Lookup,
    /// Secondary request fetching the primary email address.
    Emails,
}

impl fmt::Display for IdentityStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let step = match self {
            Self::Probe => "identity probe",
            Self::Lookup => "user lookup",
            Self::Emails => "email lookup",
        };
        f.write_str(step)
    }
}

/// Flat classification of an [`ScmError`], ignoring [`ScmError::Identity`] wrappers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Canceled,
    Timeout,
    Network,
    Status,
    Decode,
    NotFound,
    Unauthenticated,
    Unsupported,
    Config,
    Validation,
}

impl ScmError {
    pub(crate) fn in_step(self, step: IdentityStep) -> Self {
        Self::Identity {
            step,
            source: Box::new(self),
        }
    }

    pub(crate) fn unsupported(provider: ProviderKind, operation: &'static str) -> Self {
        Self::Unsupported {
            provider,
            operation,
        }
    }

    /// Innermost error, with every [`ScmError::Identity`] layer removed.
    pub fn root(&self) -> &ScmError {
        match self {
            Self::Identity { source, .. } => source.root(),
            other => other,
        }
    }

    /// The identity step that failed, if this error came from one.
    pub fn step(&self) -> Option<IdentityStep> {
        match self {
            Self::Identity { step, .. } => Some(*step),
            _ => None,
        }
    }

    /// Classifies the error so callers can tell "canceled" from "provider said no".
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Identity { source, .. } => source.kind(),
            Self::Transport(TransportError::Canceled) => ErrorKind::Canceled,
            Self::Transport(TransportError::Timeout) => ErrorKind::Timeout,
            Self::Transport(_) => ErrorKind::Network,
            Self::Status { .. } => ErrorKind::Status,
            Self::Decode { .. } | Self::InvalidText { .. } => ErrorKind::Decode,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Unauthenticated { .. } => ErrorKind::Unauthenticated,
            Self::Unsupported { .. } => ErrorKind::Unsupported,
            Self::Config(_) => ErrorKind::Config,
            Self::Validation(_) => ErrorKind::Validation,
        }
    }

    /// Raw HTTP status for [`ScmError::Status`] failures.
    pub fn status(&self) -> Option<u16> {
        self.response().map(|r| r.status)
    }

    /// Normalized response for [`ScmError::Status`] failures.
    pub fn response(&self) -> Option<&Response> {
        match self.root() {
            Self::Status { response, .. } => Some(response),
            _ => None,
        }
    }
}

/// Failures below the HTTP layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The caller canceled the request.
    #[error("request canceled")]
    Canceled,

    /// Timeout at transport level.
    #[error("request timed out")]
    Timeout,

    /// Network/transport failure without HTTP status (DNS/connect/reset).
    #[error("network error: {0}")]
    Network(String),

    /// The request path could not be joined onto the base URL.
    #[error("invalid request url: {0}")]
    InvalidUrl(String),
}

/// Configuration and setup errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Base URL could not be parsed or uses an unsupported scheme.
    #[error("invalid base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// The provider has no public default and no base URL was given.
    #[error("a base url is required for {0}")]
    MissingBaseUrl(ProviderKind),

    /// Unknown provider name.
    #[error("unknown provider '{0}', expected one of stash, github, gitlab, bitbucket")]
    UnknownProvider(String),

    /// An environment value was present but unusable.
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },

    /// Credentials could not be turned into a request header.
    #[error("provider token contains characters not allowed in a header")]
    InvalidToken,

    /// The HTTP client could not be constructed.
    #[error("http client setup failed: {0}")]
    HttpClient(String),
}

// ===== Mapping from reqwest::Error into TransportError =====

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return TransportError::Timeout;
        }
        if e.is_builder() {
            return TransportError::InvalidUrl(e.to_string());
        }
        TransportError::Network(e.to_string())
    }
}
