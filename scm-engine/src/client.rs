//! Client facade: one provider, one shared transport, capability accessors.

use std::sync::Arc;

use tracing::debug;
use url::Url;

use crate::config::{ProviderConfig, resolve_base_url};
use crate::errors::ScmResult;
use crate::git_providers::{ProviderKind, Users};
use crate::transport::{ReqwestTransport, Transport};

/// Entry point for talking to a source-control provider.
///
/// The provider is fixed at construction. The client holds no per-call
/// state, so one instance can serve many tasks concurrently.
#[derive(Debug)]
pub struct Client<T: Transport = ReqwestTransport> {
    kind: ProviderKind,
    transport: Arc<T>,
    users: Users<T>,
}

impl Client<ReqwestTransport> {
    /// Anonymous client for `kind` at `base_url`.
    ///
    /// The URL is trimmed and must be http(s); a trailing slash is added so
    /// a context path like "https://host/stash" is kept on every request.
    /// Hosted providers accept an empty `base_url` and use their public API.
    pub fn new(kind: ProviderKind, base_url: &str) -> ScmResult<Self> {
        let base_url = resolve_base_url(kind, base_url)?;
        let transport = ReqwestTransport::anonymous(base_url)?;
        Ok(Self::with_transport(kind, transport))
    }

    /// Client with the credentials, timeout and user agent from `cfg`.
    pub fn from_config(cfg: ProviderConfig) -> ScmResult<Self> {
        cfg.validate()?;
        let transport = ReqwestTransport::from_config(&cfg)?;
        Ok(Self::with_transport(cfg.kind, transport))
    }
}

impl<T: Transport> Client<T> {
    /// Client over any transport implementation.
    pub fn with_transport(kind: ProviderKind, transport: T) -> Self {
        debug!(%kind, base_url = %transport.base_url(), "creating client");
        let transport = Arc::new(transport);
        Self {
            kind,
            users: Users::new(kind, Arc::clone(&transport)),
            transport,
        }
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub fn base_url(&self) -> &Url {
        self.transport.base_url()
    }

    /// Users capability of the selected provider.
    pub fn users(&self) -> &Users<T> {
        &self.users
    }
}
