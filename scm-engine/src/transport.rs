//! Transport capability consumed by the provider adapters.
//!
//! A transport knows the base URL, the credentials and how to move bytes.
//! It does not interpret statuses: non-2xx responses come back as
//! [`RawResponse`] values so each adapter decides what success means.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use tracing::debug;
use url::Url;

use crate::config::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, ProviderConfig};
use crate::errors::{ConfigError, TransportError};
use crate::git_providers::types::ProviderKind;

/// Request relative to the transport's base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    /// Path (and optional query) without a leading slash, e.g. "rest/api/1.0/users/jcitizen".
    pub path: String,
    pub accept: &'static str,
    pub content_type: Option<&'static str>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// A body-less request expecting JSON back.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            accept: "application/json",
            content_type: None,
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn with_accept(mut self, accept: &'static str) -> Self {
        self.accept = accept;
        self
    }
}

/// Status, headers and body exactly as the provider sent them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs HTTP calls against one configured base URL.
pub trait Transport: Send + Sync {
    /// Base URL every request path is resolved against.
    fn base_url(&self) -> &Url;

    /// Sends one request. Only failures that produced no HTTP response are errors.
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send;
}

/// Reqwest-backed transport used by [`crate::Client`] in production.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
    base_url: Url,
    auth: Option<(HeaderName, HeaderValue)>,
}

impl ReqwestTransport {
    /// Anonymous transport with default timeout and user agent.
    pub fn anonymous(base_url: Url) -> Result<Self, ConfigError> {
        let http = build_client(DEFAULT_USER_AGENT, DEFAULT_TIMEOUT)?;
        Ok(Self {
            http,
            base_url,
            auth: None,
        })
    }

    /// Transport configured with credentials, timeout and user agent.
    pub fn from_config(cfg: &ProviderConfig) -> Result<Self, ConfigError> {
        debug!(
            "Initializing transport: kind={:?}, base_url={}",
            cfg.kind, cfg.base_url
        );

        let http = build_client(&cfg.user_agent, cfg.timeout)?;
        let auth = match cfg.token.as_deref() {
            Some(token) if !token.trim().is_empty() => Some(auth_header(cfg.kind, token.trim())?),
            _ => None,
        };

        Ok(Self {
            http,
            base_url: cfg.base_url.clone(),
            auth,
        })
    }
}

impl Transport for ReqwestTransport {
    fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
        let url = self
            .base_url
            .join(&request.path)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {e}", request.path)))?;
        debug!(method = %request.method, %url, "sending provider request");

        let mut builder = self
            .http
            .request(request.method, url)
            .header(ACCEPT, request.accept);
        if let Some((name, value)) = &self.auth {
            builder = builder.header(name, value);
        }
        if let Some(content_type) = request.content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = resp.bytes().await?.to_vec();

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

fn build_client(user_agent: &str, timeout: Duration) -> Result<Client, ConfigError> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
        .map_err(|e| ConfigError::HttpClient(e.to_string()))
}

/// Credential header as each provider expects it.
fn auth_header(kind: ProviderKind, token: &str) -> Result<(HeaderName, HeaderValue), ConfigError> {
    let (name, value) = match kind {
        ProviderKind::GitLab => (HeaderName::from_static("private-token"), token.to_string()),
        ProviderKind::Stash | ProviderKind::GitHub | ProviderKind::Bitbucket => {
            (reqwest::header::AUTHORIZATION, format!("Bearer {token}"))
        }
    };
    let mut value = HeaderValue::from_str(&value).map_err(|_| ConfigError::InvalidToken)?;
    value.set_sensitive(true);
    Ok((name, value))
}
