//! Provider configuration and base URL normalization.

use std::time::Duration;

use url::Url;

use crate::errors::ConfigError;
use crate::git_providers::types::ProviderKind;

pub(crate) const DEFAULT_USER_AGENT: &str = "scm-engine/0.1";
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Runtime configuration for a provider client.
///
/// Usually loaded from the environment by the binary; library users may
/// build it directly.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    /// Normalized base URL, always ending with '/'.
    pub base_url: Url,
    /// Access token (PAT, app password or OAuth token). `None` for anonymous access.
    pub token: Option<String>,
    pub timeout: Duration,
    pub user_agent: String,
}

impl ProviderConfig {
    /// Configuration with defaults for everything but the provider and URL.
    ///
    /// `base_url` may be empty for hosted providers, which then use their
    /// public API root.
    pub fn new(kind: ProviderKind, base_url: &str) -> Result<Self, ConfigError> {
        let base_url = resolve_base_url(kind, base_url)?;
        Ok(Self {
            kind,
            base_url,
            token: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Loads configuration from process environment variables.
    ///
    /// * `SCM_PROVIDER` – stash | github | gitlab | bitbucket (required)
    /// * `SCM_BASE_URL` – API root; optional for hosted providers
    /// * `SCM_TOKEN` – access token; optional
    /// * `SCM_TIMEOUT_SECS` – request timeout, default 30
    /// * `SCM_USER_AGENT` – default "scm-engine/0.1"
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ProviderConfig::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let kind: ProviderKind = lookup("SCM_PROVIDER")
            .ok_or_else(|| ConfigError::InvalidValue {
                key: "SCM_PROVIDER",
                reason: "variable is not set".into(),
            })?
            .parse()?;

        let mut cfg = Self::new(kind, lookup("SCM_BASE_URL").as_deref().unwrap_or(""))?;
        cfg.token = lookup("SCM_TOKEN").filter(|t| !t.trim().is_empty());

        if let Some(raw) = lookup("SCM_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "SCM_TIMEOUT_SECS",
                reason: format!("'{raw}' is not a whole number of seconds"),
            })?;
            cfg.timeout = Duration::from_secs(secs);
        }
        if let Some(agent) = lookup("SCM_USER_AGENT").filter(|a| !a.trim().is_empty()) {
            cfg.user_agent = agent;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "SCM_TIMEOUT_SECS",
                reason: "timeout must be > 0".into(),
            });
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "SCM_USER_AGENT",
                reason: "user agent is empty".into(),
            });
        }
        Ok(())
    }
}

/// Picks the given base URL, or the provider default when it is blank.
pub(crate) fn resolve_base_url(kind: ProviderKind, raw: &str) -> Result<Url, ConfigError> {
    match (raw.trim(), kind.default_base_url()) {
        ("", Some(default)) => normalize_base_url(default),
        ("", None) => Err(ConfigError::MissingBaseUrl(kind)),
        (given, _) => normalize_base_url(given),
    }
}

/// Parses a base URL and forces a trailing slash.
///
/// Without the slash `Url::join` would drop the last path segment, so
/// "https://host/stash" + "rest/api" must become "https://host/stash/rest/api".
pub fn normalize_base_url(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    let invalid = |reason: String| ConfigError::InvalidBaseUrl {
        url: trimmed.to_string(),
        reason,
    };

    let mut url = Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("query and fragment are not allowed".into()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
