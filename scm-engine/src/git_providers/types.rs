//! Provider-agnostic data model for users, invitations and responses.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Supported Git providers, selected once when a client is built.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Bitbucket Server / Data Center (formerly Stash).
    Stash,
    GitHub,
    GitLab,
    /// Bitbucket Cloud.
    Bitbucket,
}

impl ProviderKind {
    /// Public API root for hosted providers; `None` for self-hosted only ones.
    pub fn default_base_url(self) -> Option<&'static str> {
        match self {
            Self::Stash => None,
            Self::GitHub => Some("https://api.github.com/"),
            Self::GitLab => Some("https://gitlab.com/"),
            Self::Bitbucket => Some("https://api.bitbucket.org/"),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stash => "Bitbucket Server",
            Self::GitHub => "GitHub",
            Self::GitLab => "GitLab",
            Self::Bitbucket => "Bitbucket Cloud",
        };
        f.write_str(name)
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stash" | "bitbucket-server" => Ok(Self::Stash),
            "github" => Ok(Self::GitHub),
            "gitlab" => Ok(Self::GitLab),
            "bitbucket" | "bitbucket-cloud" => Ok(Self::Bitbucket),
            _ => Err(ConfigError::UnknownProvider(s.to_string())),
        }
    }
}

/// A user account, normalized across providers.
///
/// `login` is always populated for a resolved user. `email` is `None`
/// when the provider does not expose it to the current credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub login: String,
    pub name: String,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub link: Option<String>,
    pub is_admin: bool,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

/// A pending repository invitation for the current credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: i64,
    /// Full name of the repository, e.g. "octo-org/hello-world".
    pub repository: String,
    /// Login of the user who sent the invitation.
    pub inviter: Option<String>,
    pub permissions: String,
    pub link: Option<String>,
    pub created: Option<DateTime<Utc>>,
}

/// Normalized pagination cursor.
///
/// Page numbers are 1-based. `next_url` is set when the provider links
/// the next page by URL instead of (or as well as) by number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub first: Option<u32>,
    pub last: Option<u32>,
    pub next: Option<u32>,
    pub prev: Option<u32>,
    pub next_url: Option<String>,
}

impl Page {
    /// True when the provider reported a following page.
    pub fn has_next(&self) -> bool {
        self.next.is_some() || self.next_url.is_some()
    }
}

/// Rate limit state reported by the provider, zero when not reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rate {
    pub limit: u32,
    pub remaining: u32,
    /// Unix timestamp (seconds) when the window resets.
    pub reset: i64,
}

/// Outcome of a provider call, independent of its payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    pub status: u16,
    pub headers: HeaderMap,
    pub page: Page,
    pub rate: Rate,
}

impl Response {
    /// Response for operations a provider answers without a round trip.
    pub(crate) fn synthesized_ok() -> Self {
        Self {
            status: 200,
            ..Self::default()
        }
    }

    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
