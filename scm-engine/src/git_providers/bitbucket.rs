//! Bitbucket Cloud provider (REST 2.0) for user identity.
//!
//! Endpoints used (as of 2025):
//!   * GET /2.0/user
//!   * GET /2.0/user/emails
//!   * GET /2.0/users/{selected_user}
//!
//! The profile never carries an email. The current user's primary address
//! comes from a second, paged request that needs the `email` scope.
//! Bitbucket Cloud has no numeric user id; `User::id` is always 0.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::errors::{IdentityStep, ScmError, ScmResult};
use crate::git_providers::UserService;
use crate::git_providers::api::{Api, path_segment, require_login};
use crate::git_providers::types::*;
use crate::pagination::page_from_envelope;
use crate::transport::Transport;

/// Users capability for bitbucket.org.
#[derive(Debug)]
pub struct BitbucketUsers<T> {
    api: Api<T>,
}

impl<T: Transport> BitbucketUsers<T> {
    pub(crate) fn new(transport: Arc<T>) -> Self {
        Self {
            api: Api::new(ProviderKind::Bitbucket, transport),
        }
    }

    /// GET a paged `{values, next, previous}` envelope and fill the page cursor.
    async fn get_page<D: DeserializeOwned>(
        &self,
        path: String,
        target: &'static str,
    ) -> ScmResult<(Vec<D>, Response)> {
        let (envelope, mut response): (Envelope<D>, _) = self.api.get_json(path, target).await?;
        response.page = page_from_envelope(envelope.next.as_deref(), envelope.previous.as_deref());
        Ok((envelope.values, response))
    }

    /// Primary confirmed address of the current user, if any is listed.
    async fn primary_email(&self) -> ScmResult<Option<String>> {
        let (emails, response): (Vec<BitbucketEmail>, _) = self
            .get_page("2.0/user/emails".to_string(), "emails")
            .await?;
        debug!(
            count = emails.len(),
            has_next = response.page.has_next(),
            "Bitbucket emails listed"
        );

        Ok(emails
            .into_iter()
            .find(|e| e.is_primary && e.is_confirmed)
            .map(|e| e.email))
    }
}

impl<T: Transport> UserService for BitbucketUsers<T> {
    async fn find(&self) -> ScmResult<(User, Response)> {
        debug!("Bitbucket find: 2.0/user");
        let (profile, response): (BitbucketUser, _) = self
            .api
            .get_json("2.0/user".to_string(), "user")
            .await
            .map_err(|e| e.in_step(IdentityStep::Lookup))?;
        let mut user = User::try_from(profile).map_err(|e| e.in_step(IdentityStep::Lookup))?;

        let email = match self.primary_email().await {
            Ok(email) => email,
            Err(err) if err.status() == Some(403) => {
                warn!(%err, "token lacks the email scope; continuing without email");
                None
            }
            Err(err) => return Err(err.in_step(IdentityStep::Emails)),
        };

        user.email = email;
        Ok((user, response))
    }

    async fn find_login(&self, login: &str) -> ScmResult<(User, Response)> {
        let login = require_login(login)?;
        let path = format!("2.0/users/{}", path_segment(login));
        debug!("Bitbucket find_login: {}", path);

        let (user, response): (BitbucketUser, _) = self.api.get_json(path, "user").await?;
        Ok((User::try_from(user)?, response))
    }

    async fn find_email(&self) -> ScmResult<(String, Response)> {
        let (user, response) = self.find().await?;
        Ok((user.email.unwrap_or_default(), response))
    }

    async fn list_invitations(&self) -> ScmResult<(Vec<Invitation>, Response)> {
        Err(ScmError::unsupported(ProviderKind::Bitbucket, "list_invitations"))
    }

    async fn accept_invitation(&self, _id: i64) -> ScmResult<Response> {
        Err(ScmError::unsupported(ProviderKind::Bitbucket, "accept_invitation"))
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<D> {
    #[serde(default = "Vec::new")]
    values: Vec<D>,
    #[serde(default)]
    next: Option<String>,
    #[serde(default)]
    previous: Option<String>,
}

/// Bitbucket Cloud account (subset). `username` is absent for accounts
/// created after the Atlassian account migration.
#[derive(Debug, Deserialize)]
struct BitbucketUser {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    nickname: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    links: BitbucketLinks,
    #[serde(default)]
    created_on: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
struct BitbucketLinks {
    #[serde(default)]
    avatar: Option<Href>,
    #[serde(default)]
    html: Option<Href>,
}

#[derive(Debug, Deserialize)]
struct Href {
    href: String,
}

#[derive(Debug, Deserialize)]
struct BitbucketEmail {
    email: String,
    #[serde(default)]
    is_primary: bool,
    #[serde(default)]
    is_confirmed: bool,
}

impl TryFrom<BitbucketUser> for User {
    type Error = ScmError;

    fn try_from(u: BitbucketUser) -> Result<Self, Self::Error> {
        let login = u
            .username
            .filter(|s| !s.trim().is_empty())
            .or(u.nickname.filter(|s| !s.trim().is_empty()))
            .ok_or_else(|| ScmError::Decode {
                provider: ProviderKind::Bitbucket,
                target: "user",
                source: serde::de::Error::custom("account has neither username nor nickname"),
            })?;

        Ok(User {
            id: 0,
            name: u
                .display_name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| login.clone()),
            login,
            email: None,
            avatar: u.links.avatar.map(|h| h.href),
            link: u.links.html.map(|h| h.href),
            is_admin: false,
            created: u.created_on,
            updated: None,
        })
    }
}
