//! Bitbucket Server / Data Center ("Stash") provider for user identity.
//!
//! Endpoints used:
//!   * GET plugins/servlet/applinks/whoami   (plain-text login of the caller)
//!   * GET rest/api/1.0/users/{login}
//!
//! Bitbucket Server has no REST "current user" endpoint. The authenticated
//! user is resolved in two steps: the applinks whoami servlet returns the
//! bare login, which is then looked up like any other user.

use std::sync::Arc;

use md5::{Digest, Md5};
use serde::Deserialize;
use tracing::debug;

use crate::errors::{IdentityStep, ScmError, ScmResult};
use crate::git_providers::UserService;
use crate::git_providers::api::{Api, path_segment, require_login};
use crate::git_providers::types::*;
use crate::transport::Transport;

/// Users capability for Bitbucket Server.
#[derive(Debug)]
pub struct StashUsers<T> {
    api: Api<T>,
}

impl<T: Transport> StashUsers<T> {
    pub(crate) fn new(transport: Arc<T>) -> Self {
        Self {
            api: Api::new(ProviderKind::Stash, transport),
        }
    }

    /// Asks the whoami servlet for the login behind the current credentials.
    async fn probe_login(&self) -> ScmResult<String> {
        let (body, _) = self
            .api
            .get_text("plugins/servlet/applinks/whoami".to_string(), "whoami")
            .await?;

        let login = body.trim();
        if login.is_empty() {
            // The servlet answers 200 with an empty body for anonymous requests.
            return Err(ScmError::Unauthenticated {
                provider: ProviderKind::Stash,
            });
        }
        debug!(login, "Stash whoami resolved login");
        Ok(login.to_string())
    }

    async fn lookup(&self, login: &str) -> ScmResult<(User, Response)> {
        let login = require_login(login)?;
        let path = format!("rest/api/1.0/users/{}", path_segment(login));
        debug!("Stash find_login: {}", path);

        let (user, response): (StashUser, _) = self.api.get_json(path, "user").await?;
        Ok((user.into(), response))
    }
}

impl<T: Transport> UserService for StashUsers<T> {
    async fn find(&self) -> ScmResult<(User, Response)> {
        let login = self
            .probe_login()
            .await
            .map_err(|e| e.in_step(IdentityStep::Probe))?;
        self.lookup(&login)
            .await
            .map_err(|e| e.in_step(IdentityStep::Lookup))
    }

    async fn find_login(&self, login: &str) -> ScmResult<(User, Response)> {
        self.lookup(login).await
    }

    async fn find_email(&self) -> ScmResult<(String, Response)> {
        let (user, response) = self.find().await?;
        Ok((user.email.unwrap_or_default(), response))
    }

    async fn list_invitations(&self) -> ScmResult<(Vec<Invitation>, Response)> {
        // No invitation concept on Bitbucket Server: nothing is ever pending.
        debug!("Stash list_invitations: no invitations on this provider");
        Ok((Vec::new(), Response::synthesized_ok()))
    }

    async fn accept_invitation(&self, id: i64) -> ScmResult<Response> {
        debug!(id, "Stash accept_invitation: nothing to accept");
        Ok(Response::synthesized_ok())
    }
}

/// Gravatar URL derived from the lower-cased email, as Bitbucket Server renders avatars.
fn gravatar_url(email: &str) -> String {
    let digest = Md5::digest(email.trim().to_lowercase().as_bytes());
    format!("https://www.gravatar.com/avatar/{digest:x}.jpg")
}

/// Bitbucket Server user (subset).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StashUser {
    id: i64,
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    email_address: Option<String>,
    #[serde(default)]
    links: Option<StashLinks>,
}

#[derive(Debug, Deserialize)]
struct StashLinks {
    #[serde(rename = "self", default)]
    self_links: Vec<StashLink>,
}

#[derive(Debug, Deserialize)]
struct StashLink {
    href: String,
}

impl From<StashUser> for User {
    fn from(u: StashUser) -> Self {
        let email = u.email_address.filter(|e| !e.trim().is_empty());
        let link = u
            .links
            .and_then(|l| l.self_links.into_iter().next())
            .map(|l| l.href);

        User {
            id: u.id,
            name: u.display_name.unwrap_or_else(|| u.name.clone()),
            login: u.name,
            avatar: email.as_deref().map(gravatar_url),
            email,
            link,
            is_admin: false,
            created: None,
            updated: None,
        }
    }
}
