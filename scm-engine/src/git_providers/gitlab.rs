//! GitLab provider (REST v4) for user identity.
//!
//! Endpoints used (as of 2025):
//!   * GET /api/v4/user
//!   * GET /api/v4/users?username=:username
//!
//! GitLab cannot address a user by username in the path; the users list is
//! filtered instead and the exact match picked from the returned array.
//! GitLab has no user-level invitation inbox.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::errors::{ScmError, ScmResult};
use crate::git_providers::UserService;
use crate::git_providers::api::{Api, path_segment, require_login};
use crate::git_providers::types::*;
use crate::transport::Transport;

/// Users capability for gitlab.com and self-managed GitLab.
#[derive(Debug)]
pub struct GitLabUsers<T> {
    api: Api<T>,
}

impl<T: Transport> GitLabUsers<T> {
    pub(crate) fn new(transport: Arc<T>) -> Self {
        Self {
            api: Api::new(ProviderKind::GitLab, transport),
        }
    }
}

impl<T: Transport> UserService for GitLabUsers<T> {
    async fn find(&self) -> ScmResult<(User, Response)> {
        debug!("GitLab find: api/v4/user");
        let (user, response): (GitLabUser, _) =
            self.api.get_json("api/v4/user".to_string(), "user").await?;
        Ok((user.into(), response))
    }

    async fn find_login(&self, login: &str) -> ScmResult<(User, Response)> {
        let login = require_login(login)?;
        let path = format!("api/v4/users?username={}", path_segment(login));
        debug!("GitLab find_login: {}", path);

        let (candidates, response): (Vec<GitLabUser>, _) =
            self.api.get_json_list(path, "users").await?;

        // The username filter is case-insensitive; anything else is a near match.
        let user = candidates
            .into_iter()
            .find(|u| u.username.eq_ignore_ascii_case(login))
            .ok_or_else(|| ScmError::NotFound {
                provider: ProviderKind::GitLab,
                what: format!("user '{login}'"),
            })?;
        Ok((user.into(), response))
    }

    async fn find_email(&self) -> ScmResult<(String, Response)> {
        let (user, response) = self.find().await?;
        Ok((user.email.unwrap_or_default(), response))
    }

    async fn list_invitations(&self) -> ScmResult<(Vec<Invitation>, Response)> {
        Err(ScmError::unsupported(ProviderKind::GitLab, "list_invitations"))
    }

    async fn accept_invitation(&self, _id: i64) -> ScmResult<Response> {
        Err(ScmError::unsupported(ProviderKind::GitLab, "accept_invitation"))
    }
}

/// GitLab user (subset). `email` is only present for the current user or admins.
#[derive(Debug, Deserialize)]
struct GitLabUser {
    id: i64,
    username: String,
    name: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    public_email: Option<String>,
    #[serde(default)]
    avatar_url: Option<String>,
    #[serde(default)]
    web_url: Option<String>,
    #[serde(default)]
    is_admin: bool,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl From<GitLabUser> for User {
    fn from(u: GitLabUser) -> Self {
        let email = u
            .email
            .filter(|e| !e.trim().is_empty())
            .or(u.public_email.filter(|e| !e.trim().is_empty()));

        User {
            id: u.id,
            login: u.username,
            name: u.name,
            email,
            avatar: u.avatar_url,
            link: u.web_url,
            is_admin: u.is_admin,
            created: u.created_at,
            updated: None,
        }
    }
}
