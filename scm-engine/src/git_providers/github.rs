//! GitHub provider (REST v3) for user identity and repository invitations.
//!
//! Endpoints used (as of 2025):
//!   * GET /user
//!   * GET /users/{username}
//!   * GET /user/repository_invitations
//!   * PATCH /user/repository_invitations/{invitation_id}

use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;

use crate::errors::ScmResult;
use crate::git_providers::UserService;
use crate::git_providers::api::{Api, path_segment, require_login};
use crate::git_providers::types::*;
use crate::transport::Transport;

/// Users capability for GitHub and GitHub Enterprise.
#[derive(Debug)]
pub struct GitHubUsers<T> {
    api: Api<T>,
}

impl<T: Transport> GitHubUsers<T> {
    pub(crate) fn new(transport: Arc<T>) -> Self {
        Self {
            api: Api::new(ProviderKind::GitHub, transport),
        }
    }
}

impl<T: Transport> UserService for GitHubUsers<T> {
    async fn find(&self) -> ScmResult<(User, Response)> {
        debug!("GitHub find: user");
        let (user, response): (GitHubUser, _) =
            self.api.get_json("user".to_string(), "user").await?;
        Ok((user.into(), response))
    }

    async fn find_login(&self, login: &str) -> ScmResult<(User, Response)> {
        let login = require_login(login)?;
        let path = format!("users/{}", path_segment(login));
        debug!("GitHub find_login: {}", path);

        let (user, response): (GitHubUser, _) = self.api.get_json(path, "user").await?;
        Ok((user.into(), response))
    }

    async fn find_email(&self) -> ScmResult<(String, Response)> {
        let (user, response) = self.find().await?;
        Ok((user.email.unwrap_or_default(), response))
    }

    async fn list_invitations(&self) -> ScmResult<(Vec<Invitation>, Response)> {
        debug!("GitHub list_invitations: user/repository_invitations");
        let (raw, response): (Vec<GitHubInvitation>, _) = self
            .api
            .get_json_list(
                "user/repository_invitations".to_string(),
                "repository invitations",
            )
            .await?;

        let invitations = raw.into_iter().map(Invitation::from).collect::<Vec<_>>();
        debug!(
            count = invitations.len(),
            has_next = response.page.has_next(),
            "GitHub invitations listed"
        );
        Ok((invitations, response))
    }

    async fn accept_invitation(&self, id: i64) -> ScmResult<Response> {
        let path = format!("user/repository_invitations/{id}");
        debug!("GitHub accept_invitation: {}", path);
        self.api.send_empty(Method::PATCH, path).await
    }
}

/// GitHub user (subset).
#[derive(Debug, Deserialize)]
struct GitHubUser {
    id: i64,
    login: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    avatar_url: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    site_admin: bool,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl From<GitHubUser> for User {
    fn from(u: GitHubUser) -> Self {
        User {
            id: u.id,
            name: u
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| u.login.clone()),
            login: u.login,
            email: u.email.filter(|e| !e.trim().is_empty()),
            avatar: u.avatar_url,
            link: u.html_url,
            is_admin: u.site_admin,
            created: u.created_at,
            updated: u.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GitHubInvitation {
    id: i64,
    repository: GitHubRepoRef,
    #[serde(default)]
    inviter: Option<GitHubLogin>,
    permissions: String,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct GitHubRepoRef {
    full_name: String,
}

#[derive(Debug, Deserialize)]
struct GitHubLogin {
    login: String,
}

impl From<GitHubInvitation> for Invitation {
    fn from(i: GitHubInvitation) -> Self {
        Invitation {
            id: i.id,
            repository: i.repository.full_name,
            inviter: i.inviter.map(|u| u.login),
            permissions: i.permissions,
            link: i.html_url,
            created: i.created_at,
        }
    }
}
