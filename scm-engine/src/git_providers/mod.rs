//! Provider facade without async-trait or dynamic trait objects.
//!
//! Every provider adapter implements [`UserService`]. The enum [`Users`]
//! wraps the concrete adapter selected at construction and dispatches to it,
//! so callers get one provider-agnostic interface for:
//!   * resolving the authenticated user and any user by login
//!   * listing and accepting repository invitations.

pub mod types;
pub use types::*;

pub(crate) mod api;

pub mod bitbucket;
pub mod github;
pub mod gitlab;
pub mod stash;

use std::future::Future;
use std::sync::Arc;

use tracing::debug;

use crate::errors::ScmResult;
use crate::transport::Transport;

/// Users capability shared by every provider.
///
/// Each operation returns the normalized [`Response`] next to its payload,
/// also when the payload is empty.
pub trait UserService: Send + Sync {
    /// The user behind the configured credentials.
    fn find(&self) -> impl Future<Output = ScmResult<(User, Response)>> + Send;

    /// Any user by login.
    fn find_login(&self, login: &str) -> impl Future<Output = ScmResult<(User, Response)>> + Send;

    /// Email of the authenticated user; empty when the provider hides it.
    fn find_email(&self) -> impl Future<Output = ScmResult<(String, Response)>> + Send;

    /// Pending repository invitations for the authenticated user.
    fn list_invitations(
        &self,
    ) -> impl Future<Output = ScmResult<(Vec<Invitation>, Response)>> + Send;

    /// Accepts the invitation with the given id.
    fn accept_invitation(&self, id: i64) -> impl Future<Output = ScmResult<Response>> + Send;
}

/// Concrete users adapter with enum dispatch.
#[derive(Debug)]
pub enum Users<T> {
    Stash(stash::StashUsers<T>),
    GitHub(github::GitHubUsers<T>),
    GitLab(gitlab::GitLabUsers<T>),
    Bitbucket(bitbucket::BitbucketUsers<T>),
}

impl<T: Transport> Users<T> {
    /// Builds the adapter for `kind` on top of a shared transport.
    pub(crate) fn new(kind: ProviderKind, transport: Arc<T>) -> Self {
        debug!(%kind, base_url = %transport.base_url(), "initializing users adapter");
        match kind {
            ProviderKind::Stash => Users::Stash(stash::StashUsers::new(transport)),
            ProviderKind::GitHub => Users::GitHub(github::GitHubUsers::new(transport)),
            ProviderKind::GitLab => Users::GitLab(gitlab::GitLabUsers::new(transport)),
            ProviderKind::Bitbucket => Users::Bitbucket(bitbucket::BitbucketUsers::new(transport)),
        }
    }

    /// Provider this adapter talks to.
    pub fn kind(&self) -> ProviderKind {
        match self {
            Users::Stash(_) => ProviderKind::Stash,
            Users::GitHub(_) => ProviderKind::GitHub,
            Users::GitLab(_) => ProviderKind::GitLab,
            Users::Bitbucket(_) => ProviderKind::Bitbucket,
        }
    }
}

impl<T: Transport> UserService for Users<T> {
    async fn find(&self) -> ScmResult<(User, Response)> {
        match self {
            Users::Stash(c) => c.find().await,
            Users::GitHub(c) => c.find().await,
            Users::GitLab(c) => c.find().await,
            Users::Bitbucket(c) => c.find().await,
        }
    }

    async fn find_login(&self, login: &str) -> ScmResult<(User, Response)> {
        match self {
            Users::Stash(c) => c.find_login(login).await,
            Users::GitHub(c) => c.find_login(login).await,
            Users::GitLab(c) => c.find_login(login).await,
            Users::Bitbucket(c) => c.find_login(login).await,
        }
    }

    async fn find_email(&self) -> ScmResult<(String, Response)> {
        match self {
            Users::Stash(c) => c.find_email().await,
            Users::GitHub(c) => c.find_email().await,
            Users::GitLab(c) => c.find_email().await,
            Users::Bitbucket(c) => c.find_email().await,
        }
    }

    async fn list_invitations(&self) -> ScmResult<(Vec<Invitation>, Response)> {
        match self {
            Users::Stash(c) => c.list_invitations().await,
            Users::GitHub(c) => c.list_invitations().await,
            Users::GitLab(c) => c.list_invitations().await,
            Users::Bitbucket(c) => c.list_invitations().await,
        }
    }

    async fn accept_invitation(&self, id: i64) -> ScmResult<Response> {
        match self {
            Users::Stash(c) => c.accept_invitation(id).await,
            Users::GitHub(c) => c.accept_invitation(id).await,
            Users::GitLab(c) => c.accept_invitation(id).await,
            Users::Bitbucket(c) => c.accept_invitation(id).await,
        }
    }
}
