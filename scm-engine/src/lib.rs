//! Provider-agnostic users layer for source-control hosting services.
//!
//! A [`Client`] is bound to one provider (Bitbucket Server, GitHub, GitLab or
//! Bitbucket Cloud) and exposes its [`UserService`] through
//! [`Client::users`]. Every operation returns the normalized [`Response`]
//! (status, headers, pagination, rate limits) next to its payload.

mod client;
mod config;
mod errors;
pub mod git_providers;
pub mod pagination;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use client::Client;
pub use config::{ProviderConfig, normalize_base_url};
pub use errors::{ConfigError, ErrorKind, IdentityStep, ScmError, ScmResult, TransportError};
pub use git_providers::{Invitation, Page, ProviderKind, Rate, Response, User, UserService, Users};
pub use transport::{HttpRequest, RawResponse, ReqwestTransport, Transport};
