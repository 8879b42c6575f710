//! Request/decode plumbing shared by every provider adapter.
//!
//! `Api` turns a [`RawResponse`] into a normalized [`Response`], maps
//! non-2xx statuses to [`ScmError::Status`] with the provider's own error
//! message, and keeps JSON decode failures distinct from status failures.

use std::sync::Arc;

use reqwest::Method;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::errors::{ScmError, ScmResult};
use crate::git_providers::types::{ProviderKind, Response};
use crate::pagination::{page_from_gitlab_headers, page_from_link_header, rate_from_headers};
use crate::transport::{HttpRequest, RawResponse, Transport};

const PREVIEW_CHAR_LIMIT: usize = 160;

/// Provider-bound handle on a shared transport.
#[derive(Debug)]
pub(crate) struct Api<T> {
    kind: ProviderKind,
    transport: Arc<T>,
}

impl<T: Transport> Api<T> {
    pub(crate) fn new(kind: ProviderKind, transport: Arc<T>) -> Self {
        Self { kind, transport }
    }

    /// Sends a request and fails on any non-2xx status.
    pub(crate) async fn send(&self, request: HttpRequest) -> ScmResult<(RawResponse, Response)> {
        let method = request.method.clone();
        let path = request.path.clone();

        let raw = self.transport.send(request).await.map_err(|err| {
            warn!(provider = %self.kind, %method, %path, %err, "transport failure");
            ScmError::Transport(err)
        })?;
        let response = self.normalize(&raw);

        if !raw.is_success() {
            let message = error_message(self.kind, &raw.body);
            debug!(
                provider = %self.kind,
                %method,
                %path,
                status = raw.status,
                %message,
                "provider rejected request"
            );
            return Err(ScmError::Status {
                provider: self.kind,
                status: raw.status,
                message,
                response: Box::new(response),
            });
        }

        Ok((raw, response))
    }

    /// GET a JSON document.
    pub(crate) async fn get_json<D: DeserializeOwned>(
        &self,
        path: String,
        target: &'static str,
    ) -> ScmResult<(D, Response)> {
        let (raw, response) = self.send(self.request(Method::GET, path)).await?;
        let value = self.decode(&raw.body, target)?;
        Ok((value, response))
    }

    /// GET a JSON array; a 2xx with an empty body is an empty list.
    pub(crate) async fn get_json_list<D: DeserializeOwned>(
        &self,
        path: String,
        target: &'static str,
    ) -> ScmResult<(Vec<D>, Response)> {
        let (raw, response) = self.send(self.request(Method::GET, path)).await?;
        if raw.body.iter().all(u8::is_ascii_whitespace) {
            debug!(provider = %self.kind, target, "empty body treated as empty list");
            return Ok((Vec::new(), response));
        }
        let values = self.decode(&raw.body, target)?;
        Ok((values, response))
    }

    /// GET a plain-text body.
    pub(crate) async fn get_text(
        &self,
        path: String,
        target: &'static str,
    ) -> ScmResult<(String, Response)> {
        let (raw, response) = self
            .send(HttpRequest::get(path).with_accept("text/plain"))
            .await?;
        let text = String::from_utf8(raw.body).map_err(|source| ScmError::InvalidText {
            provider: self.kind,
            target,
            source,
        })?;
        Ok((text, response))
    }

    /// Sends a body-less request whose success carries no payload.
    pub(crate) async fn send_empty(&self, method: Method, path: String) -> ScmResult<Response> {
        let (_, response) = self.send(self.request(method, path)).await?;
        Ok(response)
    }

    /// JSON request with the provider's preferred media type.
    fn request(&self, method: Method, path: String) -> HttpRequest {
        let request = HttpRequest::new(method, path);
        match self.kind {
            ProviderKind::GitHub => request.with_accept("application/vnd.github+json"),
            _ => request,
        }
    }

    fn decode<D: DeserializeOwned>(&self, body: &[u8], target: &'static str) -> ScmResult<D> {
        serde_json::from_slice(body).map_err(|source| ScmError::Decode {
            provider: self.kind,
            target,
            source,
        })
    }

    fn normalize(&self, raw: &RawResponse) -> Response {
        let page = match self.kind {
            ProviderKind::GitHub => page_from_link_header(&raw.headers),
            ProviderKind::GitLab => page_from_gitlab_headers(&raw.headers),
            // Envelope-paginated; adapters fill the page after decoding.
            ProviderKind::Stash | ProviderKind::Bitbucket => Default::default(),
        };
        Response {
            status: raw.status,
            headers: raw.headers.clone(),
            page,
            rate: rate_from_headers(&raw.headers),
        }
    }
}

/// Escapes a login (or any identifier) as a single URL path segment.
pub(crate) fn path_segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Rejects blank logins before any request is made.
///
/// "." and ".." are rejected too: URL joining resolves them as dot segments
/// and the request would leave the user endpoint.
pub(crate) fn require_login(login: &str) -> ScmResult<&str> {
    let trimmed = login.trim();
    if trimmed.is_empty() {
        return Err(ScmError::Validation("login must not be empty".into()));
    }
    if matches!(trimmed, "." | "..") {
        return Err(ScmError::Validation(format!(
            "login '{trimmed}' is not a valid user name"
        )));
    }
    Ok(trimmed)
}

/// Stash: `{"errors":[{"message":"..."}]}`
#[derive(Debug, Deserialize)]
struct StashErrors {
    errors: Vec<MessageOnly>,
}

/// GitHub / GitLab: `{"message":"..."}` (GitLab sometimes uses `error`).
#[derive(Debug, Deserialize)]
struct FlatError {
    #[serde(default)]
    message: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Bitbucket Cloud: `{"type":"error","error":{"message":"..."}}`
#[derive(Debug, Deserialize)]
struct NestedError {
    error: MessageOnly,
}

#[derive(Debug, Deserialize)]
struct MessageOnly {
    message: String,
}

/// Extracts the provider's error message, falling back to a body preview.
pub(crate) fn error_message(kind: ProviderKind, body: &[u8]) -> String {
    let parsed = match kind {
        ProviderKind::Stash => serde_json::from_slice::<StashErrors>(body)
            .ok()
            .map(|e| {
                e.errors
                    .into_iter()
                    .map(|m| m.message)
                    .collect::<Vec<_>>()
                    .join("; ")
            }),
        ProviderKind::GitHub | ProviderKind::GitLab => serde_json::from_slice::<FlatError>(body)
            .ok()
            .and_then(|e| match (e.message, e.error) {
                (Some(serde_json::Value::String(s)), _) => Some(s),
                // GitLab validation errors come as an object of field -> messages.
                (Some(other), _) => Some(other.to_string()),
                (None, error) => error,
            }),
        ProviderKind::Bitbucket => serde_json::from_slice::<NestedError>(body)
            .ok()
            .map(|e| e.error.message),
    };

    match parsed.filter(|m| !m.trim().is_empty()) {
        Some(message) => message,
        None => body_preview(body),
    }
}

fn body_preview(body: &[u8]) -> String {
    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if compact.is_empty() {
        return "empty response body".to_string();
    }
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
