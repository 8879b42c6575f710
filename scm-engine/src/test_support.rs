//! In-memory transport for unit tests.
//!
//! Routes are keyed by method and path. Unrouted requests answer 404 so a
//! test fails loudly when an adapter calls an endpoint nobody scripted.

use std::collections::HashMap;
use std::sync::Mutex;

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderValue};
use url::Url;

use crate::errors::TransportError;
use crate::transport::{HttpRequest, RawResponse, Transport};

pub(crate) struct ScriptedTransport {
    base_url: Url,
    routes: HashMap<(Method, String), Result<RawResponse, TransportError>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new(base_url: &str) -> Self {
        Self {
            base_url: Url::parse(base_url).expect("test base url"),
            routes: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn route(
        mut self,
        method: Method,
        path: &str,
        outcome: Result<RawResponse, TransportError>,
    ) -> Self {
        self.routes.insert((method, path.to_string()), outcome);
        self
    }

    pub(crate) fn get(self, path: &str, status: u16, body: &str) -> Self {
        self.route(Method::GET, path, Ok(reply(status, body)))
    }

    /// Paths requested so far, in order.
    pub(crate) fn paths(&self) -> Vec<String> {
        self.requests
            .lock()
            .expect("request log")
            .iter()
            .map(|r| r.path.clone())
            .collect()
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("request log").clone()
    }
}

impl Transport for ScriptedTransport {
    fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
        let key = (request.method.clone(), request.path.clone());
        self.requests.lock().expect("request log").push(request);
        match self.routes.get(&key) {
            Some(outcome) => outcome.clone(),
            None => Ok(reply(404, "")),
        }
    }
}

pub(crate) fn reply(status: u16, body: &str) -> RawResponse {
    RawResponse {
        status,
        headers: HeaderMap::new(),
        body: body.as_bytes().to_vec(),
    }
}

pub(crate) fn reply_with_headers(
    status: u16,
    body: &str,
    headers: &[(&'static str, &str)],
) -> RawResponse {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        map.insert(*name, HeaderValue::from_str(value).expect("header value"));
    }
    RawResponse {
        status,
        headers: map,
        body: body.as_bytes().to_vec(),
    }
}
