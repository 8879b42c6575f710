use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::header::HeaderMap;
use scm_engine::{
    Client, ErrorKind, HttpRequest, IdentityStep, ProviderKind, RawResponse, Transport,
    TransportError, UserService,
};
use url::Url;

/// Canned responses keyed by request path.
struct FakeProvider {
    base_url: Url,
    pages: HashMap<&'static str, (u16, &'static str)>,
    seen: Arc<Mutex<Vec<String>>>,
}

impl FakeProvider {
    fn new(base_url: &str, pages: &[(&'static str, u16, &'static str)]) -> Self {
        Self {
            base_url: Url::parse(base_url).expect("base url"),
            pages: pages.iter().map(|(p, s, b)| (*p, (*s, *b))).collect(),
            seen: Arc::default(),
        }
    }

    /// Request log that outlives handing the transport to a client.
    fn log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.seen)
    }
}

impl Transport for FakeProvider {
    fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
        self.seen.lock().expect("seen").push(request.path.clone());
        tokio::task::yield_now().await;

        let (status, body) = self
            .pages
            .get(request.path.as_str())
            .copied()
            .unwrap_or((404, ""));
        Ok(RawResponse {
            status,
            headers: HeaderMap::new(),
            body: body.as_bytes().to_vec(),
        })
    }
}

/// Never answers until dropped or the caller gives up.
struct StalledProvider {
    base_url: Url,
}

impl Transport for StalledProvider {
    fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn send(&self, _request: HttpRequest) -> Result<RawResponse, TransportError> {
        std::future::pending::<()>().await;
        Err(TransportError::Canceled)
    }
}

/// Reports caller cancellation as the transport observed it.
struct CanceledProvider {
    base_url: Url,
}

impl Transport for CanceledProvider {
    fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn send(&self, _request: HttpRequest) -> Result<RawResponse, TransportError> {
        Err(TransportError::Canceled)
    }
}

const STASH: &str = "https://bitbucket.example.com/stash/";
const WHOAMI: &str = "plugins/servlet/applinks/whoami";
const JCITIZEN: &str = r#"{
    "name": "jcitizen",
    "emailAddress": "jane@example.com",
    "id": 101,
    "displayName": "Jane Citizen",
    "active": true,
    "slug": "jcitizen",
    "type": "NORMAL"
}"#;

fn stash_client() -> Client<FakeProvider> {
    Client::with_transport(
        ProviderKind::Stash,
        FakeProvider::new(
            STASH,
            &[
                (WHOAMI, 200, "jcitizen"),
                ("rest/api/1.0/users/jcitizen", 200, JCITIZEN),
            ],
        ),
    )
}

#[tokio::test]
async fn stash_resolves_the_current_user_and_email() {
    let client = stash_client();

    let (user, response) = client.users().find().await.expect("find");
    assert_eq!(user.login, "jcitizen");
    assert_eq!(user.name, "Jane Citizen");
    assert_eq!(response.status, 200);

    let (email, _) = client.users().find_email().await.expect("find_email");
    assert_eq!(email, "jane@example.com");
    assert_eq!(Some(email), user.email);
}

#[tokio::test]
async fn stash_invitations_need_no_round_trip() {
    let client = stash_client();

    let (invites, response) = client.users().list_invitations().await.expect("list");
    assert!(invites.is_empty());
    assert_eq!(response.status, 200);

    for id in [0, 7, -1] {
        let response = client.users().accept_invitation(id).await.expect("accept");
        assert_eq!(response.status, 200);
    }
    assert!(client.base_url().as_str().ends_with("/stash/"));
}

#[tokio::test]
async fn concurrent_lookups_share_one_client() {
    let client = stash_client();
    let users = client.users();

    let (a, b, c) = tokio::join!(users.find(), users.find_login("jcitizen"), users.find_email());
    let (found, _) = a.expect("find");
    let (looked_up, _) = b.expect("find_login");
    let (email, _) = c.expect("find_email");

    assert_eq!(found, looked_up);
    assert_eq!(email, "jane@example.com");
}

#[tokio::test]
async fn client_is_usable_from_spawned_tasks() {
    let client = Arc::new(stash_client());

    let handles = (0..4)
        .map(|_| {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.users().find_login("jcitizen").await })
        })
        .collect::<Vec<_>>();

    for handle in handles {
        let (user, _) = handle.await.expect("join").expect("find_login");
        assert_eq!(user.login, "jcitizen");
    }
}

#[tokio::test]
async fn identity_probe_failure_stops_before_lookup() {
    let provider = FakeProvider::new(STASH, &[(WHOAMI, 401, "")]);
    let log = provider.log();
    let client = Client::with_transport(ProviderKind::Stash, provider);

    let err = client.users().find().await.expect_err("401");
    assert_eq!(err.step(), Some(IdentityStep::Probe));
    assert_eq!(err.kind(), ErrorKind::Status);
    assert_eq!(err.status(), Some(401));
    assert_eq!(*log.lock().expect("log"), vec![WHOAMI.to_string()]);
}

#[tokio::test]
async fn cancellation_is_not_a_provider_rejection() {
    let client = Client::with_transport(
        ProviderKind::Stash,
        CanceledProvider {
            base_url: Url::parse(STASH).expect("url"),
        },
    );

    let err = client.users().find().await.expect_err("canceled");
    assert_eq!(err.kind(), ErrorKind::Canceled);
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn caller_deadline_abandons_a_stalled_request() {
    let client = Client::with_transport(
        ProviderKind::GitHub,
        StalledProvider {
            base_url: Url::parse("https://api.github.com/").expect("url"),
        },
    );

    let outcome = tokio::time::timeout(Duration::from_millis(20), client.users().find()).await;
    assert!(outcome.is_err());
}

#[tokio::test]
async fn facade_dispatches_to_each_provider() {
    let github = Client::with_transport(
        ProviderKind::GitHub,
        FakeProvider::new(
            "https://api.github.com/",
            &[("users/octocat", 200, r#"{"login":"octocat","id":583231,"name":"The Octocat"}"#)],
        ),
    );
    let gitlab = Client::with_transport(
        ProviderKind::GitLab,
        FakeProvider::new(
            "https://gitlab.com/",
            &[(
                "api/v4/users?username=octocat",
                200,
                r#"[{"id":9,"username":"octocat","name":"Octo Cat"}]"#,
            )],
        ),
    );
    let bitbucket = Client::with_transport(
        ProviderKind::Bitbucket,
        FakeProvider::new(
            "https://api.bitbucket.org/",
            &[("2.0/users/octocat", 200, r#"{"username":"octocat","display_name":"Octo"}"#)],
        ),
    );

    let (gh, _) = github.users().find_login("octocat").await.expect("github");
    let (gl, _) = gitlab.users().find_login("octocat").await.expect("gitlab");
    let (bb, _) = bitbucket.users().find_login("octocat").await.expect("bitbucket");

    assert_eq!(gh.id, 583231);
    assert_eq!(gl.id, 9);
    assert_eq!(bb.name, "Octo");
    for user in [gh, gl, bb] {
        assert_eq!(user.login, "octocat");
    }

    let err = gitlab.users().list_invitations().await.expect_err("unsupported");
    assert_eq!(err.kind(), ErrorKind::Unsupported);
}

#[tokio::test]
async fn malformed_payloads_are_decode_errors_not_status_errors() {
    let client = Client::with_transport(
        ProviderKind::Stash,
        FakeProvider::new(STASH, &[("rest/api/1.0/users/broken", 200, "{not json")]),
    );

    let err = client.users().find_login("broken").await.expect_err("decode");
    assert_eq!(err.kind(), ErrorKind::Decode);

    let err = client.users().find_login("missing").await.expect_err("404");
    assert_eq!(err.kind(), ErrorKind::Status);
    assert_eq!(err.status(), Some(404));
}
