//! In-process stub of the grading-assistant backend.
//!
//! Every request is recorded and answered by a caller-supplied responder,
//! so tests can assert both what the client sent and how it reacted.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::Router;
use gradeassist_core::{MemorySessionStore, RecordingNavigator, Session, SessionClient, User};
use tokio::net::TcpListener;

/// One request as the backend saw it
#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    /// Path plus query string
    pub path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

type Responder = dyn Fn(&Call) -> (StatusCode, String) + Send + Sync;

#[derive(Clone)]
pub struct StubBackend {
    calls: Arc<Mutex<Vec<Call>>>,
    responder: Arc<Responder>,
}

impl StubBackend {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&Call) -> (StatusCode, String) + Send + Sync + 'static,
    {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            responder: Arc::new(responder),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    /// Bind to a random local port and serve in the background.
    /// Returns the base URL.
    pub async fn start(&self) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub backend");
        let addr = listener.local_addr().expect("stub backend address");
        let app = Router::new().fallback(handle).with_state(self.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("stub backend stopped");
        });

        format!("http://{}", addr)
    }
}

async fn handle(
    State(stub): State<StubBackend>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let header_text = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let call = Call {
        method,
        path: uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string()),
        authorization: header_text(header::AUTHORIZATION),
        content_type: header_text(header::CONTENT_TYPE),
        body,
    };

    let response = (stub.responder)(&call);
    stub.calls.lock().expect("calls lock").push(call);
    response
}

/// A base URL nothing is listening on
pub async fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("address");
    drop(listener);
    format!("http://{}", addr)
}

pub fn sample_user() -> User {
    serde_json::from_str(r#"{"name":"A","email":"valid@x.com","role":"student"}"#)
        .expect("parse sample user")
}

pub struct Harness {
    pub client: SessionClient,
    pub store: Arc<MemorySessionStore>,
    pub navigator: Arc<RecordingNavigator>,
}

impl Harness {
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        let store = match token {
            Some(token) => MemorySessionStore::with_session(&Session::new(token, sample_user()))
                .expect("seed session"),
            None => MemorySessionStore::new(),
        };
        let store = Arc::new(store);
        let navigator = Arc::new(RecordingNavigator::new());
        let client = SessionClient::new(base_url, store.clone(), navigator.clone())
            .expect("build client");

        Self {
            client,
            store,
            navigator,
        }
    }

    /// Token and user are either both stored or both absent
    pub fn assert_keys_consistent(&self) {
        let (token, user) = self.store.has_keys();
        assert_eq!(token, user, "token and user must be stored together");
    }
}
