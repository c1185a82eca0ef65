//! Session-aware client for the grading-assistant REST API.
//!
//! `SessionClient` attaches the stored bearer token to every call and owns
//! the session transitions: login stores a session, logout and a 401 drop it.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client, Method, RequestBuilder};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::auth::{Session, SessionStore};
use crate::models::User;
use crate::routes::{LoginNotice, Navigator, Route};

use super::{ApiError, ApiReply};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 30;

const LOGIN_PATH: &str = "/api/auth/login";
const SIGNUP_PATH: &str = "/api/auth/signup";
const LOGOUT_PATH: &str = "/api/auth/logout";

pub const PASSWORD_MISMATCH_MESSAGE: &str = "Password and confirmation do not match";
pub const MISSING_CREDENTIALS_MESSAGE: &str = "Email and password are required";
pub const MISSING_REGISTRATION_MESSAGE: &str = "Name, email and password are required";
pub const UNEXPECTED_RESPONSE_MESSAGE: &str = "Unexpected response from the server";
pub const SESSION_SAVE_FAILED_MESSAGE: &str = "Unable to save the session on this device";

/// Result of submitting a login or registration form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome {
    /// The form succeeded and the client has already navigated away
    Navigated(Route),
    /// Message to show next to the form; nothing was stored
    Error(String),
}

impl FormOutcome {
    pub fn error_message(&self) -> Option<&str> {
        match self {
            FormOutcome::Error(msg) => Some(msg),
            FormOutcome::Navigated(_) => None,
        }
    }
}

/// API client bound to one session store and one navigator.
/// Clone is cheap - the HTTP client and both seams are shared.
#[derive(Clone)]
pub struct SessionClient {
    client: Client,
    base_url: String,
    store: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
}

impl SessionClient {
    /// Create a client for the backend at `base_url`
    pub fn new(
        base_url: impl Into<String>,
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            store,
            navigator,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    /// Whether a token is stored. Says nothing about whether the backend
    /// still accepts it; that shows up as a 401 on the next request.
    pub fn is_authenticated(&self) -> bool {
        self.store.token().is_some()
    }

    /// The stored session, if any
    pub fn session(&self) -> Option<Session> {
        match self.store.load() {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Failed to read session");
                None
            }
        }
    }

    /// The cached user record of the stored session
    pub fn current_user(&self) -> Option<User> {
        self.session().map(|s| s.user)
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn is_read(method: &Method) -> bool {
        *method == Method::GET || *method == Method::HEAD
    }

    /// Send a request and read its body as JSON.
    /// A 401 is reported as `ApiError::Unauthorized` only when `auth_rejects`
    /// is set; otherwise its JSON body is returned like any other.
    async fn send(
        builder: RequestBuilder,
        url: &str,
        auth_rejects: bool,
    ) -> std::result::Result<ApiReply, ApiError> {
        let response = builder.send().await?;
        let status = response.status();

        if auth_rejects && status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }

        let text = response.text().await?;
        match serde_json::from_str::<Value>(&text) {
            Ok(body) => {
                debug!(url = url, status = status.as_u16(), "Response received");
                Ok(ApiReply::new(body))
            }
            Err(_) => Err(ApiError::from_status(status, &text)),
        }
    }

    /// Call the backend with the stored token attached.
    ///
    /// Returns the JSON body unchanged, including any `error` field. On a
    /// 401 the session is cleared, the client is sent to the login page with
    /// the session-expired marker, and `None` is returned: the caller must
    /// not update anything further. When the request cannot complete, the
    /// connectivity reply is returned and the session is left alone.
    pub async fn request(
        &self,
        path: &str,
        method: Method,
        body: Option<&Value>,
    ) -> Option<ApiReply> {
        let url = self.url(path);
        let token = self.store.token().unwrap_or_default();

        let mut builder = self
            .client
            .request(method.clone(), &url)
            .bearer_auth(token)
            .header(header::CONTENT_TYPE, "application/json");

        if let Some(body) = body {
            if !Self::is_read(&method) {
                builder = builder.body(body.to_string());
            }
        }

        debug!(url = %url, method = %method, "Sending request");

        match Self::send(builder, &url, true).await {
            Ok(reply) => Some(reply),
            Err(ApiError::Unauthorized) => {
                self.expire_session();
                None
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Request failed");
                Some(ApiReply::connection_error())
            }
        }
    }

    /// `request` with `GET` and no body
    pub async fn get(&self, path: &str) -> Option<ApiReply> {
        self.request(path, Method::GET, None).await
    }

    /// Drop the session after the backend rejected the token and send the
    /// client to the login page.
    fn expire_session(&self) {
        info!("Session rejected by the backend, signing out");
        if let Err(e) = self.store.clear() {
            error!(error = %e, "Failed to clear rejected session");
        }
        self.navigator
            .navigate(&Route::Login(Some(LoginNotice::SessionExpired)));
    }

    /// POST a form without credentials. Bad credentials come back as a 401
    /// carrying `{error}`, which is a normal reply here.
    async fn submit_form(&self, path: &str, payload: &Value) -> ApiReply {
        let url = self.url(path);
        let builder = self.client.post(&url).json(payload);

        match Self::send(builder, &url, false).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(url = %url, error = %e, "Form submission failed");
                ApiReply::connection_error()
            }
        }
    }

    /// Log in and, on success, store the session and go to the dashboard.
    ///
    /// Any other outcome leaves the store untouched and returns the message
    /// to show next to the form.
    pub async fn login(&self, email: &str, password: &str) -> FormOutcome {
        if email.trim().is_empty() || password.is_empty() {
            return FormOutcome::Error(MISSING_CREDENTIALS_MESSAGE.to_string());
        }

        let reply = self
            .submit_form(LOGIN_PATH, &json!({ "email": email, "password": password }))
            .await;

        if let Some(message) = reply.error() {
            debug!(error = %message, "Login rejected");
            return FormOutcome::Error(message);
        }

        let token = match reply.str_field("token") {
            Some(token) if reply.is_success() => token.to_string(),
            _ => {
                warn!("Login response had neither an error nor a token");
                return FormOutcome::Error(UNEXPECTED_RESPONSE_MESSAGE.to_string());
            }
        };

        let user: User = match reply.get("user").cloned().map(serde_json::from_value) {
            Some(Ok(user)) => user,
            Some(Err(e)) => {
                warn!(error = %e, "Login response user is not an object");
                return FormOutcome::Error(UNEXPECTED_RESPONSE_MESSAGE.to_string());
            }
            None => {
                warn!("Login response carried no user");
                return FormOutcome::Error(UNEXPECTED_RESPONSE_MESSAGE.to_string());
            }
        };

        if let Err(e) = self.store.save(&Session::new(token, user)) {
            error!(error = %e, "Failed to save session");
            return FormOutcome::Error(SESSION_SAVE_FAILED_MESSAGE.to_string());
        }

        info!("Login successful");
        self.navigator.navigate(&Route::Dashboard);
        FormOutcome::Navigated(Route::Dashboard)
    }

    /// Register a new account. Mismatched passwords are caught here without
    /// touching the network. Success sends the client to the login page with
    /// the registered marker; no session is stored.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> FormOutcome {
        if password != confirm_password {
            return FormOutcome::Error(PASSWORD_MISMATCH_MESSAGE.to_string());
        }
        if name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return FormOutcome::Error(MISSING_REGISTRATION_MESSAGE.to_string());
        }

        let reply = self
            .submit_form(
                SIGNUP_PATH,
                &json!({ "name": name, "email": email, "password": password }),
            )
            .await;

        if let Some(message) = reply.error() {
            debug!(error = %message, "Registration rejected");
            return FormOutcome::Error(message);
        }

        if !reply.is_success() {
            warn!("Signup response had neither an error nor success");
            return FormOutcome::Error(UNEXPECTED_RESPONSE_MESSAGE.to_string());
        }

        info!("Registration successful");
        let route = Route::Login(Some(LoginNotice::Registered));
        self.navigator.navigate(&route);
        FormOutcome::Navigated(route)
    }

    /// Log out. The backend is told on a best-effort basis; whatever it
    /// answers, the local session is cleared and the client goes home.
    pub async fn logout(&self) {
        let url = self.url(LOGOUT_PATH);
        let token = self.store.token().unwrap_or_default();
        let builder = self.client.post(&url).bearer_auth(token);

        match builder.send().await {
            Ok(response) => {
                debug!(status = response.status().as_u16(), "Logout acknowledged");
            }
            Err(e) => {
                warn!(error = %e, "Logout call failed, clearing session anyway");
            }
        }

        if let Err(e) = self.store.clear() {
            error!(error = %e, "Failed to clear session on logout");
        }

        info!("Logged out");
        self.navigator.navigate(&Route::Home);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemorySessionStore;
    use crate::routes::RecordingNavigator;

    fn client(base_url: &str) -> (SessionClient, Arc<RecordingNavigator>) {
        let navigator = Arc::new(RecordingNavigator::new());
        let client = SessionClient::new(
            base_url,
            Arc::new(MemorySessionStore::new()),
            navigator.clone(),
        )
        .expect("build client");
        (client, navigator)
    }

    #[test]
    fn test_url_joining() {
        let (client, _) = client("http://localhost:5000/");
        assert_eq!(client.base_url(), "http://localhost:5000");
        assert_eq!(client.url("/api/grades"), "http://localhost:5000/api/grades");
        assert_eq!(client.url("api/grades"), "http://localhost:5000/api/grades");
    }

    #[test]
    fn test_reads_never_carry_a_body() {
        assert!(SessionClient::is_read(&Method::GET));
        assert!(SessionClient::is_read(&Method::HEAD));
        assert!(!SessionClient::is_read(&Method::POST));
        assert!(!SessionClient::is_read(&Method::DELETE));
    }

    #[tokio::test]
    async fn test_register_mismatch_skips_network() {
        // Nothing listens on port 9; a network call would yield the
        // connectivity message instead.
        let (client, navigator) = client("http://127.0.0.1:9");
        let outcome = client.register("A", "a@x.com", "one", "two").await;
        assert_eq!(
            outcome,
            FormOutcome::Error(PASSWORD_MISMATCH_MESSAGE.to_string())
        );
        assert!(navigator.visits().is_empty());
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let (client, navigator) = client("http://127.0.0.1:9");
        let outcome = client.login("", "pw").await;
        assert_eq!(outcome.error_message(), Some(MISSING_CREDENTIALS_MESSAGE));
        assert!(navigator.visits().is_empty());
        assert!(!client.is_authenticated());
    }
}
