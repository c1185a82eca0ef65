//! Navigation targets and the navigation side-effect seam.
//!
//! A full navigation is the only way state crosses page loads. The login
//! route carries an optional one-shot marker in its query string.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use reqwest::Url;
use tracing::info;

/// One-shot status passed to the login page through its query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginNotice {
    /// `?registered=true`
    Registered,
    /// `?error=session_expired`
    SessionExpired,
}

impl LoginNotice {
    pub fn query(&self) -> &'static str {
        match self {
            LoginNotice::Registered => "registered=true",
            LoginNotice::SessionExpired => "error=session_expired",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            LoginNotice::Registered => "Registration successful! Please log in with your account.",
            LoginNotice::SessionExpired => "Your session has expired. Please log in again.",
        }
    }

    /// Whether the notice reports a problem rather than a success
    pub fn is_error(&self) -> bool {
        matches!(self, LoginNotice::SessionExpired)
    }

    /// Read the marker from a query string, with or without the leading `?`.
    /// An expired session outranks a registration notice. Unknown
    /// parameters are ignored.
    pub fn from_query(query: &str) -> Option<Self> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let url = Url::parse(&format!("http://localhost/?{}", query)).ok()?;
        let mut registered = false;
        let mut expired = false;

        // Pairs come back percent-decoded
        for (key, value) in url.query_pairs() {
            match (key.as_ref(), value.as_ref()) {
                ("error", "session_expired") => expired = true,
                ("registered", "true") => registered = true,
                _ => {}
            }
        }

        if expired {
            Some(LoginNotice::SessionExpired)
        } else if registered {
            Some(LoginNotice::Registered)
        } else {
            None
        }
    }
}

/// Client-visible navigation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `/`, the public landing page
    Home,
    /// `/login`, the re-authentication entry point
    Login(Option<LoginNotice>),
    /// `/register`
    Register,
    /// `/dashboard`, the authenticated landing page
    Dashboard,
}

impl Route {
    pub fn href(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Login(None) => "/login".to_string(),
            Route::Login(Some(notice)) => format!("/login?{}", notice.query()),
            Route::Register => "/register".to_string(),
            Route::Dashboard => "/dashboard".to_string(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.href())
    }
}

/// Pages a client can load. Each page load runs the session guard once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    Login,
    Register,
    Dashboard,
}

impl Page {
    /// Pages that send unauthenticated visitors to the login page
    pub fn requires_auth(&self) -> bool {
        matches!(self, Page::Dashboard)
    }

    /// Pages that send authenticated visitors to the dashboard
    pub fn is_auth_only(&self) -> bool {
        matches!(self, Page::Login | Page::Register)
    }
}

/// Performs a full navigation. Callers stop handling the current action
/// once they have navigated.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &Route);
}

/// Navigator that records every target instead of leaving the page.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visits(&self) -> Vec<Route> {
        self.visits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<Route> {
        self.visits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .copied()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &Route) {
        info!(target_route = %route, "Navigating");
        self.visits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(*route);
    }
}
