//! Per-page-load session controller.
//!
//! Construct one `SessionController` per page load. `init` runs the access
//! guard the first time it is called and hands back that same outcome on
//! every later call, so attaching setup from several places never
//! navigates twice.

use std::sync::OnceLock;

use tracing::debug;

use crate::api::{FormOutcome, SessionClient};
use crate::dashboard::{Section, SectionContent};
use crate::routes::{LoginNotice, Page, Route};

/// Outcome of the page-load guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageInit {
    /// The page may not be shown; the client has navigated here instead
    Redirected(Route),
    /// The page may be shown, with an optional one-shot notice (login page)
    Ready { notice: Option<LoginNotice> },
}

impl PageInit {
    pub fn is_ready(&self) -> bool {
        matches!(self, PageInit::Ready { .. })
    }
}

pub struct SessionController {
    client: SessionClient,
    page_init: OnceLock<PageInit>,
}

impl SessionController {
    pub fn new(client: SessionClient) -> Self {
        Self {
            client,
            page_init: OnceLock::new(),
        }
    }

    pub fn client(&self) -> &SessionClient {
        &self.client
    }

    pub fn is_authenticated(&self) -> bool {
        self.client.is_authenticated()
    }

    /// Run the access guard for `page`, once. `query` is the page's query
    /// string and is only read on the login page.
    pub fn init(&self, page: Page, query: &str) -> PageInit {
        *self.page_init.get_or_init(|| self.guard(page, query))
    }

    fn guard(&self, page: Page, query: &str) -> PageInit {
        let authenticated = self.client.is_authenticated();
        debug!(?page, authenticated, "Running page guard");

        let redirect = if page.requires_auth() && !authenticated {
            Some(Route::Login(None))
        } else if page.is_auth_only() && authenticated {
            Some(Route::Dashboard)
        } else {
            None
        };

        if let Some(route) = redirect {
            self.client.navigator().navigate(&route);
            return PageInit::Redirected(route);
        }

        let notice = match page {
            Page::Login => LoginNotice::from_query(query),
            _ => None,
        };
        PageInit::Ready { notice }
    }

    pub async fn login(&self, email: &str, password: &str) -> FormOutcome {
        self.client.login(email, password).await
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> FormOutcome {
        self.client
            .register(name, email, password, confirm_password)
            .await
    }

    pub async fn logout(&self) {
        self.client.logout().await
    }

    /// Load one dashboard section.
    ///
    /// `None` means the session was rejected and the client has already
    /// left for the login page; nothing should be shown.
    pub async fn load_section(&self, section: Section) -> Option<SectionContent> {
        match section.endpoint() {
            Some(path) => {
                let reply = self.client.get(path).await?;
                Some(SectionContent::from_reply(reply))
            }
            None => Some(SectionContent::from_user(self.client.current_user())),
        }
    }
}
