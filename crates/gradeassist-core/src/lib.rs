//! Client library for the grading-assistant web application.
//!
//! `SessionClient` performs authenticated calls against the backend and
//! keeps the locally stored session in step with what the backend accepts.
//! `SessionController` wraps it for one page load: the access guard, the
//! login/registration forms, logout, and dashboard sections.
//!
//! Side effects go through two seams: `SessionStore` for the persisted
//! `{token, user}` pair and `Navigator` for full navigations.

pub mod api;
pub mod auth;
pub mod config;
pub mod controller;
pub mod dashboard;
pub mod models;
pub mod routes;

pub use api::{ApiError, ApiReply, FormOutcome, SessionClient, CONNECTION_ERROR_MESSAGE};
pub use auth::{FileSessionStore, MemorySessionStore, Session, SessionStore};
pub use config::Config;
pub use controller::{PageInit, SessionController};
pub use dashboard::{Section, SectionContent};
pub use models::{Role, User};
pub use routes::{LoginNotice, Navigator, Page, RecordingNavigator, Route};
