//! REST API client module for the grading-assistant backend.
//!
//! This module provides the `SessionClient` for calling the backend with
//! the stored bearer token attached, and for keeping the local session
//! consistent with what the backend accepts.
//!
//! Failures fall into three classes:
//! - 401 on an authenticated call: the session is dropped and the client
//!   is sent to the login page with the session-expired marker
//! - an `error` field in the body: returned untouched for the caller to show
//! - transport failure: a generic connectivity reply, session untouched

pub mod client;
pub mod error;
pub mod reply;

pub use client::{FormOutcome, SessionClient};
pub use error::ApiError;
pub use reply::{ApiReply, CONNECTION_ERROR_MESSAGE};
