//! Client-side session state.
//!
//! This module provides:
//! - `Session`: the `{token, user}` pair asserting the current identity
//! - `SessionStore`: persistence seam, with a file-backed store for the CLI
//!   and an in-memory store for embedding and tests
//!
//! A stored token is the only authentication signal. Nothing here tracks
//! expiry; the backend decides validity and says so with a 401.

pub mod session;
pub mod store;

pub use session::Session;
pub use store::{FileSessionStore, MemorySessionStore, SessionStore, TOKEN_KEY, USER_KEY};
