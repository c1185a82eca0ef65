//! Data models shared with the grading-assistant backend.
//!
//! - `User`: the authenticated principal cached alongside the bearer token
//! - `Role`: the principal's role as reported by the backend

pub mod user;

pub use user::{Role, User};
