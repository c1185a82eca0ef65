use crate::models::User;

/// The client-held identity: a bearer token and the user it belongs to.
///
/// Both halves live in one value so they can only be stored or cleared
/// together.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: User,
}

impl Session {
    pub fn new(token: impl Into<String>, user: User) -> Self {
        Self {
            token: token.into(),
            user,
        }
    }
}
