use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Role reported by the backend. New accounts are created as teachers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum Role {
    #[default]
    Teacher,
    Student,
    Admin,
    /// A role this client doesn't know about, kept verbatim
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Teacher => "teacher",
            Role::Student => "student",
            Role::Admin => "admin",
            Role::Other(s) => s,
        }
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        match s.as_str() {
            "teacher" => Role::Teacher,
            "student" => Role::Student,
            "admin" => Role::Admin,
            _ => Role::Other(s),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated principal, cached for display next to the token.
///
/// Built from any JSON object. The record is kept verbatim and serialized
/// back unchanged; the typed accessors read it leniently, so a missing,
/// null or oddly typed field falls back to a default instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct User {
    #[cfg_attr(feature = "ts", ts(optional))]
    id: Option<String>,
    name: String,
    email: String,
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    role: Role,
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    created_at: Option<DateTime<Utc>>,
    #[cfg_attr(feature = "ts", ts(skip))]
    record: Map<String, Value>,
}

impl From<Map<String, Value>> for User {
    fn from(record: Map<String, Value>) -> Self {
        let text = |key: &str| match record.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        let created_at = record
            .get("created_at")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Self {
            id: text("id"),
            name: text("name").unwrap_or_default(),
            email: text("email").unwrap_or_default(),
            role: text("role").map(Role::from).unwrap_or_default(),
            created_at,
            record,
        }
    }
}

impl From<User> for Map<String, Value> {
    fn from(user: User) -> Self {
        user.record
    }
}

impl User {
    /// Backend id as text; numeric ids are rendered in decimal
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    /// Any field of the record as the backend sent it
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.record.get(key)
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.email
        } else {
            &self.name
        }
    }

    /// Account creation date for display, if the backend sent one
    pub fn member_since(&self) -> Option<String> {
        self.created_at.map(|dt| dt.format("%Y-%m-%d").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!(Role::from("teacher".to_string()), Role::Teacher);
        assert_eq!(Role::from("student".to_string()), Role::Student);
        assert_eq!(Role::from("admin".to_string()), Role::Admin);
        assert_eq!(
            Role::from("grader".to_string()),
            Role::Other("grader".to_string())
        );
        assert_eq!(Role::Other("grader".to_string()).to_string(), "grader");
    }

    #[test]
    fn test_user_keeps_unknown_fields() {
        let json = r#"{"id":"u-1","name":"A","email":"a@x.com","role":"student","school":"North"}"#;
        let user: User = serde_json::from_str(json).expect("parse user");
        assert_eq!(user.role(), &Role::Student);
        assert_eq!(user.id(), Some("u-1"));
        assert_eq!(user.field("school"), Some(&Value::from("North")));

        let back: Value = serde_json::to_value(&user).expect("serialize user");
        let original: Value = serde_json::from_str(json).expect("parse original");
        assert_eq!(back, original);
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let user: User = serde_json::from_str(r#"{"email":"a@x.com"}"#).expect("parse user");
        assert_eq!(user.display_name(), "a@x.com");
        assert_eq!(user.role(), &Role::Teacher);
    }

    #[test]
    fn test_member_since() {
        let user: User = serde_json::from_str(
            r#"{"name":"A","email":"a@x.com","role":"teacher","created_at":"2024-06-01T08:30:00Z"}"#,
        )
        .expect("parse user");
        assert_eq!(user.member_since().as_deref(), Some("2024-06-01"));
    }

    #[test]
    fn test_numeric_id_and_null_fields_are_accepted() {
        let json = r#"{"id":7,"name":null,"email":"valid@x.com","role":null,"created_at":"not a date"}"#;
        let user: User = serde_json::from_str(json).expect("parse user");
        assert_eq!(user.id(), Some("7"));
        assert_eq!(user.name(), "");
        assert_eq!(user.display_name(), "valid@x.com");
        assert_eq!(user.role(), &Role::Teacher);
        assert_eq!(user.member_since(), None);

        // Stored back exactly as received
        let back = serde_json::to_value(&user).expect("serialize user");
        let original: Value = serde_json::from_str(json).expect("parse original");
        assert_eq!(back, original);
    }

    #[test]
    fn test_non_object_user_is_rejected() {
        assert!(serde_json::from_str::<User>(r#""A""#).is_err());
        assert!(serde_json::from_str::<User>("null").is_err());
        assert!(serde_json::from_str::<User>("[1]").is_err());
    }
}
