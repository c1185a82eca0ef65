use serde_json::{json, Value};

/// Message carried by the reply returned when a request could not complete
pub const CONNECTION_ERROR_MESSAGE: &str = "Unable to connect to the server";

/// A JSON body returned by the backend, unchanged.
///
/// Business-level `error`/`success` fields are left for the caller to read.
/// `error()` applies one rule to every shape of body, so reading it never
/// fails.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiReply(Value);

impl ApiReply {
    pub fn new(body: Value) -> Self {
        Self(body)
    }

    /// The reply standing in for a request that never completed
    pub fn connection_error() -> Self {
        Self(json!({ "error": CONNECTION_ERROR_MESSAGE }))
    }

    pub fn body(&self) -> &Value {
        &self.0
    }

    pub fn into_body(self) -> Value {
        self.0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The body's `error` field as display text.
    ///
    /// Missing, null, `false` and empty-string errors count as no error.
    /// Non-string errors are rendered as JSON text.
    pub fn error(&self) -> Option<String> {
        match self.0.get("error")? {
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            v if !is_truthy(v) => None,
            v => Some(v.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.0.get("success").map(is_truthy).unwrap_or(false)
    }

    pub fn is_connection_error(&self) -> bool {
        self.error().as_deref() == Some(CONNECTION_ERROR_MESSAGE)
    }

    /// A non-empty string field
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// JSON truthiness as the backend's browser clients read it
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
