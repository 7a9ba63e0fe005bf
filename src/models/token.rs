use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Opaque bearer credential. The value is wiped from memory on drop and
/// never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `Bearer <token>`, the Authorization header value.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

impl Drop for Token {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Success body of the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Error body returned by the API (`{"detail": "..."}`).
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    pub detail: Option<String>,
}

/// Body of the identity endpoint. Fields are optional so a slimmer or
/// richer user representation still validates the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Credentials posted to the token endpoint as `application/x-www-form-urlencoded`.
pub struct LoginForm<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

impl LoginForm<'_> {
    pub fn encode(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("username", self.username)
            .append_pair("password", self.password)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_value() {
        let token = Token::new("abc123");
        let printed = format!("{token:?}");
        assert!(!printed.contains("abc123"));
        assert_eq!(token.bearer(), "Bearer abc123");
    }

    #[test]
    fn test_token_response_tolerates_extra_fields() {
        let body = r#"{"access_token":"abc123","token_type":"bearer","role":"admin","extra":1}"#;
        let parsed: TokenResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.access_token, "abc123");
        assert_eq!(parsed.role.as_deref(), Some("admin"));

        let minimal: TokenResponse = serde_json::from_str(r#"{"access_token":"x"}"#).unwrap();
        assert!(minimal.token_type.is_none());
    }

    #[test]
    fn test_login_form_encodes_special_characters() {
        let form = LoginForm {
            username: "alice",
            password: "s3cr&t=1 2",
        };
        assert_eq!(form.encode(), "username=alice&password=s3cr%26t%3D1+2");
    }

    #[test]
    fn test_user_profile_parses_api_shape() {
        let body = r#"{"id":7,"username":"alice","role":"admin","is_active":true,"created_at":"2024-09-01T10:00:00Z"}"#;
        let user: UserProfile = serde_json::from_str(body).unwrap();
        assert_eq!(user.id, Some(7));
        assert_eq!(user.username.as_deref(), Some("alice"));
        assert!(user.created_at.is_some());
    }
}
