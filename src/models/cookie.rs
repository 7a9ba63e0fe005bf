use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::token::Token;

/// Expiry written when a cookie is deleted.
pub fn epoch_expiry() -> DateTime<Utc> {
    Utc.timestamp_opt(1, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SameSite::Strict => f.write_str("Strict"),
            SameSite::Lax => f.write_str("Lax"),
            SameSite::None => f.write_str("None"),
        }
    }
}

/// The single cookie slot holding the session token.
#[derive(Debug, Clone)]
pub struct TokenCookie {
    pub name: String,
    pub value: Token,
    pub path: String,
    /// `None` is a session cookie.
    pub expires: Option<DateTime<Utc>>,
    pub same_site: Option<SameSite>,
}

impl TokenCookie {
    pub fn new(name: impl Into<String>, value: Token) -> Self {
        Self {
            name: name.into(),
            value,
            path: "/".into(),
            expires: None,
            same_site: None,
        }
    }

    pub fn expires_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires = Some(at);
        self
    }

    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    /// A deletion record for `name`: empty value, expiry at the epoch.
    pub fn expired(name: impl Into<String>) -> Self {
        Self::new(name, Token::new("")).expires_at(epoch_expiry())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|at| at <= now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Renders the cookie as a `Set-Cookie` header value.
    pub fn to_set_cookie(&self) -> String {
        let mut out = format!("{}={}; Path={}", self.name, self.value.as_str(), self.path);
        if let Some(at) = self.expires {
            out.push_str("; Expires=");
            out.push_str(&at.format("%a, %d %b %Y %H:%M:%S GMT").to_string());
        }
        if let Some(same_site) = self.same_site {
            out.push_str("; SameSite=");
            out.push_str(&same_site.to_string());
        }
        out
    }
}

/// Looks up `name` in a `Cookie` request header (`a=1; b=2`).
/// Returns `None` when the cookie is missing or empty.
pub fn find_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .map(str::trim_start)
        .find_map(|pair| pair.strip_prefix(name)?.strip_prefix('='))
        .filter(|value| !value.is_empty())
}
