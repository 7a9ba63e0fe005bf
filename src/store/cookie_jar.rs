use std::sync::{Mutex, MutexGuard};

use crate::models::cookie::{find_cookie, TokenCookie};
use crate::models::token::Token;

use super::TokenStore;

#[derive(Default)]
struct Jar {
    slot: Option<TokenCookie>,
    /// Every `Set-Cookie` value written, oldest first.
    written: Vec<String>,
}

/// In-memory cookie slot. Behaves like `document.cookie` restricted to one
/// name: expiry is enforced on read, deletion writes an epoch-expired cookie.
pub struct CookieJarStore {
    name: String,
    jar: Mutex<Jar>,
}

impl CookieJarStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            jar: Mutex::new(Jar::default()),
        }
    }

    /// Seeds the slot from a `Cookie` request header, as a page load would.
    pub fn from_cookie_header(name: impl Into<String>, header: &str) -> Self {
        let store = Self::new(name);
        if let Some(value) = find_cookie(header, &store.name) {
            store.lock().slot = Some(TokenCookie::new(store.name.clone(), Token::new(value)));
        }
        store
    }

    /// The cookie as it would appear in a `Cookie` header, if live.
    pub fn cookie_header(&self) -> Option<String> {
        self.get()
            .map(|token| format!("{}={}", self.name, token.as_str()))
    }

    /// Last `Set-Cookie` value written by `set` or `clear`.
    pub fn last_set_cookie(&self) -> Option<String> {
        self.lock().written.last().cloned()
    }

    pub fn set_cookie_history(&self) -> Vec<String> {
        self.lock().written.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Jar> {
        self.jar.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TokenStore for CookieJarStore {
    fn get(&self) -> Option<Token> {
        let mut jar = self.lock();
        if jar.slot.as_ref().is_some_and(TokenCookie::is_expired) {
            jar.slot = None;
        }
        jar.slot
            .as_ref()
            .filter(|cookie| !cookie.value.is_empty())
            .map(|cookie| cookie.value.clone())
    }

    fn set(&self, mut cookie: TokenCookie) -> anyhow::Result<()> {
        cookie.name = self.name.clone();
        let mut jar = self.lock();
        jar.written.push(cookie.to_set_cookie());
        jar.slot = if cookie.is_expired() { None } else { Some(cookie) };
        Ok(())
    }

    fn clear(&self) -> anyhow::Result<()> {
        let mut jar = self.lock();
        jar.written.push(TokenCookie::expired(self.name.clone()).to_set_cookie());
        jar.slot = None;
        Ok(())
    }
}
