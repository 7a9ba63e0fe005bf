use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::cookie::{SameSite, TokenCookie};
use crate::models::token::Token;

use super::TokenStore;

/// On-disk shape of the cookie slot.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedCookie {
    name: String,
    value: String,
    path: String,
    expires: Option<DateTime<Utc>>,
    same_site: Option<SameSite>,
}

/// Token slot persisted as a small JSON file so a token survives between
/// `sguard` invocations. Deleting the token removes the file.
pub struct FileTokenStore {
    path: PathBuf,
    name: String,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> anyhow::Result<Option<PersistedCookie>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", self.path.display()))
            }
        };
        let cookie = serde_json::from_str(&raw)
            .with_context(|| format!("malformed cookie file {}", self.path.display()))?;
        Ok(Some(cookie))
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<Token> {
        let persisted = match self.read() {
            Ok(Some(p)) => p,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("ignoring unreadable token slot: {:#}", e);
                return None;
            }
        };
        if persisted.name != self.name || persisted.value.is_empty() {
            return None;
        }
        if persisted.expires.is_some_and(|at| at <= Utc::now()) {
            tracing::debug!("stored token expired at {:?}", persisted.expires);
            return None;
        }
        Some(Token::new(persisted.value))
    }

    fn set(&self, cookie: TokenCookie) -> anyhow::Result<()> {
        if cookie.is_expired() {
            return self.clear();
        }
        let persisted = PersistedCookie {
            name: self.name.clone(),
            value: cookie.value.as_str().to_string(),
            path: cookie.path.clone(),
            expires: cookie.expires,
            same_site: cookie.same_site,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let body = serde_json::to_string_pretty(&persisted)?;
        std::fs::write(&self.path, body)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }

    fn clear(&self) -> anyhow::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("failed to remove {}", self.path.display())),
        }
    }
}
