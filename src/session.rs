use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;

use crate::config::GuardConfig;
use crate::errors::GuardError;
use crate::models::cookie::{SameSite, TokenCookie};
use crate::models::token::Token;
use crate::navigation::Navigator;
use crate::store::TokenStore;

/// Authentication state of the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No boot check has fired on this page yet.
    Unknown,
    /// Boot check in flight.
    Checking,
    Authenticated,
    Unauthenticated,
}

/// State shared by the guard and the auth middleware: the token slot, the
/// page location and the session state.
pub struct Session {
    config: GuardConfig,
    store: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
    state: watch::Sender<SessionState>,
}

impl Session {
    pub fn new(
        config: GuardConfig,
        store: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Unknown);
        Self {
            config,
            store,
            navigator,
            state,
        }
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    pub fn token(&self) -> Option<Token> {
        self.store.get()
    }

    /// Writes `value` with a strict same-site policy. `ttl = None` stores a
    /// session cookie.
    pub fn store_token(&self, value: &str, ttl: Option<Duration>) -> Result<(), GuardError> {
        let mut cookie = TokenCookie::new(self.config.cookie_name.clone(), Token::new(value))
            .same_site(SameSite::Strict);
        if let Some(ttl) = ttl {
            let ttl = chrono::Duration::from_std(ttl)
                .map_err(|e| GuardError::Storage(anyhow::anyhow!("token ttl out of range: {e}")))?;
            let at = Utc::now()
                .checked_add_signed(ttl)
                .ok_or_else(|| GuardError::Storage(anyhow::anyhow!("token ttl out of range")))?;
            cookie = cookie.expires_at(at);
        }
        self.store.set(cookie)?;
        Ok(())
    }

    /// Empties the token slot. A storage failure is logged, not raised: the
    /// caller is already on a failure path.
    pub fn clear_token(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!("failed to clear token: {:#}", e);
        }
    }

    pub fn current_path(&self) -> String {
        self.navigator.current_path()
    }

    pub fn navigator(&self) -> &dyn Navigator {
        self.navigator.as_ref()
    }

    /// Sends the page to the login boundary unless it is already there.
    /// Returns whether a navigation happened.
    pub fn redirect_to_login(&self) -> bool {
        if self.config.is_login_path(&self.current_path()) {
            return false;
        }
        tracing::info!("redirecting to {}", self.config.login_path);
        self.navigator.replace(&self.config.login_path);
        true
    }

    /// Drops the credential and sends the page to the login boundary.
    /// Safe to run repeatedly: later calls find the page already there.
    pub fn invalidate(&self) -> bool {
        self.clear_token();
        self.set_state(SessionState::Unauthenticated);
        self.redirect_to_login()
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn set_state(&self, next: SessionState) {
        let prev = self.state.send_replace(next);
        if prev != next {
            tracing::debug!(?prev, ?next, "session state changed");
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }
}
