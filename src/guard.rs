//! Session guard: boot check, navigation guard, login and logout.
//!
//! The guard owns the [`GuardedClient`] so every request it makes, and every
//! request application code makes through [`SessionGuard::client`], carries
//! the same token-attachment and 401 rules.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use tokio::sync::watch;

use crate::client::GuardedClient;
use crate::config::GuardConfig;
use crate::errors::{GuardError, INVALID_CREDENTIALS_MESSAGE};
use crate::middleware::with_auth_header;
use crate::models::token::{ErrorDetail, LoginForm, Token, TokenResponse, UserProfile};
use crate::navigation::{LinkClick, NavigationDecision, Navigator};
use crate::notification::{AlertLevel, Notifier};
use crate::session::{Session, SessionState};
use crate::store::TokenStore;

/// Page lifecycle events the host environment forwards to the guard.
#[derive(Debug, Clone)]
pub enum PageEvent {
    Loaded,
    LinkClicked(LinkClick),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// Result of the boot check: whether a token is present afterwards.
    Booted { has_token: bool },
    Navigation(NavigationDecision),
}

pub struct SessionGuard {
    session: Arc<Session>,
    client: GuardedClient,
    notifier: Arc<dyn Notifier>,
}

impl SessionGuard {
    pub fn new(
        config: GuardConfig,
        store: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, GuardError> {
        let session = Arc::new(Session::new(config, store, navigator));
        let client = GuardedClient::new(session.clone())?;
        Ok(Self {
            session,
            client,
            notifier,
        })
    }

    pub fn config(&self) -> &GuardConfig {
        self.session.config()
    }

    /// Client for application requests. Shares this guard's token slot.
    pub fn client(&self) -> &GuardedClient {
        &self.client
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.session.subscribe()
    }

    pub fn current_path(&self) -> String {
        self.session.current_path()
    }

    pub fn get_token(&self) -> Option<Token> {
        self.session.token()
    }

    pub fn set_token(&self, value: &str, ttl: Option<Duration>) -> Result<(), GuardError> {
        self.session.store_token(value, ttl)
    }

    pub fn clear_token(&self) {
        self.session.clear_token();
    }

    /// `headers` plus the bearer header for the current token, if any.
    pub fn with_auth_header(&self, headers: &HeaderMap) -> HeaderMap {
        with_auth_header(headers, self.get_token().as_ref())
    }

    /// Dispatches a page event. A click that arrives before any boot check
    /// on this page runs the boot check first.
    pub async fn handle(&self, event: PageEvent) -> PageOutcome {
        match event {
            PageEvent::Loaded => PageOutcome::Booted {
                has_token: self.boot_check().await,
            },
            PageEvent::LinkClicked(click) => {
                if self.state() == SessionState::Unknown {
                    self.boot_check().await;
                }
                PageOutcome::Navigation(self.guard_navigation(&click))
            }
        }
    }

    /// Reconciles the current path with token presence. Runs once per page
    /// load; returns whether a token is present once the check is done.
    pub async fn boot_check(&self) -> bool {
        let config = self.session.config();
        let path = self.session.current_path();
        let token = self.session.token();
        self.session.set_state(SessionState::Checking);

        if config.is_login_path(&path) {
            if token.is_none() {
                self.session.set_state(SessionState::Unauthenticated);
                return false;
            }
            return match self.validate_token().await {
                Ok(()) => {
                    tracing::info!("token valid on login page, redirecting to {}", config.home_path);
                    self.session.set_state(SessionState::Authenticated);
                    self.session.navigator().replace(&config.home_path);
                    true
                }
                Err(e) => {
                    tracing::info!("stored token rejected: {}", e);
                    self.session.clear_token();
                    self.session.set_state(SessionState::Unauthenticated);
                    false
                }
            };
        }

        if token.is_none() {
            self.session.set_state(SessionState::Unauthenticated);
            if !config.is_excluded_path(&path) {
                tracing::info!(path = %path, "no token on protected page");
                self.session.redirect_to_login();
            }
            return false;
        }

        self.session.set_state(SessionState::Authenticated);
        true
    }

    /// Cancels in-app link navigation when no token is present and sends
    /// the page to the login boundary instead.
    pub fn guard_navigation(&self, click: &LinkClick) -> NavigationDecision {
        let Some(href) = click.href.as_deref().filter(|h| !h.is_empty()) else {
            return NavigationDecision::Allow;
        };
        if !self.is_guarded_link(href) {
            return NavigationDecision::Allow;
        }
        if self.session.token().is_some() {
            return NavigationDecision::Allow;
        }
        tracing::info!(href = %href, "link blocked, no token");
        self.session.set_state(SessionState::Unauthenticated);
        self.session.redirect_to_login();
        NavigationDecision::Cancelled
    }

    /// Same-origin links that are neither API calls nor the login boundary.
    fn is_guarded_link(&self, href: &str) -> bool {
        let config = self.session.config();
        let target = match config.base_url.join(href) {
            Ok(url) => url,
            Err(_) => return false,
        };
        if !matches!(target.scheme(), "http" | "https") || !config.is_app_origin(&target) {
            return false;
        }
        let path = target.path();
        !(config.is_api_path(path) || href.contains(config.api_prefix.as_str()))
            && !config.is_login_path(path)
    }

    pub fn logout(&self) {
        tracing::info!("logging out");
        self.session.clear_token();
        self.session.set_state(SessionState::Unauthenticated);
        let login = &self.session.config().login_path;
        self.session.navigator().replace(login);
    }

    /// Exchanges credentials for a token. On failure the user is alerted and
    /// an existing token is left in place (except on 401, which the auth
    /// middleware treats like any other API 401).
    pub async fn submit_login(&self, username: &str, password: &str) -> Result<(), GuardError> {
        match self.request_token(username, password).await {
            Ok(token) => {
                let config = self.session.config();
                self.session.store_token(token.as_str(), Some(config.token_ttl))?;
                self.session.set_state(SessionState::Authenticated);
                tracing::info!(username = %username, "login succeeded");
                self.session.navigator().replace(&config.home_path);
                Ok(())
            }
            Err(e) => {
                match &e {
                    GuardError::InvalidCredentials(_) => {
                        tracing::info!(username = %username, "login rejected")
                    }
                    other => tracing::error!(username = %username, "login failed: {}", other),
                }
                self.notifier.alert(AlertLevel::Error, e.user_message());
                Err(e)
            }
        }
    }

    async fn request_token(&self, username: &str, password: &str) -> Result<Token, GuardError> {
        let form = LoginForm { username, password };
        let resp = self
            .client
            .post_form_manual(&self.session.config().token_endpoint, form.encode())
            .await?;

        let status = resp.status();
        if status.is_success() {
            let body: TokenResponse = resp
                .json()
                .await
                .map_err(|e| GuardError::Decode(e.to_string()))?;
            if body.access_token.is_empty() {
                return Err(GuardError::Decode("empty access_token".into()));
            }
            if let Some(kind) = body
                .token_type
                .as_deref()
                .filter(|kind| !kind.eq_ignore_ascii_case("bearer"))
            {
                tracing::warn!(token_type = %kind, "token endpoint issued a non-bearer token");
            }
            tracing::debug!(role = ?body.role, "token issued");
            return Ok(Token::new(body.access_token));
        }
        if status == StatusCode::UNAUTHORIZED {
            let detail = resp
                .json::<ErrorDetail>()
                .await
                .ok()
                .and_then(|d| d.detail)
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| INVALID_CREDENTIALS_MESSAGE.to_string());
            return Err(GuardError::InvalidCredentials(detail));
        }
        Err(GuardError::ServerError(status))
    }

    /// Calls the identity endpoint; any non-2xx is a rejection.
    async fn validate_token(&self) -> Result<(), GuardError> {
        let resp = self
            .client
            .get(&self.session.config().identity_endpoint)?
            .send()
            .await?;
        match resp.status() {
            s if s.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED => Err(GuardError::Unauthorized),
            s => Err(GuardError::ServerError(s)),
        }
    }

    /// Fetches the signed-in user's profile.
    pub async fn whoami(&self) -> Result<UserProfile, GuardError> {
        let resp = self
            .client
            .get(&self.session.config().identity_endpoint)?
            .send()
            .await?;
        match resp.status() {
            s if s.is_success() => resp
                .json::<UserProfile>()
                .await
                .map_err(|e| GuardError::Decode(e.to_string())),
            StatusCode::UNAUTHORIZED => Err(GuardError::Unauthorized),
            s => Err(GuardError::ServerError(s)),
        }
    }
}
