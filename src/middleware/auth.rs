//! Bearer-token injection and 401 handling for every outgoing request.
//!
//! Both the builder API and raw `execute` calls on [`crate::client::GuardedClient`]
//! pass through [`AuthMiddleware`], so the rules below hold whichever path a
//! caller uses:
//! 1. Requests to the token endpoint go out untouched.
//! 2. Every other request gets `Authorization: Bearer <token>` if a token exists.
//! 3. A 401 for a path under the API prefix on the application's own origin
//!    clears the token and sends the page to the login boundary (replace, not
//!    push). Other 401s pass through.
//! 4. Transport errors are logged and returned to the caller.

use std::sync::Arc;

use http::Extensions;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Request, Response, StatusCode};
use reqwest_middleware::{Middleware, Next};

use crate::models::token::Token;
use crate::session::Session;

/// Returns a copy of `headers` carrying `Authorization: Bearer <token>` when
/// a token is given; otherwise an unchanged copy.
pub fn with_auth_header(headers: &HeaderMap, token: Option<&Token>) -> HeaderMap {
    let mut out = headers.clone();
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return out;
    };
    match HeaderValue::from_str(&token.bearer()) {
        Ok(mut value) => {
            value.set_sensitive(true);
            out.insert(AUTHORIZATION, value);
        }
        Err(_) => {
            tracing::warn!("stored token is not a valid header value; sending request without it");
        }
    }
    out
}

pub struct AuthMiddleware {
    session: Arc<Session>,
}

impl AuthMiddleware {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

#[async_trait::async_trait]
impl Middleware for AuthMiddleware {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        let config = self.session.config();
        let path = req.url().path().to_string();
        let app_origin = config.is_app_origin(req.url());

        if config.is_token_endpoint(&path) {
            tracing::debug!(path = %path, "token endpoint, no auth header");
        } else {
            let token = self.session.token();
            tracing::debug!(path = %path, with_token = token.is_some(), "outgoing request");
            let headers = with_auth_header(req.headers(), token.as_ref());
            *req.headers_mut() = headers;
        }

        let method = req.method().clone();
        let resp = match next.run(req, extensions).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::error!(%method, path = %path, "request failed: {}", e);
                return Err(e);
            }
        };

        if resp.status() == StatusCode::UNAUTHORIZED && app_origin && config.is_api_path(&path) {
            tracing::warn!(%method, path = %path, "401 from API, invalidating session");
            self.session.invalidate();
        }

        Ok(resp)
    }
}
