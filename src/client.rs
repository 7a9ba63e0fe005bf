/// HTTP client every caller uses to reach the API.
/// Wraps reqwest in a reqwest-middleware chain whose only link is the auth
/// middleware; no retries and no client-side timeouts.
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::redirect::Policy;
use reqwest::{Method, Response};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use url::Url;

use crate::errors::GuardError;
use crate::middleware::AuthMiddleware;
use crate::session::Session;

const USER_AGENT: &str = concat!("sguard/", env!("CARGO_PKG_VERSION"));

pub struct GuardedClient {
    client: ClientWithMiddleware,
    /// Same chain, but 3xx responses are returned instead of followed.
    no_redirect: ClientWithMiddleware,
    base_url: Url,
}

impl GuardedClient {
    pub fn new(session: Arc<Session>) -> Result<Self, GuardError> {
        let base_url = session.config().base_url.clone();

        let follow = reqwest::Client::builder()
            .use_rustls_tls()
            .user_agent(USER_AGENT)
            .build()?;
        let manual = reqwest::Client::builder()
            .use_rustls_tls()
            .user_agent(USER_AGENT)
            .redirect(Policy::none())
            .build()?;

        Ok(Self {
            client: ClientBuilder::new(follow)
                .with(AuthMiddleware::new(session.clone()))
                .build(),
            no_redirect: ClientBuilder::new(manual)
                .with(AuthMiddleware::new(session))
                .build(),
            base_url,
        })
    }

    /// Resolves an app-relative path (or absolute URL) against the base URL.
    pub fn url(&self, path: &str) -> Result<Url, GuardError> {
        self.base_url.join(path).map_err(|e| GuardError::InvalidUrl {
            url: path.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, GuardError> {
        Ok(self.client.request(method, self.url(path)?))
    }

    pub fn get(&self, path: &str) -> Result<RequestBuilder, GuardError> {
        self.request(Method::GET, path)
    }

    pub fn post(&self, path: &str) -> Result<RequestBuilder, GuardError> {
        self.request(Method::POST, path)
    }

    /// Low-level entry point for a fully built request.
    pub async fn execute(&self, req: reqwest::Request) -> Result<Response, GuardError> {
        Ok(self.client.execute(req).await?)
    }

    /// Sends raw parts without going through the builder API.
    pub async fn send_raw(
        &self,
        method: Method,
        path: &str,
        headers: HeaderMap,
        body: Vec<u8>,
    ) -> Result<Response, GuardError> {
        let mut req = reqwest::Request::new(method, self.url(path)?);
        *req.headers_mut() = headers;
        if !body.is_empty() {
            *req.body_mut() = Some(body.into());
        }
        self.execute(req).await
    }

    /// POSTs a form-encoded body without following redirects.
    pub async fn post_form_manual(&self, path: &str, body: String) -> Result<Response, GuardError> {
        let resp = self
            .no_redirect
            .post(self.url(path)?)
            .header(
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            )
            .body(body)
            .send()
            .await?;
        Ok(resp)
    }
}
