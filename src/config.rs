use std::path::PathBuf;
use std::time::Duration;

use url::Url;

/// Paths, endpoints and cookie policy the guard enforces.
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// Origin the application is served from. Relative request paths are
    /// resolved against it and link clicks are compared to its origin.
    pub base_url: Url,
    /// Login boundary: where users without a valid token are sent.
    pub login_path: String,
    /// Application root, the destination after a successful login.
    pub home_path: String,
    pub error_prefix: String,
    pub static_prefix: String,
    /// Only 401s for paths under this prefix invalidate the session.
    pub api_prefix: String,
    /// Token-issuing endpoint. Never receives an Authorization header.
    pub token_endpoint: String,
    /// "Who am I" endpoint used to validate a token on the login boundary.
    pub identity_endpoint: String,
    pub cookie_name: String,
    /// Lifetime of a token written by the login flow.
    pub token_ttl: Duration,
    /// Cookie file used by the `sguard` binary.
    pub cookie_file: PathBuf,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("http://127.0.0.1:8000").expect("static URL is valid"),
            login_path: "/unauthorized".into(),
            home_path: "/".into(),
            error_prefix: "/error".into(),
            static_prefix: "/static/".into(),
            api_prefix: "/api/".into(),
            token_endpoint: "/api/token".into(),
            identity_endpoint: "/api/users/me".into(),
            cookie_name: "access_token".into(),
            token_ttl: Duration::from_secs(24 * 60 * 60),
            cookie_file: PathBuf::from(".sguard/cookie.json"),
        }
    }
}

impl GuardConfig {
    /// Default policy served from `base_url`.
    pub fn with_base_url(base_url: Url) -> Self {
        Self {
            base_url,
            ..Self::default()
        }
    }

    pub fn is_login_path(&self, path: &str) -> bool {
        path == self.login_path
    }

    pub fn is_api_path(&self, path: &str) -> bool {
        path.starts_with(&self.api_prefix)
    }

    /// Whether `url` is served by the application itself.
    pub fn is_app_origin(&self, url: &Url) -> bool {
        same_origin(&self.base_url, url)
    }

    pub fn is_token_endpoint(&self, path: &str) -> bool {
        path.trim_end_matches('/') == self.token_endpoint.trim_end_matches('/')
    }

    /// Paths the boot check never redirects away from.
    pub fn is_excluded_path(&self, path: &str) -> bool {
        self.is_login_path(path)
            || path.starts_with(&self.error_prefix)
            || path.starts_with(&self.static_prefix)
    }
}

pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
}

pub fn load() -> anyhow::Result<GuardConfig> {
    dotenvy::dotenv().ok();

    let defaults = GuardConfig::default();

    let base_url = match std::env::var("GUARD_BASE_URL") {
        Ok(raw) => match Url::parse(&raw) {
            Ok(url) if url.has_host() => url,
            Ok(_) => anyhow::bail!("GUARD_BASE_URL must be an absolute http(s) URL, got '{raw}'"),
            Err(e) => anyhow::bail!("GUARD_BASE_URL is not a valid URL ('{raw}'): {e}"),
        },
        Err(_) => defaults.base_url,
    };

    Ok(GuardConfig {
        base_url,
        login_path: path_var("GUARD_LOGIN_PATH", defaults.login_path),
        home_path: path_var("GUARD_HOME_PATH", defaults.home_path),
        error_prefix: path_var("GUARD_ERROR_PREFIX", defaults.error_prefix),
        static_prefix: path_var("GUARD_STATIC_PREFIX", defaults.static_prefix),
        api_prefix: path_var("GUARD_API_PREFIX", defaults.api_prefix),
        token_endpoint: path_var("GUARD_TOKEN_ENDPOINT", defaults.token_endpoint),
        identity_endpoint: path_var("GUARD_IDENTITY_ENDPOINT", defaults.identity_endpoint),
        cookie_name: std::env::var("GUARD_COOKIE_NAME")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.cookie_name),
        token_ttl: std::env::var("GUARD_TOKEN_TTL_HOURS")
            .ok()
            .and_then(|v| ttl_from_hours(&v))
            .unwrap_or(defaults.token_ttl),
        cookie_file: std::env::var("GUARD_COOKIE_FILE")
            .map(PathBuf::from)
            .unwrap_or(defaults.cookie_file),
    })
}

/// Parses a TTL given in hours. `None` for garbage or values too large to
/// represent.
fn ttl_from_hours(raw: &str) -> Option<Duration> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .and_then(|hours| hours.checked_mul(60 * 60))
        .map(Duration::from_secs)
}

/// Reads a path-valued variable, forcing a leading slash.
fn path_var(name: &str, default: String) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(|v| normalize_path(v.trim()))
        .unwrap_or(default)
}

fn normalize_path(raw: &str) -> String {
    if raw.starts_with('/') {
        raw.to_string()
    } else {
        format!("/{raw}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_observed_policy() {
        let cfg = GuardConfig::default();
        assert_eq!(cfg.login_path, "/unauthorized");
        assert_eq!(cfg.token_endpoint, "/api/token");
        assert_eq!(cfg.identity_endpoint, "/api/users/me");
        assert_eq!(cfg.cookie_name, "access_token");
        assert_eq!(cfg.token_ttl, Duration::from_secs(86_400));
    }

    #[test]
    fn test_excluded_paths() {
        let cfg = GuardConfig::default();
        assert!(cfg.is_excluded_path("/unauthorized"));
        assert!(cfg.is_excluded_path("/error"));
        assert!(cfg.is_excluded_path("/error/500"));
        assert!(cfg.is_excluded_path("/static/js/app.js"));
        assert!(!cfg.is_excluded_path("/dashboard"));
        assert!(!cfg.is_excluded_path("/"));
        assert!(!cfg.is_excluded_path("/unauthorized/extra"));
    }

    #[test]
    fn test_token_endpoint_ignores_trailing_slash() {
        let cfg = GuardConfig::default();
        assert!(cfg.is_token_endpoint("/api/token"));
        assert!(cfg.is_token_endpoint("/api/token/"));
        assert!(!cfg.is_token_endpoint("/api/tokens"));
        assert!(!cfg.is_token_endpoint("/api/users/me"));
    }

    #[test]
    fn test_api_prefix() {
        let cfg = GuardConfig::default();
        assert!(cfg.is_api_path("/api/users/me"));
        assert!(!cfg.is_api_path("/apix/users"));
        assert!(!cfg.is_api_path("/dashboard"));
    }

    #[test]
    fn test_ttl_from_hours() {
        assert_eq!(ttl_from_hours("12"), Some(Duration::from_secs(12 * 3600)));
        assert_eq!(ttl_from_hours(" 1 "), Some(Duration::from_secs(3600)));
        assert_eq!(ttl_from_hours("abc"), None);
        assert_eq!(ttl_from_hours("-3"), None);
        // would overflow u64 seconds
        assert_eq!(ttl_from_hours(&u64::MAX.to_string()), None);
        assert_eq!(ttl_from_hours("6000000000000000"), None);
    }

    #[test]
    fn test_same_origin_compares_scheme_host_port() {
        let cfg = GuardConfig::with_base_url(Url::parse("http://app.local:8000/").unwrap());
        assert!(cfg.is_app_origin(&Url::parse("http://app.local:8000/api/x").unwrap()));
        assert!(!cfg.is_app_origin(&Url::parse("http://app.local:9000/api/x").unwrap()));
        assert!(!cfg.is_app_origin(&Url::parse("https://app.local:8000/api/x").unwrap()));
        assert!(!cfg.is_app_origin(&Url::parse("http://other.local:8000/api/x").unwrap()));
        assert!(same_origin(
            &Url::parse("https://app.local/").unwrap(),
            &Url::parse("https://app.local:443/x").unwrap()
        ));
    }

    #[test]
    fn test_normalize_path_adds_leading_slash() {
        assert_eq!(normalize_path("unauthorized"), "/unauthorized");
        assert_eq!(normalize_path("/login"), "/login");
    }
}
