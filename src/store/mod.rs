pub mod cookie_jar;
pub mod file;

use crate::models::cookie::TokenCookie;
use crate::models::token::Token;

pub use cookie_jar::CookieJarStore;
pub use file::FileTokenStore;

/// Abstraction over the single client-side token slot.
/// Implementations: CookieJarStore (in memory), FileTokenStore (JSON file).
///
/// Every implementation treats an expired cookie as absent.
pub trait TokenStore: Send + Sync {
    /// Current token, or `None` if the slot is empty or expired.
    fn get(&self) -> Option<Token>;

    /// Writes the cookie, replacing whatever the slot held.
    fn set(&self, cookie: TokenCookie) -> anyhow::Result<()>;

    /// Empties the slot immediately.
    fn clear(&self) -> anyhow::Result<()>;
}
