pub mod auth;

pub use auth::{with_auth_header, AuthMiddleware};
