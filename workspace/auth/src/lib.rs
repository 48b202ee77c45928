pub mod accounts;
pub mod backend;
pub mod error;
pub mod password;
pub mod sessions;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{AuthBackend, Credentials, DatabaseBackend, Identity, SessionToken};
pub use error::{AuthError, Result};

/// Sessions last two weeks unless configured otherwise.
pub const DEFAULT_SESSION_TTL_SECS: i64 = 60 * 60 * 24 * 14;
