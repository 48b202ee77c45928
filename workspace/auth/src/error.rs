use thiserror::Error;

/// Error types for the auth crate
#[derive(Error, Debug)]
pub enum AuthError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Error from hashing a password
    #[error("Password hashing error: {0}")]
    Hashing(String),

    /// The username is already held by another user
    #[error("Username '{0}' already exists")]
    UsernameTaken(String),

    /// An account operation referenced a user that no longer exists
    #[error("User {0} not found")]
    UserNotFound(i32),
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(error: argon2::password_hash::Error) -> Self {
        AuthError::Hashing(error.to_string())
    }
}

/// Type alias for Result with AuthError
pub type Result<T> = std::result::Result<T, AuthError>;
