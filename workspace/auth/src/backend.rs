use std::fmt;

use async_trait::async_trait;
use chrono::Duration;
use model::entities::user;
use sea_orm::DatabaseConnection;
use tracing::{debug, info, instrument, trace, warn};

use crate::accounts::{find_by_username, record_login};
use crate::error::Result;
use crate::password::{burn_hash, spawn_check_password};
use crate::sessions;

/// The authenticated principal. Views read profile fields and status flags from it.
pub type Identity = user::Model;

/// A username and raw password as typed into the login form.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

/// Opaque session identifier handed to the client.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for SessionToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Enough of the token to correlate log lines, not enough to replay it.
        let prefix: String = self.0.chars().take(8).collect();
        write!(f, "SessionToken({prefix}...)")
    }
}

/// Authentication and session capability used by the web layer.
#[async_trait]
pub trait AuthBackend: Send + Sync + fmt::Debug {
    /// Resolve credentials to the matching identity.
    ///
    /// The identity is returned whether or not it is active; callers decide what an
    /// inactive account means for them.
    async fn authenticate(&self, credentials: &Credentials) -> Result<Option<Identity>>;

    /// Open a new session for `identity` and record the login.
    async fn start_session(&self, identity: &Identity) -> Result<SessionToken>;

    /// The active identity a session token belongs to, if the session is still valid.
    async fn current_identity(&self, token: &str) -> Result<Option<Identity>>;

    /// Close the session. Unknown tokens are ignored.
    async fn end_session(&self, token: &str) -> Result<()>;

    /// Close every session of `identity` except `keep`.
    async fn end_other_sessions(&self, identity: &Identity, keep: &str) -> Result<u64>;

    /// How long a new session stays valid.
    fn session_ttl(&self) -> Duration;
}

/// [`AuthBackend`] storing users and sessions in the application database.
#[derive(Debug, Clone)]
pub struct DatabaseBackend {
    db: DatabaseConnection,
    session_ttl: Duration,
}

impl DatabaseBackend {
    pub fn new(db: DatabaseConnection, session_ttl: Duration) -> Self {
        Self { db, session_ttl }
    }
}

#[async_trait]
impl AuthBackend for DatabaseBackend {
    #[instrument(skip(self))]
    async fn authenticate(&self, credentials: &Credentials) -> Result<Option<Identity>> {
        trace!("Entering authenticate function");

        let Some(user) = find_by_username(&self.db, &credentials.username).await? else {
            debug!("No user named '{}'", credentials.username);
            burn_hash(&credentials.password).await;
            return Ok(None);
        };

        if spawn_check_password(&credentials.password, &user.password).await {
            debug!("Credentials accepted for user ID {}", user.id);
            Ok(Some(user))
        } else {
            warn!("Wrong password for user '{}'", credentials.username);
            Ok(None)
        }
    }

    #[instrument(skip(self, identity), fields(user_id = identity.id))]
    async fn start_session(&self, identity: &Identity) -> Result<SessionToken> {
        let session = sessions::create_session(&self.db, identity.id, self.session_ttl).await?;
        record_login(&self.db, identity.clone()).await?;
        info!("User '{}' logged in", identity.username);
        Ok(SessionToken(session.token))
    }

    async fn current_identity(&self, token: &str) -> Result<Option<Identity>> {
        sessions::session_user(&self.db, token).await
    }

    async fn end_session(&self, token: &str) -> Result<()> {
        sessions::delete_session(&self.db, token).await
    }

    async fn end_other_sessions(&self, identity: &Identity, keep: &str) -> Result<u64> {
        sessions::delete_user_sessions(&self.db, identity.id, Some(keep)).await
    }

    fn session_ttl(&self) -> Duration {
        self.session_ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::{NewAccount, create_user};
    use crate::testing::setup_db;
    use sea_orm::{ActiveModelTrait, IntoActiveModel, Set};

    async fn backend_with_user() -> (DatabaseBackend, Identity) {
        let db = setup_db().await;
        let user = create_user(
            &db,
            NewAccount {
                username: "testuser".to_string(),
                password: Some("testpassword".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        (DatabaseBackend::new(db, Duration::hours(1)), user)
    }

    fn credentials(username: &str, password: &str) -> Credentials {
        Credentials {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_authenticate() {
        let (backend, user) = backend_with_user().await;

        let found = backend
            .authenticate(&credentials("testuser", "testpassword"))
            .await
            .unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));

        let wrong = backend
            .authenticate(&credentials("testuser", "wrongpassword"))
            .await
            .unwrap();
        assert!(wrong.is_none());

        let unknown = backend
            .authenticate(&credentials("nobody", "testpassword"))
            .await
            .unwrap();
        assert!(unknown.is_none());
    }

    #[tokio::test]
    async fn test_authenticate_returns_inactive_identity() {
        let (backend, user) = backend_with_user().await;
        let mut active = user.into_active_model();
        active.is_active = Set(false);
        active.update(&backend.db).await.unwrap();

        let found = backend
            .authenticate(&credentials("testuser", "testpassword"))
            .await
            .unwrap()
            .unwrap();
        assert!(!found.is_active);
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let (backend, user) = backend_with_user().await;

        let token = backend.start_session(&user).await.unwrap();
        let current = backend.current_identity(token.as_str()).await.unwrap().unwrap();
        assert_eq!(current.id, user.id);
        assert!(current.last_login.is_some());

        backend.end_session(token.as_str()).await.unwrap();
        assert!(backend.current_identity(token.as_str()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_end_other_sessions() {
        let (backend, user) = backend_with_user().await;

        let kept = backend.start_session(&user).await.unwrap();
        let dropped = backend.start_session(&user).await.unwrap();
        assert_ne!(kept, dropped);

        let ended = backend.end_other_sessions(&user, kept.as_str()).await.unwrap();
        assert_eq!(ended, 1);
        assert!(backend.current_identity(kept.as_str()).await.unwrap().is_some());
        assert!(backend.current_identity(dropped.as_str()).await.unwrap().is_none());
    }

    #[test]
    fn test_debug_output_hides_secrets() {
        let creds = format!("{:?}", credentials("alice", "hunter2"));
        assert!(!creds.contains("hunter2"));

        let token = SessionToken::from("0123456789abcdef".to_string());
        assert_eq!(format!("{:?}", token), "SessionToken(01234567...)");
        assert_eq!(token.into_inner(), "0123456789abcdef");
    }
}
