//! Session storage.
//!
//! A session is a row keyed by a random token; the client only ever sees the
//! token. Expired rows are ignored on lookup and removed lazily, or in bulk by
//! [`clear_expired_sessions`].

use std::fmt::Write;

use chrono::{Duration, Utc};
use model::entities::{session, user};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::{debug, info, trace};

use crate::error::Result;

fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a cryptographically random 32-byte hex token.
pub fn generate_token() -> String {
    use rand::Rng;

    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// Create a session for `user_id` that lives for `ttl`.
pub async fn create_session(
    db: &DatabaseConnection,
    user_id: i32,
    ttl: Duration,
) -> Result<session::Model> {
    let now = Utc::now();
    let created = session::ActiveModel {
        token: Set(generate_token()),
        user_id: Set(user_id),
        created_at: Set(now),
        expires_at: Set(now + ttl),
    }
    .insert(db)
    .await?;
    debug!("Session created for user ID {}, expires at {}", user_id, created.expires_at);
    Ok(created)
}

/// Resolve a token to its user. Unknown and expired tokens, and sessions of
/// inactive users, resolve to `None`.
pub async fn session_user(db: &DatabaseConnection, token: &str) -> Result<Option<user::Model>> {
    trace!("Looking up session");
    let Some((found, owner)) = session::Entity::find_by_id(token.to_string())
        .find_also_related(user::Entity)
        .one(db)
        .await?
    else {
        return Ok(None);
    };

    if found.is_expired(Utc::now()) {
        debug!("Session for user ID {} expired, removing it", found.user_id);
        delete_session(db, token).await?;
        return Ok(None);
    }

    Ok(owner.filter(|user| user.is_active))
}

/// Delete a session by token. Deleting an unknown token is not an error.
pub async fn delete_session(db: &DatabaseConnection, token: &str) -> Result<()> {
    let result = session::Entity::delete_by_id(token.to_string())
        .exec(db)
        .await?;
    debug!("Deleted {} session row(s)", result.rows_affected);
    Ok(())
}

/// Delete every session of `user_id` except the one identified by `keep`.
pub async fn delete_user_sessions(
    db: &DatabaseConnection,
    user_id: i32,
    keep: Option<&str>,
) -> Result<u64> {
    let mut query = session::Entity::delete_many().filter(session::Column::UserId.eq(user_id));
    if let Some(token) = keep {
        query = query.filter(session::Column::Token.ne(token));
    }
    let result = query.exec(db).await?;
    info!("Ended {} session(s) of user ID {}", result.rows_affected, user_id);
    Ok(result.rows_affected)
}

/// Remove all sessions whose expiry has passed.
pub async fn clear_expired_sessions(db: &DatabaseConnection) -> Result<u64> {
    let result = session::Entity::delete_many()
        .filter(session::Column::ExpiresAt.lte(Utc::now()))
        .exec(db)
        .await?;
    info!("Cleared {} expired session(s)", result.rows_affected);
    Ok(result.rows_affected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::{NewAccount, create_user};
    use crate::testing::setup_db;
    use sea_orm::{ActiveModelTrait, IntoActiveModel, PaginatorTrait};

    async fn user(db: &DatabaseConnection, username: &str) -> user::Model {
        create_user(
            db,
            NewAccount {
                username: username.to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    #[test]
    fn test_generate_token_shape() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_token());
    }

    #[tokio::test]
    async fn test_session_round_trip() {
        let db = setup_db().await;
        let alice = user(&db, "alice").await;

        let session = create_session(&db, alice.id, Duration::hours(1)).await.unwrap();
        let found = session_user(&db, &session.token).await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(alice.id));

        delete_session(&db, &session.token).await.unwrap();
        assert!(session_user(&db, &session.token).await.unwrap().is_none());

        // Deleting twice is fine
        delete_session(&db, &session.token).await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let db = setup_db().await;
        assert!(session_user(&db, "deadbeef").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_session_is_ignored_and_removed() {
        let db = setup_db().await;
        let alice = user(&db, "alice").await;

        let session = create_session(&db, alice.id, Duration::seconds(-1)).await.unwrap();
        assert!(session_user(&db, &session.token).await.unwrap().is_none());

        let remaining = session::Entity::find().count(&db).await.unwrap();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn test_inactive_user_session_is_ignored() {
        let db = setup_db().await;
        let alice = user(&db, "alice").await;
        let session = create_session(&db, alice.id, Duration::hours(1)).await.unwrap();

        let mut active = alice.into_active_model();
        active.is_active = Set(false);
        active.update(&db).await.unwrap();

        assert!(session_user(&db, &session.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_user_sessions_keeps_current() {
        let db = setup_db().await;
        let alice = user(&db, "alice").await;
        let bob = user(&db, "bob").await;

        let current = create_session(&db, alice.id, Duration::hours(1)).await.unwrap();
        let other = create_session(&db, alice.id, Duration::hours(1)).await.unwrap();
        let bobs = create_session(&db, bob.id, Duration::hours(1)).await.unwrap();

        let ended = delete_user_sessions(&db, alice.id, Some(&current.token)).await.unwrap();
        assert_eq!(ended, 1);

        assert!(session_user(&db, &current.token).await.unwrap().is_some());
        assert!(session_user(&db, &other.token).await.unwrap().is_none());
        assert!(session_user(&db, &bobs.token).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_clear_expired_sessions() {
        let db = setup_db().await;
        let alice = user(&db, "alice").await;

        create_session(&db, alice.id, Duration::seconds(-60)).await.unwrap();
        create_session(&db, alice.id, Duration::seconds(-30)).await.unwrap();
        let live = create_session(&db, alice.id, Duration::hours(1)).await.unwrap();

        assert_eq!(clear_expired_sessions(&db).await.unwrap(), 2);
        assert!(session_user(&db, &live.token).await.unwrap().is_some());
    }
}
