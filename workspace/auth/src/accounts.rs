//! Creating and updating user records.

use std::fmt;

use chrono::Utc;
use model::entities::user;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    SqlErr,
};
use tracing::{debug, info, instrument, trace};

use crate::error::{AuthError, Result};
use crate::password::{make_unusable_password, spawn_make_password};

/// Field values for a user that does not exist yet.
#[derive(Clone, Default)]
pub struct NewAccount {
    pub username: String,
    /// Raw password; `None` stores an unusable password.
    pub password: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewAccount")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("is_staff", &self.is_staff)
            .field("is_superuser", &self.is_superuser)
            .finish()
    }
}

/// The profile fields a user may change about themselves.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Lowercase the domain part of an e-mail address; the local part is kept as typed.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

fn map_unique_violation(error: DbErr, username: &str) -> AuthError {
    match error.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AuthError::UsernameTaken(username.to_string()),
        _ => AuthError::Database(error),
    }
}

/// Create an active, non-staff user unless `account` says otherwise. The password is hashed
/// before it reaches the store.
#[instrument(skip(db, account), fields(username = %account.username))]
pub async fn create_user(db: &DatabaseConnection, account: NewAccount) -> Result<user::Model> {
    trace!("Entering create_user function");

    let password = match account.password.as_deref() {
        Some(raw) => spawn_make_password(raw).await?,
        None => make_unusable_password(),
    };

    let new_user = user::ActiveModel {
        username: Set(account.username.clone()),
        password: Set(password),
        first_name: Set(account.first_name),
        last_name: Set(account.last_name),
        email: Set(normalize_email(&account.email)),
        is_active: Set(true),
        is_staff: Set(account.is_staff),
        is_superuser: Set(account.is_superuser),
        date_joined: Set(Utc::now()),
        last_login: Set(None),
        ..Default::default()
    };

    let created = new_user
        .insert(db)
        .await
        .map_err(|e| map_unique_violation(e, &account.username))?;
    info!("User created with ID: {}, username: {}", created.id, created.username);
    Ok(created)
}

/// Exact, case-sensitive username lookup.
pub async fn find_by_username(db: &DatabaseConnection, username: &str) -> Result<Option<user::Model>> {
    Ok(user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?)
}

/// Whether `username` belongs to a user other than `exclude_id`.
pub async fn username_taken(
    db: &DatabaseConnection,
    username: &str,
    exclude_id: Option<i32>,
) -> Result<bool> {
    let mut query = user::Entity::find().filter(user::Column::Username.eq(username));
    if let Some(id) = exclude_id {
        query = query.filter(user::Column::Id.ne(id));
    }
    Ok(query.one(db).await?.is_some())
}

/// Overwrite the four profile fields. Password and status flags are left alone.
#[instrument(skip(db, existing), fields(user_id = existing.id))]
pub async fn update_profile(
    db: &DatabaseConnection,
    existing: user::Model,
    update: ProfileUpdate,
) -> Result<user::Model> {
    trace!("Entering update_profile function");
    debug!("Updating profile fields: {:?}", update);

    let mut active: user::ActiveModel = existing.into();
    active.username = Set(update.username.clone());
    active.first_name = Set(update.first_name);
    active.last_name = Set(update.last_name);
    active.email = Set(normalize_email(&update.email));

    let updated = active
        .update(db)
        .await
        .map_err(|e| map_unique_violation(e, &update.username))?;
    info!("User with ID {} updated profile", updated.id);
    Ok(updated)
}

/// Replace the stored hash with the hash of `raw`.
#[instrument(skip(db, existing, raw), fields(user_id = existing.id))]
pub async fn set_password(
    db: &DatabaseConnection,
    existing: user::Model,
    raw: &str,
) -> Result<user::Model> {
    let mut active: user::ActiveModel = existing.into();
    active.password = Set(spawn_make_password(raw).await?);
    let updated = active.update(db).await?;
    info!("Password changed for user ID {}", updated.id);
    Ok(updated)
}

/// Stamp `last_login` with the current time.
pub async fn record_login(db: &DatabaseConnection, existing: user::Model) -> Result<user::Model> {
    let user_id = existing.id;
    let mut active: user::ActiveModel = existing.into();
    active.last_login = Set(Some(Utc::now()));
    match active.update(db).await {
        Ok(updated) => Ok(updated),
        Err(DbErr::RecordNotUpdated) => Err(AuthError::UserNotFound(user_id)),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::password::check_password;
    use crate::testing::setup_db;

    fn account(username: &str) -> NewAccount {
        NewAccount {
            username: username.to_string(),
            password: Some("testpassword".to_string()),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            email: "Test@EXAMPLE.com".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("Jane.Doe@Example.COM"), "Jane.Doe@example.com");
        assert_eq!(normalize_email("  user@host.org "), "user@host.org");
        assert_eq!(normalize_email(""), "");
        assert_eq!(normalize_email("no-at-sign"), "no-at-sign");
    }

    #[test]
    fn test_new_account_debug_hides_password() {
        let rendered = format!("{:?}", account("alice"));
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("testpassword"));
    }

    #[tokio::test]
    async fn test_create_user_defaults() {
        let db = setup_db().await;

        let user = create_user(&db, account("alice")).await.unwrap();

        assert_eq!(user.username, "alice");
        assert_ne!(user.password, "testpassword");
        assert!(check_password("testpassword", &user.password));
        assert_eq!(user.email, "Test@example.com");
        assert!(user.is_active);
        assert!(!user.is_staff);
        assert!(!user.is_superuser);
        assert!(user.last_login.is_none());
    }

    #[tokio::test]
    async fn test_create_user_without_password() {
        let db = setup_db().await;

        let user = create_user(
            &db,
            NewAccount {
                password: None,
                ..account("nopass")
            },
        )
        .await
        .unwrap();

        assert!(!user.has_usable_password());
    }

    #[tokio::test]
    async fn test_duplicate_username_is_reported() {
        let db = setup_db().await;

        create_user(&db, account("alice")).await.unwrap();
        let err = create_user(&db, account("alice")).await.unwrap_err();

        assert!(matches!(err, AuthError::UsernameTaken(ref name) if name == "alice"));
    }

    #[tokio::test]
    async fn test_username_taken_excludes_self() {
        let db = setup_db().await;
        let alice = create_user(&db, account("alice")).await.unwrap();

        assert!(username_taken(&db, "alice", None).await.unwrap());
        assert!(!username_taken(&db, "alice", Some(alice.id)).await.unwrap());
        assert!(!username_taken(&db, "Alice", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_profile_keeps_flags_and_password() {
        let db = setup_db().await;
        let alice = create_user(&db, account("alice")).await.unwrap();
        let original_hash = alice.password.clone();

        let updated = update_profile(
            &db,
            alice,
            ProfileUpdate {
                username: "alice2".to_string(),
                first_name: "Alice".to_string(),
                last_name: "Liddell".to_string(),
                email: "alice@WONDER.land".to_string(),
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.username, "alice2");
        assert_eq!(updated.first_name, "Alice");
        assert_eq!(updated.last_name, "Liddell");
        assert_eq!(updated.email, "alice@wonder.land");
        assert_eq!(updated.password, original_hash);
        assert!(updated.is_active);
        assert!(!updated.is_staff);
    }

    #[tokio::test]
    async fn test_update_profile_rejects_taken_username() {
        let db = setup_db().await;
        create_user(&db, account("alice")).await.unwrap();
        let bob = create_user(&db, account("bob")).await.unwrap();

        let err = update_profile(
            &db,
            bob,
            ProfileUpdate {
                username: "alice".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AuthError::UsernameTaken(_)));
    }

    #[tokio::test]
    async fn test_set_password_and_record_login() {
        let db = setup_db().await;
        let alice = create_user(&db, account("alice")).await.unwrap();

        let alice = set_password(&db, alice, "n3w-secret").await.unwrap();
        assert!(check_password("n3w-secret", &alice.password));
        assert!(!check_password("testpassword", &alice.password));

        let alice = record_login(&db, alice).await.unwrap();
        assert!(alice.last_login.is_some());

        let found = find_by_username(&db, "alice").await.unwrap().unwrap();
        assert!(found.last_login.is_some());
    }
}
