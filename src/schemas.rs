use std::fmt;
use std::sync::Arc;

use auth::{AuthBackend, DatabaseBackend, Identity};
use sea_orm::DatabaseConnection;
use serde::Serialize;

use crate::config::Settings;
use crate::templates::Templates;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Authentication and session store
    pub auth: Arc<dyn AuthBackend>,
    /// Compiled page templates
    pub templates: Templates,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// State backed by [`DatabaseBackend`] with the configured session lifetime.
    pub fn new(db: DatabaseConnection, templates: Templates, settings: Arc<Settings>) -> Self {
        let auth = Arc::new(DatabaseBackend::new(db.clone(), settings.session_ttl()));
        Self {
            db,
            auth,
            templates,
            settings,
        }
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("auth", &self.auth)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// What templates may show about the logged-in user. The password hash stays out.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub full_name: String,
    pub short_name: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl From<&Identity> for UserView {
    fn from(user: &Identity) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            full_name: match user.full_name() {
                name if name.is_empty() => user.username.clone(),
                name => name,
            },
            short_name: user.short_name().to_string(),
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
        }
    }
}
