use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use sea_orm::Database;
use serde::Deserialize;
use tracing::{debug, info, trace};

use crate::schemas::AppState;
use crate::templates::Templates;

/// Prefix of the environment variables that override [`Settings`].
pub const ENV_PREFIX: &str = "ACCOUNTD";

/// Optional settings file looked up in the working directory.
pub const CONFIG_FILE: &str = "accountd";

/// Runtime settings of the web application.
///
/// Resolved from built-in defaults, then `accountd.toml` if present, then
/// `ACCOUNTD_*` environment variables.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    /// Name of the cookie carrying the session token.
    pub session_cookie_name: String,
    /// Lifetime of a session and max-age of its cookie.
    pub session_ttl_secs: i64,
    /// Mark the session cookie `Secure`. Turn on behind HTTPS.
    pub cookie_secure: bool,
    pub request_timeout_secs: u64,
    /// Directory of templates overriding the built-in ones.
    pub templates_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            session_cookie_name: "sessionid".to_string(),
            session_ttl_secs: auth::DEFAULT_SESSION_TTL_SECS,
            cookie_secure: false,
            request_timeout_secs: 30,
            templates_dir: None,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::from_config(
            Config::builder()
                .add_source(File::with_name(CONFIG_FILE).required(false))
                .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true)),
        )
    }

    fn from_config(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        let defaults = Settings::default();
        let settings = builder
            .set_default("session_cookie_name", defaults.session_cookie_name)?
            .set_default("session_ttl_secs", defaults.session_ttl_secs)?
            .set_default("cookie_secure", defaults.cookie_secure)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs)?
            .build()
            .context("Failed to read settings")?
            .try_deserialize::<Settings>()
            .context("Invalid settings")?;

        if settings.session_ttl_secs <= 0 {
            anyhow::bail!("session_ttl_secs must be positive");
        }
        Ok(settings)
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.session_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Connect to the database and assemble the shared application state.
pub async fn initialize_app_state_with_url(database_url: &str) -> Result<AppState> {
    trace!("Entering initialize_app_state_with_url function");
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    debug!("Settings: {:?}", settings);

    info!("Connecting to database");
    let db = Database::connect(database_url)
        .await
        .with_context(|| format!("Failed to connect to database '{}'", database_url))?;

    let templates = match &settings.templates_dir {
        Some(dir) => Templates::from_dir(dir)?,
        None => Templates::builtin()?,
    };

    Ok(AppState::new(db, templates, Arc::new(settings)))
}
