use anyhow::{Context, Result};
use auth::sessions::clear_expired_sessions;
use sea_orm::Database;
use tracing::{info, trace};

pub async fn clear_sessions(database_url: &str) -> Result<()> {
    trace!("Entering clear_sessions function");
    let db = Database::connect(database_url)
        .await
        .with_context(|| format!("Failed to connect to database '{}'", database_url))?;

    let removed = clear_expired_sessions(&db).await?;
    info!("Removed {} expired session(s)", removed);
    Ok(())
}
