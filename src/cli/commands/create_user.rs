use anyhow::{Context, Result};
use auth::accounts::{NewAccount, create_user as insert_user};
use sea_orm::Database;
use tracing::{info, trace, warn};

pub async fn create_user(
    database_url: &str,
    username: &str,
    email: &str,
    password: Option<String>,
    superuser: bool,
) -> Result<()> {
    trace!("Entering create_user function");
    let db = Database::connect(database_url)
        .await
        .with_context(|| format!("Failed to connect to database '{}'", database_url))?;

    if password.is_none() {
        warn!("No password given, '{}' will not be able to log in", username);
    }

    let user = insert_user(
        &db,
        NewAccount {
            username: username.to_string(),
            password,
            email: email.to_string(),
            is_staff: superuser,
            is_superuser: superuser,
            ..Default::default()
        },
    )
    .await?;

    info!("Created user '{}' with ID {}", user.username, user.id);
    println!("Created user '{}' (ID {})", user.username, user.id);
    Ok(())
}
