use anyhow::Result;
use tracing::{info, trace};

use super::initdb::connect_and_migrate;
use super::serve::serve;

pub async fn migrate_and_serve(database_url: &str, bind_address: &str) -> Result<()> {
    trace!("Entering migrate_and_serve function");
    info!("Applying database migrations and starting server");

    // The migration connection is dropped; serving opens its own pool.
    drop(connect_and_migrate(database_url).await?);

    serve(database_url, bind_address).await
}
