use std::time::Duration;

use anyhow::Context as _;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use crate::config::DatabaseConfig;

/// Build a lazily connecting pool: an unreachable database at boot shows up as
/// a down backend instead of aborting startup.
pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(config.url());
    options
        .connect_lazy(true)
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(2))
        .sqlx_logging(false);

    Database::connect(options)
        .await
        .with_context(|| format!("configure database pool for {}:{}", config.host, config.port))
}
