use anyhow::Context as _;
use deadpool_redis::{Config, Pool, Runtime};

use crate::config::CacheConfig;

/// Build the Redis pool. Connections are opened on first checkout.
pub fn pool(config: &CacheConfig) -> anyhow::Result<Pool> {
    Config::from_url(config.url())
        .create_pool(Some(Runtime::Tokio1))
        .with_context(|| format!("create Redis pool for {}:{}", config.host, config.port))
}
