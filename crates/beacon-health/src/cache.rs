use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use deadpool_redis::Pool;
use serde_json::{Value, json};

use crate::probe::{Probe, ProbeError};

pub const DEFAULT_PING_TIMEOUT: Duration = Duration::from_secs(2);

#[async_trait]
pub trait CacheClient: Send + Sync {
    async fn ping(&self) -> anyhow::Result<()>;
}

#[async_trait]
impl CacheClient for Pool {
    async fn ping(&self) -> anyhow::Result<()> {
        let mut conn = self.get().await.context("check out cache connection")?;
        let reply: String = deadpool_redis::redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .context("PING")?;
        anyhow::ensure!(reply == "PONG", "unexpected PING reply {reply:?}");
        Ok(())
    }
}

/// Connection facts reported with every cache result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    pub host: String,
    pub port: u16,
    pub db: i64,
}

pub struct CacheProbe<C = Pool> {
    client: C,
    settings: CacheSettings,
    timeout: Duration,
}

impl<C: CacheClient> CacheProbe<C> {
    pub fn new(client: C, settings: CacheSettings) -> Self {
        Self {
            client,
            settings,
            timeout: DEFAULT_PING_TIMEOUT,
        }
    }

    /// Bound for a single ping; the call is abandoned when it expires and
    /// reported like a registry deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl<C: CacheClient> Probe for CacheProbe<C> {
    fn details(&self) -> Value {
        json!({
            "host": self.settings.host,
            "port": self.settings.port,
            "db": self.settings.db,
        })
    }

    async fn check(&self) -> Result<(), ProbeError> {
        match tokio::time::timeout(self.timeout, self.client.ping()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ProbeError::CachePing(e)),
            Err(_) => Err(ProbeError::TimedOut(self.timeout)),
        }
    }
}
