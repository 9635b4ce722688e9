use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DatabaseConnection, DatabaseTransaction, TransactionTrait};
use serde_json::{Value, json};

use crate::probe::{Probe, ProbeError};

/// A dedicated connection checked out of the relational client.
#[async_trait]
pub trait SqlHandle: Send {
    async fn ping(&mut self) -> anyhow::Result<()>;

    /// Give the connection back to the pool.
    async fn release(self) -> anyhow::Result<()>
    where
        Self: Sized;
}

#[async_trait]
pub trait SqlClient: Send + Sync {
    type Handle: SqlHandle;

    async fn acquire(&self) -> anyhow::Result<Self::Handle>;
}

/// Opening a transaction pins one pooled connection, so a failure here means the
/// pool could not hand out a live connection at all.
#[async_trait]
impl SqlClient for DatabaseConnection {
    type Handle = DatabaseTransaction;

    async fn acquire(&self) -> anyhow::Result<DatabaseTransaction> {
        Ok(self.begin().await?)
    }
}

#[async_trait]
impl SqlHandle for DatabaseTransaction {
    async fn ping(&mut self) -> anyhow::Result<()> {
        self.execute_unprepared("SELECT 1").await?;
        Ok(())
    }

    async fn release(self) -> anyhow::Result<()> {
        self.rollback().await?;
        Ok(())
    }
}

/// Connection facts reported with every relational-store result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationalSettings {
    pub host: String,
    pub port: u16,
    pub name: String,
}

pub struct RelationalProbe<C = DatabaseConnection> {
    client: C,
    settings: RelationalSettings,
}

impl<C: SqlClient> RelationalProbe<C> {
    pub fn new(client: C, settings: RelationalSettings) -> Self {
        Self { client, settings }
    }
}

#[async_trait]
impl<C: SqlClient> Probe for RelationalProbe<C> {
    fn details(&self) -> Value {
        json!({
            "db": self.settings.name,
            "host": self.settings.host,
            "port": self.settings.port,
        })
    }

    async fn check(&self) -> Result<(), ProbeError> {
        let mut handle = self
            .client
            .acquire()
            .await
            .map_err(ProbeError::ConnectionAcquisition)?;

        let pinged = handle.ping().await;
        if let Err(e) = handle.release().await {
            tracing::debug!(error = %e, "failed to release relational store connection");
        }
        pinged.map_err(ProbeError::RelationalPing)
    }
}
