use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

/// Why a probe reported its backend as down.
///
/// Each backend failure mode gets its own variant so the rendered message tells
/// configuration, connectivity, protocol, acquisition and liveness failures apart.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("no broker configured")]
    NoBrokerConfigured,
    #[error("{}", broker_message(.failed_connect, .failed_controller))]
    Broker {
        failed_connect: Vec<String>,
        failed_controller: Vec<String>,
    },
    #[error("failed to acquire relational store connection: {0:#}")]
    ConnectionAcquisition(anyhow::Error),
    #[error("failed to ping relational store: {0:#}")]
    RelationalPing(anyhow::Error),
    #[error("failed to ping cache: {0:#}")]
    CachePing(anyhow::Error),
    #[error("probe timed out after {}ms", .0.as_millis())]
    TimedOut(Duration),
    /// Failure reported by a probe outside the built-in backends.
    #[error("{0:#}")]
    Check(anyhow::Error),
}

fn broker_message(failed_connect: &[String], failed_controller: &[String]) -> String {
    let mut lines = Vec::with_capacity(2);
    if !failed_connect.is_empty() {
        lines.push(format!(
            "failed to connect to brokers: {}",
            failed_connect.join(", ")
        ));
    }
    if !failed_controller.is_empty() {
        lines.push(format!(
            "failed to resolve controller for brokers: {}",
            failed_controller.join(", ")
        ));
    }
    lines.join("\n")
}

/// A single backend check.
///
/// `details` must only use configuration, so the report can describe a backend
/// that never answered. `check` performs the live round trip.
#[async_trait]
pub trait Probe: Send + Sync {
    fn details(&self) -> Value;

    async fn check(&self) -> Result<(), ProbeError>;
}

/// Outcome of one probe run. `error == None` means the backend is up.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub name: String,
    pub details: Value,
    pub error: Option<String>,
}

impl ProbeResult {
    pub fn new(name: impl Into<String>, details: Value, outcome: Result<(), ProbeError>) -> Self {
        Self {
            name: name.into(),
            details,
            error: outcome.err().map(|e| e.to_string()),
        }
    }

    pub fn is_up(&self) -> bool {
        self.error.is_none()
    }
}
