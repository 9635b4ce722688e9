use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use futures::future::join_all;
use serde_json::{Value, json};
use tokio::net::TcpStream;

use crate::kafka;
use crate::probe::{Probe, ProbeError};

pub const DEFAULT_CLIENT_ID: &str = "beacon";
/// Dial plus controller lookup stay under the registry's default 3 s deadline.
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(1);
pub const DEFAULT_CONTROLLER_TIMEOUT: Duration = Duration::from_secs(1);

/// An open connection to one broker. Dropping it closes the socket.
#[async_trait]
pub trait BrokerConn: Send {
    /// Address of the controller this broker currently reports.
    async fn controller(&mut self) -> anyhow::Result<String>;
}

#[async_trait]
pub trait BrokerDialer: Send + Sync {
    type Conn: BrokerConn;

    async fn dial(&self, addr: &str) -> anyhow::Result<Self::Conn>;
}

/// Plain TCP dialer speaking the Kafka metadata API.
#[derive(Debug, Clone)]
pub struct KafkaDialer {
    client_id: String,
    dial_timeout: Duration,
}

impl KafkaDialer {
    pub fn new(client_id: impl Into<String>, dial_timeout: Duration) -> Self {
        Self {
            client_id: client_id.into(),
            dial_timeout,
        }
    }
}

impl Default for KafkaDialer {
    fn default() -> Self {
        Self::new(DEFAULT_CLIENT_ID, DEFAULT_DIAL_TIMEOUT)
    }
}

pub struct KafkaConn {
    stream: TcpStream,
    client_id: String,
    next_correlation_id: i32,
}

#[async_trait]
impl BrokerDialer for KafkaDialer {
    type Conn = KafkaConn;

    async fn dial(&self, addr: &str) -> anyhow::Result<KafkaConn> {
        let stream = tokio::time::timeout(self.dial_timeout, TcpStream::connect(addr))
            .await
            .with_context(|| format!("dial {addr}: timed out after {:?}", self.dial_timeout))?
            .with_context(|| format!("dial {addr}"))?;
        Ok(KafkaConn {
            stream,
            client_id: self.client_id.clone(),
            next_correlation_id: 1,
        })
    }
}

#[async_trait]
impl BrokerConn for KafkaConn {
    async fn controller(&mut self) -> anyhow::Result<String> {
        let correlation_id = self.next_correlation_id;
        self.next_correlation_id = self.next_correlation_id.wrapping_add(1);
        let metadata =
            kafka::fetch_metadata(&mut self.stream, correlation_id, &self.client_id).await?;
        Ok(metadata.controller()?.address())
    }
}

/// How a single broker answered.
enum BrokerOutcome {
    Reachable,
    ConnectFailed,
    ControllerFailed,
}

/// Checks that every configured broker accepts a connection and can name its
/// cluster controller.
///
/// Brokers are checked concurrently, each bounded by the dial timeout plus the
/// controller timeout, so one silent broker cannot hold up the others.
pub struct BrokerProbe<D = KafkaDialer> {
    brokers: Vec<String>,
    dialer: D,
    controller_timeout: Duration,
}

impl BrokerProbe<KafkaDialer> {
    pub fn new(brokers: Vec<String>) -> Self {
        Self::with_dialer(brokers, KafkaDialer::default())
    }
}

impl<D: BrokerDialer> BrokerProbe<D> {
    pub fn with_dialer(brokers: Vec<String>, dialer: D) -> Self {
        Self {
            brokers,
            dialer,
            controller_timeout: DEFAULT_CONTROLLER_TIMEOUT,
        }
    }

    /// Bound for the metadata round trip on an already open connection.
    pub fn with_controller_timeout(mut self, timeout: Duration) -> Self {
        self.controller_timeout = timeout;
        self
    }

    async fn check_one(&self, broker: &str) -> BrokerOutcome {
        let mut conn = match self.dialer.dial(broker).await {
            Ok(conn) => conn,
            Err(e) => {
                let reason = format!("{e:#}");
                tracing::warn!(broker = %broker, error = %reason, "broker connect failed");
                return BrokerOutcome::ConnectFailed;
            }
        };

        let lookup = tokio::time::timeout(self.controller_timeout, conn.controller()).await;
        // The socket is closed here on every path.
        drop(conn);

        match lookup {
            Ok(Ok(controller)) => {
                tracing::debug!(broker = %broker, controller = %controller, "broker reachable");
                BrokerOutcome::Reachable
            }
            Ok(Err(e)) => {
                let reason = format!("{e:#}");
                tracing::warn!(broker = %broker, error = %reason, "controller lookup failed");
                BrokerOutcome::ControllerFailed
            }
            Err(_) => {
                tracing::warn!(
                    broker = %broker,
                    timeout_ms = self.controller_timeout.as_millis() as u64,
                    "controller lookup timed out"
                );
                BrokerOutcome::ControllerFailed
            }
        }
    }
}

#[async_trait]
impl<D: BrokerDialer> Probe for BrokerProbe<D> {
    fn details(&self) -> Value {
        json!({ "brokers": self.brokers })
    }

    async fn check(&self) -> Result<(), ProbeError> {
        if self.brokers.is_empty() {
            return Err(ProbeError::NoBrokerConfigured);
        }

        let outcomes = join_all(self.brokers.iter().map(|b| self.check_one(b))).await;

        let mut failed_connect = Vec::new();
        let mut failed_controller = Vec::new();
        for (broker, outcome) in self.brokers.iter().zip(outcomes) {
            match outcome {
                BrokerOutcome::Reachable => {}
                BrokerOutcome::ConnectFailed => failed_connect.push(broker.clone()),
                BrokerOutcome::ControllerFailed => failed_controller.push(broker.clone()),
            }
        }

        if failed_connect.is_empty() && failed_controller.is_empty() {
            Ok(())
        } else {
            Err(ProbeError::Broker {
                failed_connect,
                failed_controller,
            })
        }
    }
}
