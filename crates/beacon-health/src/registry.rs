use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;

use crate::probe::{Probe, ProbeError, ProbeResult};

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Wiring mistakes detected while assembling the registry. Fatal at startup.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("probe name must not be empty")]
    EmptyName,
    #[error("probe {0:?} registered twice")]
    DuplicateName(String),
    #[error("probe timeout must be greater than zero")]
    ZeroTimeout,
    #[error("no probes registered")]
    NoProbes,
}

#[async_trait]
impl<P: Probe + ?Sized> Probe for Arc<P> {
    fn details(&self) -> Value {
        (**self).details()
    }

    async fn check(&self) -> Result<(), ProbeError> {
        (**self).check().await
    }
}

struct NamedProbe {
    name: String,
    probe: Arc<dyn Probe>,
}

/// The fixed set of named probes, run together on every call.
///
/// Nothing is cached: each [`HealthRegistry::check_all`] performs live checks.
pub struct HealthRegistry {
    probes: Vec<NamedProbe>,
    timeout: Duration,
}

impl HealthRegistry {
    pub fn builder() -> HealthRegistryBuilder {
        HealthRegistryBuilder::default()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.probes.iter().map(|p| p.name.as_str())
    }

    pub fn probe_timeout(&self) -> Duration {
        self.timeout
    }

    /// Run every probe concurrently, each under the probe timeout, and return
    /// one result per probe in registration order.
    pub async fn check_all(&self) -> Vec<ProbeResult> {
        join_all(self.probes.iter().map(|p| self.run(p))).await
    }

    async fn run(&self, named: &NamedProbe) -> ProbeResult {
        let started = Instant::now();
        let outcome = match tokio::time::timeout(self.timeout, named.probe.check()).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ProbeError::TimedOut(self.timeout)),
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let result = ProbeResult::new(&named.name, named.probe.details(), outcome);
        match &result.error {
            None => tracing::debug!(probe = %result.name, elapsed_ms, "probe up"),
            Some(error) => {
                tracing::warn!(probe = %result.name, elapsed_ms, error = %error, "probe down")
            }
        }
        result
    }
}

#[derive(Default)]
pub struct HealthRegistryBuilder {
    probes: Vec<NamedProbe>,
    timeout: Option<Duration>,
}

impl HealthRegistryBuilder {
    pub fn probe(mut self, name: impl Into<String>, probe: impl Probe + 'static) -> Self {
        self.probes.push(NamedProbe {
            name: name.into(),
            probe: Arc::new(probe),
        });
        self
    }

    /// Register `probe` only when its backend is configured. An omitted probe
    /// does not appear in reports at all.
    pub fn optional_probe<P>(self, name: impl Into<String>, probe: Option<P>) -> Self
    where
        P: Probe + 'static,
    {
        match probe {
            Some(probe) => self.probe(name, probe),
            None => self,
        }
    }

    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<HealthRegistry, RegistryError> {
        let timeout = self.timeout.unwrap_or(DEFAULT_PROBE_TIMEOUT);
        if timeout.is_zero() {
            return Err(RegistryError::ZeroTimeout);
        }
        if self.probes.is_empty() {
            return Err(RegistryError::NoProbes);
        }

        let mut seen = HashSet::new();
        for named in &self.probes {
            if named.name.trim().is_empty() {
                return Err(RegistryError::EmptyName);
            }
            if !seen.insert(named.name.as_str()) {
                return Err(RegistryError::DuplicateName(named.name.clone()));
            }
        }

        Ok(HealthRegistry {
            probes: self.probes,
            timeout,
        })
    }
}
