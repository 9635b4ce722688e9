//! Dependency health aggregation.
//!
//! A [`Probe`] checks one backend. The [`HealthRegistry`] owns the named set of
//! probes and runs them all on every call; the [`HealthResponder`] turns the
//! collected results into the `/health` report.

pub mod broker;
pub mod cache;
pub mod kafka;
pub mod probe;
pub mod registry;
pub mod relational;
pub mod responder;

pub use broker::{BrokerConn, BrokerDialer, BrokerProbe};
pub use cache::{CacheClient, CacheProbe};
pub use probe::{Probe, ProbeError, ProbeResult};
pub use registry::{HealthRegistry, HealthRegistryBuilder, RegistryError};
pub use relational::{RelationalProbe, SqlClient, SqlHandle};
pub use responder::{HealthReport, HealthResponder, ServiceStatus, ServiceStatusResponse, alive, health};
