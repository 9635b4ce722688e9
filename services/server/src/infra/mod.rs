//! Backend clients and the probe set built from them.

pub mod cache;
pub mod db;

use anyhow::Context as _;

use beacon_health::broker::KafkaDialer;
use beacon_health::cache::CacheSettings;
use beacon_health::relational::RelationalSettings;
use beacon_health::{BrokerProbe, CacheProbe, HealthRegistry, RelationalProbe};

use crate::config::ServerConfig;

pub const BROKER_PROBE: &str = "broker";
pub const RELATIONAL_PROBE: &str = "relational-store";
pub const CACHE_PROBE: &str = "cache";

/// Assemble the health registry for every configured backend.
///
/// Returns `None` when health checks are disabled or no backend is configured,
/// in which case `/health` is not mounted. Client construction errors are
/// returned as startup failures.
pub async fn build_registry(config: &ServerConfig) -> anyhow::Result<Option<HealthRegistry>> {
    if !config.health.enabled {
        tracing::info!("health checks disabled");
        return Ok(None);
    }
    if config.kafka.is_none() && config.database.is_none() && config.cache.is_none() {
        tracing::info!("no backends configured, skipping health checks");
        return Ok(None);
    }

    let broker = config.kafka.as_ref().map(|kafka| {
        if kafka.dial_timeout + kafka.controller_timeout >= config.health.probe_timeout {
            tracing::warn!(
                "broker dial and controller timeouts reach the probe timeout; \
                 a silent broker will surface as a probe timeout"
            );
        }
        BrokerProbe::with_dialer(
            kafka.brokers.clone(),
            KafkaDialer::new(kafka.client_id.clone(), kafka.dial_timeout),
        )
        .with_controller_timeout(kafka.controller_timeout)
    });

    let relational = match &config.database {
        None => None,
        Some(database) => {
            let client = db::connect(database).await?;
            Some(RelationalProbe::new(
                client,
                RelationalSettings {
                    host: database.host.clone(),
                    port: database.port,
                    name: database.name.clone(),
                },
            ))
        }
    };

    let cache = match &config.cache {
        None => None,
        Some(settings) => {
            let pool = cache::pool(settings)?;
            Some(
                CacheProbe::new(
                    pool,
                    CacheSettings {
                        host: settings.host.clone(),
                        port: settings.port,
                        db: settings.db,
                    },
                )
                .with_timeout(settings.ping_timeout),
            )
        }
    };

    let registry = HealthRegistry::builder()
        .optional_probe(BROKER_PROBE, broker)
        .optional_probe(RELATIONAL_PROBE, relational)
        .optional_probe(CACHE_PROBE, cache)
        .probe_timeout(config.health.probe_timeout)
        .build()
        .context("register health checks")?;

    tracing::info!(
        probes = ?registry.names().collect::<Vec<_>>(),
        timeout_ms = registry.probe_timeout().as_millis() as u64,
        "health checks registered"
    );
    Ok(Some(registry))
}
