use std::time::Duration;

use beacon_core::config::{ConfigError, Env, ProcessEnv};

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// Route group prefix; every route lives under `/{app_name}`. Env var: `APP_NAME`.
    pub app_name: String,
    /// TCP port to listen on (default 8080). Env var: `HTTP_PORT`.
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthConfig {
    /// Mount `/health` at all. Env var: `HEALTH_CHECKS_ENABLED`.
    pub enabled: bool,
    /// Deadline for each probe. Env var: `HEALTH_PROBE_TIMEOUT_MS`.
    pub probe_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KafkaConfig {
    /// Ordered broker addresses. May be empty, which reports the broker as down.
    pub brokers: Vec<String>,
    pub client_id: String,
    pub dial_timeout: Duration,
    /// Bound for the metadata round trip after a broker accepted the connection.
    pub controller_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
}

impl DatabaseConfig {
    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.name
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub host: String,
    pub port: u16,
    /// Logical database index.
    pub db: i64,
    pub password: Option<String>,
    /// Bound for one `PING`, kept below the probe timeout.
    pub ping_timeout: Duration,
}

impl CacheConfig {
    pub fn url(&self) -> String {
        match &self.password {
            Some(password) => format!(
                "redis://:{}@{}:{}/{}",
                password, self.host, self.port, self.db
            ),
            None => format!("redis://{}:{}/{}", self.host, self.port, self.db),
        }
    }
}

/// `APP_NAME` becomes a literal route prefix, so it may only hold plain path
/// segments: no route parameters, wildcards or empty segments.
fn app_name<E: Env>(env: &E) -> Result<String, ConfigError> {
    let Some(raw) = env.non_blank("APP_NAME") else {
        return Ok(String::new());
    };
    let name = raw.trim_matches('/');
    let valid_char = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~');
    let valid = name.is_empty()
        || name
            .split('/')
            .all(|segment| !segment.is_empty() && segment.chars().all(valid_char));
    if !valid {
        return Err(ConfigError::Invalid {
            key: "APP_NAME",
            value: raw,
            reason: "expected path segments of letters, digits, '-', '_', '.' or '~'".to_owned(),
        });
    }
    Ok(name.to_owned())
}

/// Service configuration loaded from environment variables.
///
/// A backend section is `None` when its anchor variable (`KAFKA_BROKERS`,
/// `DB_HOST`, `REDIS_HOST`) is unset; that backend is then not probed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub http: HttpConfig,
    pub health: HealthConfig,
    pub kafka: Option<KafkaConfig>,
    pub database: Option<DatabaseConfig>,
    pub cache: Option<CacheConfig>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(&ProcessEnv)
    }

    pub fn load<E: Env>(env: &E) -> Result<Self, ConfigError> {
        let http = HttpConfig {
            app_name: app_name(env)?,
            port: env.parse_or("HTTP_PORT", 8080)?,
        };

        let health = HealthConfig {
            enabled: env.flag_or("HEALTH_CHECKS_ENABLED", true)?,
            probe_timeout: Duration::from_millis(env.parse_or("HEALTH_PROBE_TIMEOUT_MS", 3000)?),
        };

        let kafka = match env.list("KAFKA_BROKERS") {
            None => None,
            Some(brokers) => Some(KafkaConfig {
                brokers,
                client_id: env
                    .non_blank("KAFKA_CLIENT_ID")
                    .unwrap_or_else(|| "beacon".to_owned()),
                dial_timeout: Duration::from_millis(env.parse_or("KAFKA_DIAL_TIMEOUT_MS", 1000)?),
                controller_timeout: Duration::from_millis(
                    env.parse_or("KAFKA_CONTROLLER_TIMEOUT_MS", 1000)?,
                ),
            }),
        };

        let database = match env.non_blank("DB_HOST") {
            None => None,
            Some(host) => Some(DatabaseConfig {
                host,
                port: env.parse_or("DB_PORT", 5432)?,
                name: env.required("DB_NAME")?,
                user: env.required("DB_USER")?,
                password: env.var("DB_PASSWORD").unwrap_or_default(),
            }),
        };

        let cache = match env.non_blank("REDIS_HOST") {
            None => None,
            Some(host) => Some(CacheConfig {
                host,
                port: env.parse_or("REDIS_PORT", 6379)?,
                db: env.parse_or("REDIS_DB", 0)?,
                password: env.non_blank("REDIS_PASSWORD"),
                ping_timeout: Duration::from_millis(env.parse_or("REDIS_PING_TIMEOUT_MS", 2000)?),
            }),
        };

        Ok(Self {
            http,
            health,
            kafka,
            database,
            cache,
        })
    }
}
