use std::time::Duration;

use axum::http::StatusCode;

use beacon_server::config::{
    CacheConfig, DatabaseConfig, HealthConfig, KafkaConfig, ServerConfig,
};
use beacon_server::infra::build_registry;
use beacon_testing::client::get_json;

use crate::helpers::{app, http_config};

/// A local port with nothing listening on it.
async fn closed_port() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

fn config(enabled: bool) -> ServerConfig {
    ServerConfig {
        http: http_config("orders"),
        health: HealthConfig {
            enabled,
            probe_timeout: Duration::from_secs(2),
        },
        kafka: None,
        database: None,
        cache: None,
    }
}

#[tokio::test]
async fn should_skip_registry_when_disabled() {
    let mut config = config(false);
    config.kafka = Some(KafkaConfig {
        brokers: vec!["127.0.0.1:9092".into()],
        client_id: "beacon".into(),
        dial_timeout: Duration::from_millis(200),
        controller_timeout: Duration::from_millis(500),
    });

    assert!(build_registry(&config).await.unwrap().is_none());
}

#[tokio::test]
async fn should_skip_registry_without_backends() {
    assert!(build_registry(&config(true)).await.unwrap().is_none());
}

#[tokio::test]
async fn should_register_only_configured_backends() {
    let mut config = config(true);
    config.kafka = Some(KafkaConfig {
        brokers: vec![],
        client_id: "beacon".into(),
        dial_timeout: Duration::from_millis(200),
        controller_timeout: Duration::from_millis(500),
    });

    let registry = build_registry(&config).await.unwrap().unwrap();

    assert_eq!(registry.names().collect::<Vec<_>>(), vec!["broker"]);
    let results = registry.check_all().await;
    assert_eq!(results[0].error.as_deref(), Some("no broker configured"));
}

#[tokio::test]
async fn should_report_unreachable_backends_as_down_with_details() {
    let port = closed_port().await;
    let mut config = config(true);
    config.kafka = Some(KafkaConfig {
        brokers: vec![format!("127.0.0.1:{port}")],
        client_id: "beacon".into(),
        dial_timeout: Duration::from_millis(500),
        controller_timeout: Duration::from_millis(500),
    });
    config.database = Some(DatabaseConfig {
        host: "127.0.0.1".into(),
        port,
        name: "orders".into(),
        user: "app".into(),
        password: "secret".into(),
    });
    config.cache = Some(CacheConfig {
        host: "127.0.0.1".into(),
        port,
        db: 1,
        password: None,
        ping_timeout: Duration::from_millis(1000),
    });

    let registry = build_registry(&config).await.unwrap().unwrap();
    let responder = beacon_health::HealthResponder::new(std::sync::Arc::new(registry));
    let router = app("orders", Some(responder));

    let resp = get_json(&router, "/orders/health").await;

    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    for name in ["broker", "relational-store", "cache"] {
        assert_eq!(resp.body[name]["status"], "DOWN", "{name} should be DOWN");
        assert!(resp.body[name]["error"].is_string());
    }
    assert_eq!(resp.body["relational-store"]["details"]["host"], "127.0.0.1");
    assert_eq!(resp.body["relational-store"]["details"]["db"], "orders");
    assert_eq!(resp.body["cache"]["details"]["db"], 1);
    assert_eq!(
        resp.body["broker"]["error"],
        format!("failed to connect to brokers: 127.0.0.1:{port}")
    );
}
