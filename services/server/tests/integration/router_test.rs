use axum::http::StatusCode;

use beacon_testing::client::get_json;
use beacon_testing::fixture::Fixture;

use crate::helpers::{Backends, TEST_APP_NAME, app};

#[tokio::test]
async fn should_report_200_when_every_backend_is_up() {
    let backends = Backends::healthy();
    let router = app(TEST_APP_NAME, Some(backends.responder()));

    let resp = get_json(&router, "/orders/health").await;

    assert_eq!(resp.status, StatusCode::OK);
    for name in ["broker", "relational-store", "cache"] {
        assert_eq!(resp.body[name]["status"], "UP", "{name} should be UP");
        assert!(resp.body[name].get("error").is_none());
    }
    assert_eq!(resp.body["relational-store"]["details"]["db"], "orders");
}

#[tokio::test]
async fn should_report_500_without_truncating_the_report() {
    let backends = Backends::healthy();
    backends
        .broker
        .fail_with("failed to connect to brokers: kafka-2:9092");
    let router = app(TEST_APP_NAME, Some(backends.responder()));

    let resp = get_json(&router, "/orders/health").await;

    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.body.as_object().unwrap().len(), 3);
    assert_eq!(resp.body["broker"]["status"], "DOWN");
    assert_eq!(
        resp.body["broker"]["error"],
        "failed to connect to brokers: kafka-2:9092"
    );
    assert_eq!(resp.body["broker"]["details"]["brokers"][1], "kafka-2:9092");
    assert_eq!(resp.body["relational-store"]["status"], "UP");
    assert_eq!(resp.body["cache"]["status"], "UP");
}

#[tokio::test]
async fn should_serve_alive_without_probing() {
    let backends = Backends::healthy();
    backends.cache.fail_with("connection refused");
    let router = app(TEST_APP_NAME, Some(backends.responder()));

    let resp = get_json(&router, "/orders/alive").await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, Fixture::load("contracts/http/alive.json"));
    assert_eq!(backends.total_calls(), 0);
}

#[tokio::test]
async fn should_probe_on_every_health_call_with_stable_results() {
    let backends = Backends::healthy();
    backends.relational.fail_with("failed to ping relational store: timeout");
    let router = app(TEST_APP_NAME, Some(backends.responder()));

    let first = get_json(&router, "/orders/health").await;
    let second = get_json(&router, "/orders/health").await;

    assert_eq!(first.status, second.status);
    for name in ["broker", "relational-store", "cache"] {
        assert_eq!(first.body[name]["status"], second.body[name]["status"]);
    }
    assert_eq!(backends.relational.calls(), 2);
}

#[tokio::test]
async fn should_not_mount_health_without_a_registry() {
    let router = app(TEST_APP_NAME, None);

    let health = get_json(&router, "/orders/health").await;
    let alive = get_json(&router, "/orders/alive").await;

    assert_eq!(health.status, StatusCode::NOT_FOUND);
    assert_eq!(health.body["error"], "RepositoryNoDataFoundException");
    assert_eq!(alive.status, StatusCode::OK);
}

#[tokio::test]
async fn should_serve_from_root_without_app_name() {
    let backends = Backends::healthy();
    let router = app("", Some(backends.responder()));

    assert_eq!(get_json(&router, "/health").await.status, StatusCode::OK);
    assert_eq!(get_json(&router, "/alive").await.status, StatusCode::OK);
}

#[tokio::test]
async fn should_keep_routes_inside_the_app_group() {
    let router = app(TEST_APP_NAME, None);

    let resp = get_json(&router, "/alive").await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.body["message"], "no route for /alive");
    assert!(resp.headers.contains_key("x-request-id"));
}
