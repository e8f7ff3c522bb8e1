//! Integration tests for the inspection tracker API.
//!
//! Most tests drive the full router over the in-memory store. Tests marked
//! `#[ignore]` need a PostgreSQL instance in DATABASE_URL.
//! Run with: cargo test --test integration -- --ignored

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Utc};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

use inspection_tracker::api::{create_router, AppState};
use inspection_tracker::config::Config;
use inspection_tracker::inspection::{InspectionService, InspectionStatus};
use inspection_tracker::metrics::MetricsHandle;
use inspection_tracker::startup::{prepare_store, ConnectRetry};
use inspection_tracker::store::{
    InspectionStore, MemoryConfig, MemoryStore, PgInspectionStore,
};

fn app_with(store: MemoryStore) -> Router {
    let service = InspectionService::new(Arc::new(store));
    create_router(AppState::new(service, MetricsHandle::detached()))
}

fn app() -> Router {
    app_with(MemoryStore::new())
}

/// Send a request and decode the JSON body (Null when empty).
async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

fn alpha() -> Value {
    json!({
        "site": "Site Alpha",
        "inspection_date": "2025-08-01",
        "findings": "Fire extinguisher expired"
    })
}

fn timestamp(value: &Value) -> DateTime<Utc> {
    value.as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn create_then_approve() {
    let app = app();

    let (status, created) = send(&app, Method::POST, "/api/inspections", Some(alpha())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "Draft");
    assert_eq!(created["site"], "Site Alpha");
    assert_eq!(created["inspection_date"], "2025-08-01");
    assert_eq!(created["findings"], "Fire extinguisher expired");
    assert_eq!(created["created_at"], created["updated_at"]);

    let id = created["id"].as_i64().unwrap();
    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/api/inspections/{id}/status"),
        Some(json!({ "status": "Approved" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "Approved");
    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["created_at"], created["created_at"]);
    assert!(timestamp(&updated["updated_at"]) > timestamp(&updated["created_at"]));
}

#[tokio::test]
async fn create_ignores_caller_status() {
    let app = app();
    let mut body = alpha();
    body["status"] = json!("Approved");

    let (status, created) = send(&app, Method::POST, "/api/inspections", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "Draft");
}

#[tokio::test]
async fn empty_body_is_missing_fields() {
    let app = app();

    let (status, body) = send(&app, Method::POST, "/api/inspections", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Missing fields" }));
}

#[tokio::test]
async fn incomplete_creates_persist_nothing() {
    let app = app();
    send(&app, Method::POST, "/api/inspections", Some(alpha())).await;

    for field in ["site", "inspection_date", "findings"] {
        let mut absent = alpha();
        absent.as_object_mut().unwrap().remove(field);
        let (status, body) = send(&app, Method::POST, "/api/inspections", Some(absent)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "absent {field}");
        assert_eq!(body["error"], "Missing fields");

        let mut empty = alpha();
        empty[field] = json!("");
        let (status, _) = send(&app, Method::POST, "/api/inspections", Some(empty)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "empty {field}");
    }

    let (_, listed) = send(&app, Method::GET, "/api/inspections", None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn missing_body_is_missing_fields() {
    let app = app();
    let (status, body) = send(&app, Method::POST, "/api/inspections", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing fields");
}

#[tokio::test]
async fn malformed_date_and_long_site_are_rejected() {
    let app = app();

    let mut bad_date = alpha();
    bad_date["inspection_date"] = json!("August 1st");
    let (status, body) = send(&app, Method::POST, "/api/inspections", Some(bad_date)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid inspection_date");

    let mut long_site = alpha();
    long_site["site"] = json!("x".repeat(121));
    let (status, body) = send(&app, Method::POST, "/api/inspections", Some(long_site)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Site too long");
}

#[tokio::test]
async fn nul_in_text_is_rejected_before_store() {
    let app = app_with(MemoryStore::with_config(MemoryConfig {
        fail_queries: true,
        ..Default::default()
    }));

    let mut body = alpha();
    body["findings"] = json!("exit\u{0}blocked");
    let (status, body) = send(&app, Method::POST, "/api/inspections", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Invalid characters" }));
}

#[tokio::test]
async fn list_is_newest_first() {
    let app = app();
    let mut ids = Vec::new();
    for site in ["Site Alpha", "Site Beta", "Warehouse 3"] {
        let mut body = alpha();
        body["site"] = json!(site);
        let (_, created) = send(&app, Method::POST, "/api/inspections", Some(body)).await;
        ids.push(created["id"].as_i64().unwrap());
    }

    let (status, listed) = send(&app, Method::GET, "/api/inspections", None).await;
    assert_eq!(status, StatusCode::OK);

    let listed_ids: Vec<i64> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_i64().unwrap())
        .collect();
    ids.reverse();
    assert_eq!(listed_ids, ids);
    assert_eq!(listed[0]["site"], "Warehouse 3");
}

#[tokio::test]
async fn invalid_status_leaves_record_unchanged() {
    let app = app();
    let (_, created) = send(&app, Method::POST, "/api/inspections", Some(alpha())).await;
    let uri = format!("/api/inspections/{}/status", created["id"]);

    for body in [json!({ "status": "Rejected" }), json!({ "status": "approved" }), json!({})] {
        let (status, error) = send(&app, Method::PUT, &uri, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error, json!({ "error": "Invalid status" }));
    }

    let (_, listed) = send(&app, Method::GET, "/api/inspections", None).await;
    assert_eq!(listed[0], created);
}

#[tokio::test]
async fn transition_on_missing_id_is_not_found() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/inspections/4242/status",
        Some(json!({ "status": "Approved" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Not found" }));

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/inspections/not-a-number/status",
        Some(json!({ "status": "Approved" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bad_status_wins_over_bad_id() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/inspections/not-a-number/status",
        Some(json!({ "status": "Closed" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid status");
}

#[tokio::test]
async fn every_status_reachable_and_updated_at_increases() {
    let app = app();
    let (_, created) = send(&app, Method::POST, "/api/inspections", Some(alpha())).await;
    let uri = format!("/api/inspections/{}/status", created["id"]);

    let mut last = timestamp(&created["updated_at"]);
    let sequence = [
        InspectionStatus::Approved,
        InspectionStatus::Draft,
        InspectionStatus::Approved,
        InspectionStatus::UnderReview,
        InspectionStatus::UnderReview,
        InspectionStatus::Draft,
    ];

    for next in sequence {
        let (status, updated) =
            send(&app, Method::PUT, &uri, Some(json!({ "status": next.as_str() }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["status"], next.as_str());

        let updated_at = timestamp(&updated["updated_at"]);
        assert!(updated_at > last);
        last = updated_at;
    }
}

#[tokio::test]
async fn store_failure_is_generic_500() {
    let app = app_with(MemoryStore::with_config(MemoryConfig {
        fail_queries: true,
        ..Default::default()
    }));

    let (status, body) = send(&app, Method::GET, "/api/inspections", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Internal server error" }));

    let (status, body) = send(&app, Method::POST, "/api/inspections", Some(alpha())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Internal server error" }));
}

#[tokio::test]
async fn validation_never_reaches_a_failing_store() {
    let app = app_with(MemoryStore::with_config(MemoryConfig {
        fail_queries: true,
        ..Default::default()
    }));

    let (status, _) = send(&app, Method::POST, "/api/inspections", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_ignores_store_state() {
    let app = app_with(MemoryStore::with_config(MemoryConfig {
        unreachable_pings: u32::MAX,
        fail_queries: true,
    }));

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));
}

/// Build a Postgres store from DATABASE_URL, if set.
fn pg_store() -> Option<PgInspectionStore> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").ok()?;

    let config = Config {
        database_url,
        db_max_connections: 5,
        db_connect_attempts: 5,
        db_connect_interval_ms: 500,
        port: 0,
        cors_permissive: false,
        rust_log: "info".to_string(),
        log_json: false,
    };

    PgInspectionStore::connect_lazy(&config).ok()
}

/// Test the startup sequence and CRUD contract against a real database.
#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_postgres_round_trip() {
    let store = match pg_store() {
        Some(s) => s,
        None => {
            println!("Skipping: DATABASE_URL not set or invalid");
            return;
        }
    };

    let retry = ConnectRetry {
        max_attempts: 5,
        interval_ms: 500,
    };
    prepare_store(&store, &retry).await.unwrap();
    // Schema creation is idempotent.
    store.ensure_schema().await.unwrap();

    let store = Arc::new(store);
    let app = create_router(AppState::new(
        InspectionService::new(store.clone()),
        MetricsHandle::detached(),
    ));

    let (status, created) = send(&app, Method::POST, "/api/inspections", Some(alpha())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "Draft");
    assert_eq!(created["created_at"], created["updated_at"]);

    let uri = format!("/api/inspections/{}/status", created["id"]);
    let (status, updated) =
        send(&app, Method::PUT, &uri, Some(json!({ "status": "Approved" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(timestamp(&updated["updated_at"]) > timestamp(&updated["created_at"]));

    let (_, listed) = send(&app, Method::GET, "/api/inspections", None).await;
    assert_eq!(listed[0]["id"], created["id"]);

    store.close().await;
}

/// Test that the guard gives up on an unreachable server.
#[tokio::test]
#[ignore = "requires network access"]
async fn test_postgres_unreachable() {
    let config = Config {
        database_url: "postgres://nobody@127.0.0.1:1/none".to_string(),
        db_max_connections: 1,
        db_connect_attempts: 3,
        db_connect_interval_ms: 10,
        port: 0,
        cors_permissive: false,
        rust_log: "info".to_string(),
        log_json: false,
    };

    let store = PgInspectionStore::connect_lazy(&config).unwrap();
    let err = prepare_store(&store, &ConnectRetry::from_config(&config))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not reachable after 3 attempts"));
}
