//! API integration tests.
//!
//! These drive the full router in-process against a mock database.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::redundant_clone)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use mozsolidaria_api::{AppState, EXPORT_FALLBACK_HEADER, app};
use mozsolidaria_common::config::{Config, DatabaseConfig, ExportConfig, ServerConfig};
use mozsolidaria_db::{
    entities::{donation::DonationStatus, project, user, user_group},
    test_utils,
};
use sea_orm::{DatabaseBackend, DbErr, MockDatabase};
use serde_json::Value;
use tower::ServiceExt;

const TOKEN: &str = "0123456789abcdef0123456789abcdef";

/// Create a test configuration.
fn create_test_config(pdf_enabled: bool) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8000,
            url: "https://api.mozsolidaria.org".to_string(),
            cors_origins: Vec::new(),
        },
        database: DatabaseConfig {
            url: "postgres://localhost/test".to_string(),
            max_connections: 10,
            min_connections: 1,
        },
        exports: ExportConfig {
            pdf_enabled,
            ..ExportConfig::default()
        },
    }
}

fn create_test_app_with(db: MockDatabase, pdf_enabled: bool) -> Router {
    let state = AppState::new(Arc::new(db.into_connection()), &create_test_config(pdf_enabled));
    app(state)
}

/// Create the test app over a prepared mock database.
fn create_test_app(db: MockDatabase) -> Router {
    create_test_app_with(db, true)
}

fn mock_db() -> MockDatabase {
    MockDatabase::new(DatabaseBackend::Postgres)
}

fn with_token(mut user: user::Model) -> user::Model {
    user.token = Some(TOKEN.to_string());
    user
}

fn superuser() -> user::Model {
    user::Model {
        is_superuser: true,
        ..with_token(test_utils::staff("u-admin", "admin"))
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("GET")
        .body(Body::empty())
        .unwrap()
}

fn authed(method: &str, uri: &str, body: Option<&str>) -> Request<Body> {
    let builder = Request::builder()
        .uri(uri)
        .method(method)
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"));
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app(mock_db());

    let response = app.oneshot(get("/api/v1/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let app = create_test_app(mock_db());

    let response = app.oneshot(get("/api/v1/nonexistent")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_prometheus_metrics_are_text() {
    let app = create_test_app(mock_db());

    let response = app
        .oneshot(get("/api/v1/metrics/prometheus"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn test_stats_require_authentication() {
    let app = create_test_app(mock_db());

    let response = app.oneshot(get("/api/v1/reports/stats")).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_stats_without_permission_forbidden() {
    let db = mock_db()
        .append_query_results([[with_token(test_utils::user("u1", "maria"))]])
        .append_query_results([Vec::<user_group::Model>::new()]);
    let app = create_test_app(db);

    let response = app
        .oneshot(authed("GET", "/api/v1/reports/stats", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_stats_invalid_period_rejected() {
    let db = mock_db().append_query_results([[superuser()]]);
    let app = create_test_app(db);

    let response = app
        .oneshot(authed("GET", "/api/v1/reports/stats?period=2weeks", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_stats_degrade_instead_of_failing() {
    // Only the token lookup has a result; every aggregate query fails.
    let db = mock_db().append_query_results([[superuser()]]);
    let app = create_test_app(db);

    let response = app
        .oneshot(authed("GET", "/api/v1/reports/stats?period=1month", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["period"], "1month");
    assert_eq!(
        body["data"]["degradedGroups"],
        serde_json::json!(["community", "projects", "financial", "performance"])
    );
    assert_eq!(body["data"]["financial"]["donationCount"], 0);
}

#[tokio::test]
async fn test_export_unknown_area_rejected() {
    let db = mock_db().append_query_results([[superuser()]]);
    let app = create_test_app(db);

    let response = app
        .oneshot(authed(
            "POST",
            "/api/v1/reports/exports/generate",
            Some(r#"{"type":"invoices","format":"csv"}"#),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_pdf_export_falls_back_to_json() {
    let db = mock_db()
        .append_query_results([[superuser()]])
        .append_query_results([Vec::<mozsolidaria_db::entities::volunteer_profile::Model>::new()]);
    let app = create_test_app_with(db, false);

    let response = app
        .oneshot(authed(
            "POST",
            "/api/v1/reports/exports/volunteers",
            Some(r#"{"format":"pdf","filename":"Voluntarios 2025","options":{"includeSummary":false}}"#),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(EXPORT_FALLBACK_HEADER).unwrap(),
        "true"
    );
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(disposition.contains("Voluntarios_2025.json"));

    let body = json_body(response).await;
    assert_eq!(body["fallback"], true);
    assert_eq!(body["type"], "volunteers");
    assert!(body["rows"].as_array().unwrap().is_empty());
    assert!(body.get("summary").is_none());
}

#[tokio::test]
async fn test_unknown_project_returns_404() {
    let db = mock_db().append_query_results([Vec::<project::Model>::new()]);
    let app = create_test_app(db);

    let response = app
        .oneshot(get("/api/v1/projects/nao-existe"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_private_project_hidden_from_anonymous() {
    let mut hidden = test_utils::project("p1", "interno");
    hidden.is_public = false;
    let db = mock_db().append_query_results([[hidden]]);
    let app = create_test_app(db);

    let response = app.oneshot(get("/api/v1/projects/interno")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_donation_methods_are_public() {
    let db = mock_db().append_query_results([[
        test_utils::donation_method("m1", "M-Pesa"),
        test_utils::donation_method("m2", "Transferência bancária"),
    ]]);
    let app = create_test_app(db);

    let response = app
        .oneshot(get("/api/v1/donations/methods"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_create_notification_requires_staff() {
    let db = mock_db().append_query_results([[with_token(test_utils::user("u1", "maria"))]]);
    let app = create_test_app(db);

    let response = app
        .oneshot(authed(
            "POST",
            "/api/v1/notifications",
            Some(r#"{"recipientId":"u2","title":"Olá","message":"Teste","notificationType":"system"}"#),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unread_count() {
    let db = mock_db()
        .append_query_results([[with_token(test_utils::user("u1", "maria"))]])
        .append_query_results([[maplit::btreemap! {
            "num_items" => sea_orm::Value::BigInt(Some(4)),
        }]]);
    let app = create_test_app(db);

    let response = app
        .oneshot(authed("GET", "/api/v1/notifications/unread-count", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["count"], 4);
}

#[tokio::test]
async fn test_token_with_invalid_json_returns_error() {
    let app = create_test_app(mock_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/auth/token")
                .method("POST")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("invalid json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(
        response.status() == StatusCode::BAD_REQUEST
            || response.status() == StatusCode::UNPROCESSABLE_ENTITY
    );
}

#[tokio::test]
async fn test_token_with_unknown_user_unauthorized() {
    let db = mock_db().append_query_results([Vec::<user::Model>::new()]);
    let app = create_test_app(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/auth/token")
                .method("POST")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"username":"ninguem","password":"segredo"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_lookup_failure_is_server_error() {
    let db = mock_db().append_query_errors([DbErr::Custom("connection refused".into())]);
    let app = create_test_app(db);

    let response = app
        .oneshot(authed("GET", "/api/v1/notifications/unread-count", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "DATABASE_ERROR");
}

#[tokio::test]
async fn test_public_comments_hide_author_email() {
    let db = mock_db()
        .append_query_results([[test_utils::blog_post("b1", "ola-mundo")]])
        .append_query_results([[test_utils::comment("c1", "b1", true)]]);
    let app = create_test_app(db);

    let response = app
        .oneshot(get("/api/v1/blog/posts/ola-mundo/comments"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let comment = &body["data"][0];
    assert_eq!(comment["id"], "c1");
    assert!(comment.get("author_name").is_some());
    assert!(comment.get("author_email").is_none());
}

#[tokio::test]
async fn test_donation_status_change_requires_auth() {
    let app = create_test_app(mock_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/donations/d1")
                .method("PATCH")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"status":"completed"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_staff_completes_donation() {
    let mut pending = test_utils::donation("d1", 750);
    pending.status = DonationStatus::Pending;
    let mut completed = pending.clone();
    completed.status = DonationStatus::Completed;
    let db = mock_db()
        .append_query_results([[superuser()]])
        .append_query_results([[pending]])
        .append_query_results([[completed]]);
    let app = create_test_app(db);

    let response = app
        .oneshot(authed(
            "PATCH",
            "/api/v1/donations/d1",
            Some(r#"{"status":"completed"}"#),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["status"], "completed");
}

#[tokio::test]
async fn test_donation_list_rejects_out_of_range_date() {
    let db = mock_db().append_query_results([[superuser()]]);
    let app = create_test_app(db);

    let response = app
        .oneshot(authed(
            "GET",
            "/api/v1/donations?date_to=%2B262142-12-31",
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_project_update_change_requires_staff() {
    let db = mock_db().append_query_results([[with_token(test_utils::user("u1", "maria"))]]);
    let app = create_test_app(db);

    let response = app
        .oneshot(authed(
            "PATCH",
            "/api/v1/projects/agua/updates/u1",
            Some(r#"{"progress_percentage":80}"#),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
