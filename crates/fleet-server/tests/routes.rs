use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use fleet_config::{AppConfig, FleetSettings, GenieSettings};
use fleet_server::{build_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn no_env(_: &str) -> Option<String> {
    None
}

fn host_and_token_only(key: &str) -> Option<String> {
    match key {
        "DATABRICKS_HOST" => Some("https://127.0.0.1:9".to_string()),
        "DATABRICKS_TOKEN" => Some("dapi-test".to_string()),
        _ => None,
    }
}

fn full_env(key: &str) -> Option<String> {
    match key {
        "DATABRICKS_GENIE_SPACE_ID" => Some("01ef2345abcdef".to_string()),
        other => host_and_token_only(other),
    }
}

fn app(seed: Option<u64>) -> Router {
    app_with_env(seed, no_env)
}

fn app_with_env(seed: Option<u64>, env: fn(&str) -> Option<String>) -> Router {
    let config = AppConfig {
        genie: GenieSettings {
            env_file: None,
            ..Default::default()
        },
        fleet: FleetSettings { size: 20, seed },
        ..Default::default()
    };
    build_router(AppState::with_env(config, Arc::new(env)))
}

async fn call(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app.oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn liveness_probe() {
    let (status, body) = call(app(None), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn send_message_without_configuration_fails_fast() {
    let (status, body) = call(
        app(None),
        Method::POST,
        "/api/genie/send-message",
        Some(json!({"content": "How many turbines are offline?"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let detail = body["detail"].as_str().unwrap();
    assert!(
        detail.contains("not configured"),
        "unexpected detail: {detail}"
    );
}

#[tokio::test]
async fn genie_health_reports_unconfigured() {
    let (status, body) = call(app(None), Method::GET, "/api/genie/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["configured"], false);
    assert!(body["space_id"].is_null());
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn genie_health_reads_credentials_from_lookup() {
    let (status, body) = call(app_with_env(None, full_env), Method::GET, "/api/genie/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["configured"], true);
    assert_eq!(body["space_id"], "01ef2345...");
    assert_eq!(body["host"], "https://127.0.0.1:9...");
}

#[tokio::test]
async fn send_message_without_space_fails_before_network() {
    let (status, body) = call(
        app_with_env(None, host_and_token_only),
        Method::POST,
        "/api/genie/send-message",
        Some(json!({"content": "How many turbines are offline?"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["detail"],
        "Genie Space ID not configured. Please set DATABRICKS_GENIE_SPACE_ID."
    );
}

#[tokio::test]
async fn kpis_cover_the_configured_fleet() {
    let (status, body) = call(app(Some(1)), Method::GET, "/api/turbine/kpis", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_turbines"], 20);
}

#[tokio::test]
async fn turbines_are_filtered_and_paged() {
    let (status, body) = call(
        app(Some(4)),
        Method::GET,
        "/api/turbine/turbines?status=operational&limit=3",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let turbines = body.as_array().unwrap();
    assert!(turbines.len() <= 3);
    assert!(turbines.iter().all(|t| t["status"] == "operational"));

    let (_, all) = call(app(Some(4)), Method::GET, "/api/turbine/turbines?offset=18", None).await;
    assert_eq!(all.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn seeded_fleet_is_consistent_across_views() {
    let (_, list) = call(app(Some(9)), Method::GET, "/api/turbine/turbines", None).await;
    let (status, detail) = call(app(Some(9)), Method::GET, "/api/turbine/turbines/5", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["name"], "WT-005");
    assert_eq!(detail["status"], list[4]["status"]);
    assert_eq!(detail["health_score"], list[4]["health_score"]);
}

#[tokio::test]
async fn unknown_turbine_is_not_found() {
    let (status, body) = call(app(None), Method::GET, "/api/turbine/turbines/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Turbine 999 not found");
}

#[tokio::test]
async fn energy_output_honours_hours() {
    let (status, body) = call(app(None), Method::GET, "/api/turbine/energy-output?hours=6", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn maintenance_is_acknowledged() {
    let (status, body) = call(
        app(None),
        Method::POST,
        "/api/turbine/turbines/45/maintenance?maintenance_date=2025-03-01T08:00:00Z",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["turbine_id"], 45);
    assert_eq!(body["message"], "Maintenance scheduled for turbine 45");
}

#[tokio::test]
async fn clusters_and_summary() {
    let (status, clusters) = call(app(None), Method::GET, "/api/turbine/turbines/map/clusters", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(clusters.as_array().unwrap().len(), 100);

    let (status, summary) = call(app(None), Method::GET, "/api/turbine/assistant-summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["priority_items"].as_array().unwrap().len(), 4);
}
