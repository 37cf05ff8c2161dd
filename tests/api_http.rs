// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - GET /  (banner)
// - POST /score  (assessment contract + contract violations)
// - POST /scan   (report contract)
// - GET /debug/last-scan, /debug/region-rate

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value as Json};
use tower::ServiceExt as _; // for `oneshot`

use zombie_risk_analyzer::api;

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

/// Build the same Router the binary uses.
fn test_router() -> Router {
    api::create_router()
}

async fn read_json(resp: axum::response::Response) -> Json {
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    serde_json::from_slice(&bytes).expect("parse json body")
}

#[tokio::test]
async fn api_health_returns_200_and_ok_body() {
    let app = test_router();

    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");

    let resp = app.oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK, "health should be 200");

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    let body = String::from_utf8(bytes).expect("utf8");
    assert_eq!(body.trim(), "ok", "health body should be 'ok'");
}

#[tokio::test]
async fn api_root_banner_lists_services() {
    let app = test_router();
    let req = Request::builder()
        .method("GET")
        .uri("/")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert!(resp.status().is_success());
    let v = read_json(resp).await;
    assert!(v.get("message").is_some(), "missing 'message'");
    assert!(v["services"].is_array(), "missing 'services'");
}

#[tokio::test]
async fn api_score_returns_expected_json_fields() {
    let app = test_router();

    let payload = json!({
        "resource_id": "i-0abc",
        "resource_type": "ec2",
        "region": "us-east-1",
        "days_since_creation": 10,
        "has_name_tag": true,
        "has_owner_tag": false,
        "has_environment_tag": false,
        "is_stopped": true,
        "instance_size_score": 0.0,
        "region_zombie_rate": 0.0
    });
    let req = Request::builder()
        .method("POST")
        .uri("/score")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build POST /score");

    let resp = app.oneshot(req).await.expect("oneshot /score");
    assert!(
        resp.status().is_success(),
        "POST /score should be 2xx, got {}",
        resp.status()
    );

    let v = read_json(resp).await;

    // Contract checks for UI consumers
    assert!(v.get("probability").is_some(), "missing 'probability'");
    assert!(v.get("tier").is_some(), "missing 'tier'");
    assert!(v.get("reasons").is_some(), "missing 'reasons'");
    assert!(v.get("summary").is_some(), "missing 'summary'");

    // 0.05 + 0.60 + 0.15 + 0.10 = 0.90 → HIGH with the default profile
    assert_eq!(v["tier"], json!("HIGH"));
    let p = v["probability"].as_f64().unwrap();
    assert!((p - 0.90).abs() < 1e-6, "probability ~= 0.90, got {}", p);
}

#[tokio::test]
async fn api_score_rejects_missing_required_fields() {
    let app = test_router();

    // No resource_type: the request must fail loudly, not default.
    let payload = json!({
        "resource_id": "i-0abc",
        "days_since_creation": 10,
        "has_name_tag": true,
        "has_owner_tag": true,
        "has_environment_tag": true,
        "is_stopped": false,
        "instance_size_score": 0.0,
        "region_zombie_rate": 0.0
    });
    let req = Request::builder()
        .method("POST")
        .uri("/score")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn api_scan_reports_zombies_and_totals() {
    let app = test_router();

    let records = json!([
        {
            "id": "i-1",
            "resource_type": "ec2",
            "region": "us-east-1",
            "state": "stopped",
            "instance_type": "t3.medium",
            "tags": {}
        },
        {
            "id": "i-2",
            "resource_type": "ec2",
            "region": "us-east-1",
            "state": "running",
            "instance_type": "t3.micro",
            "tags": {"Name": "web", "Owner": "team-a", "Environment": "staging"}
        }
    ]);
    let req = Request::builder()
        .method("POST")
        .uri("/scan")
        .header("content-type", "application/json")
        .body(Body::from(records.to_string()))
        .expect("build POST /scan");

    let resp = app.oneshot(req).await.expect("oneshot /scan");
    assert!(
        resp.status().is_success(),
        "POST /scan should be 2xx, got {}",
        resp.status()
    );

    let v = read_json(resp).await;
    assert_eq!(v["total_resources"], json!(2));
    assert_eq!(v["zombies"].as_array().unwrap().len(), 1);
    assert_eq!(v["zombies"][0]["resource_id"], json!("i-1"));
    assert!(v["cost_summary"]["total_monthly_savings"].as_f64().unwrap() > 0.0);
    assert!(v.get("scan_timestamp").is_some());
    assert!(v["zombies"][0]["assessment"]["summary"].is_string());
}

#[tokio::test]
async fn api_last_scan_reflects_previous_scan() {
    let app = test_router();

    // Same router instance for both calls, so the in-memory history carries over.
    let records = json!([
        {"id": "i-9", "resource_type": "ec2", "region": "eu-west-1", "state": "stopped"}
    ]);
    let scan_req = Request::builder()
        .method("POST")
        .uri("/scan")
        .header("content-type", "application/json")
        .body(Body::from(records.to_string()))
        .unwrap();
    let resp = app.clone().oneshot(scan_req).await.unwrap();
    assert!(resp.status().is_success());

    let req = Request::builder()
        .method("GET")
        .uri("/debug/last-scan")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let v = read_json(resp).await;
    assert_eq!(v["zombie_count"], json!(1));
    assert_eq!(v["total_resources"], json!(1));
}

#[tokio::test]
async fn api_region_rate_uses_prior_for_unknown_region() {
    let app = test_router();

    let req = Request::builder()
        .method("GET")
        .uri("/debug/region-rate?region=ap-south-1")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap().to_vec();
    let body = String::from_utf8(bytes).unwrap();
    assert_eq!(body, "region='ap-south-1' -> rate=0.15");
}
