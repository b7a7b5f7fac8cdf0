//! End-to-end tests against the real router: login, brand isolation,
//! summary and ranking, and the dataset failure-mode status codes.

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use fleetgate::{config::Config, AppState};

fn test_config(data_dir: &Path) -> Config {
    Config {
        port: 0,
        database_url: "sqlite::memory:".into(),
        secret_key: "integration-test-secret".into(),
        token_ttl_minutes: 60,
        data_dir: data_dir.to_path_buf(),
        allowed_origins: vec![],
        seed_demo_user: false,
        summary_precision: 1,
        ranking_precision: 2,
    }
}

fn write_master(root: &Path, brand: &str, rows: &[(u8, u8, u8)]) {
    let dir = root.join(brand);
    std::fs::create_dir_all(&dir).unwrap();
    let mut csv =
        String::from("vehicle_id,engine_failure_imminent,battery_issue_imminent,brake_issue_imminent\n");
    for (i, (e, b, k)) in rows.iter().enumerate() {
        csv.push_str(&format!("v{},{},{},{}\n", i, e, b, k));
    }
    std::fs::write(dir.join("master_vehicle_data.csv"), csv).unwrap();
}

async fn setup(data_dir: &Path) -> Router {
    let state = AppState::new(test_config(data_dir)).await.unwrap();
    state
        .creds
        .insert_user("user1@example.com", "password123", "audi")
        .await
        .unwrap();
    fleetgate::api::router(Arc::new(state))
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_bearer(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

async fn login(app: &Router) -> String {
    let (status, body) = send(
        app,
        post_json(
            "/auth/login",
            json!({"email": "user1@example.com", "password": "password123", "brand": "audi"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["brand"], "audi");
    body["access_token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn login_and_read_own_brand_summary() {
    let tmp = tempfile::tempdir().unwrap();
    // one flagged engine out of four vehicles
    write_master(tmp.path(), "audi", &[(1, 0, 0), (0, 0, 0), (0, 0, 0), (0, 0, 0)]);
    let app = setup(tmp.path()).await;

    let token = login(&app).await;
    let (status, body) = send(&app, get_bearer("/audi/summary", &token)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["fleet_health_score"].is_f64() || body["fleet_health_score"].is_i64());
    assert_eq!(body["engine_health"], 75.0);
    assert_eq!(body["battery_health"], 100.0);
    assert_eq!(body["total_vehicles"], 4);
}

#[tokio::test]
async fn other_brand_summary_is_forbidden() {
    let tmp = tempfile::tempdir().unwrap();
    write_master(tmp.path(), "audi", &[(0, 0, 0)]);
    write_master(tmp.path(), "bmw", &[(0, 0, 0)]);
    let app = setup(tmp.path()).await;

    let token = login(&app).await;
    let (status, body) = send(&app, get_bearer("/bmw/summary", &token)).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "brand_mismatch");
}

#[tokio::test]
async fn bad_credentials_and_wrong_login_brand_are_uniform_401s() {
    let tmp = tempfile::tempdir().unwrap();
    write_master(tmp.path(), "audi", &[(0, 0, 0)]);
    let app = setup(tmp.path()).await;

    let (status, wrong_password) = send(
        &app,
        post_json(
            "/auth/login",
            json!({"email": "user1@example.com", "password": "nope", "brand": "audi"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, unknown_identity) = send(
        &app,
        post_json(
            "/auth/login",
            json!({"email": "ghost@example.com", "password": "nope", "brand": "audi"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, wrong_brand) = send(
        &app,
        post_json(
            "/auth/login",
            json!({"email": "user1@example.com", "password": "password123", "brand": "bmw"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // same body for all three — no enumeration side channel
    assert_eq!(wrong_password, unknown_identity);
    assert_eq!(wrong_password, wrong_brand);
}

#[tokio::test]
async fn missing_and_garbage_tokens_are_uniform_401s() {
    let tmp = tempfile::tempdir().unwrap();
    write_master(tmp.path(), "audi", &[(0, 0, 0)]);
    let app = setup(tmp.path()).await;

    let (status, _) = send(
        &app,
        Request::builder()
            .uri("/audi/summary")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, get_bearer("/audi/summary", "garbage.token.here")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "invalid or expired token");
}

#[tokio::test]
async fn ranking_is_visible_to_any_authenticated_identity() {
    let tmp = tempfile::tempdir().unwrap();
    write_master(tmp.path(), "audi", &[(0, 0, 0)]);
    write_master(tmp.path(), "bmw", &[(1, 1, 1)]);
    write_master(tmp.path(), "vw", &[(1, 0, 0), (0, 0, 0)]);
    let app = setup(tmp.path()).await;

    let token = login(&app).await;
    let (status, body) = send(&app, get_bearer("/ranking", &token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_brands"], 3);

    let ranking = body["ranking"].as_array().unwrap();
    let brands: Vec<&str> = ranking
        .iter()
        .map(|e| e["brand"].as_str().unwrap())
        .collect();
    assert_eq!(brands, ["audi", "vw", "bmw"]);
    let ranks: Vec<u64> = ranking.iter().map(|e| e["rank"].as_u64().unwrap()).collect();
    assert_eq!(ranks, [1, 2, 3]);
    // ranking context rounds to two decimals
    assert_eq!(ranking[1]["fleet_health_score"], 83.33);
}

#[tokio::test]
async fn ranking_requires_a_token() {
    let tmp = tempfile::tempdir().unwrap();
    write_master(tmp.path(), "audi", &[(0, 0, 0)]);
    let app = setup(tmp.path()).await;

    let (status, _) = send(
        &app,
        Request::builder()
            .uri("/ranking")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_dataset_is_404_but_missing_root_is_503() {
    let tmp = tempfile::tempdir().unwrap();
    write_master(tmp.path(), "audi", &[(0, 0, 0)]);
    let app = setup(tmp.path()).await;
    let token = login(&app).await;

    // audi exists but has no engine_risk_summary file
    let (status, body) = send(&app, get_bearer("/audi/engine/risk", &token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "dataset_not_found");

    // same call against an app whose dataset root does not exist at all
    let missing_root = tmp.path().join("never-created");
    let app = setup(&missing_root).await;
    let token = login(&app).await;
    let (status, body) = send(&app, get_bearer("/audi/engine/risk", &token)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "dataset_store_unavailable");
}

#[tokio::test]
async fn empty_master_dataset_is_a_500_not_a_perfect_score() {
    let tmp = tempfile::tempdir().unwrap();
    write_master(tmp.path(), "audi", &[]);
    let app = setup(tmp.path()).await;

    let token = login(&app).await;
    let (status, body) = send(&app, get_bearer("/audi/summary", &token)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "dataset_corrupt");
}

#[tokio::test]
async fn subsystem_rows_pass_through_with_typed_values() {
    let tmp = tempfile::tempdir().unwrap();
    write_master(tmp.path(), "audi", &[(0, 0, 0)]);
    std::fs::write(
        tmp.path().join("audi/engine_temp_perf.csv"),
        "temp_band,avg_output\ncold,0.91\nhot,0.84\n",
    )
    .unwrap();
    let app = setup(tmp.path()).await;

    let token = login(&app).await;
    let (status, body) = send(&app, get_bearer("/audi/engine/temp-performance", &token)).await;

    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["temp_band"], "cold");
    assert_eq!(rows[0]["avg_output"], 0.91);
}

#[tokio::test]
async fn brake_endpoints_shape_their_responses() {
    let tmp = tempfile::tempdir().unwrap();
    write_master(tmp.path(), "audi", &[(0, 0, 0)]);
    std::fs::write(
        tmp.path().join("audi/brake_temp_perf.csv"),
        "temp_band,avg_brake_temp_c\n0-100,212.456\n",
    )
    .unwrap();
    std::fs::write(
        tmp.path().join("audi/brake_wear_distribution.csv"),
        "band,count\nlow,120\nhigh,30\n",
    )
    .unwrap();
    std::fs::write(
        tmp.path().join("audi/brake_risk_summary.csv"),
        "brake_issue_imminent,fraction\n1,0.87\n",
    )
    .unwrap();
    let app = setup(tmp.path()).await;
    let token = login(&app).await;

    let (status, body) = send(&app, get_bearer("/audi/brakes/temp-performance", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["temperature"], "0-100");
    assert_eq!(body[0]["wear"], 212.46);

    let (status, body) = send(&app, get_bearer("/audi/brakes/wear-distribution", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0], json!({"label": "low", "value": 120}));
    assert_eq!(body[1], json!({"label": "high", "value": 30}));

    let (status, body) = send(&app, get_bearer("/audi/brakes/risk", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["risk"], "High Risk");
    assert_eq!(body["confidence"], 87.0);
}

#[tokio::test]
async fn fractional_wear_distribution_value_is_corrupt_not_zero() {
    let tmp = tempfile::tempdir().unwrap();
    write_master(tmp.path(), "audi", &[(0, 0, 0)]);
    std::fs::write(
        tmp.path().join("audi/brake_wear_distribution.csv"),
        "band,count\nlow,12.5\n",
    )
    .unwrap();
    let app = setup(tmp.path()).await;
    let token = login(&app).await;

    let (status, body) = send(&app, get_bearer("/audi/brakes/wear-distribution", &token)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "dataset_corrupt");
}

#[tokio::test]
async fn assistant_answers_own_brand_only() {
    let tmp = tempfile::tempdir().unwrap();
    write_master(tmp.path(), "audi", &[(0, 0, 0), (1, 0, 0)]);
    write_master(tmp.path(), "bmw", &[(0, 0, 0)]);
    let app = setup(tmp.path()).await;
    let token = login(&app).await;

    let req = Request::builder()
        .method("POST")
        .uri("/assistant/query")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::from(
            json!({"question": "How is the engine?", "brand": "audi"}).to_string(),
        ))
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["answer"].as_str().unwrap().contains("Engine health"));

    let req = Request::builder()
        .method("POST")
        .uri("/assistant/query")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::from(
            json!({"question": "How is the engine?", "brand": "bmw"}).to_string(),
        ))
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn health_check_needs_no_auth() {
    let tmp = tempfile::tempdir().unwrap();
    let app = setup(tmp.path()).await;

    let resp = app
        .clone()
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
