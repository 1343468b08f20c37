use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::{Value, json};
use taskflow_server::config::Config;
use testcontainers_modules::{postgres, testcontainers};
use tower::ServiceExt;

mod common;

/// Test context for endpoint tests.
pub struct TestContext {
    #[allow(dead_code)] // container is kept to ensure it's not dropped
    pub container: testcontainers::ContainerAsync<postgres::Postgres>,
    pub app: Router,
}

fn test_config() -> Config {
    Config {
        db_url: "".to_string(),
        port: 8080,
        jwt_secret: "test_secret".to_string(),
        token_ttl_hours: 24,
        cors_origin: "http://localhost:3000".to_string(),
        api_prefix: "/api".to_string(),
    }
}

/// Setup function for endpoint tests using PostgreSQL container.
async fn setup() -> anyhow::Result<TestContext> {
    // Allow multiple calls to init for tests.
    let _ = tracing_subscriber::fmt().try_init();
    let container = common::setup_container().await?;
    let db = common::setup_db(&container).await?;
    let app = taskflow_server::web::create_app(&test_config(), db)?;
    Ok(TestContext { container, app })
}

/// Sends a request and returns the status with the parsed JSON body, `Null` when empty.
async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Registers and logs in a user, returning the bearer token.
async fn register_and_login(app: &Router, email: &str) -> String {
    let (status, _) = send(
        app,
        Method::POST,
        "/api/users/register",
        None,
        Some(json!({ "name": "Ada Lovelace", "email": email, "password": "hunter22" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        Method::POST,
        "/api/users/login",
        None,
        Some(json!({ "email": email, "password": "hunter22" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn can_register_login_and_fetch_profile() {
    let state = setup().await.expect("Failed to setup test context");

    let (status, body) = send(
        &state.app,
        Method::POST,
        "/api/users/register",
        None,
        Some(json!({ "name": "Ada Lovelace", "email": "Ada@Example.com", "password": "hunter22" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert!(body["user"].get("passwordHash").is_none());

    let (status, body) = send(
        &state.app,
        Method::POST,
        "/api/users/login",
        None,
        Some(json!({ "email": "ada@example.com", "password": "hunter22" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = send(&state.app, Method::GET, "/api/users/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "Ada Lovelace");
}

#[tokio::test]
async fn rejects_duplicate_registration_and_bad_login() {
    let state = setup().await.expect("Failed to setup test context");
    register_and_login(&state.app, "ada@example.com").await;

    let (status, body) = send(
        &state.app,
        Method::POST,
        "/api/users/register",
        None,
        Some(json!({ "name": "Impostor", "email": "ADA@example.com", "password": "hunter22" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    let (status, body) = send(
        &state.app,
        Method::POST,
        "/api/users/login",
        None,
        Some(json!({ "email": "ada@example.com", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials");
}

#[tokio::test]
async fn rejects_invalid_registration_payload() {
    let state = setup().await.expect("Failed to setup test context");

    let (status, body) = send(
        &state.app,
        Method::POST,
        "/api/users/register",
        None,
        Some(json!({ "name": "Al", "email": "not-an-email", "password": "123" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn can_manage_tasks_through_api() {
    let state = setup().await.expect("Failed to setup test context");
    let token = register_and_login(&state.app, "ada@example.com").await;

    let (status, body) = send(
        &state.app,
        Method::POST,
        "/api/tasks",
        Some(&token),
        Some(json!({ "title": "Write report", "category": "Work", "priority": "High" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["task"]["status"], "Pending");
    assert_eq!(body["task"]["aiSuggestions"], json!({}));
    let task_id = body["task"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&state.app, Method::GET, "/api/tasks", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tasks"].as_array().unwrap().len(), 1);

    let (status, body) = send(
        &state.app,
        Method::PATCH,
        &format!("/api/tasks/{}", task_id),
        Some(&token),
        Some(json!({ "title": "Write final report" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["task"]["title"], "Write final report");
    assert_eq!(body["task"]["priority"], "High");

    let (status, body) = send(
        &state.app,
        Method::DELETE,
        &format!("/api/tasks/{}", task_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = send(
        &state.app,
        Method::GET,
        &format!("/api/tasks/{}", task_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn hides_tasks_of_other_users() {
    let state = setup().await.expect("Failed to setup test context");
    let owner = register_and_login(&state.app, "owner@example.com").await;
    let intruder = register_and_login(&state.app, "intruder@example.com").await;

    let (_, body) = send(
        &state.app,
        Method::POST,
        "/api/tasks",
        Some(&owner),
        Some(json!({ "title": "Private plans" })),
    )
    .await;
    let task_uri = format!("/api/tasks/{}", body["task"]["id"].as_str().unwrap());

    let (status, body) = send(&state.app, Method::GET, &task_uri, Some(&intruder), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Task not found");

    let (status, _) = send(
        &state.app,
        Method::PATCH,
        &task_uri,
        Some(&intruder),
        Some(json!({ "status": "Completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&state.app, Method::GET, "/api/tasks", Some(&intruder), None).await;
    assert_eq!(body["tasks"], json!([]));
}

#[tokio::test]
async fn rejects_malformed_task_requests() {
    let state = setup().await.expect("Failed to setup test context");
    let token = register_and_login(&state.app, "ada@example.com").await;

    let (status, _) = send(
        &state.app,
        Method::POST,
        "/api/tasks",
        Some(&token),
        Some(json!({ "title": "Ok title", "priority": "Urgent" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&state.app, Method::GET, "/api/tasks/42", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid ID format");

    let (status, _) = send(
        &state.app,
        Method::GET,
        "/api/tasks?sortBy=nonsense",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn completing_task_through_api_records_analytics() {
    let state = setup().await.expect("Failed to setup test context");
    let token = register_and_login(&state.app, "ada@example.com").await;

    let (_, body) = send(
        &state.app,
        Method::POST,
        "/api/tasks",
        Some(&token),
        Some(json!({ "title": "Write report", "category": "Work" })),
    )
    .await;
    let task_id = body["task"]["id"].as_str().unwrap().to_string();

    let (_, body) = send(&state.app, Method::GET, "/api/analytics", Some(&token), None).await;
    assert_eq!(body["analytics"], json!([]));

    let (status, _) = send(
        &state.app,
        Method::PATCH,
        &format!("/api/tasks/{}", task_id),
        Some(&token),
        Some(json!({ "status": "Completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&state.app, Method::GET, "/api/analytics", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let records = body["analytics"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["taskId"], task_id.as_str());
    assert_eq!(records[0]["task"]["title"], "Write report");
    assert_eq!(records[0]["status"], "Completed");
    assert_eq!(records[0]["completionTime"], 0);
    assert_eq!(records[0]["productivityScore"], 50);

    let (status, body) = send(
        &state.app,
        Method::GET,
        "/api/analytics/aggregated",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["analytics"],
        json!([{
            "category": "Work",
            "avgCompletionTime": 0.0,
            "avgProductivityScore": 50.0,
            "totalTasks": 1
        }])
    );
}

#[tokio::test]
async fn creating_completed_task_records_analytics() {
    let state = setup().await.expect("Failed to setup test context");
    let token = register_and_login(&state.app, "ada@example.com").await;

    let (status, _) = send(
        &state.app,
        Method::POST,
        "/api/tasks",
        Some(&token),
        Some(json!({ "title": "Already done", "status": "Completed", "priority": "High" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(&state.app, Method::GET, "/api/analytics", Some(&token), None).await;
    let records = body["analytics"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["productivityScore"], 70);
}

#[tokio::test]
async fn rejects_inverted_aggregation_window() {
    let state = setup().await.expect("Failed to setup test context");
    let token = register_and_login(&state.app, "ada@example.com").await;

    let (status, body) = send(
        &state.app,
        Method::GET,
        "/api/analytics/aggregated?startDate=2025-02-01&endDate=2025-01-01",
        Some(&token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "startDate must not be after endDate");
}

#[tokio::test]
async fn requires_token_for_analytics() {
    let state = setup().await.expect("Failed to setup test context");

    let (status, body) = send(&state.app, Method::GET, "/api/analytics", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHORIZED");
}
