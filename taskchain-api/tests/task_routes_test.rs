/// HTTP-level tests for the scenario and task endpoints
///
/// Every test runs the full router (auth layer, error mapping, security
/// headers) over an in-memory store.

mod common;

use axum::http::StatusCode;
use common::TestContext;
use serde_json::{json, Value};

async fn create_scenario(ctx: &TestContext, name: &str) -> i64 {
    let (status, body) = ctx
        .send("POST", "/v1/scenarios", Some("alice"), Some(json!({ "name": name })))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
}

async fn add_task(ctx: &TestContext, scenario_id: i64, seq: i32, description: &str, owner: &str) -> Value {
    let (status, body) = ctx
        .send(
            "POST",
            &format!("/v1/scenarios/{scenario_id}/tasks"),
            Some("alice"),
            Some(json!({ "sequence_number": seq, "description": description, "owner": owner })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

#[tokio::test]
async fn test_requests_without_token_are_rejected() {
    let ctx = TestContext::new().unwrap();

    let (status, body) = ctx.send("GET", "/v1/scenarios", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = ctx.send("POST", "/v1/tasks/1/complete", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_design_then_build_flow() {
    let ctx = TestContext::new().unwrap();
    let scenario_id = create_scenario(&ctx, "Release 1.0").await;

    let design = add_task(&ctx, scenario_id, 1, "Design", "alice").await;
    let build = add_task(&ctx, scenario_id, 2, "Build", "bob").await;
    assert_eq!(design["status"], "released");
    assert_eq!(build["status"], "locked");

    let build_id = build["id"].as_i64().unwrap();
    let design_id = design["id"].as_i64().unwrap();

    // Bob cannot start before Design is done
    let (status, body) = ctx
        .send("POST", &format!("/v1/tasks/{build_id}/complete"), Some("bob"), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "not_released");

    // Only Alice may complete Design
    let (status, body) = ctx
        .send("POST", &format!("/v1/tasks/{design_id}/complete"), Some("bob"), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "not_owner");

    let (status, body) = ctx
        .send("POST", &format!("/v1/tasks/{design_id}/complete"), Some("alice"), None)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["outcome"], "newly_released_successor");
    assert_eq!(body["task"]["status"], "completed");
    assert_eq!(body["newly_released"]["id"], build_id);
    assert_eq!(body["newly_released"]["status"], "released");

    // A second completion is refused and does not move the timestamp
    let completed_at = body["task"]["completed_at"].clone();
    let (status, body) = ctx
        .send("POST", &format!("/v1/tasks/{design_id}/complete"), Some("alice"), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "already_completed");

    let (_, task) = ctx
        .send("GET", &format!("/v1/tasks/{design_id}"), Some("carol"), None)
        .await;
    assert_eq!(task["completed_at"], completed_at);

    let (status, body) = ctx
        .send("POST", &format!("/v1/tasks/{build_id}/complete"), Some("bob"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "completed");
    assert!(body["newly_released"].is_null());
}

#[tokio::test]
async fn test_scenario_board_lists_tasks_in_sequence() {
    let ctx = TestContext::new().unwrap();
    let scenario_id = create_scenario(&ctx, "Board").await;

    add_task(&ctx, scenario_id, 3, "Deploy", "alice").await;
    add_task(&ctx, scenario_id, 1, "Design", "alice").await;
    add_task(&ctx, scenario_id, 2, "Build", "bob").await;

    let (status, board) = ctx
        .send("GET", &format!("/v1/scenarios/{scenario_id}"), Some("alice"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(board["scenario"]["name"], "Board");

    let descriptions: Vec<&str> = board["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["description"].as_str().unwrap())
        .collect();
    assert_eq!(descriptions, ["Design", "Build", "Deploy"]);

    // "Deploy" was inserted first into the empty scenario and got the bootstrap release
    let released: Vec<&Value> = board["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|t| t["status"] == "released")
        .collect();
    assert_eq!(released.len(), 1);
    assert_eq!(released[0]["description"], "Deploy");
}

#[tokio::test]
async fn test_manual_release() {
    let ctx = TestContext::new().unwrap();
    let scenario_id = create_scenario(&ctx, "Manual").await;

    add_task(&ctx, scenario_id, 1, "Design", "alice").await;
    let build = add_task(&ctx, scenario_id, 2, "Build", "bob").await;
    let build_id = build["id"].as_i64().unwrap();

    let (status, body) = ctx
        .send("POST", &format!("/v1/tasks/{build_id}/release"), Some("alice"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "released");

    let (status, body) = ctx
        .send("POST", &format!("/v1/tasks/{build_id}/release"), Some("alice"), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "already_released");
}

#[tokio::test]
async fn test_delete_task_and_scenario() {
    let ctx = TestContext::new().unwrap();
    let scenario_id = create_scenario(&ctx, "Doomed").await;
    let design = add_task(&ctx, scenario_id, 1, "Design", "alice").await;
    let build = add_task(&ctx, scenario_id, 2, "Build", "bob").await;
    let design_id = design["id"].as_i64().unwrap();
    let build_id = build["id"].as_i64().unwrap();

    let (status, _) = ctx
        .send("DELETE", &format!("/v1/tasks/{design_id}"), Some("alice"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The successor of a deleted task stays locked
    let (_, task) = ctx
        .send("GET", &format!("/v1/tasks/{build_id}"), Some("alice"), None)
        .await;
    assert_eq!(task["status"], "locked");

    let (status, _) = ctx
        .send("DELETE", &format!("/v1/scenarios/{scenario_id}"), Some("alice"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = ctx
        .send("GET", &format!("/v1/tasks/{build_id}"), Some("alice"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, _) = ctx
        .send("GET", &format!("/v1/scenarios/{scenario_id}"), Some("alice"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_completed_task_is_not_deleted() {
    let ctx = TestContext::new().unwrap();
    let scenario_id = create_scenario(&ctx, "Kept").await;
    let design = add_task(&ctx, scenario_id, 1, "Design", "alice").await;
    let design_id = design["id"].as_i64().unwrap();

    let (status, _) = ctx
        .send("POST", &format!("/v1/tasks/{design_id}/complete"), Some("alice"), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx
        .send("DELETE", &format!("/v1/tasks/{design_id}"), Some("alice"), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "already_completed");

    let (status, task) = ctx
        .send("GET", &format!("/v1/tasks/{design_id}"), Some("alice"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(task["status"], "completed");
}

#[tokio::test]
async fn test_task_in_missing_scenario_is_not_found() {
    let ctx = TestContext::new().unwrap();

    let (status, _) = ctx
        .send(
            "POST",
            "/v1/scenarios/999/tasks",
            Some("alice"),
            Some(json!({ "sequence_number": 1, "description": "Design", "owner": "alice" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_task_input_is_bad_request() {
    let ctx = TestContext::new().unwrap();

    let (status, body) = ctx
        .send(
            "POST",
            "/v1/tasks",
            Some("alice"),
            Some(json!({ "sequence_number": 1, "description": "   ", "owner": "alice" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_ungrouped_tasks() {
    let ctx = TestContext::new().unwrap();

    for (seq, owner) in [(1, "alice"), (2, "bob")] {
        let (status, _) = ctx
            .send(
                "POST",
                "/v1/tasks",
                Some("alice"),
                Some(json!({ "sequence_number": seq, "description": "Legacy", "owner": owner })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, tasks) = ctx.send("GET", "/v1/tasks", Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    let tasks = tasks.as_array().unwrap();
    assert_eq!(tasks.len(), 2);
    assert!(tasks.iter().all(|t| t["scenario_id"].is_null()));
    assert_eq!(tasks[0]["status"], "released");
    assert_eq!(tasks[1]["status"], "locked");
}

#[tokio::test]
async fn test_security_headers_present() {
    let ctx = TestContext::new().unwrap();

    let request = axum::http::Request::builder()
        .uri("/v1/scenarios")
        .header("authorization", format!("Bearer {}", ctx.token_for("alice")))
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(ctx.app.clone(), request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert!(response.headers().get("strict-transport-security").is_none());
}
