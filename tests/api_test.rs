use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use canvas_assistant::ai::{Completer, CompletionRequest, DisabledCompleter};
use canvas_assistant::api::router;
use canvas_assistant::config::AppConfig;
use canvas_assistant::db;
use canvas_assistant::error::AppError;
use canvas_assistant::planner::PlannerController;
use canvas_assistant::provider::FixedSampleProvider;
use canvas_assistant::provider::sample::SAMPLE_TOKEN;
use canvas_assistant::state::AppState;
use chrono::Utc;
use serde_json::{Value, json};
use tower::ServiceExt;

struct CountingCompleter {
    calls: AtomicUsize,
}

#[async_trait]
impl Completer for CountingCompleter {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("summary of {} chars", request.prompt.len()))
    }
}

async fn app_with(completer: Arc<dyn Completer>) -> Router {
    let config = AppConfig::sample();
    let pool = db::connect(&config.database_url)
        .await
        .expect("Failed to create test db");

    let state = AppState {
        db: pool,
        provider: Arc::new(FixedSampleProvider::new(Utc::now())),
        completer,
        planner: PlannerController::new(),
        config: Arc::new(config),
    };
    router(state)
}

async fn app() -> Router {
    app_with(Arc::new(DisabledCompleter)).await
}

async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn ids(value: &Value) -> Vec<i64> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app().await;
    let (status, body) = send(&app, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn lms_routes_require_a_token() {
    let app = app().await;
    let (status, body) = send(&app, "GET", "/api/courses", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "401 Unauthorized");

    let (status, body) = send(&app, "GET", "/api/courses", Some(SAMPLE_TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[0]["code"], "BIO101");
}

#[tokio::test]
async fn login_persists_session_until_logout() {
    let app = app().await;

    let (status, _) = send(&app, "GET", "/api/auth/session", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, session) = send(
        &app,
        "POST",
        "/api/auth/token",
        None,
        Some(json!({"code": "abc", "redirect_uri": "http://localhost:3000/callback"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["token"], SAMPLE_TOKEN);
    assert_eq!(session["user_id"], 1001);

    let (status, stored) = send(&app, "GET", "/api/auth/session", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored, session);

    let (status, _) = send(&app, "GET", "/api/courses", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "DELETE", "/api/auth/session", None, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", "/api/courses", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn empty_code_is_rejected() {
    let app = app().await;
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/token",
        None,
        Some(json!({"code": "  ", "redirect_uri": "http://localhost"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn assignments_are_filtered_and_sorted() {
    let app = app().await;

    let (status, body) = send(
        &app,
        "GET",
        "/api/assignments?sort_by=due_date&skip_summary=true",
        Some(SAMPLE_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![1, 4, 5, 2, 3]);

    let (_, body) = send(
        &app,
        "GET",
        "/api/assignments?sort_by=points&course_id=101&skip_summary=true",
        Some(SAMPLE_TOKEN),
        None,
    )
    .await;
    assert_eq!(ids(&body), vec![5, 1, 3]);

    let (_, body) = send(
        &app,
        "GET",
        "/api/assignments?search=LAB&skip_summary=true",
        Some(SAMPLE_TOKEN),
        None,
    )
    .await;
    assert_eq!(ids(&body), vec![5, 3]);

    let (_, body) = send(
        &app,
        "GET",
        "/api/assignments?sort_by=due_date&limit=2&skip_summary=true",
        Some(SAMPLE_TOKEN),
        None,
    )
    .await;
    assert_eq!(ids(&body), vec![1, 4]);
}

#[tokio::test]
async fn unknown_course_is_not_found() {
    let app = app().await;
    let (status, _) = send(&app, "GET", "/api/assignments?course_id=999&skip_summary=true", Some(SAMPLE_TOKEN), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn recommendations_fill_each_bucket_once() {
    let app = app().await;
    let (status, body) = send(&app, "GET", "/api/assignments/recommendations", Some(SAMPLE_TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);

    let buckets = body.as_array().unwrap();
    assert_eq!(buckets.len(), 3);
    assert_eq!(buckets[0]["kind"], "urgent");
    assert_eq!(ids(&buckets[0]["assignments"]), vec![1, 4]);
    assert_eq!(buckets[1]["kind"], "high_impact");
    assert_eq!(ids(&buckets[1]["assignments"]), vec![2]);
    assert_eq!(buckets[2]["kind"], "quick_win");
    assert_eq!(ids(&buckets[2]["assignments"]), vec![3, 5]);
}

#[tokio::test]
async fn summaries_are_generated_once_and_cached() {
    let completer = Arc::new(CountingCompleter { calls: AtomicUsize::new(0) });
    let app = app_with(completer.clone()).await;

    let (status, first) = send(&app, "GET", "/api/assignments/2/summary?course_id=202", Some(SAMPLE_TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(first["summary"].as_str().unwrap().starts_with("summary of"));

    let (_, second) = send(&app, "GET", "/api/assignments/2/summary?course_id=202", Some(SAMPLE_TOKEN), None).await;
    assert_eq!(first, second);
    assert_eq!(completer.calls.load(Ordering::SeqCst), 1);

    let (_, listed) = send(&app, "GET", "/api/assignments?course_id=202&skip_summary=true", Some(SAMPLE_TOKEN), None).await;
    let essay = listed.as_array().unwrap().iter().find(|a| a["id"] == 2).unwrap();
    assert_eq!(essay["summary"], first["summary"]);
    assert_eq!(completer.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn summary_placeholders() {
    let app = app().await;

    let (status, body) = send(&app, "GET", "/api/assignments/3/summary?course_id=101", Some(SAMPLE_TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], "No description available");

    let (status, body) = send(&app, "GET", "/api/assignments/2/summary?course_id=202", Some(SAMPLE_TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], "Summary unavailable");

    let (status, body) = send(&app, "GET", "/api/assignments/1/summary?course_id=101", Some(SAMPLE_TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], "Label the organelles.");
}

#[tokio::test]
async fn listing_summarizes_unless_skipped() {
    let completer = Arc::new(CountingCompleter { calls: AtomicUsize::new(0) });
    let app = app_with(completer.clone()).await;

    let (_, body) = send(&app, "GET", "/api/assignments?course_id=202", Some(SAMPLE_TOKEN), None).await;
    let essay = body.as_array().unwrap().iter().find(|a| a["id"] == 2).unwrap();
    assert!(essay["summary"].as_str().unwrap().starts_with("summary of"));
    let quiz = body.as_array().unwrap().iter().find(|a| a["id"] == 4).unwrap();
    assert_eq!(quiz["summary"], "Twenty capitals, ten minutes.");
    assert_eq!(completer.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn analytics_endpoints() {
    let app = app().await;

    let (status, body) = send(&app, "GET", "/api/analytics/101", Some(SAMPLE_TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);
    let completion = body["assignment_completion"].as_array().unwrap();
    assert_eq!(completion.len(), 4);
    let worksheet = completion.iter().find(|c| c["assignment_id"] == 1).unwrap();
    assert!((worksheet["completion_rate"].as_f64().unwrap() - 2.0 / 3.0).abs() < 1e-9);
    assert_eq!(body["grade_distribution"]["Cell Structure Worksheet"]["avg"], 4.5);
    let quiz = completion.iter().find(|c| c["assignment_id"] == 6).unwrap();
    assert_eq!(quiz["completion_rate"], 1.0);
    assert_eq!(body["grade_distribution"]["Photosynthesis Quiz"]["avg"], 8.0);

    let (status, body) = send(&app, "GET", "/api/analytics/workload", Some(SAMPLE_TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 5);
    assert_eq!(body["undated"], 1);
    assert_eq!(body["by_course"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn completion_endpoint() {
    let completer = Arc::new(CountingCompleter { calls: AtomicUsize::new(0) });
    let app = app_with(completer.clone()).await;

    let (status, body) = send(&app, "POST", "/api/ai/complete", Some(SAMPLE_TOKEN), Some(json!({"prompt": "hello"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "summary of 5 chars");

    let (status, _) = send(&app, "POST", "/api/ai/complete", Some(SAMPLE_TOKEN), Some(json!({"prompt": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "GET", "/api/ai/insights", Some(SAMPLE_TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["text"].as_str().unwrap().starts_with("summary of"));
}

#[tokio::test]
async fn planner_actions() {
    let app = app().await;

    let (status, body) = send(&app, "GET", "/api/planner", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["display"], "25:00");
    assert_eq!(body["timer"]["phase"], "work");
    assert_eq!(body["timer"]["running"], false);

    let (_, body) = send(&app, "POST", "/api/planner/tasks/from-assignments?course_id=101", Some(SAMPLE_TOKEN), None).await;
    assert_eq!(body["timer"]["tasks"].as_array().unwrap().len(), 3);
    assert_eq!(body["current_task"]["assignment_id"], 1);

    let (_, body) = send(&app, "POST", "/api/planner/skip", None, None).await;
    assert_eq!(body["timer"]["phase"], "short_break");
    assert_eq!(body["timer"]["sessions_completed"], 1);
    assert_eq!(body["current_task"]["assignment_id"], 5);

    let (_, body) = send(&app, "POST", "/api/planner/start", None, None).await;
    assert_eq!(body["timer"]["running"], true);

    let (_, body) = send(&app, "POST", "/api/planner/reset", None, None).await;
    assert_eq!(body["timer"]["running"], false);
    assert_eq!(body["display"], "05:00");

    let (_, body) = send(&app, "DELETE", "/api/planner", None, None).await;
    assert_eq!(body["timer"]["phase"], "work");
    assert_eq!(body["timer"]["sessions_completed"], 0);
    assert!(body["timer"]["tasks"].as_array().unwrap().is_empty());
}
