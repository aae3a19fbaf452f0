use axum::Json;
use axum::extract::{Path, Query};
use axum::routing::{get, post, put};
use axum::{Router, extract::State, http::StatusCode};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::ai::CompletionRequest;
use crate::analytics::{CourseAnalytics, WorkloadStats};
use crate::auth::{self, BearerToken};
use crate::error::AppError;
use crate::models::{AssignmentRecord, AuthSession, CourseRecord};
use crate::planner::{PlannerSnapshot, PlannerTask};
use crate::recommend::RecommendationBucket;
use crate::repository;
use crate::services::{AssignmentQuery, DashboardService, SummaryService};
use crate::state::AppState;
use crate::view::SortKey;

const PLANNER_TASK_LIMIT: usize = 5;

#[derive(Deserialize)]
struct CourseFilterParams {
    course_id: Option<i64>,
}

#[derive(Deserialize)]
struct SummaryParams {
    course_id: i64,
}

#[derive(Deserialize)]
struct TokenExchangeRequest {
    code: String,
    redirect_uri: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    message: &'static str,
}

#[derive(Serialize)]
struct SummaryResponse {
    summary: String,
}

#[derive(Serialize)]
struct TextResponse {
    text: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/auth/token", post(exchange_token))
        .route("/api/auth/session", get(current_session).delete(logout))
        .route("/api/courses", get(list_courses))
        .route("/api/assignments", get(list_assignments))
        .route("/api/assignments/recommendations", get(recommendations))
        .route("/api/assignments/{id}/summary", get(assignment_summary))
        .route("/api/analytics/workload", get(workload))
        .route("/api/analytics/{course_id}", get(course_analytics))
        .route("/api/ai/complete", post(complete))
        .route("/api/ai/insights", get(insights))
        .route("/api/planner", get(planner_snapshot).delete(planner_discard))
        .route("/api/planner/tasks", put(planner_tasks))
        .route("/api/planner/tasks/from-assignments", post(planner_tasks_from_assignments))
        .route("/api/planner/start", post(planner_start))
        .route("/api/planner/pause", post(planner_pause))
        .route("/api/planner/reset", post(planner_reset))
        .route("/api/planner/skip", post(planner_skip))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(Json(HealthResponse {
        status: "ok",
        message: "API is running",
    }))
}

async fn exchange_token(
    State(state): State<AppState>,
    Json(req): Json<TokenExchangeRequest>,
) -> Result<Json<AuthSession>, AppError> {
    let session = auth::login(&state.db, state.provider.as_ref(), &req.code, &req.redirect_uri).await?;
    Ok(Json(session))
}

async fn current_session(State(state): State<AppState>) -> Result<Json<AuthSession>, AppError> {
    let session = repository::load_session(&state.db)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(session))
}

async fn logout(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    auth::logout(&state.db).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_courses(
    State(state): State<AppState>,
    token: BearerToken,
) -> Result<Json<Vec<CourseRecord>>, AppError> {
    let courses = DashboardService::from_state(&state).courses(token.as_str()).await?;
    Ok(Json(courses))
}

async fn list_assignments(
    State(state): State<AppState>,
    token: BearerToken,
    Query(query): Query<AssignmentQuery>,
) -> Result<Json<Vec<AssignmentRecord>>, AppError> {
    let assignments = DashboardService::from_state(&state)
        .assignments(token.as_str(), &query, Utc::now())
        .await?;
    Ok(Json(assignments))
}

async fn recommendations(
    State(state): State<AppState>,
    token: BearerToken,
    Query(params): Query<CourseFilterParams>,
) -> Result<Json<Vec<RecommendationBucket>>, AppError> {
    let buckets = DashboardService::from_state(&state)
        .recommendations(token.as_str(), params.course_id, Utc::now())
        .await?;
    Ok(Json(buckets))
}

async fn assignment_summary(
    State(state): State<AppState>,
    token: BearerToken,
    Path(id): Path<i64>,
    Query(params): Query<SummaryParams>,
) -> Result<Json<SummaryResponse>, AppError> {
    let summary = SummaryService::from_state(&state)
        .summary_for(token.as_str(), params.course_id, id, Utc::now())
        .await?;
    Ok(Json(SummaryResponse { summary }))
}

async fn workload(
    State(state): State<AppState>,
    token: BearerToken,
) -> Result<Json<WorkloadStats>, AppError> {
    let stats = DashboardService::from_state(&state)
        .workload(token.as_str(), Utc::now())
        .await?;
    Ok(Json(stats))
}

async fn course_analytics(
    State(state): State<AppState>,
    token: BearerToken,
    Path(course_id): Path<i64>,
) -> Result<Json<CourseAnalytics>, AppError> {
    let analytics = DashboardService::from_state(&state)
        .course_analytics(token.as_str(), course_id, Utc::now())
        .await?;
    Ok(Json(analytics))
}

async fn complete(
    State(state): State<AppState>,
    _token: BearerToken,
    Json(req): Json<CompletionRequest>,
) -> Result<Json<TextResponse>, AppError> {
    if req.prompt.trim().is_empty() {
        return Err(AppError::BadRequest("prompt is required".to_string()));
    }
    let text = state.completer.complete(&req).await?;
    Ok(Json(TextResponse { text }))
}

async fn insights(
    State(state): State<AppState>,
    token: BearerToken,
) -> Result<Json<TextResponse>, AppError> {
    let text = DashboardService::from_state(&state)
        .insights(token.as_str(), Utc::now())
        .await?;
    Ok(Json(TextResponse { text }))
}

async fn planner_snapshot(State(state): State<AppState>) -> Json<PlannerSnapshot> {
    Json(state.planner.snapshot().await)
}

async fn planner_discard(State(state): State<AppState>) -> Json<PlannerSnapshot> {
    Json(state.planner.discard().await)
}

async fn planner_tasks(
    State(state): State<AppState>,
    Json(tasks): Json<Vec<PlannerTask>>,
) -> Json<PlannerSnapshot> {
    Json(state.planner.set_tasks(tasks).await)
}

async fn planner_tasks_from_assignments(
    State(state): State<AppState>,
    token: BearerToken,
    Query(params): Query<CourseFilterParams>,
) -> Result<Json<PlannerSnapshot>, AppError> {
    let query = AssignmentQuery {
        course_id: params.course_id,
        limit: Some(PLANNER_TASK_LIMIT),
        skip_summary: true,
        sort_by: SortKey::DueDate,
        ..Default::default()
    };
    let assignments = DashboardService::from_state(&state)
        .assignments(token.as_str(), &query, Utc::now())
        .await?;
    let work_secs = state.planner.snapshot().await.timer.config.work_secs;
    let tasks = assignments
        .iter()
        .map(|a| PlannerTask::from_assignment(a, work_secs))
        .collect();
    Ok(Json(state.planner.set_tasks(tasks).await))
}

async fn planner_start(State(state): State<AppState>) -> Json<PlannerSnapshot> {
    Json(state.planner.start().await)
}

async fn planner_pause(State(state): State<AppState>) -> Json<PlannerSnapshot> {
    Json(state.planner.pause().await)
}

async fn planner_reset(State(state): State<AppState>) -> Json<PlannerSnapshot> {
    Json(state.planner.reset().await)
}

async fn planner_skip(State(state): State<AppState>) -> Json<PlannerSnapshot> {
    Json(state.planner.skip().await)
}
