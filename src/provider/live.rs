use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{DataProvider, dto};
use crate::ai::summarize::strip_html;
use crate::classify::calculate_priority;
use crate::config::CanvasConfig;
use crate::error::AppError;
use crate::models::{AssignmentRecord, AuthSession, CourseRecord, SubmissionRecord};

const PAGE_SIZE: u32 = 100;

/// Canvas REST client.
pub struct LiveProvider {
    client: Client,
    config: CanvasConfig,
}

impl LiveProvider {
    pub fn new(config: CanvasConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client, config })
    }

    async fn get_json<T: DeserializeOwned>(&self, token: &str, path: &str) -> Result<T, AppError> {
        let url = self.config.api_url(path);
        debug!("GET {}", url);

        let response = self.client
            .get(&url)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::upstream(status, format!("Canvas API error {}: {}", status, body)));
        }

        let body_text = response.text().await?;
        serde_json::from_str::<T>(&body_text).map_err(|e| {
            tracing::error!("Failed to parse Canvas response from {}: {}", path, e);
            AppError::upstream(
                reqwest::StatusCode::BAD_GATEWAY,
                format!("Failed to parse Canvas response: {}", e),
            )
        })
    }

    async fn fetch_course(&self, token: &str, course_id: i64) -> Result<dto::CanvasCourse, AppError> {
        self.get_json(token, &format!("/courses/{}", course_id)).await
    }

    async fn list_course_assignments(
        &self,
        token: &str,
        course_id: i64,
        course_name: &str,
        now: DateTime<Utc>,
        open_only: bool,
    ) -> Result<Vec<AssignmentRecord>, AppError> {
        let assignments: Vec<dto::CanvasAssignment> = self
            .get_json(
                token,
                &format!("/courses/{}/assignments?include[]=submission&per_page={}", course_id, PAGE_SIZE),
            )
            .await?;

        Ok(to_records(assignments, course_id, course_name, now, open_only))
    }
}

fn to_records(
    assignments: Vec<dto::CanvasAssignment>,
    course_id: i64,
    course_name: &str,
    now: DateTime<Utc>,
    open_only: bool,
) -> Vec<AssignmentRecord> {
    assignments
        .into_iter()
        .filter(|a| !open_only || !is_submitted(a))
        .map(|a| to_record(a, course_id, course_name, now))
        .collect()
}

fn is_submitted(assignment: &dto::CanvasAssignment) -> bool {
    assignment
        .submission
        .as_ref()
        .and_then(|s| s.workflow_state.as_deref())
        == Some("submitted")
}

fn to_record(
    assignment: dto::CanvasAssignment,
    course_id: i64,
    course_name: &str,
    now: DateTime<Utc>,
) -> AssignmentRecord {
    let priority = calculate_priority(assignment.due_at, assignment.points_possible, now);
    AssignmentRecord {
        id: assignment.id,
        name: assignment.name,
        description: assignment.description.filter(|d| !strip_html(d).is_empty()),
        due_at: assignment.due_at,
        points_possible: assignment.points_possible,
        course_id,
        course_name: course_name.to_string(),
        priority: Some(priority),
        summary: None,
    }
}

fn to_course(course: dto::CanvasCourse) -> CourseRecord {
    CourseRecord {
        id: course.id,
        name: course.name.unwrap_or_default(),
        code: course.course_code.unwrap_or_default(),
        start_at: course.start_at,
        end_at: course.end_at,
    }
}

#[async_trait]
impl DataProvider for LiveProvider {
    async fn fetch_courses(&self, token: &str) -> Result<Vec<CourseRecord>, AppError> {
        let courses: Vec<dto::CanvasCourse> = self
            .get_json(token, &format!("/courses?enrollment_state=active&per_page={}", PAGE_SIZE))
            .await?;

        Ok(courses
            .into_iter()
            .filter(|c| !c.access_restricted_by_date.unwrap_or(false))
            .map(to_course)
            .collect())
    }

    async fn fetch_assignments(
        &self,
        token: &str,
        course_id: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Vec<AssignmentRecord>, AppError> {
        let courses: Vec<(i64, String)> = match course_id {
            Some(id) => {
                let course = self.fetch_course(token, id).await?;
                vec![(course.id, course.name.unwrap_or_default())]
            }
            None => self
                .fetch_courses(token)
                .await?
                .into_iter()
                .map(|c| (c.id, c.name))
                .collect(),
        };

        let mut records = Vec::new();
        for (id, name) in courses {
            match self.list_course_assignments(token, id, &name, now, true).await {
                Ok(mut course_records) => records.append(&mut course_records),
                Err(e) => {
                    warn!("Skipping assignments for course {}: {}", id, e);
                }
            }
        }
        Ok(records)
    }

    async fn fetch_course_assignments(
        &self,
        token: &str,
        course_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<AssignmentRecord>, AppError> {
        let course = self.fetch_course(token, course_id).await?;
        let course_name = course.name.unwrap_or_default();
        self.list_course_assignments(token, course.id, &course_name, now, false)
            .await
    }

    async fn fetch_assignment(
        &self,
        token: &str,
        course_id: i64,
        assignment_id: i64,
        now: DateTime<Utc>,
    ) -> Result<AssignmentRecord, AppError> {
        let assignment: dto::CanvasAssignment = self
            .get_json(token, &format!("/courses/{}/assignments/{}", course_id, assignment_id))
            .await?;
        let course_name = match self.fetch_course(token, course_id).await {
            Ok(course) => course.name.unwrap_or_default(),
            Err(e) => {
                warn!("Course {} name unavailable: {}", course_id, e);
                String::new()
            }
        };
        Ok(to_record(assignment, course_id, &course_name, now))
    }

    async fn fetch_submissions(
        &self,
        token: &str,
        course_id: i64,
    ) -> Result<Vec<SubmissionRecord>, AppError> {
        let submissions: Vec<dto::CanvasSubmission> = self
            .get_json(
                token,
                &format!("/courses/{}/students/submissions?per_page={}", course_id, PAGE_SIZE),
            )
            .await?;

        Ok(submissions
            .into_iter()
            .filter_map(|s| {
                Some(SubmissionRecord {
                    assignment_id: s.assignment_id?,
                    workflow_state: s.workflow_state.unwrap_or_default(),
                    score: s.score,
                })
            })
            .collect())
    }

    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<AuthSession, AppError> {
        let (Some(client_id), Some(client_secret)) =
            (self.config.client_id.as_deref(), self.config.client_secret.as_deref())
        else {
            return Err(AppError::Config(
                "CANVAS_CLIENT_ID and CANVAS_CLIENT_SECRET must be set for OAuth".to_string(),
            ));
        };

        let request_body = dto::TokenRequest {
            grant_type: "authorization_code",
            client_id,
            client_secret,
            redirect_uri,
            code,
        };

        let response = self.client
            .post(self.config.oauth_token_url())
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::upstream(status, format!("OAuth exchange failed {}: {}", status, body)));
        }

        let token: dto::TokenResponse = response.json().await?;
        let user_id = token
            .user
            .map(|u| u.id)
            .ok_or_else(|| AppError::upstream(reqwest::StatusCode::BAD_GATEWAY, "OAuth response had no user"))?;

        Ok(AuthSession {
            token: token.access_token,
            user_id,
        })
    }
}
