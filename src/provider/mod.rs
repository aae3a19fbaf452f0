pub mod dto;
pub mod live;
pub mod sample;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::config::{AppConfig, ProviderKind};
use crate::error::AppError;
use crate::models::{AssignmentRecord, AuthSession, CourseRecord, SubmissionRecord};

pub use live::LiveProvider;
pub use sample::FixedSampleProvider;

/// Source of LMS records. One implementation is picked at startup.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Active courses visible to the token holder.
    async fn fetch_courses(&self, token: &str) -> Result<Vec<CourseRecord>, AppError>;

    /// Open assignments, for one course or for every active course. Each
    /// record carries a priority computed against `now`.
    async fn fetch_assignments(
        &self,
        token: &str,
        course_id: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Vec<AssignmentRecord>, AppError>;

    /// Every assignment in one course, including ones already submitted.
    async fn fetch_course_assignments(
        &self,
        token: &str,
        course_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<AssignmentRecord>, AppError>;

    async fn fetch_assignment(
        &self,
        token: &str,
        course_id: i64,
        assignment_id: i64,
        now: DateTime<Utc>,
    ) -> Result<AssignmentRecord, AppError>;

    async fn fetch_submissions(
        &self,
        token: &str,
        course_id: i64,
    ) -> Result<Vec<SubmissionRecord>, AppError>;

    /// Trades an OAuth authorization code for a bearer token.
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<AuthSession, AppError>;
}

pub fn from_config(config: &AppConfig) -> Result<Arc<dyn DataProvider>, AppError> {
    let provider: Arc<dyn DataProvider> = match config.provider {
        ProviderKind::Live => Arc::new(LiveProvider::new(config.canvas.clone())?),
        ProviderKind::Sample => Arc::new(FixedSampleProvider::new(Utc::now())),
    };
    Ok(provider)
}
