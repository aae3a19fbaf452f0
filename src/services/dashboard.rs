use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::ai::{Completer, CompletionRequest};
use crate::analytics::{self, CourseAnalytics, WorkloadStats};
use crate::classify::{priority_label, urgency_level};
use crate::error::AppError;
use crate::models::{AssignmentRecord, CourseRecord};
use crate::provider::DataProvider;
use crate::recommend::{self, RecommendationBucket};
use crate::repository;
use crate::services::SummaryService;
use crate::state::AppState;
use crate::view::{self, SortKey, ViewCriteria};

const INSIGHT_ASSIGNMENTS: usize = 10;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignmentQuery {
    pub course_id: Option<i64>,
    pub limit: Option<usize>,
    #[serde(default)]
    pub skip_summary: bool,
    pub search: Option<String>,
    #[serde(default)]
    pub sort_by: SortKey,
}

impl AssignmentQuery {
    fn criteria(&self) -> ViewCriteria {
        ViewCriteria {
            course_id: self.course_id,
            search: self.search.clone(),
            sort_by: self.sort_by,
        }
    }
}

pub struct DashboardService {
    db: SqlitePool,
    provider: Arc<dyn DataProvider>,
    completer: Arc<dyn Completer>,
    summaries: SummaryService,
}

impl DashboardService {
    pub fn from_state(state: &AppState) -> Self {
        Self {
            db: state.db.clone(),
            provider: state.provider.clone(),
            completer: state.completer.clone(),
            summaries: SummaryService::from_state(state),
        }
    }

    pub async fn courses(&self, token: &str) -> Result<Vec<CourseRecord>, AppError> {
        self.provider.fetch_courses(token).await
    }

    /// Fresh records with any cached summaries attached.
    async fn load(
        &self,
        token: &str,
        course_id: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Vec<AssignmentRecord>, AppError> {
        let mut records = self.provider.fetch_assignments(token, course_id, now).await?;
        let keys: Vec<(i64, i64)> = records.iter().map(|r| (r.course_id, r.id)).collect();
        let cached = repository::fetch_summaries_for(&self.db, &keys).await?;
        for record in records.iter_mut() {
            if let Some(summary) = cached.get(&(record.course_id, record.id)) {
                record.attach_summary(summary.clone());
            }
        }
        Ok(records)
    }

    pub async fn assignments(
        &self,
        token: &str,
        query: &AssignmentQuery,
        now: DateTime<Utc>,
    ) -> Result<Vec<AssignmentRecord>, AppError> {
        let records = self.load(token, query.course_id, now).await?;
        let mut view = view::apply_limit(view::apply_view(&records, &query.criteria()), query.limit);

        if !query.skip_summary {
            let mut summarized = 0;
            for record in view.iter_mut().filter(|r| r.summary.is_none() && r.description.is_some()) {
                self.summaries.summarize_record(record).await;
                summarized += 1;
            }
            if summarized > 0 {
                info!("summarized {} assignments", summarized);
            }
        }

        Ok(view)
    }

    pub async fn recommendations(
        &self,
        token: &str,
        course_id: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Vec<RecommendationBucket>, AppError> {
        let records = self.load(token, course_id, now).await?;
        Ok(recommend::bucketize(&records, now))
    }

    pub async fn workload(&self, token: &str, now: DateTime<Utc>) -> Result<WorkloadStats, AppError> {
        let records = self.provider.fetch_assignments(token, None, now).await?;
        Ok(analytics::workload(&records, now))
    }

    pub async fn course_analytics(
        &self,
        token: &str,
        course_id: i64,
        now: DateTime<Utc>,
    ) -> Result<CourseAnalytics, AppError> {
        let records = self.provider.fetch_course_assignments(token, course_id, now).await?;
        let submissions = self.provider.fetch_submissions(token, course_id).await?;
        Ok(analytics::course_analytics(course_id, &records, &submissions))
    }

    pub async fn insights(&self, token: &str, now: DateTime<Utc>) -> Result<String, AppError> {
        let records = self.load(token, None, now).await?;
        if records.is_empty() {
            return Ok("Nothing is due right now.".to_string());
        }
        let prompt = insights_prompt(&records, now);
        self.completer.complete(&CompletionRequest::new(prompt)).await
    }
}

/// Study-plan prompt over the highest-priority assignments.
pub fn insights_prompt(records: &[AssignmentRecord], now: DateTime<Utc>) -> String {
    let ranked = view::apply_view(records, &ViewCriteria::default());
    let mut prompt = String::from(
        "You are a study coach. Given these upcoming assignments, suggest what to work on first \
         and how to split the week. Keep it under 150 words.\n\n",
    );
    for record in ranked.iter().take(INSIGHT_ASSIGNMENTS) {
        let due = record
            .due_at
            .map(|d| d.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| "no due date".to_string());
        let points = record
            .points_possible
            .map(|p| format!("{} pts", p))
            .unwrap_or_else(|| "ungraded".to_string());
        prompt.push_str(&format!(
            "- {} ({}): due {}, {}, priority {}, urgency {:?}\n",
            record.name,
            record.course_name,
            due,
            points,
            priority_label(record.priority),
            urgency_level(record.due_at, now),
        ));
    }
    prompt
}
