use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::ai::summarize::strip_html;
use crate::ai::{Completer, NO_DESCRIPTION, SUMMARY_UNAVAILABLE, summarize_content};
use crate::error::AppError;
use crate::models::AssignmentRecord;
use crate::provider::DataProvider;
use crate::repository;
use crate::state::AppState;

/// On-demand assignment summaries, cached once per assignment.
pub struct SummaryService {
    db: SqlitePool,
    provider: Arc<dyn DataProvider>,
    completer: Arc<dyn Completer>,
    timeout: Duration,
}

impl SummaryService {
    pub fn new(
        db: SqlitePool,
        provider: Arc<dyn DataProvider>,
        completer: Arc<dyn Completer>,
        timeout: Duration,
    ) -> Self {
        Self { db, provider, completer, timeout }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.db.clone(),
            state.provider.clone(),
            state.completer.clone(),
            state.config.summary_timeout,
        )
    }

    /// Errors only when the assignment itself can't be loaded; a failed
    /// summarization yields the placeholder text.
    pub async fn summary_for(
        &self,
        token: &str,
        course_id: i64,
        assignment_id: i64,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        if let Some(cached) = repository::fetch_summary(&self.db, course_id, assignment_id).await? {
            return Ok(cached);
        }
        let mut record = self
            .provider
            .fetch_assignment(token, course_id, assignment_id, now)
            .await?;
        Ok(self.summarize_record(&mut record).await)
    }

    pub async fn summarize_record(&self, record: &mut AssignmentRecord) -> String {
        if let Some(summary) = &record.summary {
            return summary.clone();
        }
        // Markup-only descriptions have nothing to summarize.
        let Some(description) = record
            .description
            .as_deref()
            .filter(|d| !strip_html(d).is_empty())
        else {
            return NO_DESCRIPTION.to_string();
        };

        let outcome = tokio::time::timeout(
            self.timeout,
            summarize_content(self.completer.as_ref(), description),
        )
        .await
        .unwrap_or(Err(AppError::Timeout));

        match outcome {
            Ok(summary) => {
                match repository::insert_summary(&self.db, record.course_id, record.id, &summary).await {
                    Ok(true) => info!("cached summary for assignment {}/{}", record.course_id, record.id),
                    Ok(false) => {}
                    Err(e) => warn!("Failed to cache summary for {}: {}", record.id, e),
                }
                record.attach_summary(summary.clone());
                summary
            }
            Err(e) => {
                warn!("Summary for assignment {} unavailable: {}", record.id, e);
                SUMMARY_UNAVAILABLE.to_string()
            }
        }
    }
}
