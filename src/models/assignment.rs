use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One unit of due coursework as fetched from the LMS.
///
/// Read-only after the fetch except for `summary`, which is attached at most
/// once when an on-demand summary succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub points_possible: Option<f64>,
    pub course_id: i64,
    pub course_name: String,
    /// Ranking hint computed upstream; higher is more important.
    pub priority: Option<i32>,
    pub summary: Option<String>,
}

impl AssignmentRecord {
    pub fn priority_or_zero(&self) -> i32 {
        self.priority.unwrap_or(0)
    }

    pub fn points_or_zero(&self) -> f64 {
        self.points_possible.filter(|p| p.is_finite()).unwrap_or(0.0)
    }

    /// Returns false when a summary is already present; the existing one is kept.
    pub fn attach_summary(&mut self, summary: impl Into<String>) -> bool {
        if self.summary.is_some() {
            return false;
        }
        self.summary = Some(summary.into());
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub assignment_id: i64,
    pub workflow_state: String,
    pub score: Option<f64>,
}

impl SubmissionRecord {
    pub fn is_submitted(&self) -> bool {
        self.workflow_state == "submitted"
    }
}
