use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use super::DataProvider;
use crate::classify::calculate_priority;
use crate::error::AppError;
use crate::models::{AssignmentRecord, AuthSession, CourseRecord, SubmissionRecord};

pub const SAMPLE_TOKEN: &str = "sample-token";
pub const SAMPLE_USER_ID: i64 = 1001;

/// Fixed data set for demos and tests. Due dates are offsets from `anchor`.
pub struct FixedSampleProvider {
    anchor: DateTime<Utc>,
}

struct SampleAssignment {
    id: i64,
    course_id: i64,
    name: &'static str,
    description: Option<&'static str>,
    due_in_days: Option<i64>,
    points: Option<f64>,
    /// Already handed in by the sample student.
    submitted: bool,
}

const COURSES: [(i64, &str, &str); 2] = [
    (101, "Introduction to Biology", "BIO101"),
    (202, "Modern European History", "HIS202"),
];

const ASSIGNMENTS: [SampleAssignment; 6] = [
    SampleAssignment {
        id: 1,
        course_id: 101,
        name: "Cell Structure Worksheet",
        description: Some("Label the organelles."),
        due_in_days: Some(1),
        points: Some(5.0),
        submitted: false,
    },
    SampleAssignment {
        id: 2,
        course_id: 202,
        name: "Research Essay",
        description: Some(
            "<p>Write a 2,000 word essay on the causes of the First World War. \
             Use at least five primary sources, cite them in Chicago style, and \
             submit a one-page outline to the discussion board before the draft.</p>",
        ),
        due_in_days: Some(10),
        points: Some(20.0),
        submitted: false,
    },
    SampleAssignment {
        id: 3,
        course_id: 101,
        name: "Lab Safety Reading",
        description: None,
        due_in_days: None,
        points: Some(3.0),
        submitted: false,
    },
    SampleAssignment {
        id: 4,
        course_id: 202,
        name: "Map Quiz",
        description: Some("Twenty capitals, ten minutes."),
        due_in_days: Some(2),
        points: Some(12.0),
        submitted: false,
    },
    SampleAssignment {
        id: 5,
        course_id: 101,
        name: "Microscope Lab Report",
        description: None,
        due_in_days: Some(6),
        points: Some(8.0),
        submitted: false,
    },
    SampleAssignment {
        id: 6,
        course_id: 101,
        name: "Photosynthesis Quiz",
        description: Some("Ten questions on the light reactions."),
        due_in_days: Some(-2),
        points: Some(10.0),
        submitted: true,
    },
];

const SUBMISSIONS: [(i64, &str, Option<f64>); 8] = [
    (1, "submitted", Some(4.0)),
    (1, "submitted", Some(5.0)),
    (1, "unsubmitted", None),
    (3, "submitted", Some(3.0)),
    (5, "unsubmitted", None),
    (2, "submitted", Some(17.5)),
    (6, "submitted", Some(9.0)),
    (6, "submitted", Some(7.0)),
];

impl FixedSampleProvider {
    pub fn new(anchor: DateTime<Utc>) -> Self {
        Self { anchor }
    }

    fn course_name(course_id: i64) -> &'static str {
        COURSES
            .iter()
            .find(|(id, _, _)| *id == course_id)
            .map(|(_, name, _)| *name)
            .unwrap_or_default()
    }

    fn record(&self, sample: &SampleAssignment, now: DateTime<Utc>) -> AssignmentRecord {
        let due_at = sample.due_in_days.map(|d| self.anchor + Duration::days(d));
        AssignmentRecord {
            id: sample.id,
            name: sample.name.to_string(),
            description: sample.description.map(str::to_string),
            due_at,
            points_possible: sample.points,
            course_id: sample.course_id,
            course_name: Self::course_name(sample.course_id).to_string(),
            priority: Some(calculate_priority(due_at, sample.points, now)),
            summary: None,
        }
    }

    fn known_course(course_id: i64) -> Result<(), AppError> {
        if COURSES.iter().any(|(id, _, _)| *id == course_id) {
            Ok(())
        } else {
            Err(AppError::NotFound)
        }
    }
}

#[async_trait]
impl DataProvider for FixedSampleProvider {
    async fn fetch_courses(&self, _token: &str) -> Result<Vec<CourseRecord>, AppError> {
        Ok(COURSES
            .iter()
            .map(|(id, name, code)| CourseRecord {
                id: *id,
                name: name.to_string(),
                code: code.to_string(),
                start_at: None,
                end_at: None,
            })
            .collect())
    }

    async fn fetch_assignments(
        &self,
        _token: &str,
        course_id: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Vec<AssignmentRecord>, AppError> {
        if let Some(id) = course_id {
            Self::known_course(id)?;
        }
        Ok(ASSIGNMENTS
            .iter()
            .filter(|a| !a.submitted && course_id.is_none_or(|id| a.course_id == id))
            .map(|a| self.record(a, now))
            .collect())
    }

    async fn fetch_course_assignments(
        &self,
        _token: &str,
        course_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<AssignmentRecord>, AppError> {
        Self::known_course(course_id)?;
        Ok(ASSIGNMENTS
            .iter()
            .filter(|a| a.course_id == course_id)
            .map(|a| self.record(a, now))
            .collect())
    }

    async fn fetch_assignment(
        &self,
        _token: &str,
        course_id: i64,
        assignment_id: i64,
        now: DateTime<Utc>,
    ) -> Result<AssignmentRecord, AppError> {
        ASSIGNMENTS
            .iter()
            .find(|a| a.course_id == course_id && a.id == assignment_id)
            .map(|a| self.record(a, now))
            .ok_or(AppError::NotFound)
    }

    async fn fetch_submissions(
        &self,
        _token: &str,
        course_id: i64,
    ) -> Result<Vec<SubmissionRecord>, AppError> {
        Self::known_course(course_id)?;
        Ok(SUBMISSIONS
            .iter()
            .filter(|(assignment_id, _, _)| {
                ASSIGNMENTS
                    .iter()
                    .any(|a| a.id == *assignment_id && a.course_id == course_id)
            })
            .map(|(assignment_id, state, score)| SubmissionRecord {
                assignment_id: *assignment_id,
                workflow_state: state.to_string(),
                score: *score,
            })
            .collect())
    }

    async fn exchange_code(&self, code: &str, _redirect_uri: &str) -> Result<AuthSession, AppError> {
        if code.trim().is_empty() {
            return Err(AppError::BadRequest("authorization code is empty".to_string()));
        }
        Ok(AuthSession {
            token: SAMPLE_TOKEN.to_string(),
            user_id: SAMPLE_USER_ID,
        })
    }
}
