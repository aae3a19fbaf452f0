//! Chart-ready aggregates over assignments and submissions.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::{UrgencyLevel, urgency_level};
use crate::models::{AssignmentRecord, SubmissionRecord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentCompletion {
    pub assignment_id: i64,
    pub assignment_name: String,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseAnalytics {
    pub course_id: i64,
    pub assignment_completion: Vec<AssignmentCompletion>,
    /// Keyed by assignment name; assignments without scores are absent.
    pub grade_distribution: BTreeMap<String, GradeStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UrgencyCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseLoad {
    pub course_id: i64,
    pub course_name: String,
    pub assignments: usize,
    pub points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadStats {
    pub total: usize,
    pub undated: usize,
    pub by_urgency: UrgencyCounts,
    pub by_course: Vec<CourseLoad>,
    pub points_due_this_week: f64,
}

pub fn course_analytics(
    course_id: i64,
    assignments: &[AssignmentRecord],
    submissions: &[SubmissionRecord],
) -> CourseAnalytics {
    let mut assignment_completion = Vec::with_capacity(assignments.len());
    let mut grade_distribution = BTreeMap::new();

    for assignment in assignments.iter().filter(|a| a.course_id == course_id) {
        let subs: Vec<&SubmissionRecord> = submissions
            .iter()
            .filter(|s| s.assignment_id == assignment.id)
            .collect();

        let submitted = subs.iter().filter(|s| s.is_submitted()).count();
        assignment_completion.push(AssignmentCompletion {
            assignment_id: assignment.id,
            assignment_name: assignment.name.clone(),
            completion_rate: submitted as f64 / subs.len().max(1) as f64,
        });

        let scores: Vec<f64> = subs.iter().filter_map(|s| s.score).collect();
        if let Some(stats) = grade_stats(&scores) {
            grade_distribution.insert(assignment.name.clone(), stats);
        }
    }

    CourseAnalytics {
        course_id,
        assignment_completion,
        grade_distribution,
    }
}

fn grade_stats(scores: &[f64]) -> Option<GradeStats> {
    if scores.is_empty() {
        return None;
    }
    let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let avg = scores.iter().sum::<f64>() / scores.len() as f64;
    Some(GradeStats { min, max, avg })
}

pub fn workload(records: &[AssignmentRecord], now: DateTime<Utc>) -> WorkloadStats {
    let week_end = now + Duration::days(7);
    let mut by_urgency = UrgencyCounts::default();
    let mut by_course: Vec<CourseLoad> = Vec::new();
    let mut points_due_this_week = 0.0;
    let mut undated = 0;

    for record in records {
        match urgency_level(record.due_at, now) {
            UrgencyLevel::High => by_urgency.high += 1,
            UrgencyLevel::Medium => by_urgency.medium += 1,
            UrgencyLevel::Low => by_urgency.low += 1,
        }

        match record.due_at {
            Some(due) if due >= now && due < week_end => points_due_this_week += record.points_or_zero(),
            Some(_) => {}
            None => undated += 1,
        }

        match by_course.iter_mut().find(|c| c.course_id == record.course_id) {
            Some(load) => {
                load.assignments += 1;
                load.points += record.points_or_zero();
            }
            None => by_course.push(CourseLoad {
                course_id: record.course_id,
                course_name: record.course_name.clone(),
                assignments: 1,
                points: record.points_or_zero(),
            }),
        }
    }

    WorkloadStats {
        total: records.len(),
        undated,
        by_urgency,
        by_course,
        points_due_this_week,
    }
}
