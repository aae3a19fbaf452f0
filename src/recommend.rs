use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::AssignmentRecord;

pub const BUCKET_SIZE: usize = 3;
const URGENT_WINDOW_DAYS: i64 = 3;
const HIGH_IMPACT_POINTS_FLOOR: f64 = 10.0;
const QUICK_WIN_POINTS_CEILING: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketKind {
    Urgent,
    HighImpact,
    QuickWin,
}

impl BucketKind {
    fn title(&self) -> &'static str {
        match self {
            BucketKind::Urgent => "Urgent",
            BucketKind::HighImpact => "High Impact",
            BucketKind::QuickWin => "Quick Wins",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            BucketKind::Urgent => "Due within the next 3 days",
            BucketKind::HighImpact => "Worth more than 10 points",
            BucketKind::QuickWin => "Small assignments you can finish quickly",
        }
    }

    fn icon(&self) -> &'static str {
        match self {
            BucketKind::Urgent => "alarm-clock",
            BucketKind::HighImpact => "trophy",
            BucketKind::QuickWin => "zap",
        }
    }

    fn color(&self) -> &'static str {
        match self {
            BucketKind::Urgent => "red",
            BucketKind::HighImpact => "purple",
            BucketKind::QuickWin => "green",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationBucket {
    pub kind: BucketKind,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub color: String,
    pub assignments: Vec<AssignmentRecord>,
}

impl RecommendationBucket {
    fn new(kind: BucketKind, assignments: Vec<AssignmentRecord>) -> Self {
        Self {
            kind,
            title: kind.title().to_string(),
            description: kind.description().to_string(),
            icon: kind.icon().to_string(),
            color: kind.color().to_string(),
            assignments,
        }
    }
}

/// Greedy three-pass partition: urgent, then high impact, then quick wins.
///
/// Each pass only sees records no earlier pass placed, so an assignment lands
/// in at most one bucket. Empty buckets are left out.
pub fn bucketize(records: &[AssignmentRecord], now: DateTime<Utc>) -> Vec<RecommendationBucket> {
    let mut used: HashSet<(i64, i64)> = HashSet::new();
    let mut buckets = Vec::new();
    let urgent_cutoff = now + Duration::days(URGENT_WINDOW_DAYS);

    let mut urgent: Vec<&AssignmentRecord> = records
        .iter()
        .filter(|r| r.due_at.is_some_and(|due| due < urgent_cutoff))
        .collect();
    urgent.sort_by_key(|r| r.due_at);
    push_bucket(&mut buckets, &mut used, BucketKind::Urgent, urgent);

    let mut high_impact: Vec<&AssignmentRecord> = records
        .iter()
        .filter(|r| !used.contains(&key(r)))
        .filter(|r| r.points_or_zero() > HIGH_IMPACT_POINTS_FLOOR)
        .collect();
    high_impact.sort_by(|a, b| b.points_or_zero().total_cmp(&a.points_or_zero()));
    push_bucket(&mut buckets, &mut used, BucketKind::HighImpact, high_impact);

    let mut quick_wins: Vec<&AssignmentRecord> = records
        .iter()
        .filter(|r| !used.contains(&key(r)))
        .filter(|r| {
            let points = r.points_or_zero();
            points > 0.0 && points <= QUICK_WIN_POINTS_CEILING
        })
        .collect();
    quick_wins.sort_by(|a, b| a.points_or_zero().total_cmp(&b.points_or_zero()));
    push_bucket(&mut buckets, &mut used, BucketKind::QuickWin, quick_wins);

    buckets
}

// Ids are only unique within a course.
fn key(record: &AssignmentRecord) -> (i64, i64) {
    (record.course_id, record.id)
}

fn push_bucket(
    buckets: &mut Vec<RecommendationBucket>,
    used: &mut HashSet<(i64, i64)>,
    kind: BucketKind,
    candidates: Vec<&AssignmentRecord>,
) {
    let picked: Vec<AssignmentRecord> = candidates
        .into_iter()
        .filter(|r| used.insert(key(r)))
        .take(BUCKET_SIZE)
        .cloned()
        .collect();
    if !picked.is_empty() {
        buckets.push(RecommendationBucket::new(kind, picked));
    }
}
