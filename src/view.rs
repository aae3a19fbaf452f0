use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::AssignmentRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Priority,
    DueDate,
    Points,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewCriteria {
    pub course_id: Option<i64>,
    pub search: Option<String>,
    #[serde(default)]
    pub sort_by: SortKey,
}

impl ViewCriteria {
    /// Search matches the assignment name or its course name, case-insensitively.
    fn matches(&self, record: &AssignmentRecord, needle: Option<&str>) -> bool {
        if let Some(course_id) = self.course_id {
            if record.course_id != course_id {
                return false;
            }
        }
        match needle {
            None => true,
            Some(needle) => {
                record.name.to_lowercase().contains(needle)
                    || record.course_name.to_lowercase().contains(needle)
            }
        }
    }
}

/// Filtered, stably sorted copy of `records`. The input is never touched.
pub fn apply_view(records: &[AssignmentRecord], criteria: &ViewCriteria) -> Vec<AssignmentRecord> {
    let needle = criteria
        .search
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(str::to_lowercase);

    let mut view: Vec<AssignmentRecord> = records
        .iter()
        .filter(|r| criteria.matches(r, needle.as_deref()))
        .cloned()
        .collect();

    sort_records(&mut view, criteria.sort_by);
    view
}

pub fn sort_records(records: &mut [AssignmentRecord], sort_by: SortKey) {
    match sort_by {
        SortKey::Priority => records.sort_by(|a, b| b.priority_or_zero().cmp(&a.priority_or_zero())),
        SortKey::DueDate => records.sort_by(|a, b| match (a.due_at, b.due_at) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }),
        SortKey::Points => records.sort_by(|a, b| b.points_or_zero().total_cmp(&a.points_or_zero())),
    }
}

pub fn apply_limit(mut records: Vec<AssignmentRecord>, limit: Option<usize>) -> Vec<AssignmentRecord> {
    if let Some(limit) = limit {
        records.truncate(limit);
    }
    records
}
