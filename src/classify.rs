//! Pure classification rules over assignment scheduling and scoring fields.
//!
//! Every function takes `now` explicitly so results are reproducible.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const SECS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriorityLabel {
    #[serde(rename = "No Priority")]
    NoPriority,
    Low,
    Medium,
    High,
    Urgent,
}

impl PriorityLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityLabel::NoPriority => "No Priority",
            PriorityLabel::Low => "Low",
            PriorityLabel::Medium => "Medium",
            PriorityLabel::High => "High",
            PriorityLabel::Urgent => "Urgent",
        }
    }
}

impl std::fmt::Display for PriorityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whole days until `due_at`, rounded up. Anything overdue is <= 0.
pub fn days_until_due_ceil(due_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let secs = (due_at - now).num_seconds();
    -(-secs).div_euclid(SECS_PER_DAY)
}

/// Whole days until `due_at`, rounded down.
pub fn days_until_due_floor(due_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (due_at - now).num_seconds().div_euclid(SECS_PER_DAY)
}

pub fn urgency_level(due_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> UrgencyLevel {
    let Some(due_at) = due_at else {
        return UrgencyLevel::Low;
    };
    match days_until_due_ceil(due_at, now) {
        d if d <= 2 => UrgencyLevel::High,
        d if d <= 5 => UrgencyLevel::Medium,
        _ => UrgencyLevel::Low,
    }
}

pub fn priority_label(priority: Option<i32>) -> PriorityLabel {
    match priority {
        None => PriorityLabel::NoPriority,
        Some(p) if p >= 10 => PriorityLabel::Urgent,
        Some(p) if p >= 7 => PriorityLabel::High,
        Some(p) if p >= 4 => PriorityLabel::Medium,
        Some(_) => PriorityLabel::Low,
    }
}

/// Upstream ranking hint attached to each assignment at fetch time.
///
/// Due-date factor: due within a day +10, within 3 days +8, within a week +5,
/// later +2. Points factor (only when points > 0): >100 +5, >50 +3, >20 +2,
/// otherwise +1.
pub fn calculate_priority(
    due_at: Option<DateTime<Utc>>,
    points_possible: Option<f64>,
    now: DateTime<Utc>,
) -> i32 {
    let mut priority = 0;

    if let Some(due_at) = due_at {
        priority += match days_until_due_floor(due_at, now) {
            d if d < 1 => 10,
            d if d < 3 => 8,
            d if d < 7 => 5,
            _ => 2,
        };
    }

    if let Some(points) = points_possible.filter(|p| *p > 0.0) {
        priority += if points > 100.0 {
            5
        } else if points > 50.0 {
            3
        } else if points > 20.0 {
            2
        } else {
            1
        };
    }

    priority
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn no_due_date_is_always_low() {
        assert_eq!(urgency_level(None, now()), UrgencyLevel::Low);
        assert_eq!(urgency_level(None, Utc::now()), UrgencyLevel::Low);
    }

    #[test]
    fn urgency_thresholds() {
        let n = now();
        assert_eq!(urgency_level(Some(n - Duration::days(3)), n), UrgencyLevel::High);
        assert_eq!(urgency_level(Some(n + Duration::hours(1)), n), UrgencyLevel::High);
        assert_eq!(urgency_level(Some(n + Duration::days(2)), n), UrgencyLevel::High);
        assert_eq!(urgency_level(Some(n + Duration::hours(49)), n), UrgencyLevel::Medium);
        assert_eq!(urgency_level(Some(n + Duration::days(5)), n), UrgencyLevel::Medium);
        assert_eq!(urgency_level(Some(n + Duration::days(6)), n), UrgencyLevel::Low);
    }

    #[test]
    fn priority_labels() {
        assert_eq!(priority_label(Some(10)), PriorityLabel::Urgent);
        assert_eq!(priority_label(Some(42)), PriorityLabel::Urgent);
        assert_eq!(priority_label(Some(7)), PriorityLabel::High);
        assert_eq!(priority_label(Some(6)), PriorityLabel::Medium);
        assert_eq!(priority_label(Some(4)), PriorityLabel::Medium);
        assert_eq!(priority_label(Some(3)), PriorityLabel::Low);
        assert_eq!(priority_label(Some(-1)), PriorityLabel::Low);
        assert_eq!(priority_label(None), PriorityLabel::NoPriority);
        assert_eq!(priority_label(None).to_string(), "No Priority");
    }

    #[test]
    fn day_rounding() {
        let n = now();
        assert_eq!(days_until_due_ceil(n + Duration::hours(25), n), 2);
        assert_eq!(days_until_due_floor(n + Duration::hours(25), n), 1);
        assert_eq!(days_until_due_ceil(n - Duration::hours(1), n), 0);
        assert_eq!(days_until_due_floor(n - Duration::hours(1), n), -1);
    }

    #[test]
    fn priority_combines_due_and_points() {
        let n = now();
        assert_eq!(calculate_priority(None, None, n), 0);
        assert_eq!(calculate_priority(Some(n + Duration::hours(5)), Some(150.0), n), 15);
        assert_eq!(calculate_priority(Some(n + Duration::days(2)), Some(60.0), n), 11);
        assert_eq!(calculate_priority(Some(n + Duration::days(4)), Some(25.0), n), 7);
        assert_eq!(calculate_priority(Some(n + Duration::days(30)), Some(5.0), n), 3);
        assert_eq!(calculate_priority(None, Some(0.0), n), 0);
    }
}
