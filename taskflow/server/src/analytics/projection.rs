//! Task attributes and derived productivity metrics kept on an analytics record.
//!
//! Everything here is pure so the scoring rules can be checked without a database.

use chrono::{DateTime, Utc};

use crate::entities::analytics;
use crate::entities::sea_orm_active_enums::{TaskPriority, TaskStatus};
use crate::task::Task;

pub const BASE_SCORE: i32 = 50;
pub const MIN_SCORE: i32 = 0;
pub const MAX_SCORE: i32 = 100;

/// Stored completion time meaning "not captured yet".
pub const UNCAPTURED_COMPLETION_TIME: i32 = 0;

const MILLIS_PER_MINUTE: f64 = 60_000.0;

/// Minutes between creation and the last update, rounded half away from zero.
pub fn completion_minutes(created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> i32 {
    let elapsed_ms = (updated_at - created_at).num_milliseconds() as f64;
    (elapsed_ms / MILLIS_PER_MINUTE).round() as i32
}

/// Productivity score of a completed task, always within `MIN_SCORE..=MAX_SCORE`.
pub fn productivity_score(
    priority: TaskPriority,
    completion_time: i32,
    due_date: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
) -> i32 {
    let mut score = BASE_SCORE;

    score += match priority {
        TaskPriority::High => 20,
        TaskPriority::Low => -10,
        TaskPriority::Medium => 0,
    };

    score += match completion_time {
        t if t <= 0 => 0,
        1..=60 => 20,
        61..=120 => 10,
        _ => -10,
    };

    if due_date.is_some_and(|due| due >= updated_at) {
        score += 10;
    }

    score.clamp(MIN_SCORE, MAX_SCORE)
}

/// What changed on a projection during [`TaskProjection::refresh`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub captured_completion_time: Option<i32>,
    pub recomputed_score: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskProjection {
    pub category: Option<String>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub completion_time: i32,
    pub productivity_score: Option<i32>,
}

impl TaskProjection {
    /// Starts a projection for a task that has no analytics record yet.
    pub fn for_task(task: &Task) -> Self {
        Self {
            category: task.category().map(str::to_string),
            priority: task.priority(),
            status: task.status(),
            completion_time: UNCAPTURED_COMPLETION_TIME,
            productivity_score: None,
        }
    }

    /// Copies the task's attributes and updates the derived metrics.
    ///
    /// The completion time is captured once, on the first refresh that sees the
    /// task completed while the sentinel is still stored. The score is recomputed
    /// on every refresh of a completed task and left alone otherwise.
    pub fn refresh(&mut self, task: &Task) -> RefreshOutcome {
        let mut outcome = RefreshOutcome::default();

        self.category = task.category().map(str::to_string);
        self.priority = task.priority();
        self.status = task.status();

        if !task.is_completed() {
            return outcome;
        }

        if self.completion_time == UNCAPTURED_COMPLETION_TIME {
            self.completion_time = completion_minutes(task.created_at(), task.updated_at());
            outcome.captured_completion_time = Some(self.completion_time);
        }

        let score = productivity_score(
            self.priority,
            self.completion_time,
            task.due_date(),
            task.updated_at(),
        );
        self.productivity_score = Some(score);
        outcome.recomputed_score = Some(score);

        outcome
    }
}

impl From<&analytics::Model> for TaskProjection {
    fn from(model: &analytics::Model) -> Self {
        Self {
            category: model.category.clone(),
            priority: model.priority,
            status: model.status,
            completion_time: model.completion_time,
            productivity_score: model.productivity_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::task;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    fn task_model(status: TaskStatus, minutes: i64) -> task::Model {
        task::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Write report".to_string(),
            description: None,
            priority: TaskPriority::Medium,
            status,
            category: Some("Work".to_string()),
            due_date: None,
            ai_suggestions: serde_json::json!({}),
            created_at: t0(),
            updated_at: t0() + Duration::minutes(minutes),
        }
    }

    #[test]
    fn rounds_completion_minutes_to_nearest() {
        assert_eq!(completion_minutes(t0(), t0() + Duration::seconds(29)), 0);
        assert_eq!(completion_minutes(t0(), t0() + Duration::seconds(30)), 1);
        assert_eq!(completion_minutes(t0(), t0() + Duration::seconds(89)), 1);
        assert_eq!(completion_minutes(t0(), t0() + Duration::minutes(45)), 45);
    }

    #[test]
    fn can_score_fast_high_priority_task_before_due_date() {
        let updated_at = t0() + Duration::minutes(30);
        let due = Some(t0() + Duration::days(1));

        assert_eq!(productivity_score(TaskPriority::High, 30, due, updated_at), 100);
    }

    #[test]
    fn can_score_slow_low_priority_task_without_due_date() {
        assert_eq!(productivity_score(TaskPriority::Low, 200, None, t0()), 30);
    }

    #[test]
    fn can_score_medium_task_in_second_hour_past_due() {
        let updated_at = t0() + Duration::minutes(90);
        let due = Some(t0());

        assert_eq!(productivity_score(TaskPriority::Medium, 90, due, updated_at), 60);
    }

    #[test]
    fn gives_no_duration_bonus_for_zero_minutes() {
        assert_eq!(productivity_score(TaskPriority::Medium, 0, None, t0()), 50);
    }

    #[test]
    fn counts_due_date_equal_to_update_as_on_time() {
        assert_eq!(productivity_score(TaskPriority::Medium, 0, Some(t0()), t0()), 60);
    }

    #[test]
    fn keeps_score_within_bounds() {
        let priorities = [TaskPriority::Low, TaskPriority::Medium, TaskPriority::High];
        for priority in priorities {
            for completion_time in [0, 1, 59, 60, 61, 120, 121, 10_000] {
                for due in [None, Some(t0() - Duration::days(1)), Some(t0() + Duration::days(1))] {
                    let score = productivity_score(priority, completion_time, due, t0());
                    assert!((MIN_SCORE..=MAX_SCORE).contains(&score));
                }
            }
        }
    }

    #[test]
    fn pending_task_copies_attributes_without_metrics() {
        let task = Task::from(task_model(TaskStatus::Pending, 45));
        let mut projection = TaskProjection::for_task(&task);

        let outcome = projection.refresh(&task);

        assert_eq!(outcome, RefreshOutcome::default());
        assert_eq!(projection.category.as_deref(), Some("Work"));
        assert_eq!(projection.completion_time, UNCAPTURED_COMPLETION_TIME);
        assert_eq!(projection.productivity_score, None);
    }

    #[test]
    fn completed_task_captures_completion_time_once() {
        let first = Task::from(task_model(TaskStatus::Completed, 45));
        let mut projection = TaskProjection::for_task(&first);

        let outcome = projection.refresh(&first);
        assert_eq!(outcome.captured_completion_time, Some(45));
        assert_eq!(outcome.recomputed_score, Some(70));

        let later = Task::from(task_model(TaskStatus::Completed, 300));
        let outcome = projection.refresh(&later);

        assert_eq!(outcome.captured_completion_time, None);
        assert_eq!(projection.completion_time, 45);
        assert_eq!(projection.productivity_score, Some(70));
    }

    #[test]
    fn regression_to_pending_keeps_metrics() {
        let completed = Task::from(task_model(TaskStatus::Completed, 45));
        let mut projection = TaskProjection::for_task(&completed);
        projection.refresh(&completed);

        let reopened = Task::from(task_model(TaskStatus::Pending, 50));
        projection.refresh(&reopened);

        assert_eq!(projection.status, TaskStatus::Pending);
        assert_eq!(projection.completion_time, 45);
        assert_eq!(projection.productivity_score, Some(70));
    }

    #[test]
    fn zero_minute_completion_is_recaptured_on_next_refresh() {
        let instant = Task::from(task_model(TaskStatus::Completed, 0));
        let mut projection = TaskProjection::for_task(&instant);
        projection.refresh(&instant);
        assert_eq!(projection.completion_time, 0);

        let edited = Task::from(task_model(TaskStatus::Completed, 30));
        let outcome = projection.refresh(&edited);

        assert_eq!(outcome.captured_completion_time, Some(30));
        assert_eq!(projection.completion_time, 30);
    }
}
