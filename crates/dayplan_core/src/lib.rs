pub mod config;
pub mod error;
pub mod extract;
pub mod grid;
pub mod model;
pub mod planner;
pub mod reminder;
pub mod split;

#[cfg(test)]
mod tests {
    use crate::error::CoreError;
    use crate::model::{Priority, Task, TaskStatus};

    #[test]
    fn task_has_required_fields() {
        let task = Task {
            id: "write-report-20251124".to_string(),
            title: "write report".to_string(),
            description: None,
            priority: Priority::Medium,
            duration_minutes: 60,
            due_date: None,
            tags: Vec::new(),
            recurrence: None,
            status: TaskStatus::Pending,
            created_at: "2025-11-24T08:00:00Z".to_string(),
        };

        assert_eq!(task.id, "write-report-20251124");
        assert_eq!(task.title, "write report");
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.duration_minutes, 60);
        assert!(task.tags.is_empty());
        assert_eq!(task.recurrence, None);
    }

    #[test]
    fn core_error_exposes_code() {
        let err = CoreError::invalid_config("work hours must end after they start");
        assert_eq!(err.code(), "invalid_config");

        let err = CoreError::invalid_data("due_date must be RFC3339");
        assert_eq!(err.code(), "invalid_data");

        let err = CoreError::overlap("interval overlaps an occupied span");
        assert_eq!(err.code(), "overlap");
    }
}
