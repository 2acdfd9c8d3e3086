use serde::{Deserialize, Serialize};

/// A structured task record. Datetime fields hold RFC3339 strings and are
/// parsed where they are used; malformed values surface as `invalid_data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub priority: Priority,
    pub duration_minutes: u32,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub recurrence: Option<Recurrence>,
    pub status: TaskStatus,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Scheduling rank: lower sorts first.
    pub fn rank(self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    Daily,
    Weekly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Scheduled,
    Completed,
    Overdue,
}

#[cfg(test)]
mod tests {
    use super::{Priority, Task, TaskStatus};

    #[test]
    fn priority_rank_orders_high_first() {
        assert!(Priority::High.rank() < Priority::Medium.rank());
        assert!(Priority::Medium.rank() < Priority::Low.rank());
    }

    #[test]
    fn task_serializes_with_snake_case_enums() {
        let task = Task {
            id: "write-report-20251124".to_string(),
            title: "write report".to_string(),
            description: None,
            priority: Priority::Medium,
            duration_minutes: 60,
            due_date: None,
            tags: vec!["work".to_string()],
            recurrence: None,
            status: TaskStatus::Pending,
            created_at: "2025-11-24T08:00:00Z".to_string(),
        };

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["priority"], "medium");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["recurrence"], serde_json::Value::Null);
    }

    #[test]
    fn task_deserializes_with_missing_optional_fields() {
        let raw = r#"{
            "id": "call-bank-20251124",
            "title": "call bank",
            "priority": "high",
            "duration_minutes": 30,
            "status": "pending",
            "created_at": "2025-11-24T08:00:00Z"
        }"#;

        let task: Task = serde_json::from_str(raw).unwrap();
        assert_eq!(task.description, None);
        assert_eq!(task.due_date, None);
        assert!(task.tags.is_empty());
        assert_eq!(task.recurrence, None);
    }
}
