use serde::{Deserialize, Serialize};

/// One placed span. `task_id` is `None` for break blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleBlock {
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub task_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnscheduledTask {
    pub task_id: String,
    pub reason: String,
}

/// The plan for a single date: non-overlapping blocks in ascending start
/// order plus the tasks that could not be placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub date: String,
    pub blocks: Vec<ScheduleBlock>,
    pub unscheduled: Vec<UnscheduledTask>,
}

#[cfg(test)]
mod tests {
    use super::{Schedule, ScheduleBlock, UnscheduledTask};

    #[test]
    fn schedule_serializes_to_wire_shape() {
        let schedule = Schedule {
            date: "2025-11-24".to_string(),
            blocks: vec![
                ScheduleBlock {
                    start: "2025-11-24T09:00:00Z".to_string(),
                    end: "2025-11-24T10:00:00Z".to_string(),
                    task_id: Some("write-report-20251124".to_string()),
                },
                ScheduleBlock {
                    start: "2025-11-24T10:00:00Z".to_string(),
                    end: "2025-11-24T10:15:00Z".to_string(),
                    task_id: None,
                },
            ],
            unscheduled: vec![UnscheduledTask {
                task_id: "long-audit-20251124".to_string(),
                reason: "no_available_slot".to_string(),
            }],
        };

        let json = serde_json::to_value(&schedule).unwrap();
        assert_eq!(json["date"], "2025-11-24");
        assert_eq!(json["blocks"][1]["task_id"], serde_json::Value::Null);
        assert_eq!(json["unscheduled"][0]["reason"], "no_available_slot");
    }
}
