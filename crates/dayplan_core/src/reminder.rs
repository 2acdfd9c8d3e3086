use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

use crate::error::CoreError;
use crate::model::{Schedule, Task, TaskStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub task_id: String,
    pub start: String,
    pub minutes_until_start: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverdueNotice {
    pub task_id: String,
    pub due_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderReport {
    pub alerts: Vec<Alert>,
    pub overdue: Vec<OverdueNotice>,
    pub tick_time: String,
}

/// Reads a produced schedule and the task records to compute upcoming-start
/// alerts and overdue notices. Read-only; delivery and cross-call dedup
/// belong to the reminder collaborator.
pub fn check_reminders(
    schedule: &Schedule,
    tasks: &[Task],
    alert_window_minutes: u32,
    now: OffsetDateTime,
) -> Result<ReminderReport, CoreError> {
    let cutoff = now + Duration::minutes(i64::from(alert_window_minutes));

    let mut alerts: Vec<Alert> = Vec::new();
    for block in &schedule.blocks {
        let Some(task_id) = block.task_id.as_deref() else {
            continue;
        };
        if alerts.iter().any(|alert| alert.task_id == task_id) {
            continue;
        }
        let start = OffsetDateTime::parse(&block.start, &Rfc3339)
            .map_err(|_| CoreError::invalid_data("schedule block start must be RFC3339"))?;
        if start >= now && start <= cutoff {
            alerts.push(Alert {
                task_id: task_id.to_string(),
                start: block.start.clone(),
                minutes_until_start: (start - now).whole_minutes(),
            });
        }
    }

    let mut overdue = Vec::new();
    for task in tasks {
        if task.status == TaskStatus::Completed {
            continue;
        }
        let Some(raw) = task.due_date.as_deref() else {
            continue;
        };
        let due = OffsetDateTime::parse(raw, &Rfc3339).map_err(|_| {
            CoreError::invalid_data(format!("task {}: due_date must be RFC3339", task.id))
        })?;
        if due < now {
            overdue.push(OverdueNotice {
                task_id: task.id.clone(),
                due_date: raw.to_string(),
            });
        }
    }

    let tick_time = now
        .format(&Rfc3339)
        .map_err(|err| CoreError::invalid_data(err.to_string()))?;

    Ok(ReminderReport {
        alerts,
        overdue,
        tick_time,
    })
}
