use log::{debug, warn};
use time::format_description::well_known::Rfc3339;
use time::{Date, Duration, OffsetDateTime, UtcOffset};

use crate::config::Preferences;
use crate::error::CoreError;
use crate::grid::TimeGrid;
use crate::model::{
    Adjustment, Advisory, Recurrence, Schedule, ScheduleBlock, Task, TaskStatus, TimeInterval,
    UnscheduledTask,
};
use crate::split::{self, FocusChunk};

pub const REASON_NO_SLOT: &str = "no_available_slot";

type Span = (OffsetDateTime, OffsetDateTime);

struct ActiveAdvisory {
    window: Span,
    adjustment: Adjustment,
}

/// Produces the conflict-free schedule for one date. Placed tasks are marked
/// scheduled in place; tasks that do not fit are reported in the unscheduled
/// list rather than raised. Deterministic and idempotent for identical
/// inputs.
pub fn plan(
    date: Date,
    tasks: &mut [Task],
    blocked_intervals: &[TimeInterval],
    preferences: &Preferences,
    advisories: &[Advisory],
) -> Result<Schedule, CoreError> {
    let resolved = preferences.resolve()?;
    let window_start = date.with_time(resolved.work_start).assume_offset(resolved.offset);
    let window_end = date.with_time(resolved.work_end).assume_offset(resolved.offset);

    // The extractor guarantees positive durations; a zero here means a
    // record bypassed that boundary.
    for task in tasks.iter() {
        if task.duration_minutes == 0 {
            return Err(CoreError::invalid_data(format!(
                "task {} has a non-positive duration",
                task.id
            )));
        }
    }

    let order = eligible_order(tasks, date, resolved.offset)?;

    let mut busy: Vec<Span> = Vec::with_capacity(blocked_intervals.len());
    for interval in blocked_intervals {
        busy.push(parse_interval(interval)?);
    }
    let mut grid = TimeGrid::new(window_start, window_end, &busy)?;

    let advisories = active_advisories(advisories);

    let mut placed: Vec<(Span, Option<String>)> = Vec::new();
    let mut unscheduled: Vec<UnscheduledTask> = Vec::new();
    let mut scheduled_indexes: Vec<usize> = Vec::new();
    let mut cursor = window_start;

    for &index in &order {
        let task = &tasks[index];
        let duration = buffered_duration(task.duration_minutes, cursor, window_end, &advisories);
        let chunks = split::split(duration, resolved.focus_minutes, resolved.break_minutes);
        let avoid = avoid_windows(task, &advisories);

        let mut starts = vec![cursor];
        if let Some(preferred) = preferred_start(cursor, window_end, &advisories)
            && preferred > cursor
        {
            starts.insert(0, preferred);
        }

        let mut placement = None;
        for start in starts {
            if let Some(blocks) = place_chunks(&mut grid, &chunks, start, &avoid)? {
                placement = Some(blocks);
                break;
            }
        }

        match placement {
            Some(blocks) => {
                if let Some(&(last_span, _)) = blocks.last() {
                    cursor = last_span.1;
                }
                for (span, is_break) in blocks {
                    let task_id = (!is_break).then(|| task.id.clone());
                    placed.push((span, task_id));
                }
                scheduled_indexes.push(index);
            }
            None => {
                debug!("task {} does not fit on {date}", task.id);
                unscheduled.push(UnscheduledTask {
                    task_id: task.id.clone(),
                    reason: REASON_NO_SLOT.to_string(),
                });
            }
        }
    }

    for index in scheduled_indexes {
        tasks[index].status = TaskStatus::Scheduled;
    }

    let mut blocks = Vec::with_capacity(placed.len());
    for ((start, end), task_id) in placed {
        blocks.push(ScheduleBlock {
            start: format_rfc3339(start)?,
            end: format_rfc3339(end)?,
            task_id,
        });
    }

    Ok(Schedule {
        date: format_date(date),
        blocks,
        unscheduled,
    })
}

/// Eligible task indexes in placement order: due date ascending (absent
/// last), then priority, then input position.
fn eligible_order(tasks: &[Task], date: Date, offset: UtcOffset) -> Result<Vec<usize>, CoreError> {
    let mut keyed: Vec<((u8, i64, u8, usize), usize)> = Vec::new();

    for (index, task) in tasks.iter().enumerate() {
        if !matches!(task.status, TaskStatus::Pending | TaskStatus::Overdue) {
            continue;
        }

        let due = match task.due_date.as_deref() {
            Some(raw) => Some(parse_datetime(raw, "due_date", &task.id)?),
            None => None,
        };

        let eligible = match task.recurrence {
            Some(Recurrence::Daily) => true,
            Some(Recurrence::Weekly) => {
                let anchor = match due {
                    Some(value) => value,
                    None => parse_datetime(&task.created_at, "created_at", &task.id)?,
                };
                anchor.to_offset(offset).date().weekday() == date.weekday()
            }
            None => due.is_none_or(|value| value.to_offset(offset).date() >= date),
        };
        if !eligible {
            continue;
        }

        let due_key = match due {
            Some(value) => (0, value.unix_timestamp()),
            None => (1, 0),
        };
        keyed.push(((due_key.0, due_key.1, task.priority.rank(), index), index));
    }

    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(keyed.into_iter().map(|(_, index)| index).collect())
}

fn active_advisories(advisories: &[Advisory]) -> Vec<ActiveAdvisory> {
    advisories
        .iter()
        .filter_map(|advisory| match parse_interval(&advisory.window) {
            Ok(window) => Some(ActiveAdvisory {
                window,
                adjustment: advisory.adjustment,
            }),
            Err(err) => {
                // A broken advisory means "no advisory", never a failed plan.
                warn!("discarding advisory with invalid window: {err}");
                None
            }
        })
        .collect()
}

fn buffered_duration(
    base_minutes: u32,
    search_start: OffsetDateTime,
    window_end: OffsetDateTime,
    advisories: &[ActiveAdvisory],
) -> u32 {
    let mut total = base_minutes;
    for advisory in advisories {
        if let Adjustment::AddBufferMinutes { minutes } = advisory.adjustment
            && overlaps(advisory.window, (search_start, window_end))
        {
            total = total.saturating_add(minutes);
        }
    }
    total
}

fn avoid_windows(task: &Task, advisories: &[ActiveAdvisory]) -> Vec<Span> {
    let outdoor = task
        .tags
        .iter()
        .any(|tag| tag == "outdoor" || tag == "location");
    if !outdoor {
        return Vec::new();
    }
    advisories
        .iter()
        .filter(|advisory| matches!(advisory.adjustment, Adjustment::AvoidOutdoor))
        .map(|advisory| advisory.window)
        .collect()
}

fn preferred_start(
    cursor: OffsetDateTime,
    window_end: OffsetDateTime,
    advisories: &[ActiveAdvisory],
) -> Option<OffsetDateTime> {
    advisories
        .iter()
        .find(|advisory| {
            matches!(advisory.adjustment, Adjustment::PreferWindow)
                && overlaps(advisory.window, (cursor, window_end))
        })
        .map(|advisory| advisory.window.0.max(cursor))
}

/// Places every chunk of one task, each chunk together with its trailing
/// break as a single contiguous span. On any miss the task's blocks are
/// released and `None` is returned.
fn place_chunks(
    grid: &mut TimeGrid,
    chunks: &[FocusChunk],
    start: OffsetDateTime,
    avoid: &[Span],
) -> Result<Option<Vec<(Span, bool)>>, CoreError> {
    let mut blocks: Vec<(Span, bool)> = Vec::new();
    let mut search = start;

    for chunk in chunks {
        let break_minutes = chunk.break_minutes.unwrap_or(0);
        let Some((slot_start, slot_end)) =
            find_clear_slot(grid, search, chunk.minutes + break_minutes, avoid)
        else {
            for &((span_start, span_end), _) in &blocks {
                grid.release(span_start, span_end);
            }
            return Ok(None);
        };

        let chunk_end = slot_start + Duration::minutes(i64::from(chunk.minutes));
        grid.occupy(slot_start, chunk_end)?;
        blocks.push(((slot_start, chunk_end), false));
        if break_minutes > 0 {
            grid.occupy(chunk_end, slot_end)?;
            blocks.push(((chunk_end, slot_end), true));
        }
        search = slot_end;
    }

    Ok(Some(blocks))
}

fn find_clear_slot(
    grid: &TimeGrid,
    after: OffsetDateTime,
    minutes: u32,
    avoid: &[Span],
) -> Option<Span> {
    let mut search = after;
    loop {
        let slot = grid.find_next_free_slot(search, minutes)?;
        match avoid.iter().find(|window| overlaps(**window, slot)) {
            None => return Some(slot),
            // Resume past the advisory window; the loop strictly advances.
            Some(window) => search = window.1,
        }
    }
}

fn overlaps(a: Span, b: Span) -> bool {
    a.0 < b.1 && b.0 < a.1
}

fn parse_interval(interval: &TimeInterval) -> Result<Span, CoreError> {
    let start = OffsetDateTime::parse(&interval.start, &Rfc3339)
        .map_err(|_| CoreError::invalid_data("interval start must be RFC3339"))?;
    let end = OffsetDateTime::parse(&interval.end, &Rfc3339)
        .map_err(|_| CoreError::invalid_data("interval end must be RFC3339"))?;
    if end <= start {
        return Err(CoreError::invalid_data("interval must end after it starts"));
    }
    Ok((start, end))
}

fn parse_datetime(raw: &str, field: &str, task_id: &str) -> Result<OffsetDateTime, CoreError> {
    OffsetDateTime::parse(raw, &Rfc3339).map_err(|_| {
        CoreError::invalid_data(format!("task {task_id}: {field} must be RFC3339"))
    })
}

fn format_rfc3339(value: OffsetDateTime) -> Result<String, CoreError> {
    value
        .format(&Rfc3339)
        .map_err(|err| CoreError::invalid_data(err.to_string()))
}

fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}
