use time::{Duration, OffsetDateTime};

use crate::error::CoreError;

/// Free/busy map for a single day's work window. Busy intervals are clamped
/// to the window, sorted, and merged once at construction; slot search is a
/// linear scan over the gaps.
#[derive(Debug, Clone)]
pub struct TimeGrid {
    window_start: OffsetDateTime,
    window_end: OffsetDateTime,
    occupied: Vec<(OffsetDateTime, OffsetDateTime)>,
}

impl TimeGrid {
    pub fn new(
        window_start: OffsetDateTime,
        window_end: OffsetDateTime,
        busy: &[(OffsetDateTime, OffsetDateTime)],
    ) -> Result<Self, CoreError> {
        if window_end <= window_start {
            return Err(CoreError::invalid_config(
                "work window must end after it starts",
            ));
        }

        let mut clamped: Vec<(OffsetDateTime, OffsetDateTime)> = busy
            .iter()
            .filter_map(|&(start, end)| {
                let start = start.max(window_start);
                let end = end.min(window_end);
                (start < end).then_some((start, end))
            })
            .collect();
        clamped.sort();

        let mut occupied: Vec<(OffsetDateTime, OffsetDateTime)> =
            Vec::with_capacity(clamped.len());
        for (start, end) in clamped {
            match occupied.last_mut() {
                Some(last) if start <= last.1 => {
                    if end > last.1 {
                        last.1 = end;
                    }
                }
                _ => occupied.push((start, end)),
            }
        }

        Ok(Self {
            window_start,
            window_end,
            occupied,
        })
    }

    pub fn window_start(&self) -> OffsetDateTime {
        self.window_start
    }

    pub fn window_end(&self) -> OffsetDateTime {
        self.window_end
    }

    /// Earliest free span of at least `duration_minutes` starting at or
    /// after `after`, fully inside the window, or `None`.
    pub fn find_next_free_slot(
        &self,
        after: OffsetDateTime,
        duration_minutes: u32,
    ) -> Option<(OffsetDateTime, OffsetDateTime)> {
        if duration_minutes == 0 {
            return None;
        }
        let needed = Duration::minutes(i64::from(duration_minutes));
        let mut cursor = self.window_start.max(after);

        for &(busy_start, busy_end) in &self.occupied {
            if busy_end <= cursor {
                continue;
            }
            if busy_start >= cursor && busy_start - cursor >= needed {
                return Some((cursor, cursor + needed));
            }
            cursor = cursor.max(busy_end);
        }

        if self.window_end - cursor >= needed {
            return Some((cursor, cursor + needed));
        }
        None
    }

    /// Inserts a busy interval. The planner always queries free slots first,
    /// so an overlap here is an invariant breach, not a normal outcome.
    pub fn occupy(
        &mut self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<(), CoreError> {
        if end <= start {
            return Err(CoreError::invalid_data("interval must end after it starts"));
        }
        if start < self.window_start || end > self.window_end {
            return Err(CoreError::invalid_data(
                "interval falls outside the work window",
            ));
        }

        let index = self.occupied.partition_point(|&(s, _)| s < start);
        if index > 0 && self.occupied[index - 1].1 > start {
            return Err(CoreError::overlap("interval overlaps an occupied span"));
        }
        if index < self.occupied.len() && self.occupied[index].0 < end {
            return Err(CoreError::overlap("interval overlaps an occupied span"));
        }

        self.occupied.insert(index, (start, end));
        Ok(())
    }

    /// Removes an interval previously passed to `occupy`, for rollback.
    /// Returns false when no exactly matching interval is occupied.
    pub fn release(&mut self, start: OffsetDateTime, end: OffsetDateTime) -> bool {
        match self.occupied.iter().position(|&span| span == (start, end)) {
            Some(index) => {
                self.occupied.remove(index);
                true
            }
            None => false,
        }
    }
}
