/// One bounded chunk of work. `break_minutes` is `Some` on every chunk but
/// the last; the break belongs immediately after the chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusChunk {
    pub minutes: u32,
    pub break_minutes: Option<u32>,
}

/// Decomposes a duration into focus blocks of at most `ceiling_minutes`.
/// Chunk durations always sum to `total_minutes`. A zero ceiling disables
/// splitting; callers guarantee a positive total.
pub fn split(total_minutes: u32, ceiling_minutes: u32, break_minutes: u32) -> Vec<FocusChunk> {
    if total_minutes == 0 {
        return Vec::new();
    }
    if ceiling_minutes == 0 || total_minutes <= ceiling_minutes {
        return vec![FocusChunk {
            minutes: total_minutes,
            break_minutes: None,
        }];
    }

    let mut chunks = Vec::new();
    let mut remaining = total_minutes;
    while remaining > ceiling_minutes {
        chunks.push(FocusChunk {
            minutes: ceiling_minutes,
            break_minutes: Some(break_minutes),
        });
        remaining -= ceiling_minutes;
    }
    chunks.push(FocusChunk {
        minutes: remaining,
        break_minutes: None,
    });
    chunks
}
