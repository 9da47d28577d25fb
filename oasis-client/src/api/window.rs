use time::{format_description::BorrowedFormatItem, macros::format_description, Duration, OffsetDateTime, UtcOffset};

/// Reporting interval of the real-time market.
pub const SLOT: Duration = Duration::minutes(5);

/// Default lookback; a little over an hour to absorb publication latency.
pub const DEFAULT_LOOKBACK: Duration = Duration::minutes(70);

const OASIS_DATETIME: &[BorrowedFormatItem<'static>] =
    format_description!("[year][month][day]T[hour]:[minute]-0000");

/// Truncates an instant to the start of its 5-minute slot, in UTC.
pub fn floor_to_slot(ts: OffsetDateTime) -> OffsetDateTime {
    let ts = ts.to_offset(UtcOffset::UTC);
    let into_slot = ts.unix_timestamp().rem_euclid(SLOT.whole_seconds());
    ts - Duration::new(into_slot, ts.nanosecond() as i32)
}

/// Slot starts covered by a reporting interval `[start, end)` that `window`
/// admits.
///
/// An interval with no usable end covers exactly the slot of `start`. The
/// walk is bounded by the window, never by the interval.
pub fn interval_slots(
    start: OffsetDateTime,
    end: Option<OffsetDateTime>,
    window: &FetchWindow,
) -> Vec<OffsetDateTime> {
    let first = floor_to_slot(start);
    let end = match end {
        Some(end) if end > first => end,
        _ => first.checked_add(SLOT).unwrap_or(first),
    };

    let stop = end.min(window.end);
    let mut slot = first.max(floor_to_slot(window.start));
    let mut slots = Vec::new();
    while slot < stop {
        if window.admits(slot) {
            slots.push(slot);
        }
        slot += SLOT;
    }
    slots
}

/// UTC range queried from every feed in one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

impl FetchWindow {
    /// `start = now - lookback`, `end = now`. Neither bound is snapped to the grid.
    pub fn ending_at(now: OffsetDateTime, lookback: Duration) -> Self {
        let end = now.to_offset(UtcOffset::UTC);
        Self {
            start: end - lookback,
            end,
        }
    }

    pub fn last_hour(now: OffsetDateTime) -> Self {
        Self::ending_at(now, DEFAULT_LOOKBACK)
    }

    /// Nearest completed 5-minute boundary at or before `end`.
    pub fn last_completed_slot(&self) -> OffsetDateTime {
        floor_to_slot(self.end)
    }

    /// Whether a slot start lies inside `[start, end)`.
    pub fn admits(&self, slot: OffsetDateTime) -> bool {
        slot >= self.start && slot < self.end
    }

    pub fn oasis_start(&self) -> String {
        format_oasis(self.start)
    }

    pub fn oasis_end(&self) -> String {
        format_oasis(self.end)
    }
}

fn format_oasis(ts: OffsetDateTime) -> String {
    // The format has no fallible components.
    ts.format(OASIS_DATETIME).unwrap_or_default()
}
