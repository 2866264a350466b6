use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use entity::prelude::Priority;
use util::Durations;

/// A half-open `[start, end)` span.
pub type Interval = (DateTime<Utc>, DateTime<Utc>);

/// The gaps between `busy` inside `[day_start, day_end)`.
pub fn free_blocks(
    busy: &[Interval],
    day_start: DateTime<Utc>,
    day_end: DateTime<Utc>,
) -> Vec<Interval> {
    let mut busy = busy.to_vec();
    busy.sort_by_key(|(start, _)| *start);

    let mut free = vec![];
    let mut cursor = day_start;
    for (start, end) in busy {
        let gap_end = start.min(day_end);
        if cursor < gap_end {
            free.push((cursor, gap_end));
        }
        cursor = cursor.max(end);
    }
    if cursor < day_end {
        free.push((cursor, day_end));
    }

    free
}

pub fn overlaps(busy: &[Interval], start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    busy.iter().any(|(s, e)| start < *e && end > *s)
}

/// Pushes a `length` block starting at `start` forward by its own length
/// until it clears `busy`. An empty block is returned where it starts.
pub fn next_free_slot(
    busy: &[Interval],
    start: DateTime<Utc>,
    length: Duration,
) -> Interval {
    if length <= Duration::zero() {
        return (start, start);
    }

    let mut start = start;
    while overlaps(busy, start, start + length) {
        start += length;
    }

    (start, start + length)
}

pub fn duration_for(durations: &Durations, priority: Priority) -> Duration {
    let minutes = match priority {
        Priority::Low => durations.low,
        Priority::Medium => durations.medium,
        Priority::High => durations.high,
        Priority::MustBeDoneToday => durations.must_be_done_today,
        Priority::Unassigned | Priority::Someday => durations.fallback,
    };

    Duration::minutes(i64::from(minutes))
}

/// `09:00 AM - 10:30 AM`
pub fn format_block((start, end): Interval, tz: Tz) -> String {
    format!(
        "{} - {}",
        start.with_timezone(&tz).format("%I:%M %p"),
        end.with_timezone(&tz).format("%I:%M %p")
    )
}
