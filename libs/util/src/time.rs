use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

pub fn local_today(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// Local midnight of `date`. On a DST gap the earliest valid instant wins.
pub fn start_of_day(date: NaiveDate, tz: Tz) -> DateTime<Tz> {
    at_hour(date, 0, tz)
}

/// The last instant of the local day.
pub fn end_of_day(date: NaiveDate, tz: Tz) -> DateTime<Tz> {
    let next = date.checked_add_days(Days::new(1)).unwrap_or(date);
    start_of_day(next, tz) - chrono::Duration::microseconds(1)
}

/// `hour` o'clock local time on `date`; 24 is the next midnight.
pub fn at_hour(date: NaiveDate, hour: u32, tz: Tz) -> DateTime<Tz> {
    let naive =
        date.and_time(NaiveTime::MIN) + chrono::Duration::hours(hour.into());
    tz.from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
}

/// Rounds up to the next `:30` or `:00`, dropping seconds. A time sitting
/// exactly on `:00` moves to `:30`.
pub fn round_up_to_half_hour(now: DateTime<Tz>) -> DateTime<Tz> {
    let floor = now
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now);

    if floor.minute() < 30 {
        floor.with_minute(30).unwrap_or(floor)
    } else {
        let top = floor.with_minute(0).unwrap_or(floor);
        top + chrono::Duration::hours(1)
    }
}
