use std::fmt;

use anyhow::Context as _;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;
use entity::property;
use notion::{
    databases::request::{DateCondition, Filter, Sort},
    pages::request::{PropertyInput, UpdatePageRequest},
};
use tracing::{info, warn};
use util::{local_today, Config};

use crate::{schedule::Interval, State};

/// A configured time range for one class of tasks, resolved to today.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub event: String,
    pub class: String,
    pub span: Interval,
}

#[derive(Debug, Default)]
pub struct BudgetReport {
    /// `(task name, block)`
    pub scheduled: Vec<(String, Interval)>,
    /// Tasks left over once every window of their class was full.
    pub unplaced: Vec<String>,
    pub failed: usize,
}

impl fmt::Display for BudgetReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "budgeted {} task(s), {} without room, {} failed",
            self.scheduled.len(),
            self.unplaced.len(),
            self.failed
        )
    }
}

fn local(date: NaiveDate, time: NaiveTime, tz: Tz) -> anyhow::Result<DateTime<Utc>> {
    let at = tz
        .from_local_datetime(&date.and_time(time))
        .earliest()
        .context(format!("{} {} does not exist in {}", date, time, tz))?;

    Ok(at.with_timezone(&Utc))
}

pub fn windows_for(config: &Config, today: NaiveDate) -> anyhow::Result<Vec<Window>> {
    config
        .budget
        .windows
        .iter()
        .map(|w| {
            let (start, end) = w.times()?;
            Ok(Window {
                event: w.event.clone(),
                class: w.class.clone(),
                span: (
                    local(today, start, config.timezone)?,
                    local(today, end, config.timezone)?,
                ),
            })
        })
        .collect()
}

/// Consecutive `block` sized slots across `windows` in order, at most `count`.
/// A window only takes whole blocks.
pub fn fill_windows(windows: &[Interval], count: usize, block: Duration) -> Vec<Interval> {
    let mut slots = vec![];
    for (start, end) in windows {
        let mut cursor = *start;
        while slots.len() < count && cursor + block <= *end {
            slots.push((cursor, cursor + block));
            cursor += block;
        }
    }

    slots
}

/// Windows grouped by class in first-seen order, each group sorted by start.
fn by_class(windows: Vec<Window>) -> Vec<(String, Vec<Interval>)> {
    let mut groups: Vec<(String, Vec<Interval>)> = vec![];
    for window in windows {
        match groups.iter_mut().find(|(class, _)| *class == window.class) {
            Some((_, spans)) => spans.push(window.span),
            None => groups.push((window.class, vec![window.span])),
        }
    }
    for (_, spans) in groups.iter_mut() {
        spans.sort_by_key(|(start, _)| *start);
    }

    groups
}

/// Spreads today's open tasks of each class over that class's windows.
pub async fn budget(state: &State, now: DateTime<Utc>) -> anyhow::Result<BudgetReport> {
    let tz = state.config.timezone;
    let today = local_today(now, tz);
    let block = Duration::minutes(i64::from(state.config.budget.block_minutes));

    let mut report = BudgetReport::default();
    let windows = windows_for(&state.config, today)?;
    if windows.is_empty() {
        info!(task = "budget", "no windows configured");
        return Ok(report);
    }

    for (class, spans) in by_class(windows) {
        let filter = Filter::and(vec![
            Filter::date(property::DUE, DateCondition::Equals(today.to_string())),
            Filter::select_equals(property::CLASS, &class),
            Filter::checkbox_equals(property::DONE, false),
        ]);
        let tasks = state.fetch_tasks(filter, vec![Sort::oldest_first()]).await?;
        if tasks.is_empty() {
            warn!(task = "budget", class, "no tasks for window");
            continue;
        }

        let slots = fill_windows(&spans, tasks.len(), block);
        for (task, slot) in tasks.iter().zip(slots.iter()) {
            let (start, end) = *slot;
            let request = UpdatePageRequest::default().property(
                property::DUE,
                PropertyInput::date(
                    start.with_timezone(&tz).to_rfc3339_opts(SecondsFormat::Secs, false),
                    Some(end.with_timezone(&tz).to_rfc3339_opts(SecondsFormat::Secs, false)),
                ),
            );
            match state.update(task, &request).await {
                Ok(()) => report.scheduled.push((task.name.clone(), *slot)),
                Err(_) => report.failed += 1,
            }
        }
        report
            .unplaced
            .extend(tasks.iter().skip(slots.len()).map(|t| t.name.clone()));

        info!(
            task = "budget",
            class,
            tasks = tasks.len(),
            slots = slots.len(),
        );
    }

    Ok(report)
}
