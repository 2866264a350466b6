use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use entity::{prelude::*, property};
use futures::{stream, StreamExt};
use notion::{
    databases::request::{DateCondition, Filter},
    pages::request::{PropertyInput, UpdatePageRequest},
};
use tracing::info;
use util::{end_of_day, local_today};

use crate::{status_excludes, State};

/// Which overdue tasks a sweep moves onto today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sweep {
    /// Due strictly before now.
    BeforeNow,
    /// Due any time up to the end of today.
    ThroughToday,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub matched: usize,
    pub updated: usize,
    pub failed: usize,
}

impl fmt::Display for SweepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "moved {} of {} task(s) to today, {} failed",
            self.updated, self.matched, self.failed
        )
    }
}

pub async fn clean_before_now(
    state: &State,
    now: DateTime<Utc>,
) -> anyhow::Result<SweepReport> {
    sweep(state, Sweep::BeforeNow, now).await
}

pub async fn clean_slate(
    state: &State,
    now: DateTime<Utc>,
) -> anyhow::Result<SweepReport> {
    sweep(state, Sweep::ThroughToday, now).await
}

pub fn sweep_filter(kind: Sweep, now: DateTime<Utc>, state: &State) -> Filter {
    let tz = state.config.timezone;
    let due = match kind {
        Sweep::BeforeNow => DateCondition::Before(
            now.to_rfc3339_opts(SecondsFormat::Secs, true),
        ),
        Sweep::ThroughToday => DateCondition::OnOrBefore(
            end_of_day(local_today(now, tz), tz)
                .with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        ),
    };

    let mut filters =
        vec![Filter::checkbox_equals(property::ASSIGNED_TIME, true)];
    filters.extend(status_excludes(&[
        Status::Done,
        Status::Completed,
        Status::Deprecated,
        Status::HandedOff,
    ]));
    filters.push(Filter::checkbox_equals(property::DONE, false));
    filters.push(Filter::date(property::DUE, due));

    Filter::and(filters)
}

/// Resets the due date of every matching task to today, a bounded number of
/// updates at a time.
pub async fn sweep(
    state: &State,
    kind: Sweep,
    now: DateTime<Utc>,
) -> anyhow::Result<SweepReport> {
    let tasks = state
        .fetch_tasks(sweep_filter(kind, now, state), vec![])
        .await?;

    let today = local_today(now, state.config.timezone);
    let request = UpdatePageRequest::default()
        .property(property::DUE, PropertyInput::date(today.to_string(), None));
    let request = &request;

    let results = stream::iter(tasks.iter())
        .map(|task| async move { state.update(task, request).await.is_ok() })
        .buffer_unordered(state.config.notion.concurrency)
        .collect::<Vec<bool>>()
        .await;

    let updated = results.iter().filter(|ok| **ok).count();
    let report = SweepReport {
        matched: tasks.len(),
        updated,
        failed: tasks.len() - updated,
    };

    info!(
        task = "sweep",
        kind = format!("{:?}", kind),
        matched = report.matched,
        updated = report.updated,
        failed = report.failed,
    );

    Ok(report)
}
