use anyhow::Context as _;
use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, Utc};
use entity::{prelude::*, property};
use notion::{
    databases::request::{DateCondition, Filter, Sort},
    objects::Page,
    pages::request::{CreatePageRequest, PropertyInput},
};
use tracing::{info, warn};
use util::{at_hour, local_today};

use crate::{prompt::Prompt, State};

pub mod block;
pub mod planner;
pub mod triage;

pub use block::{format_block, free_blocks, Interval};
pub use planner::{Planner, ScheduleReport};
pub use triage::{triage_unassigned, TriageReport};

pub const SCHEDULE_DAY_TITLE: &str = "Schedule Day";

/// Prioritised tasks due by `today`, either already placed in the day
/// (`assigned`) or still waiting for a slot.
pub fn due_today_filter(today: NaiveDate, assigned: bool) -> Filter {
    Filter::and(vec![
        Filter::date(property::DUE, DateCondition::OnOrBefore(today.to_string())),
        Filter::checkbox_equals(property::ASSIGNED_TIME, assigned),
        Filter::checkbox_equals(property::DONE, false),
        Filter::status_does_not_equal(
            property::PRIORITY,
            Priority::Someday.as_ref(),
        ),
        Filter::status_does_not_equal(
            property::PRIORITY,
            Priority::Unassigned.as_ref(),
        ),
    ])
}

/// Blocks already taken today.
pub async fn current_schedule(
    state: &State,
    now: DateTime<Utc>,
) -> anyhow::Result<Vec<Interval>> {
    let today = local_today(now, state.config.timezone);
    let tasks = state
        .fetch_tasks(due_today_filter(today, true), vec![Sort::oldest_first()])
        .await?;

    Ok(tasks
        .iter()
        .filter_map(|t| t.due.as_ref().and_then(|d| d.interval()))
        .collect())
}

/// Free blocks of today's working hours.
pub async fn overview(
    state: &State,
    now: DateTime<Utc>,
) -> anyhow::Result<Vec<Interval>> {
    let busy = current_schedule(state, now).await?;

    Ok(working_hours_free(state, now, &busy))
}

fn working_hours_free(
    state: &State,
    now: DateTime<Utc>,
    busy: &[Interval],
) -> Vec<Interval> {
    let tz = state.config.timezone;
    let today = local_today(now, tz);
    let schedule = &state.config.schedule;

    free_blocks(
        busy,
        at_hour(today, schedule.day_start_hour, tz).with_timezone(&Utc),
        at_hour(today, schedule.day_end_hour, tz).with_timezone(&Utc),
    )
}

/// Books half an hour from `now` for planning the day.
pub async fn create_schedule_day_task(
    state: &State,
    now: DateTime<Utc>,
) -> anyhow::Result<Page> {
    let tz = state.config.timezone;
    let at = |t: DateTime<Utc>| {
        t.with_timezone(&tz)
            .to_rfc3339_opts(SecondsFormat::Secs, false)
    };

    let request = CreatePageRequest::new(&state.database_id)
        .property(property::NAME, PropertyInput::title(SCHEDULE_DAY_TITLE))
        .property(property::CLASS, PropertyInput::select("Admin"))
        .property(
            property::PRIORITY,
            PropertyInput::status(Priority::High.as_ref()),
        )
        .property(
            property::DUE,
            PropertyInput::date(at(now), Some(at(now + Duration::minutes(30)))),
        );

    let page = state
        .client
        .create_page(&request)
        .await
        .context("failed to create the schedule day task")?;

    Ok(page)
}

/// The daily planning session: overview, triage, then one proposal per
/// pending task.
pub async fn run(
    state: &State,
    prompt: &dyn Prompt,
    now: DateTime<Utc>,
    dry_run: bool,
) -> anyhow::Result<ScheduleReport> {
    let tz = state.config.timezone;
    let busy = current_schedule(state, now).await?;

    prompt.say("Free blocks today:");
    for block in working_hours_free(state, now, &busy) {
        prompt.say(&format!("- {}", format_block(block, tz)));
    }

    if dry_run {
        prompt.say("Dry run, nothing will be written.");
    } else {
        match create_schedule_day_task(state, now).await {
            Ok(page) => info!(task = "schedule day", page_id = page.id),
            Err(e) => warn!(task = "schedule day", error = format!("{:#}", e)),
        }
    }

    let triaged = triage_unassigned(state, prompt, dry_run).await?;
    prompt.say(&triaged.to_string());

    let today = local_today(now, tz);
    let pending = state
        .fetch_tasks(due_today_filter(today, false), vec![Sort::oldest_first()])
        .await?;

    let report = Planner::new(state, prompt, busy, now, dry_run)
        .run(pending)
        .await?;
    prompt.say(&report.to_string());

    Ok(report)
}
