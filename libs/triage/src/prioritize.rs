use std::fmt;

use anyhow::Context as _;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use entity::{prelude::*, property};
use notion::{
    databases::request::{DateCondition, Filter},
    pages::request::{PropertyInput, UpdatePageRequest},
};
use tracing::{info, warn};
use util::local_today;

use crate::{prompt::Prompt, State};

#[derive(Debug, Default)]
pub struct PrioritizeReport {
    pub scanned: usize,
    /// Names raised to `Must Be Done Today`.
    pub raised: Vec<String>,
    pub failed: usize,
}

impl fmt::Display for PrioritizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scanned {} task(s), {} due soon, {} failed",
            self.scanned,
            self.raised.len(),
            self.failed
        )
    }
}

/// `now <= due < now + horizon`
pub fn due_within(
    due: DateTime<Utc>,
    now: DateTime<Utc>,
    horizon: Duration,
) -> bool {
    now <= due && due < now + horizon
}

/// Reads a weekday name (the next such day, never today) or a `Month day`
/// (rolled into next year once passed).
pub fn parse_due_input(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(weekday) = input.parse::<Weekday>() {
        let ahead = (weekday.num_days_from_monday() as i64
            - today.weekday().num_days_from_monday() as i64)
            .rem_euclid(7);
        let ahead = if ahead == 0 { 7 } else { ahead };
        return today.checked_add_signed(Duration::days(ahead));
    }

    let in_year = |year: i32| {
        NaiveDate::parse_from_str(&format!("{} {}", input, year), "%B %d %Y")
            .ok()
    };
    match in_year(today.year()) {
        Some(date) if date >= today => Some(date),
        _ => in_year(today.year() + 1),
    }
}

fn midnight_utc(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0).map(|d| d.and_utc())
}

/// Lists upcoming deadlines, asks for the missing ones and raises every task
/// due within the horizon to `Must Be Done Today`.
pub async fn prioritize(
    state: &State,
    prompt: &dyn Prompt,
    now: DateTime<Utc>,
) -> anyhow::Result<PrioritizeReport> {
    let config = &state.config.prioritize;
    let today = local_today(now, state.config.timezone);
    let horizon = Duration::days(i64::from(config.horizon_days));

    let filter = Filter::date(
        &config.property,
        DateCondition::OnOrAfter(today.to_string()),
    );
    let pages = state.fetch_pages(filter, vec![]).await?;

    prompt.say(&format!("Tasks with their '{}' dates:", config.property));
    for page in &pages {
        let deadline = page
            .date(&config.property)
            .map(|d| d.start.to_rfc3339())
            .unwrap_or_else(|| "No date".to_string());
        prompt.say(&format!("{}: {}", page.title(), deadline));
    }

    let request = UpdatePageRequest::default().property(
        property::PRIORITY,
        PropertyInput::status(Priority::MustBeDoneToday.as_ref()),
    );

    let mut report = PrioritizeReport {
        scanned: pages.len(),
        ..Default::default()
    };
    for page in &pages {
        let task = page.to_task();
        let due = match page.date(&config.property) {
            Some(due) => due.start,
            None => {
                let answer = prompt
                    .ask(&format!(
                        "Enter a deadline for '{}' (weekday or Month day): ",
                        task.name
                    ))
                    .context("failed to read deadline")?;
                match parse_due_input(&answer, today).and_then(midnight_utc) {
                    Some(due) => due,
                    None => {
                        warn!(task = "prioritize", name = task.name, answer);
                        prompt.say(&format!(
                            "Invalid date for '{}', leaving it as is.",
                            task.name
                        ));
                        continue;
                    }
                }
            }
        };

        if !due_within(due, now, horizon) {
            continue;
        }

        match state.update(&task, &request).await {
            Ok(()) => {
                info!(task = "prioritize", page_id = task.id, name = task.name);
                report.raised.push(task.name);
            }
            Err(_) => report.failed += 1,
        }
    }

    prompt.say("Tasks due soon:");
    for name in &report.raised {
        prompt.say(&format!("- {}", name));
    }

    Ok(report)
}
