use std::{fmt, str::FromStr};

use entity::{prelude::*, property};
use notion::{
    databases::request::Filter,
    pages::request::{PropertyInput, UpdatePageRequest},
};
use tracing::info;

use crate::{prompt::Prompt, status_excludes, State};

/// An answer to the unassigned-task question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriageChoice {
    Low,
    High,
    Someday,
    Deprecate,
    Done,
}

impl FromStr for TriageChoice {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" => Ok(TriageChoice::Low),
            "2" => Ok(TriageChoice::High),
            "s" => Ok(TriageChoice::Someday),
            "c" => Ok(TriageChoice::Deprecate),
            "x" => Ok(TriageChoice::Done),
            _ => Err(()),
        }
    }
}

impl TriageChoice {
    pub fn request(&self) -> UpdatePageRequest {
        let (name, value) = match self {
            TriageChoice::Low => (
                property::PRIORITY,
                PropertyInput::status(Priority::Low.as_ref()),
            ),
            TriageChoice::High => (
                property::PRIORITY,
                PropertyInput::status(Priority::High.as_ref()),
            ),
            TriageChoice::Someday => (
                property::PRIORITY,
                PropertyInput::status(Priority::Someday.as_ref()),
            ),
            TriageChoice::Deprecate => (
                property::STATUS,
                PropertyInput::status(Status::Deprecated.as_ref()),
            ),
            TriageChoice::Done => (
                property::STATUS,
                PropertyInput::status(Status::Done.as_ref()),
            ),
        };

        UpdatePageRequest::default().property(name, value)
    }
}

#[derive(Debug, Default)]
pub struct TriageReport {
    pub changed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl fmt::Display for TriageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "triaged {} task(s), skipped {}, {} failed",
            self.changed, self.skipped, self.failed
        )
    }
}

/// Open tasks nobody has prioritised yet.
pub fn unassigned_filter() -> Filter {
    let mut filters = vec![Filter::status_equals(
        property::PRIORITY,
        Priority::Unassigned.as_ref(),
    )];
    filters.extend(status_excludes(&Status::CLOSED));
    filters.push(Filter::checkbox_equals(property::DONE, false));

    Filter::and(filters)
}

pub async fn triage_unassigned(
    state: &State,
    prompt: &dyn Prompt,
    dry_run: bool,
) -> anyhow::Result<TriageReport> {
    let tasks = state.fetch_tasks(unassigned_filter(), vec![]).await?;

    let mut report = TriageReport::default();
    if tasks.is_empty() {
        return Ok(report);
    }

    prompt.say("Unassigned tasks:");
    for task in &tasks {
        let answer = prompt.ask(&format!(
            "{}: [1] Low, [2] High, [c] Deprecated, [x] Done, [s] Someday, \
             anything else to skip: ",
            task.name
        ))?;
        let Ok(choice) = answer.parse::<TriageChoice>() else {
            report.skipped += 1;
            continue;
        };

        if dry_run {
            report.changed += 1;
            continue;
        }
        match state.update(task, &choice.request()).await {
            Ok(()) => {
                info!(
                    task = "triage",
                    page_id = task.id,
                    choice = format!("{:?}", choice),
                );
                report.changed += 1;
            }
            Err(_) => report.failed += 1,
        }
    }

    Ok(report)
}
