use std::{collections::HashSet, fmt, str::FromStr};

use chrono::{DateTime, Days, SecondsFormat, Utc};
use chrono_tz::Tz;
use entity::{prelude::*, property};
use notion::pages::request::{PropertyInput, UpdatePageRequest};
use tracing::info;
use util::{at_hour, local_today, round_up_to_half_hour, start_of_day};

use super::block::{duration_for, format_block, next_free_slot, Interval};
use crate::{prompt::Prompt, State};

/// An answer to a proposed block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Apply,
    Defer,
    Done,
    High,
}

impl FromStr for Choice {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "Y" => Ok(Choice::Apply),
            "S" => Ok(Choice::Defer),
            "X" | "C" => Ok(Choice::Done),
            "H" | "HIGH" => Ok(Choice::High),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Scheduled(Interval),
    Deferred(DateTime<Utc>),
    Completed,
    Raised,
    /// A task with the same name was already proposed.
    Duplicate,
    Failed,
}

#[derive(Debug, Default)]
pub struct ScheduleReport {
    pub outcomes: Vec<(String, Outcome)>,
    /// The pass ran into the end of the day.
    pub halted: bool,
}

impl ScheduleReport {
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed))
    }

    fn count(&self, f: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| f(o)).count()
    }
}

impl fmt::Display for ScheduleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scheduled {}, deferred {}, completed {}, raised {}, failed {}",
            self.count(|o| matches!(o, Outcome::Scheduled(_))),
            self.count(|o| matches!(o, Outcome::Deferred(_))),
            self.count(|o| matches!(o, Outcome::Completed)),
            self.count(|o| matches!(o, Outcome::Raised)),
            self.failed(),
        )?;
        if self.halted {
            write!(f, " (stopped at the end of the day)")?;
        }

        Ok(())
    }
}

/// Drops finished tasks and moves urgent ones to the front, `Must Be Done
/// Today` leading. Otherwise the input order is kept.
pub fn plan_order(tasks: Vec<TaskEntity>) -> Vec<TaskEntity> {
    let (mut urgent, rest): (Vec<_>, Vec<_>) = tasks
        .into_iter()
        .filter(|t| !t.done)
        .partition(|t| t.effective_priority().is_urgent());
    urgent.sort_by_key(|t| t.effective_priority() != Priority::MustBeDoneToday);
    urgent.extend(rest);

    urgent
}

fn timestamp(at: DateTime<Utc>, tz: Tz) -> String {
    at.with_timezone(&tz)
        .to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Walks the day from the next half hour, proposing one block per task.
pub struct Planner<'a> {
    state: &'a State,
    prompt: &'a dyn Prompt,
    dry_run: bool,
    busy: Vec<Interval>,
    proposed: HashSet<String>,
    cursor: DateTime<Utc>,
    cutoff: DateTime<Utc>,
}

impl<'a> Planner<'a> {
    pub fn new(
        state: &'a State,
        prompt: &'a dyn Prompt,
        busy: Vec<Interval>,
        now: DateTime<Utc>,
        dry_run: bool,
    ) -> Self {
        let tz = state.config.timezone;
        let cursor =
            round_up_to_half_hour(now.with_timezone(&tz)).with_timezone(&Utc);
        let cutoff = at_hour(
            local_today(now, tz),
            state.config.schedule.day_end_hour,
            tz,
        )
        .with_timezone(&Utc);

        Self {
            state,
            prompt,
            dry_run,
            busy,
            proposed: HashSet::new(),
            cursor,
            cutoff,
        }
    }

    pub async fn run(
        mut self,
        tasks: Vec<TaskEntity>,
    ) -> anyhow::Result<ScheduleReport> {
        let mut report = ScheduleReport::default();
        for task in plan_order(tasks) {
            if self.cursor >= self.cutoff {
                self.prompt.say("Reached the end of the day, stopping.");
                report.halted = true;
                break;
            }

            let outcome = self.propose(&task).await?;
            report.outcomes.push((task.name, outcome));
        }

        Ok(report)
    }

    async fn propose(&mut self, task: &TaskEntity) -> anyhow::Result<Outcome> {
        if self.proposed.contains(&task.name) {
            self.prompt
                .say(&format!("Skipping '{}', already proposed.", task.name));
            return Ok(Outcome::Duplicate);
        }
        self.proposed.insert(task.name.clone());

        let tz = self.state.config.timezone;
        let priority = task.effective_priority();
        let length =
            duration_for(&self.state.config.schedule.durations, priority);
        let (start, end) = next_free_slot(&self.busy, self.cursor, length);

        self.prompt.say(&format!(
            "{} [{}]: {}",
            task.name,
            priority,
            format_block((start, end), tz)
        ));
        let choice = loop {
            let answer = self.prompt.ask(
                "[Y] schedule, [S] tomorrow, [X/C] done, [H] high priority: ",
            )?;
            match answer.parse::<Choice>() {
                Ok(choice) => break choice,
                Err(()) => self.prompt.say("Invalid choice, try again."),
            }
        };

        let outcome = match choice {
            Choice::Apply => {
                let request = UpdatePageRequest::default()
                    .property(
                        property::DUE,
                        PropertyInput::date(
                            timestamp(start, tz),
                            Some(timestamp(end, tz)),
                        ),
                    )
                    .property(
                        property::PRIORITY,
                        PropertyInput::status(priority.as_ref()),
                    );
                if !self.write(task, &request).await {
                    return Ok(Outcome::Failed);
                }
                self.busy.push((start, end));
                self.cursor = end;
                Outcome::Scheduled((start, end))
            }
            Choice::Defer => {
                let local = start.with_timezone(&tz).date_naive();
                let tomorrow = local.checked_add_days(Days::new(1)).unwrap_or(local);
                let tomorrow = start_of_day(tomorrow, tz).with_timezone(&Utc);
                let request = UpdatePageRequest::default().property(
                    property::DUE,
                    PropertyInput::date(timestamp(tomorrow, tz), None),
                );
                if !self.write(task, &request).await {
                    return Ok(Outcome::Failed);
                }
                Outcome::Deferred(tomorrow)
            }
            Choice::Done => {
                let request = UpdatePageRequest::default().property(
                    property::STATUS,
                    PropertyInput::status(Status::Done.as_ref()),
                );
                if !self.write(task, &request).await {
                    return Ok(Outcome::Failed);
                }
                self.cursor = end;
                Outcome::Completed
            }
            Choice::High => {
                let request = UpdatePageRequest::default().property(
                    property::PRIORITY,
                    PropertyInput::status(Priority::High.as_ref()),
                );
                if !self.write(task, &request).await {
                    return Ok(Outcome::Failed);
                }
                Outcome::Raised
            }
        };

        info!(
            task = "schedule",
            page_id = task.id,
            outcome = format!("{:?}", outcome),
            dry_run = self.dry_run,
        );

        Ok(outcome)
    }

    async fn write(&self, task: &TaskEntity, request: &UpdatePageRequest) -> bool {
        if self.dry_run {
            return true;
        }

        self.state.update(task, request).await.is_ok()
    }
}

#[cfg(test)]
mod test {
    use chrono::{DateTime, TimeZone, Utc};
    use entity::prelude::{Priority, TaskEntity};
    use mockito::Matcher;
    use serde_json::json;

    use super::{plan_order, Choice, Outcome, Planner};
    use crate::{
        prompt::ScriptedPrompt,
        test_support::{state, updated},
    };

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, hour, minute, 0).unwrap()
    }

    fn task(id: &str, name: &str, priority: Option<Priority>) -> TaskEntity {
        TaskEntity {
            id: id.to_string(),
            name: name.to_string(),
            created_at: at(0, 0),
            priority,
            status: None,
            class: None,
            due: None,
            actually_due: None,
            done: false,
            assigned_time: false,
        }
    }

    #[test]
    fn test_choice_parse() {
        assert_eq!("y".parse(), Ok(Choice::Apply));
        assert_eq!("S".parse(), Ok(Choice::Defer));
        assert_eq!("c".parse(), Ok(Choice::Done));
        assert_eq!("x".parse(), Ok(Choice::Done));
        assert_eq!("High".parse(), Ok(Choice::High));
        assert_eq!("maybe".parse::<Choice>(), Err(()));
    }

    #[test]
    fn test_plan_order_urgent_first() {
        // Arrange
        let mut finished = task("f", "Finished", Some(Priority::MustBeDoneToday));
        finished.done = true;
        let tasks = vec![
            task("a", "A", None),
            task("b", "B", Some(Priority::High)),
            finished,
            task("c", "C", Some(Priority::Medium)),
            task("d", "D", Some(Priority::MustBeDoneToday)),
            task("e", "E", Some(Priority::High)),
        ];

        // Act
        let ids = plan_order(tasks)
            .into_iter()
            .map(|t| t.id)
            .collect::<Vec<_>>();

        // Assert
        assert_eq!(ids, vec!["d", "b", "e", "a", "c"]);
    }

    #[tokio::test]
    async fn test_planner_applies_choices() {
        // Arrange
        let mut server = mockito::Server::new_async().await;
        let report_mock = server
            .mock("PATCH", "/v1/pages/report")
            .match_body(Matcher::Json(json!({
                "properties": {
                    "Due": { "date": {
                        "start": "2025-03-10T11:30:00-04:00",
                        "end": "2025-03-10T13:30:00-04:00"
                    } },
                    "Priority": { "status": { "name": "Must Be Done Today" } }
                }
            })))
            .with_status(200)
            .with_body(updated("report"))
            .create_async()
            .await;
        let call_mock = server
            .mock("PATCH", "/v1/pages/call")
            .match_body(Matcher::Json(json!({
                "properties": { "Due": { "date": { "start": "2025-03-11T00:00:00-04:00" } } }
            })))
            .with_status(200)
            .with_body(updated("call"))
            .create_async()
            .await;
        let email_mock = server
            .mock("PATCH", "/v1/pages/email")
            .match_body(Matcher::Json(json!({
                "properties": { "Priority": { "status": { "name": "High" } } }
            })))
            .with_status(200)
            .with_body(updated("email"))
            .create_async()
            .await;
        let duplicate_mock = server
            .mock("PATCH", "/v1/pages/email-copy")
            .expect(0)
            .create_async()
            .await;
        let state = state(&server);
        let prompt = ScriptedPrompt::new(["bogus", "y", "s", "h"]);
        // 09:10 EDT, one meeting 10:00-11:00 EDT
        let now = at(13, 10);
        let busy = vec![(at(14, 0), at(15, 0))];
        let tasks = vec![
            task("email", "Email", None),
            task("call", "Call", Some(Priority::High)),
            task("report", "Report", Some(Priority::MustBeDoneToday)),
            task("email-copy", "Email", None),
        ];

        // Act
        let report = Planner::new(&state, &prompt, busy, now, false)
            .run(tasks)
            .await
            .unwrap();

        // Assert
        report_mock.assert_async().await;
        call_mock.assert_async().await;
        email_mock.assert_async().await;
        duplicate_mock.assert_async().await;
        assert_eq!(
            report.outcomes,
            vec![
                ("Report".to_string(), Outcome::Scheduled((at(15, 30), at(17, 30)))),
                ("Call".to_string(), Outcome::Deferred(Utc.with_ymd_and_hms(2025, 3, 11, 4, 0, 0).unwrap())),
                ("Email".to_string(), Outcome::Raised),
                ("Email".to_string(), Outcome::Duplicate),
            ]
        );
        assert!(!report.halted);
        assert!(prompt
            .transcript()
            .contains(&"Invalid choice, try again.".to_string()));
    }

    #[tokio::test]
    async fn test_planner_dry_run_writes_nothing() {
        // Arrange
        let mut server = mockito::Server::new_async().await;
        let any_write = server
            .mock("PATCH", Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let state = state(&server);
        let prompt = ScriptedPrompt::new(["y", "x"]);
        let tasks = vec![
            task("a", "A", Some(Priority::Low)),
            task("b", "B", Some(Priority::Medium)),
        ];

        // Act
        let report = Planner::new(&state, &prompt, vec![], at(13, 10), true)
            .run(tasks)
            .await
            .unwrap();

        // Assert
        any_write.assert_async().await;
        assert_eq!(
            report.outcomes,
            vec![
                ("A".to_string(), Outcome::Scheduled((at(13, 30), at(13, 45)))),
                ("B".to_string(), Outcome::Completed),
            ]
        );
    }

    #[tokio::test]
    async fn test_planner_halts_at_end_of_day() {
        // Arrange
        let server = mockito::Server::new_async().await;
        let state = state(&server);
        let prompt = ScriptedPrompt::default();
        // 22:40 EDT rounds to 23:00
        let now = Utc.with_ymd_and_hms(2025, 3, 11, 2, 40, 0).unwrap();

        // Act
        let report = Planner::new(&state, &prompt, vec![], now, true)
            .run(vec![task("a", "A", None)])
            .await
            .unwrap();

        // Assert
        assert!(report.halted);
        assert!(report.outcomes.is_empty());
    }
}
