use std::fmt;

use entity::{prelude::*, property};
use notion::{
    databases::request::Sort,
    pages::request::{PropertyInput, UpdatePageRequest},
};
use strum::IntoEnumIterator;
use tracing::{error, info, warn};

use crate::{prompt::Prompt, schedule::triage::unassigned_filter, State};

pub mod ollama;

pub use ollama::{Assessment, Assessor, Ollama};

#[derive(Debug, Default)]
pub struct AssessReport {
    pub groups: usize,
    pub updated: usize,
    pub skipped_groups: usize,
    pub failed: usize,
}

impl fmt::Display for AssessReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "assessed {} group(s), updated {} task(s), skipped {} group(s), {} failed",
            self.groups, self.updated, self.skipped_groups, self.failed
        )
    }
}

/// Tasks grouped by title, in the order titles first appear.
pub fn group_by_title(tasks: Vec<TaskEntity>) -> Vec<(String, Vec<TaskEntity>)> {
    let mut groups: Vec<(String, Vec<TaskEntity>)> = vec![];
    for task in tasks {
        match groups.iter_mut().find(|(title, _)| *title == task.name) {
            Some((_, group)) => group.push(task),
            None => groups.push((task.name.clone(), vec![task])),
        }
    }

    groups
}

/// Model labels are matched ignoring case.
fn parse_priority(label: &str) -> Option<Priority> {
    Priority::iter().find(|p| p.as_ref().eq_ignore_ascii_case(label.trim()))
}

fn confirmed(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "" | "y" | "yes")
}

/// Asks the model to prioritise and size each group of unassigned tasks,
/// writing the result back after confirmation.
pub async fn assess<A: Assessor>(
    state: &State,
    prompt: &dyn Prompt,
    llm: &A,
) -> anyhow::Result<AssessReport> {
    let tasks = state
        .fetch_tasks(unassigned_filter(), vec![Sort::oldest_first()])
        .await?;

    let mut report = AssessReport::default();
    for (title, group) in group_by_title(tasks) {
        report.groups += 1;
        prompt.say(&format!("Found {} task(s) titled '{}'", group.len(), title));

        let answer =
            prompt.ask("Do you want to update all tasks with this title? (Y/n): ")?;
        if !confirmed(&answer) {
            report.skipped_groups += 1;
            continue;
        }

        let assessment = match llm.assess(&title).await {
            Ok(assessment) => assessment,
            Err(e) => {
                error!(task = "assess", title, error = format!("{:#}", e));
                prompt.say(&format!("Could not assess '{}', skipping.", title));
                report.skipped_groups += 1;
                continue;
            }
        };
        let Some(priority) = parse_priority(&assessment.priority) else {
            warn!(task = "assess", title, priority = assessment.priority);
            prompt.say(&format!(
                "Unknown priority '{}' for '{}', skipping.",
                assessment.priority, title
            ));
            report.skipped_groups += 1;
            continue;
        };

        prompt.say(&format!(
            "Priority: {}, Estimated time: {}",
            priority, assessment.estimated_time
        ));
        let answer = prompt.ask("Apply this update to all these tasks? (Y/n): ")?;
        if !confirmed(&answer) {
            report.skipped_groups += 1;
            continue;
        }

        let request = UpdatePageRequest::default()
            .property(property::PRIORITY, PropertyInput::status(priority.as_ref()))
            .property(
                property::LEVEL_OF_EFFORT,
                PropertyInput::select(&assessment.estimated_time),
            );
        for task in &group {
            match state.update(task, &request).await {
                Ok(()) => {
                    info!(task = "assess", page_id = task.id, priority = priority.as_ref());
                    report.updated += 1;
                }
                Err(_) => report.failed += 1,
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod test {
    use std::sync::Mutex;

    use anyhow::anyhow;
    use chrono::{TimeZone, Utc};
    use entity::prelude::{Priority, TaskEntity};
    use mockito::Matcher;
    use serde_json::json;

    use super::{assess, group_by_title, parse_priority, Assessment, Assessor};
    use crate::{
        prompt::ScriptedPrompt,
        test_support::{page, query_body, state, updated},
    };

    /// Answers from a fixed list and remembers the titles it was asked about.
    struct FakeAssessor {
        asked: Mutex<Vec<String>>,
    }

    impl Assessor for FakeAssessor {
        async fn assess(&self, title: &str) -> anyhow::Result<Assessment> {
            self.asked.lock().unwrap().push(title.to_string());
            match title {
                "Laundry" => Ok(Assessment {
                    priority: "Low".to_string(),
                    estimated_time: "30 minutes".to_string(),
                }),
                "Taxes" => Ok(Assessment {
                    priority: "Urgent-ish".to_string(),
                    estimated_time: "1 hour".to_string(),
                }),
                _ => Err(anyhow!("model unavailable")),
            }
        }
    }

    #[test]
    fn test_group_by_title_first_seen_order() {
        // Arrange
        let created = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let task = |id: &str, name: &str| TaskEntity {
            id: id.to_string(),
            name: name.to_string(),
            created_at: created,
            priority: None,
            status: None,
            class: None,
            due: None,
            actually_due: None,
            done: false,
            assigned_time: false,
        };
        let tasks = vec![task("1", "B"), task("2", "A"), task("3", "B")];

        // Act
        let groups = group_by_title(tasks);

        // Assert
        let shape = groups
            .iter()
            .map(|(t, g)| (t.as_str(), g.iter().map(|t| t.id.as_str()).collect::<Vec<_>>()))
            .collect::<Vec<_>>();
        assert_eq!(shape, vec![("B", vec!["1", "3"]), ("A", vec!["2"])]);
    }

    #[test]
    fn test_parse_priority_ignores_case() {
        assert_eq!(parse_priority(" high "), Some(Priority::High));
        assert_eq!(parse_priority("Must be done today"), Some(Priority::MustBeDoneToday));
        assert_eq!(parse_priority("soonish"), None);
    }

    #[tokio::test]
    async fn test_assess_updates_confirmed_groups() {
        // Arrange
        let mut server = mockito::Server::new_async().await;
        let created = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let _query = server
            .mock("POST", "/v1/databases/db123/query")
            .with_status(200)
            .with_body(query_body(vec![
                page("l1", "Laundry", created, json!({})),
                page("x1", "Mystery", created, json!({})),
                page("l2", "Laundry", created, json!({})),
                page("t1", "Taxes", created, json!({})),
                page("s1", "Skip me", created, json!({})),
            ]))
            .create_async()
            .await;
        let laundry = server
            .mock("PATCH", Matcher::Regex("^/v1/pages/l[12]$".to_string()))
            .match_body(Matcher::Json(json!({
                "properties": {
                    "Priority": { "status": { "name": "Low" } },
                    "Level of Effort": { "select": { "name": "30 minutes" } }
                }
            })))
            .with_status(200)
            .with_body(updated("l1"))
            .expect(2)
            .create_async()
            .await;
        let others = server
            .mock("PATCH", Matcher::Regex("^/v1/pages/(x1|t1|s1)$".to_string()))
            .expect(0)
            .create_async()
            .await;
        let state = state(&server);
        // Laundry: yes, apply. Mystery: yes (model fails). Taxes: yes (bad
        // priority). Skip me: no.
        let prompt = ScriptedPrompt::new(["", "y", "yes", "Y", "n"]);
        let llm = FakeAssessor {
            asked: Mutex::new(vec![]),
        };

        // Act
        let report = assess(&state, &prompt, &llm).await.unwrap();

        // Assert
        laundry.assert_async().await;
        others.assert_async().await;
        assert_eq!(*llm.asked.lock().unwrap(), vec!["Laundry", "Mystery", "Taxes"]);
        assert_eq!(report.groups, 4);
        assert_eq!(report.updated, 2);
        assert_eq!(report.skipped_groups, 3);
    }
}
