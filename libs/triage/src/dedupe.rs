use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, Utc};
use entity::{prelude::*, property};
use notion::{
    databases::request::{DateCondition, Filter},
    pages::request::{PropertyInput, UpdatePageRequest},
};
use tracing::info;
use util::local_today;

use crate::{status_excludes, State};

#[derive(Debug, Default)]
pub struct DedupeReport {
    pub scanned: usize,
    pub deprecated: Vec<TaskEntity>,
    pub failed: usize,
}

impl fmt::Display for DedupeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scanned {} task(s), deprecated {} duplicate(s), {} failed",
            self.scanned,
            self.deprecated.len(),
            self.failed
        )
    }
}

/// Every task sharing a name with an older one. The oldest of each name is
/// kept; ties keep their input order.
pub fn find_duplicates(tasks: &[TaskEntity]) -> Vec<&TaskEntity> {
    let mut groups: BTreeMap<&str, Vec<&TaskEntity>> = BTreeMap::new();
    for task in tasks {
        groups.entry(task.name.as_str()).or_default().push(task);
    }

    groups
        .into_values()
        .flat_map(|mut group| {
            group.sort_by_key(|t| t.created_at);
            group.into_iter().skip(1)
        })
        .collect()
}

/// Marks newer copies of open, upcoming tasks as `Deprecated`.
pub async fn deprecate_duplicates(
    state: &State,
    now: DateTime<Utc>,
) -> anyhow::Result<DedupeReport> {
    let today = local_today(now, state.config.timezone);

    let mut filters = vec![Filter::date(
        property::DUE,
        DateCondition::OnOrAfter(today.to_string()),
    )];
    filters.extend(status_excludes(&[
        Status::Done,
        Status::HandedOff,
        Status::Deprecated,
    ]));
    filters.push(Filter::checkbox_equals(property::DONE, false));

    let tasks = state.fetch_tasks(Filter::and(filters), vec![]).await?;

    let request = UpdatePageRequest::default().property(
        property::STATUS,
        PropertyInput::status(Status::Deprecated.as_ref()),
    );

    let mut report = DedupeReport {
        scanned: tasks.len(),
        ..Default::default()
    };
    for task in find_duplicates(&tasks) {
        match state.update(task, &request).await {
            Ok(()) => {
                info!(task = "dedupe", page_id = task.id, name = task.name);
                report.deprecated.push(task.clone());
            }
            Err(_) => report.failed += 1,
        }
    }

    Ok(report)
}

#[cfg(test)]
mod test {
    use chrono::{TimeZone, Utc};
    use entity::prelude::TaskEntity;
    use mockito::Matcher;
    use serde_json::json;

    use super::{deprecate_duplicates, find_duplicates};
    use crate::test_support::{page, query_body, state, updated};

    fn task(id: &str, name: &str, day: u32) -> TaskEntity {
        TaskEntity {
            id: id.to_string(),
            name: name.to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap(),
            priority: None,
            status: None,
            class: None,
            due: None,
            actually_due: None,
            done: false,
            assigned_time: false,
        }
    }

    #[test]
    fn test_find_duplicates_keeps_oldest() {
        // Arrange
        let tasks = vec![
            task("b", "Laundry", 5),
            task("a", "Laundry", 2),
            task("c", "Email", 3),
            task("d", "Laundry", 9),
        ];

        // Act
        let ids = find_duplicates(&tasks)
            .into_iter()
            .map(|t| t.id.as_str())
            .collect::<Vec<_>>();

        // Assert
        assert_eq!(ids, vec!["b", "d"]);
    }

    #[test]
    fn test_find_duplicates_none() {
        let tasks = vec![task("a", "One", 1), task("b", "Two", 1)];

        assert!(find_duplicates(&tasks).is_empty());
    }

    #[tokio::test]
    async fn test_deprecate_duplicates_patches_newer_copies() {
        // Arrange
        let mut server = mockito::Server::new_async().await;
        let created = |day| Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap();
        let query = server
            .mock("POST", "/v1/databases/db123/query")
            .match_body(Matcher::PartialJson(json!({
                "filter": { "and": [
                    { "property": "Due", "date": { "on_or_after": "2025-03-10" } },
                    { "property": "Status", "status": { "does_not_equal": "Done" } },
                    { "property": "Status", "status": { "does_not_equal": "Handed Off" } },
                    { "property": "Status", "status": { "does_not_equal": "Deprecated" } },
                    { "property": "Done", "checkbox": { "equals": false } }
                ] }
            })))
            .with_status(200)
            .with_body(query_body(vec![
                page("new", "Laundry", created(8), json!({})),
                page("old", "Laundry", created(1), json!({})),
                page("solo", "Email", created(3), json!({})),
            ]))
            .create_async()
            .await;
        let patch = server
            .mock("PATCH", "/v1/pages/new")
            .match_body(Matcher::Json(json!({
                "properties": { "Status": { "status": { "name": "Deprecated" } } }
            })))
            .with_status(200)
            .with_body(updated("new"))
            .create_async()
            .await;
        let untouched = server
            .mock("PATCH", Matcher::Regex("^/v1/pages/(old|solo)$".to_string()))
            .expect(0)
            .create_async()
            .await;
        let state = state(&server);
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 15, 0, 0).unwrap();

        // Act
        let report = deprecate_duplicates(&state, now).await.unwrap();

        // Assert
        query.assert_async().await;
        patch.assert_async().await;
        untouched.assert_async().await;
        assert_eq!(report.scanned, 3);
        assert_eq!(report.deprecated.len(), 1);
        assert_eq!(report.failed, 0);
    }
}
