use anyhow::Context as _;
use entity::prelude::*;
use notion::{
    databases::request::{Filter, QueryDatabaseRequest, Sort},
    objects::Page,
    pages::request::UpdatePageRequest,
    Client,
};
use tracing::{debug, error, info};
use util::{Config, Secrets};

pub mod assess;
pub mod budget;
pub mod create;
pub mod dedupe;
pub mod extract;
pub mod overdue;
pub mod pipeline;
pub mod prioritize;
pub mod prompt;
pub mod schedule;

/// Everything an operation needs to talk to the task database.
#[derive(Clone, Debug)]
pub struct State {
    pub client: Client,
    pub database_id: String,
    pub config: Config,
    /// Logs patches instead of sending them.
    pub dry_run: bool,
}

impl State {
    pub fn new(secrets: &Secrets, config: Config) -> anyhow::Result<Self> {
        let client = Client::new(
            &secrets.notion_api_key,
            &secrets.notion_api_version,
            &config.notion.base_url,
        )
        .context("failed to build notion client")?;

        Ok(Self {
            client,
            database_id: secrets.database_id.clone(),
            config,
            dry_run: false,
        })
    }

    pub fn with_dry_run(self, dry_run: bool) -> Self {
        Self { dry_run, ..self }
    }

    pub async fn fetch_pages(
        &self,
        filter: Filter,
        sorts: Vec<Sort>,
    ) -> anyhow::Result<Vec<Page>> {
        let request = QueryDatabaseRequest {
            filter: Some(filter),
            sorts: (!sorts.is_empty()).then_some(sorts),
            page_size: Some(self.config.notion.page_size),
            ..Default::default()
        };

        let pages = self
            .client
            .query_all(
                &self.database_id,
                request,
                Some(self.config.notion.max_results),
            )
            .await
            .context("failed to query tasks")?;

        debug!(task = "fetch pages", count = pages.len());

        Ok(pages)
    }

    pub async fn fetch_tasks(
        &self,
        filter: Filter,
        sorts: Vec<Sort>,
    ) -> anyhow::Result<Vec<TaskEntity>> {
        let pages = self.fetch_pages(filter, sorts).await?;

        Ok(pages.iter().map(Page::to_task).collect())
    }

    /// Patches one task. Failures are logged here so callers only count them.
    /// In a dry run the patch is logged and skipped.
    pub async fn update(
        &self,
        task: &TaskEntity,
        request: &UpdatePageRequest,
    ) -> anyhow::Result<()> {
        if self.dry_run {
            info!(
                task = "update task",
                page_id = task.id,
                name = task.name,
                dry_run = true,
                request = serde_json::to_string(request).unwrap_or_default(),
            );
            return Ok(());
        }

        let result = self.client.update_page(&task.id, request).await;

        if let Err(e) = result {
            error!(
                task = "update task",
                page_id = task.id,
                name = task.name,
                error = e.to_string(),
            );
            return Err(e).context(format!("failed to update {}", task.name));
        }

        Ok(())
    }
}

/// Excludes every status in `statuses`.
pub(crate) fn status_excludes(statuses: &[Status]) -> Vec<Filter> {
    statuses
        .iter()
        .map(|s| Filter::status_does_not_equal(entity::property::STATUS, s.as_ref()))
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{DateTime, Utc};
    use serde_json::{json, Value};
    use util::{secrets_from, Config};

    use crate::State;

    pub fn state(server: &mockito::Server) -> State {
        state_with(server, Config::default())
    }

    pub fn state_with(server: &mockito::Server, mut config: Config) -> State {
        config.notion.base_url = format!("{}/v1", server.url());
        let secrets = secrets_from(|key| match key {
            "NOTION_API_KEY" => Some("secret_abc".to_string()),
            "DATABASE_ID" => Some("db123".to_string()),
            _ => None,
        })
        .unwrap();

        State::new(&secrets, config).unwrap()
    }

    /// A page as the query endpoint returns it.
    pub fn page(
        id: &str,
        name: &str,
        created: DateTime<Utc>,
        extra: Value,
    ) -> Value {
        let mut properties = json!({
            "Name": {
                "id": "title",
                "type": "title",
                "title": [{ "type": "text", "text": { "content": name }, "plain_text": name }]
            }
        });
        if let (Some(properties), Some(extra)) =
            (properties.as_object_mut(), extra.as_object())
        {
            properties.extend(extra.clone());
        }

        json!({
            "id": id,
            "created_time": created.to_rfc3339(),
            "properties": properties
        })
    }

    pub fn query_body(pages: Vec<Value>) -> String {
        json!({ "results": pages, "has_more": false, "next_cursor": null })
            .to_string()
    }

    pub fn updated(id: &str) -> String {
        json!({
            "id": id,
            "created_time": "2025-03-01T00:00:00.000Z",
            "properties": {}
        })
        .to_string()
    }
}
