use std::fmt;

use anyhow::{ensure, Context};
use entity::{property, task::normalize_title};
use notion::{
    objects::Page,
    pages::request::{CreatePageRequest, PropertyInput},
};
use tracing::{error, info};

use crate::State;

#[derive(Debug, Default)]
pub struct CreateReport {
    /// `(title, page id)`
    pub created: Vec<(String, String)>,
    /// `(title, error)`
    pub failed: Vec<(String, String)>,
}

impl CreateReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

impl fmt::Display for CreateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created {} task(s), {} failed",
            self.created.len(),
            self.failed.len()
        )
    }
}

/// Creates one task titled `title`, tagged with `class` when given.
pub async fn create_task(
    state: &State,
    title: &str,
    class: Option<&str>,
) -> anyhow::Result<Page> {
    let title = normalize_title(title).context("task title is empty")?;

    let mut request = CreatePageRequest::new(&state.database_id)
        .property(property::NAME, PropertyInput::title(&title));
    if let Some(class) = class.and_then(normalize_title) {
        request = request.property(property::CLASS, PropertyInput::select(&class));
    }

    let page = state
        .client
        .create_page(&request)
        .await
        .context(format!("failed to create task {}", title))?;

    Ok(page)
}

/// Creates every non-blank title in order, carrying on past failures.
pub async fn create_tasks(
    state: &State,
    titles: &[String],
    class: Option<&str>,
) -> anyhow::Result<CreateReport> {
    let titles = titles
        .iter()
        .filter_map(|t| normalize_title(t))
        .collect::<Vec<_>>();
    ensure!(!titles.is_empty(), "no task titles given");

    let mut report = CreateReport::default();
    for title in titles {
        match create_task(state, &title, class).await {
            Ok(page) => {
                info!(task = "create task", title, page_id = page.id);
                report.created.push((title, page.id));
            }
            Err(e) => {
                error!(task = "create task", title, error = format!("{:#}", e));
                report.failed.push((title, format!("{:#}", e)));
            }
        }
    }

    Ok(report)
}

/// `prefix 1` .. `prefix count`.
pub fn numbered_titles(prefix: &str, count: usize) -> Vec<String> {
    (1..=count)
        .map(|n| format!("{} {}", prefix.trim(), n))
        .collect()
}
