use anyhow::ensure;
use chrono::{DateTime, Utc};

use super::{Step, StepRunner};
use crate::{
    assess::{self, Assessor},
    budget, dedupe, overdue, prioritize,
    prompt::Prompt,
    schedule, State,
};

/// Runs pipeline steps against the task database. A dry run is taken from
/// [`State::dry_run`] and covers every step.
pub struct TriageRunner<'a, A> {
    pub state: &'a State,
    pub prompt: &'a dyn Prompt,
    pub assessor: &'a A,
    pub now: DateTime<Utc>,
}

/// A step with failed writes fails as a whole.
fn settle(summary: String, failed: usize) -> anyhow::Result<String> {
    ensure!(failed == 0, "{}", summary);

    Ok(summary)
}

impl<A: Assessor> StepRunner for TriageRunner<'_, A> {
    async fn run(&self, step: Step) -> anyhow::Result<String> {
        let (state, now) = (self.state, self.now);

        match step {
            Step::CleanBeforeNow => {
                let report = overdue::clean_before_now(state, now).await?;
                settle(report.to_string(), report.failed)
            }
            Step::CleanSlate => {
                let report = overdue::clean_slate(state, now).await?;
                settle(report.to_string(), report.failed)
            }
            Step::Dedupe => {
                let report = dedupe::deprecate_duplicates(state, now).await?;
                settle(report.to_string(), report.failed)
            }
            Step::Prioritize => {
                let report =
                    prioritize::prioritize(state, self.prompt, now).await?;
                settle(report.to_string(), report.failed)
            }
            Step::Budget => {
                let report = budget::budget(state, now).await?;
                settle(report.to_string(), report.failed)
            }
            Step::Schedule => {
                let report =
                    schedule::run(state, self.prompt, now, state.dry_run).await?;
                settle(report.to_string(), report.failed())
            }
            Step::Assess => {
                let report =
                    assess::assess(state, self.prompt, self.assessor).await?;
                settle(report.to_string(), report.failed)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use anyhow::anyhow;
    use chrono::{TimeZone, Utc};
    use mockito::Matcher;
    use serde_json::json;
    use util::{BudgetWindow, Config, PipelineConfig, StageConfig};

    use super::TriageRunner;
    use crate::{
        assess::{Assessment, Assessor},
        pipeline::{run_pipeline, stages_from_config, Step},
        prompt::ScriptedPrompt,
        test_support::{page, query_body, state, state_with},
    };

    struct NoModel;

    impl Assessor for NoModel {
        async fn assess(&self, _title: &str) -> anyhow::Result<Assessment> {
            Err(anyhow!("no model in tests"))
        }
    }

    struct FixedModel;

    impl Assessor for FixedModel {
        async fn assess(&self, _title: &str) -> anyhow::Result<Assessment> {
            Ok(Assessment {
                priority: "High".to_string(),
                estimated_time: "30 minutes".to_string(),
            })
        }
    }

    fn stage(name: &str, steps: &[&str], parallel: bool) -> StageConfig {
        StageConfig {
            name: name.to_string(),
            steps: steps.iter().map(|s| s.to_string()).collect(),
            parallel,
        }
    }

    #[tokio::test]
    async fn test_dry_run_sweeps_and_dedupe_write_nothing() {
        // Arrange
        let mut server = mockito::Server::new_async().await;
        let created = |day| Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap();
        let query = server
            .mock("POST", "/v1/databases/db123/query")
            .with_status(200)
            .with_body(query_body(vec![
                page("new", "Laundry", created(8), json!({})),
                page("old", "Laundry", created(1), json!({})),
            ]))
            .expect(3)
            .create_async()
            .await;
        let patch = server
            .mock("PATCH", Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let state = state(&server).with_dry_run(true);
        let prompt = ScriptedPrompt::default();
        let runner = TriageRunner {
            state: &state,
            prompt: &prompt,
            assessor: &NoModel,
            now: Utc.with_ymd_and_hms(2025, 3, 10, 15, 0, 0).unwrap(),
        };
        let stages = stages_from_config(&PipelineConfig {
            stages: vec![stage(
                "cleanup",
                &["clean-before-now", "clean-slate", "dedupe"],
                true,
            )],
        })
        .unwrap();

        // Act
        let report = run_pipeline(&stages, &runner).await;

        // Assert
        query.assert_async().await;
        patch.assert_async().await;
        assert!(report.is_success(), "{}", report);
        let dedupe = report.stages[0]
            .outcomes
            .iter()
            .find(|o| o.step == Step::Dedupe)
            .unwrap();
        assert_eq!(
            dedupe.result.as_deref(),
            Ok("scanned 2 task(s), deprecated 1 duplicate(s), 0 failed")
        );
    }

    #[tokio::test]
    async fn test_dry_run_prioritize_budget_assess_write_nothing() {
        // Arrange
        let mut server = mockito::Server::new_async().await;
        let created = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let query = server
            .mock("POST", "/v1/databases/db123/query")
            .with_status(200)
            .with_body(query_body(vec![page("soon", "Report", created, json!({
                "Actually Due": { "type": "date", "date": { "start": "2025-03-11T09:00:00.000Z", "end": null } }
            }))]))
            .expect(3)
            .create_async()
            .await;
        let patch = server
            .mock("PATCH", Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let mut config = Config::default();
        config.budget.windows = vec![BudgetWindow {
            event: "Kyros".to_string(),
            class: "Kyros".to_string(),
            start: "10:00".to_string(),
            end: "12:00".to_string(),
        }];
        let state = state_with(&server, config).with_dry_run(true);
        let prompt = ScriptedPrompt::new(["y", "y"]);
        let runner = TriageRunner {
            state: &state,
            prompt: &prompt,
            assessor: &FixedModel,
            now: Utc.with_ymd_and_hms(2025, 3, 10, 15, 0, 0).unwrap(),
        };
        let stages = stages_from_config(&PipelineConfig {
            stages: vec![
                stage("prioritize", &["prioritize"], false),
                stage("budget", &["budget"], false),
                stage("assess", &["assess"], false),
            ],
        })
        .unwrap();

        // Act
        let report = run_pipeline(&stages, &runner).await;

        // Assert
        query.assert_async().await;
        patch.assert_async().await;
        assert!(report.is_success(), "{}", report);
        assert_eq!(report.stages.len(), 3);
    }

    #[tokio::test]
    async fn test_failed_query_stops_later_stages() {
        // Arrange
        let mut server = mockito::Server::new_async().await;
        let sweep = server
            .mock("POST", "/v1/databases/db123/query")
            .match_body(Matcher::Regex("\"before\"".to_string()))
            .with_status(502)
            .with_body("bad gateway")
            .expect(1)
            .create_async()
            .await;
        let dedupe = server
            .mock("POST", "/v1/databases/db123/query")
            .match_body(Matcher::Regex("\"on_or_after\"".to_string()))
            .with_status(200)
            .with_body(query_body(vec![]))
            .expect(0)
            .create_async()
            .await;
        let state = state(&server).with_dry_run(true);
        let prompt = ScriptedPrompt::default();
        let runner = TriageRunner {
            state: &state,
            prompt: &prompt,
            assessor: &NoModel,
            now: Utc.with_ymd_and_hms(2025, 3, 10, 15, 0, 0).unwrap(),
        };
        let stages = stages_from_config(&PipelineConfig {
            stages: vec![
                StageConfig {
                    name: "sweep".to_string(),
                    steps: vec!["clean-before-now".to_string()],
                    parallel: false,
                },
                StageConfig {
                    name: "dedupe".to_string(),
                    steps: vec!["dedupe".to_string()],
                    parallel: false,
                },
            ],
        })
        .unwrap();

        // Act
        let report = run_pipeline(&stages, &runner).await;

        // Assert
        sweep.assert_async().await;
        dedupe.assert_async().await;
        assert_eq!(report.failed_stage.as_deref(), Some("sweep"));
        assert_eq!(report.stages.len(), 1);
    }

    #[tokio::test]
    async fn test_clean_stages_succeed_on_empty_database() {
        let mut server = mockito::Server::new_async().await;
        let query = server
            .mock("POST", "/v1/databases/db123/query")
            .with_status(200)
            .with_body(query_body(vec![]))
            .expect(3)
            .create_async()
            .await;
        let state = state(&server).with_dry_run(true);
        let prompt = ScriptedPrompt::default();
        let runner = TriageRunner {
            state: &state,
            prompt: &prompt,
            assessor: &NoModel,
            now: Utc.with_ymd_and_hms(2025, 3, 10, 15, 0, 0).unwrap(),
        };
        let stages = stages_from_config(&PipelineConfig {
            stages: vec![StageConfig {
                name: "cleanup".to_string(),
                steps: vec![
                    "clean-before-now".to_string(),
                    "clean-slate".to_string(),
                    "dedupe".to_string(),
                ],
                parallel: true,
            }],
        })
        .unwrap();

        let report = run_pipeline(&stages, &runner).await;

        query.assert_async().await;
        assert!(report.is_success(), "{}", report);
    }
}
