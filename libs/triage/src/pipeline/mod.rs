use std::{fmt, future::Future, str::FromStr};

use anyhow::{anyhow, bail, ensure};
use futures::future::join_all;
use tracing::{error, info};
use util::PipelineConfig;

mod runner;

pub use runner::TriageRunner;

/// One operation the pipeline can run.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[strum(serialize_all = "kebab-case")]
pub enum Step {
    CleanBeforeNow,
    CleanSlate,
    Dedupe,
    Prioritize,
    Budget,
    Schedule,
    Assess,
}

impl Step {
    /// Steps that read answers from the terminal.
    pub fn is_interactive(&self) -> bool {
        matches!(self, Step::Prioritize | Step::Schedule | Step::Assess)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub name: String,
    pub steps: Vec<Step>,
    pub parallel: bool,
}

/// Validates `[[pipeline.stages]]`.
pub fn stages_from_config(config: &PipelineConfig) -> anyhow::Result<Vec<Stage>> {
    ensure!(!config.stages.is_empty(), "pipeline has no stages");

    config
        .stages
        .iter()
        .map(|stage| {
            let steps = stage
                .steps
                .iter()
                .map(|s| {
                    Step::from_str(s.trim()).map_err(|_| {
                        anyhow!("unknown step {} in stage {}", s, stage.name)
                    })
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            ensure!(!steps.is_empty(), "pipeline stage {} has no steps", stage.name);

            if stage.parallel {
                if let Some(step) = steps.iter().find(|s| s.is_interactive()) {
                    bail!(
                        "interactive step {} cannot run in parallel stage {}",
                        step,
                        stage.name
                    );
                }
            }

            Ok(Stage {
                name: stage.name.clone(),
                steps,
                parallel: stage.parallel,
            })
        })
        .collect()
}

pub trait StepRunner {
    /// Runs `step`, returning a one-line summary.
    fn run(&self, step: Step) -> impl Future<Output = anyhow::Result<String>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub step: Step,
    /// Summary on success, error chain on failure.
    pub result: Result<String, String>,
}

impl StepOutcome {
    fn new(stage: &str, step: Step, result: anyhow::Result<String>) -> Self {
        let result = match result {
            Ok(summary) => {
                info!(task = "pipeline", stage, step = step.as_ref(), summary);
                Ok(summary)
            }
            Err(e) => {
                let e = format!("{:#}", e);
                error!(task = "pipeline", stage, step = step.as_ref(), error = e);
                Err(e)
            }
        };

        Self { step, result }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub name: String,
    pub outcomes: Vec<StepOutcome>,
}

impl StageReport {
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub stages: Vec<StageReport>,
    pub failed_stage: Option<String>,
}

impl PipelineReport {
    pub fn is_success(&self) -> bool {
        self.failed_stage.is_none()
    }
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stage in &self.stages {
            writeln!(f, "[{}]", stage.name)?;
            for outcome in &stage.outcomes {
                match &outcome.result {
                    Ok(summary) => writeln!(f, "  ok   {}: {}", outcome.step, summary)?,
                    Err(e) => writeln!(f, "  FAIL {}: {}", outcome.step, e)?,
                }
            }
        }
        match &self.failed_stage {
            Some(stage) => write!(f, "pipeline stopped at stage {}", stage),
            None => write!(f, "pipeline finished"),
        }
    }
}

async fn run_stage<R: StepRunner>(stage: &Stage, runner: &R) -> StageReport {
    let outcomes = if stage.parallel {
        let results = join_all(stage.steps.iter().map(|step| runner.run(*step))).await;
        stage
            .steps
            .iter()
            .zip(results)
            .map(|(step, result)| StepOutcome::new(&stage.name, *step, result))
            .collect()
    } else {
        let mut outcomes = vec![];
        for step in &stage.steps {
            let outcome = StepOutcome::new(&stage.name, *step, runner.run(*step).await);
            let failed = outcome.result.is_err();
            outcomes.push(outcome);
            if failed {
                break;
            }
        }
        outcomes
    };

    StageReport {
        name: stage.name.clone(),
        outcomes,
    }
}

/// Runs the stages in order and stops at the first one with a failed step.
pub async fn run_pipeline<R: StepRunner>(stages: &[Stage], runner: &R) -> PipelineReport {
    let mut report = PipelineReport::default();
    for stage in stages {
        info!(
            task = "pipeline",
            stage = stage.name,
            parallel = stage.parallel,
            steps = stage.steps.len(),
        );

        let stage_report = run_stage(stage, runner).await;
        let failed = !stage_report.is_success();
        report.stages.push(stage_report);

        if failed {
            error!(task = "pipeline", stage = stage.name, "stage failed");
            report.failed_stage = Some(stage.name.clone());
            break;
        }
    }

    report
}
