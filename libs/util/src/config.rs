use anyhow::{ensure, Context};
use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub timezone: Tz,
    pub notion: NotionConfig,
    pub create: CreateConfig,
    pub schedule: ScheduleConfig,
    pub prioritize: PrioritizeConfig,
    pub budget: BudgetConfig,
    pub assess: AssessConfig,
    pub pipeline: PipelineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::America::New_York,
            notion: NotionConfig::default(),
            create: CreateConfig::default(),
            schedule: ScheduleConfig::default(),
            prioritize: PrioritizeConfig::default(),
            budget: BudgetConfig::default(),
            assess: AssessConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            (1..=100).contains(&self.notion.page_size),
            "notion.page_size must be between 1 and 100"
        );
        ensure!(
            self.notion.concurrency > 0,
            "notion.concurrency must be positive"
        );
        ensure!(
            self.schedule.day_start_hour < self.schedule.day_end_hour
                && self.schedule.day_end_hour <= 24,
            "schedule hours must satisfy day_start_hour < day_end_hour <= 24"
        );
        let durations = &self.schedule.durations;
        for (key, minutes) in [
            ("low", durations.low),
            ("medium", durations.medium),
            ("high", durations.high),
            ("must_be_done_today", durations.must_be_done_today),
            ("fallback", durations.fallback),
        ] {
            ensure!(
                minutes > 0,
                "schedule.durations.{} must be positive",
                key
            );
        }
        ensure!(
            self.prioritize.horizon_days > 0,
            "prioritize.horizon_days must be positive"
        );
        ensure!(
            self.budget.block_minutes > 0,
            "budget.block_minutes must be positive"
        );
        for window in &self.budget.windows {
            let (start, end) = window.times()?;
            ensure!(
                start < end,
                "budget window {} ends before it starts",
                window.event
            );
        }
        for stage in &self.pipeline.stages {
            ensure!(
                !stage.steps.is_empty(),
                "pipeline stage {} has no steps",
                stage.name
            );
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotionConfig {
    pub base_url: String,
    pub page_size: u32,
    pub max_results: usize,
    pub concurrency: usize,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.notion.com/v1".to_string(),
            page_size: 100,
            max_results: 1000,
            concurrency: 8,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateConfig {
    pub default_class: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub day_start_hour: u32,
    pub day_end_hour: u32,
    pub durations: Durations,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            day_start_hour: 9,
            day_end_hour: 23,
            durations: Durations::default(),
        }
    }
}

/// Block length in minutes per priority.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Durations {
    pub low: u32,
    pub medium: u32,
    pub high: u32,
    pub must_be_done_today: u32,
    /// Used for labels without their own entry.
    pub fallback: u32,
}

impl Default for Durations {
    fn default() -> Self {
        Self {
            low: 15,
            medium: 30,
            high: 60,
            must_be_done_today: 120,
            fallback: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PrioritizeConfig {
    pub property: String,
    pub horizon_days: u32,
}

impl Default for PrioritizeConfig {
    fn default() -> Self {
        Self {
            property: "Actually Due".to_string(),
            horizon_days: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    pub block_minutes: u32,
    pub windows: Vec<BudgetWindow>,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            block_minutes: 60,
            windows: vec![],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BudgetWindow {
    pub event: String,
    pub class: String,
    pub start: String,
    pub end: String,
}

impl BudgetWindow {
    pub fn times(&self) -> anyhow::Result<(NaiveTime, NaiveTime)> {
        let start = NaiveTime::parse_from_str(&self.start, "%H:%M").context(
            format!("failed to parse start of window {}", self.event),
        )?;
        let end = NaiveTime::parse_from_str(&self.end, "%H:%M").context(
            format!("failed to parse end of window {}", self.event),
        )?;

        Ok((start, end))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssessConfig {
    pub base_url: String,
    pub model: String,
}

impl Default for AssessConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub stages: Vec<StageConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stages: vec![
                StageConfig {
                    name: "cleanup".to_string(),
                    steps: vec![
                        "clean-before-now".to_string(),
                        "dedupe".to_string(),
                        "budget".to_string(),
                    ],
                    parallel: true,
                },
                StageConfig {
                    name: "prioritize".to_string(),
                    steps: vec!["prioritize".to_string()],
                    parallel: false,
                },
                StageConfig {
                    name: "plan".to_string(),
                    steps: vec!["schedule".to_string()],
                    parallel: false,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StageConfig {
    pub name: String,
    pub steps: Vec<String>,
    #[serde(default)]
    pub parallel: bool,
}
