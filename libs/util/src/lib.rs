use std::path::Path;

use anyhow::{ensure, Context};

mod config;
mod time;

pub use config::{
    AssessConfig, BudgetConfig, BudgetWindow, Config, CreateConfig,
    Durations, NotionConfig, PipelineConfig, PrioritizeConfig, ScheduleConfig,
    StageConfig,
};
pub use time::{
    at_hour, end_of_day, local_today, round_up_to_half_hour, start_of_day,
};

pub const DEFAULT_NOTION_API_VERSION: &str = "2022-06-28";
pub const DEFAULT_CONFIG_NAME: &str = "Config.toml";

#[derive(Clone)]
pub struct Secrets {
    pub notion_api_key: String,
    pub database_id: String,
    pub notion_api_version: String,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("notion_api_key", &"***")
            .field("database_id", &self.database_id)
            .field("notion_api_version", &self.notion_api_version)
            .finish()
    }
}

/// Loads `.env` when present, then reads the secrets from the environment.
pub fn load_env() -> anyhow::Result<Secrets> {
    dotenv::dotenv().ok();

    secrets_from(|key| std::env::var(key).ok())
}

/// Builds [`Secrets`] from any variable source. Blank values count as
/// missing.
pub fn secrets_from<F>(lookup: F) -> anyhow::Result<Secrets>
where
    F: Fn(&str) -> Option<String>,
{
    let required = |key: &str| -> anyhow::Result<String> {
        let value = lookup(key)
            .map(|v| v.trim().to_string())
            .unwrap_or_default();
        ensure!(!value.is_empty(), "{} was not found", key);
        Ok(value)
    };

    let notion_api_key = required("NOTION_API_KEY")?;
    let database_id = required("DATABASE_ID")?;
    let notion_api_version = lookup("NOTION_API_VERSION")
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_NOTION_API_VERSION.to_string());

    Ok(Secrets {
        notion_api_key,
        database_id,
        notion_api_version,
    })
}

/// Reads a `Config.toml`.
///
/// With `explicit` unset a missing file yields the defaults; an explicitly
/// requested file has to exist.
pub fn load_config(path: &Path, explicit: bool) -> anyhow::Result<Config> {
    if !explicit && !path.exists() {
        return Ok(Config::default());
    }

    let config = std::fs::read_to_string(path)
        .context(format!("failed to read {}", path.display()))?;

    let config = toml::from_str::<Config>(&config)
        .context(format!("failed to parse {}", path.display()))?;

    config.validate()?;

    Ok(config)
}
