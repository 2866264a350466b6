use anyhow::{bail, ensure, Context};
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use util::AssessConfig;

/// What the model thinks of a task title.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Assessment {
    #[serde(rename = "new_priority")]
    pub priority: String,
    #[serde(rename = "new_estimated_time")]
    pub estimated_time: String,
}

pub trait Assessor {
    fn assess(
        &self,
        title: &str,
    ) -> impl std::future::Future<Output = anyhow::Result<Assessment>> + Send;
}

#[derive(Debug, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
}

/// A local Ollama server.
#[derive(Debug, Clone)]
pub struct Ollama {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl Ollama {
    pub fn new(config: &AssessConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::ClientBuilder::new()
            .default_headers(headers)
            .build()
            .context("failed to build ollama client")?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            client,
        })
    }

    pub async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .context("failed to reach ollama")?;

        let status_code = response.status();
        let text = response.text().await;

        ensure!(
            status_code.is_success(),
            "status code: {}, response: {:?}",
            status_code,
            text
        );

        let response = serde_json::from_str::<GenerateResponse>(&text?)
            .context("failed to parse response")?;
        debug!(task = "ollama", output = response.response);

        Ok(response.response)
    }
}

impl Assessor for Ollama {
    async fn assess(&self, title: &str) -> anyhow::Result<Assessment> {
        let output = self.generate(&assessment_prompt(title)).await?;

        parse_assessment(&output)
    }
}

pub fn assessment_prompt(title: &str) -> String {
    format!(
        r#"You are an expert task assessor. Given an input string 'title' that represents a task name, evaluate the task and output two variables in JSON format:
"new_priority": (High, Medium, or Low) based on the task's intrinsic importance, complexity, and impact,
"new_estimated_time": a human-readable time estimate (e.g., '5 minutes', '15 minutes', '1 hour', etc) based on the typical duration for similar tasks.
For example, if the input 'title' is '1 Hr of GMAT Prep', the output should be:
{{"new_priority": "High", "new_estimated_time": "1 hour"}}
Now, process the following input:
title: {}"#,
        title
    )
}

/// Reads the model output as JSON, falling back to picking the two fields out
/// of surrounding prose.
pub fn parse_assessment(output: &str) -> anyhow::Result<Assessment> {
    match serde_json::from_str::<Assessment>(output.trim()) {
        Ok(assessment) => return Ok(assessment),
        Err(e) => warn!(task = "parse assessment", error = e.to_string()),
    }

    let field = |name: &str| -> anyhow::Result<Option<String>> {
        let re = Regex::new(&format!(r#""{}":\s*"([^"]+)""#, name))?;
        Ok(re
            .captures(output)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string()))
    };

    match (field("new_priority")?, field("new_estimated_time")?) {
        (Some(priority), Some(estimated_time)) => Ok(Assessment {
            priority,
            estimated_time,
        }),
        _ => bail!("could not read an assessment from {:?}", output),
    }
}
