use std::path::{Path, PathBuf};

use anyhow::{bail, ensure, Context as _};
use chrono::Utc;
use triage::{
    assess::{self, Ollama},
    budget, create, dedupe, extract, overdue,
    pipeline::{run_pipeline, stages_from_config, TriageRunner},
    prioritize,
    prompt::ConsolePrompt,
    schedule, State,
};
use util::{load_config, load_env, Config, DEFAULT_CONFIG_NAME};

use crate::cli::{Cli, Command};

fn config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => load_config(path, true),
        None => load_config(&PathBuf::from(DEFAULT_CONFIG_NAME), false),
    }
}

fn read_titles(file: &Path, markdown: bool) -> anyhow::Result<Vec<String>> {
    let text = std::fs::read_to_string(file)
        .context(format!("failed to read {}", file.display()))?;

    if markdown {
        extract::markdown_titles(&text)
    } else {
        extract::extract_issues(&text)
    }
}

/// Fails the command when some writes did not go through.
fn settle(summary: String, failed: usize) -> anyhow::Result<()> {
    println!("{}", summary);
    ensure!(failed == 0, "{} update(s) failed", failed);

    Ok(())
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = config(cli.config.as_deref())?;

    // Both only touch local files and the config.
    match &cli.command {
        Command::Extract {
            file,
            markdown,
            create: false,
            ..
        } => {
            for title in read_titles(file, *markdown)? {
                println!("{}", title);
            }
            return Ok(());
        }
        Command::Run { .. } => {
            stages_from_config(&config.pipeline)?;
        }
        _ => {}
    }

    let secrets = load_env()?;
    let default_class = config.create.default_class.clone();
    let dry_run = match cli.command {
        Command::Schedule { dry_run } | Command::Run { dry_run } => dry_run,
        _ => false,
    };
    let state = State::new(&secrets, config)?.with_dry_run(dry_run);
    let now = Utc::now();
    let prompt = ConsolePrompt;

    match cli.command {
        Command::Create {
            class,
            count,
            prefix,
            mut titles,
        } => {
            if let (Some(count), Some(prefix)) = (count, prefix) {
                titles.extend(create::numbered_titles(&prefix, count));
            }
            let class = class.or(default_class);
            create_all(&state, &titles, class.as_deref()).await
        }
        Command::Dedupe => {
            let report = dedupe::deprecate_duplicates(&state, now).await?;
            for task in &report.deprecated {
                println!("deprecated {} ({})", task.name, task.id);
            }
            settle(report.to_string(), report.failed)
        }
        Command::Prioritize => {
            let report = prioritize::prioritize(&state, &prompt, now).await?;
            settle(report.to_string(), report.failed)
        }
        Command::CleanBeforeNow => {
            let report = overdue::clean_before_now(&state, now).await?;
            settle(report.to_string(), report.failed)
        }
        Command::CleanSlate => {
            let report = overdue::clean_slate(&state, now).await?;
            settle(report.to_string(), report.failed)
        }
        Command::Schedule { dry_run } => {
            let report = schedule::run(&state, &prompt, now, dry_run).await?;
            ensure!(report.failed() == 0, "{} update(s) failed", report.failed());
            Ok(())
        }
        Command::Overview => {
            let tz = state.config.timezone;
            println!("Free blocks today:");
            for block in schedule::overview(&state, now).await? {
                println!("- {}", schedule::format_block(block, tz));
            }
            Ok(())
        }
        Command::Budget => {
            let report = budget::budget(&state, now).await?;
            let tz = state.config.timezone;
            for (name, block) in &report.scheduled {
                println!("{}: {}", name, schedule::format_block(*block, tz));
            }
            for name in &report.unplaced {
                println!("no room for {}", name);
            }
            settle(report.to_string(), report.failed)
        }
        Command::Extract {
            file,
            markdown,
            class,
            ..
        } => {
            let titles = read_titles(&file, markdown)?;
            let class = class.or(default_class);
            create_all(&state, &titles, class.as_deref()).await
        }
        Command::Assess => {
            let ollama = Ollama::new(&state.config.assess)?;
            let report = assess::assess(&state, &prompt, &ollama).await?;
            settle(report.to_string(), report.failed)
        }
        Command::Run { .. } => {
            let stages = stages_from_config(&state.config.pipeline)?;
            let ollama = Ollama::new(&state.config.assess)?;
            let runner = TriageRunner {
                state: &state,
                prompt: &prompt,
                assessor: &ollama,
                now,
            };

            let report = run_pipeline(&stages, &runner).await;
            println!("{}", report);
            if let Some(stage) = report.failed_stage {
                bail!("pipeline failed at stage {}", stage);
            }
            Ok(())
        }
    }
}

async fn create_all(
    state: &State,
    titles: &[String],
    class: Option<&str>,
) -> anyhow::Result<()> {
    let report = create::create_tasks(state, titles, class).await?;

    for (title, id) in &report.created {
        println!("created {} ({})", title, id);
    }
    for (title, e) in &report.failed {
        println!("failed {}: {}", title, e);
    }
    println!("{}", report);

    ensure!(report.is_success(), "{} task(s) failed", report.failed.len());

    Ok(())
}
