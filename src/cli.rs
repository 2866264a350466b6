use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "triage", version, about = "Triage and schedule a Notion task database")]
pub struct Cli {
    /// Config file, `Config.toml` in the working directory when omitted
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create tasks from titles
    Create {
        /// Class label for every created task
        #[arg(long)]
        class: Option<String>,
        /// Also create `<prefix> 1` .. `<prefix> N`
        #[arg(long, requires = "prefix")]
        count: Option<usize>,
        #[arg(long, requires = "count")]
        prefix: Option<String>,
        titles: Vec<String>,
    },
    /// Deprecate newer copies of duplicated open tasks
    Dedupe,
    /// Raise tasks due within the horizon to Must Be Done Today
    Prioritize,
    /// Move scheduled tasks due before now onto today
    CleanBeforeNow,
    /// Move scheduled tasks due by the end of today onto today
    CleanSlate,
    /// Plan the day interactively
    Schedule {
        /// Ask everything, write nothing
        #[arg(long)]
        dry_run: bool,
    },
    /// Print today's free blocks
    Overview,
    /// Fill the configured class windows with today's tasks
    Budget,
    /// Pull task titles out of notes
    Extract {
        file: PathBuf,
        /// Read markdown list items instead of `Issue` lines
        #[arg(long)]
        markdown: bool,
        /// Create the extracted titles as tasks
        #[arg(long)]
        create: bool,
        #[arg(long, requires = "create")]
        class: Option<String>,
    },
    /// Let a local model prioritise and size unassigned tasks
    Assess,
    /// Run the configured pipeline
    Run {
        #[arg(long)]
        dry_run: bool,
    },
}
