use std::{fs::OpenOptions, path::Path, sync::Mutex};

use anyhow::Context as _;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod cli;
mod command;

fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let out_file = OpenOptions::new()
                .append(true)
                .create(true)
                .open(path)
                .context(format!("failed to open {}", path.display()))?;

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(out_file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    if let Err(e) = init_tracing(cli.log_file.as_deref()) {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }

    if let Err(e) = command::run(cli).await {
        error!(task = "main", error = format!("{:#}", e));
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
