use std::{
    collections::VecDeque,
    io::{BufRead, Write},
    sync::Mutex,
};

use anyhow::{bail, Context};

/// Where interactive commands ask questions and print progress.
pub trait Prompt {
    /// Shows `question` and returns the trimmed answer.
    fn ask(&self, question: &str) -> anyhow::Result<String>;

    fn say(&self, line: &str);
}

/// Reads answers from stdin.
pub struct ConsolePrompt;

impl Prompt for ConsolePrompt {
    fn ask(&self, question: &str) -> anyhow::Result<String> {
        let mut stdout = std::io::stdout();
        write!(stdout, "{}", question).context("failed to write prompt")?;
        stdout.flush().context("failed to flush prompt")?;

        let mut line = String::new();
        let read = std::io::stdin()
            .lock()
            .read_line(&mut line)
            .context("failed to read answer")?;
        if read == 0 {
            bail!("input closed while waiting for an answer");
        }

        Ok(line.trim().to_string())
    }

    fn say(&self, line: &str) {
        println!("{}", line);
    }
}

/// Replays canned answers and records everything shown.
#[derive(Default)]
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<String>>,
    transcript: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            transcript: Mutex::new(vec![]),
        }
    }

    pub fn transcript(&self) -> Vec<String> {
        self.transcript
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn record(&self, line: &str) {
        self.transcript
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(line.to_string());
    }
}

impl Prompt for ScriptedPrompt {
    fn ask(&self, question: &str) -> anyhow::Result<String> {
        self.record(question);

        let answer = self
            .answers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match answer {
            Some(answer) => Ok(answer.trim().to_string()),
            None => bail!("no scripted answer for {:?}", question),
        }
    }

    fn say(&self, line: &str) {
        self.record(line);
    }
}
