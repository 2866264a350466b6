use regex::Regex;

const MIN_TITLE_LEN: usize = 3;

/// Titles of every `Issue <title>` line.
pub fn extract_issues(text: &str) -> anyhow::Result<Vec<String>> {
    let re = Regex::new(r"Issue\s+(.*?)\n")?;

    Ok(re
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|issue| !issue.is_empty())
        .collect())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownTask {
    pub text: String,
    pub subtasks: Vec<String>,
}

impl MarkdownTask {
    /// `text`, or `text: sub1; sub2` with subtasks.
    pub fn title(&self) -> String {
        if self.subtasks.is_empty() {
            self.text.clone()
        } else {
            format!("{}: {}", self.text, self.subtasks.join("; "))
        }
    }
}

/// Open `-` list items. Items indented by two or more characters become
/// subtasks of the last top-level item; checked ones are dropped.
pub fn parse_markdown_tasks(text: &str) -> anyhow::Result<Vec<MarkdownTask>> {
    let re = Regex::new(r"^(\s*)-\s*(\[[xX ]\])?\s*(.+)$")?;

    let mut tasks: Vec<MarkdownTask> = vec![];
    for line in text.lines() {
        let Some(c) = re.captures(line) else {
            continue;
        };

        let checked = c
            .get(2)
            .is_some_and(|b| b.as_str().eq_ignore_ascii_case("[x]"));
        if checked {
            continue;
        }

        let indent = c.get(1).map_or(0, |m| m.as_str().chars().count());
        let text = c.get(3).map_or("", |m| m.as_str()).trim().to_string();
        if indent < 2 {
            tasks.push(MarkdownTask {
                text,
                subtasks: vec![],
            });
        } else if let Some(parent) = tasks.last_mut() {
            parent.subtasks.push(text);
        }
    }

    Ok(tasks)
}

/// Task titles ready for creation, short fragments dropped.
pub fn markdown_titles(text: &str) -> anyhow::Result<Vec<String>> {
    Ok(parse_markdown_tasks(text)?
        .iter()
        .map(MarkdownTask::title)
        .filter(|t| t.chars().count() >= MIN_TITLE_LEN)
        .collect())
}

#[cfg(test)]
mod test {
    use super::{extract_issues, markdown_titles, parse_markdown_tasks, MarkdownTask};

    #[test]
    fn test_extract_issues() {
        // Arrange
        let text = "Sprint notes\nIssue   Fix login \nsomething else\nIssue Add dark mode\nIssue \ntrailing Issue no newline";

        // Act
        let issues = extract_issues(text).unwrap();

        // Assert
        assert_eq!(issues, vec!["Fix login", "Add dark mode"]);
    }

    #[test]
    fn test_parse_markdown_tasks() {
        // Arrange
        let text = "\
# Notes
  - orphan subtask
- [ ] Write report
  - [ ] outline
  - [x] title page
    - sources
- [x] Call bank
  - hidden under a finished item
- Plain item
not a list item
";

        // Act
        let tasks = parse_markdown_tasks(text).unwrap();

        // Assert
        assert_eq!(
            tasks,
            vec![
                MarkdownTask {
                    text: "Write report".to_string(),
                    subtasks: vec![
                        "outline".to_string(),
                        "sources".to_string(),
                        "hidden under a finished item".to_string(),
                    ],
                },
                MarkdownTask {
                    text: "Plain item".to_string(),
                    subtasks: vec![],
                },
            ]
        );
    }

    #[test]
    fn test_markdown_titles_join_and_drop_short() {
        let text = "- Email\n  - boss\n  - team\n- ok\n- Gym\n";

        let titles = markdown_titles(text).unwrap();

        assert_eq!(titles, vec!["Email: boss; team", "Gym"]);
    }
}
