use std::{collections::HashMap, str::FromStr};

use chrono::{DateTime, Utc};
use entity::{
    prelude::*,
    property,
    task::UNNAMED_TASK,
};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use tracing::warn;

/// A database row as returned by the pages and query endpoints.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Page {
    pub id: String,
    pub created_time: DateTime<Utc>,
    #[serde(default)]
    pub properties: HashMap<String, PropertyValue>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
    Title {
        title: Vec<RichText>,
    },
    Select {
        select: Option<SelectOption>,
    },
    Status {
        status: Option<SelectOption>,
    },
    Date {
        date: Option<DateValue>,
    },
    Checkbox {
        checkbox: bool,
    },
    #[serde(other)]
    Unsupported,
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct RichText {
    pub text: Option<Text>,
    pub plain_text: Option<String>,
}

impl RichText {
    pub fn text(content: &str) -> Self {
        Self {
            text: Some(Text {
                content: content.to_string(),
            }),
            plain_text: None,
        }
    }

    fn as_str(&self) -> &str {
        self.plain_text
            .as_deref()
            .or(self.text.as_ref().map(|t| t.content.as_str()))
            .unwrap_or_default()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Text {
    pub content: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SelectOption {
    pub name: String,
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DateValue {
    pub start: String,
    pub end: Option<String>,
}

impl Page {
    /// The title segments joined, or `Unnamed Task` when empty.
    pub fn title(&self) -> String {
        let title = self
            .properties
            .get(property::NAME)
            .into_iter()
            .chain(self.properties.values())
            .find_map(|value| match value {
                PropertyValue::Title { title } => Some(title),
                _ => None,
            });

        let name = title
            .map(|segments| {
                segments.iter().map(RichText::as_str).collect::<String>()
            })
            .unwrap_or_default();

        if name.trim().is_empty() {
            UNNAMED_TASK.to_string()
        } else {
            name
        }
    }

    /// Name of a select or status option.
    pub fn option_name(&self, name: &str) -> Option<&str> {
        match self.properties.get(name)? {
            PropertyValue::Select {
                select: Some(option),
            }
            | PropertyValue::Status {
                status: Some(option),
            } => Some(option.name.as_str()),
            _ => None,
        }
    }

    pub fn checkbox(&self, name: &str) -> bool {
        matches!(
            self.properties.get(name),
            Some(PropertyValue::Checkbox { checkbox: true })
        )
    }

    /// Parsed date property. Unparseable values are logged and skipped.
    pub fn date(&self, name: &str) -> Option<Due> {
        let Some(PropertyValue::Date { date: Some(date) }) =
            self.properties.get(name)
        else {
            return None;
        };

        match Due::parse(&date.start, date.end.as_deref()) {
            Ok(due) => Some(due),
            Err(e) => {
                warn!(
                    task = "parse date property",
                    page_id = self.id,
                    property = name,
                    error = e.to_string(),
                );
                None
            }
        }
    }

    pub fn to_task(&self) -> TaskEntity {
        TaskEntity {
            id: self.id.clone(),
            name: self.title(),
            created_at: self.created_time,
            priority: self
                .option_name(property::PRIORITY)
                .and_then(|p| Priority::from_str(p).ok()),
            status: self.option_name(property::STATUS).map(String::from),
            class: self.option_name(property::CLASS).map(String::from),
            due: self.date(property::DUE),
            actually_due: self.date(property::ACTUALLY_DUE),
            done: self.checkbox(property::DONE),
            assigned_time: self.checkbox(property::ASSIGNED_TIME),
        }
    }
}
