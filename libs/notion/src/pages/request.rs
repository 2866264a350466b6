use std::collections::BTreeMap;

use serde::Serialize;

use crate::objects::{DateValue, RichText, SelectOption};

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Parent {
    pub database_id: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CreatePageRequest {
    pub parent: Parent,
    pub properties: BTreeMap<String, PropertyInput>,
}

impl CreatePageRequest {
    pub fn new(database_id: &str) -> Self {
        Self {
            parent: Parent {
                database_id: database_id.to_string(),
            },
            properties: BTreeMap::new(),
        }
    }

    pub fn property(mut self, name: &str, value: PropertyInput) -> Self {
        self.properties.insert(name.to_string(), value);
        self
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct UpdatePageRequest {
    pub properties: BTreeMap<String, PropertyInput>,
}

impl UpdatePageRequest {
    pub fn property(mut self, name: &str, value: PropertyInput) -> Self {
        self.properties.insert(name.to_string(), value);
        self
    }
}

/// A property value in the shape the write endpoints accept,
/// e.g. `{"select": {"name": "Kyros"}}`.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum PropertyInput {
    Title(Vec<RichText>),
    Select(SelectOption),
    Status(SelectOption),
    Date(DateValue),
    Checkbox(bool),
}

impl PropertyInput {
    pub fn title(content: &str) -> Self {
        Self::Title(vec![RichText::text(content)])
    }

    pub fn select(name: &str) -> Self {
        Self::Select(SelectOption {
            name: name.to_string(),
        })
    }

    pub fn status(name: &str) -> Self {
        Self::Status(SelectOption {
            name: name.to_string(),
        })
    }

    pub fn date(start: String, end: Option<String>) -> Self {
        Self::Date(DateValue { start, end })
    }
}
