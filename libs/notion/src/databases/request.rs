use serde::Serialize;
use serde_with::skip_serializing_none;

#[skip_serializing_none]
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct QueryDatabaseRequest {
    pub filter: Option<Filter>,
    pub sorts: Option<Vec<Sort>>,
    pub start_cursor: Option<String>,
    pub page_size: Option<u32>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Filter {
    And { and: Vec<Filter> },
    Property(PropertyFilter),
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PropertyFilter {
    pub property: String,
    #[serde(flatten)]
    pub condition: Condition,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Status(OptionCondition),
    Select(OptionCondition),
    Checkbox(CheckboxCondition),
    Date(DateCondition),
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum OptionCondition {
    Equals(String),
    DoesNotEqual(String),
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum CheckboxCondition {
    Equals(bool),
}

/// Date comparisons take ISO 8601 dates or datetimes.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum DateCondition {
    Equals(String),
    Before(String),
    OnOrBefore(String),
    OnOrAfter(String),
}

impl Filter {
    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::And { and: filters }
    }

    pub fn property(property: &str, condition: Condition) -> Self {
        Filter::Property(PropertyFilter {
            property: property.to_string(),
            condition,
        })
    }

    pub fn status_equals(property: &str, value: &str) -> Self {
        Self::property(
            property,
            Condition::Status(OptionCondition::Equals(value.to_string())),
        )
    }

    pub fn status_does_not_equal(property: &str, value: &str) -> Self {
        Self::property(
            property,
            Condition::Status(OptionCondition::DoesNotEqual(value.to_string())),
        )
    }

    pub fn select_equals(property: &str, value: &str) -> Self {
        Self::property(
            property,
            Condition::Select(OptionCondition::Equals(value.to_string())),
        )
    }

    pub fn checkbox_equals(property: &str, value: bool) -> Self {
        Self::property(
            property,
            Condition::Checkbox(CheckboxCondition::Equals(value)),
        )
    }

    pub fn date(property: &str, condition: DateCondition) -> Self {
        Self::property(property, Condition::Date(condition))
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Sort {
    Property {
        property: String,
        direction: SortDirection,
    },
    Timestamp {
        timestamp: Timestamp,
        direction: SortDirection,
    },
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Timestamp {
    CreatedTime,
    LastEditedTime,
}

impl Sort {
    pub fn oldest_first() -> Self {
        Sort::Timestamp {
            timestamp: Timestamp::CreatedTime,
            direction: SortDirection::Ascending,
        }
    }
}
