use serde::{Deserialize, Serialize};

/// Values of the `Priority` status property.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
pub enum Priority {
    Unassigned,
    Low,
    Medium,
    High,
    #[strum(serialize = "Must Be Done Today")]
    #[serde(rename = "Must Be Done Today")]
    MustBeDoneToday,
    Someday,
}

impl Priority {
    /// Scheduled ahead of everything else.
    pub fn is_urgent(&self) -> bool {
        matches!(self, Priority::High | Priority::MustBeDoneToday)
    }
}
