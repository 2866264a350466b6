use serde::Deserialize;

use crate::objects::Page;

#[derive(Deserialize, Debug, Clone)]
pub struct QueryDatabaseResponse {
    pub results: Vec<Page>,
    #[serde(default)]
    pub has_more: bool,
    pub next_cursor: Option<String>,
}
