use anyhow::Context as _;
use chrono::{DateTime, NaiveDate, Utc};

/// A Notion date value resolved to instants.
///
/// A bare `YYYY-MM-DD` is read as midnight UTC and flagged `date_only`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Due {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub date_only: bool,
}

impl Due {
    pub fn parse(start: &str, end: Option<&str>) -> anyhow::Result<Self> {
        let (start, date_only) = parse_notion_date(start)?;
        let end = match end {
            Some(end) => Some(parse_notion_date(end)?.0),
            None => None,
        };

        Ok(Self {
            start,
            end,
            date_only,
        })
    }

    /// Start and end when both are set.
    pub fn interval(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.end.map(|end| (self.start, end))
    }
}

pub fn parse_notion_date(value: &str) -> anyhow::Result<(DateTime<Utc>, bool)> {
    if value.len() == 10 {
        let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .context(format!("failed to parse date {}", value))?;
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .context("failed to build midnight")?
            .and_utc();
        return Ok((midnight, true));
    }

    let datetime = DateTime::parse_from_rfc3339(value)
        .context(format!("failed to parse datetime {}", value))?;

    Ok((datetime.with_timezone(&Utc), false))
}
