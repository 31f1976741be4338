//! JSON shapes exchanged with the search API.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub const STATUS_QUEUED: u8 = 0;
pub const STATUS_RUNNING: u8 = 1;
pub const STATUS_COMPLETED: u8 = 2;
pub const STATUS_FAILED: u8 = 3;

/// Denominator used when the server reports progress as a percentage.
pub const DEFAULT_PROGRESS_TOTAL: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobPayload {
    pub id: String,
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub repo: String,
    pub status: u8,
    #[serde(default)]
    pub progress: u32,
    #[serde(default = "default_total")]
    pub total: u32,
    #[serde(default)]
    pub matches: u64,
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub started: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub completed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub queue_position: Option<u32>,
}

fn default_total() -> u32 {
    DEFAULT_PROGRESS_TOTAL
}

/// Accepts a missing field, `null`, an empty string or the zero time
/// (`0001-01-01T00:00:00Z`) as "not set".
fn optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw.filter(|value| !value.trim().is_empty()) else {
        return Ok(None);
    };
    let parsed = DateTime::parse_from_rfc3339(raw.trim())
        .map_err(serde::de::Error::custom)?
        .with_timezone(&Utc);
    if parsed.year() <= 1 {
        return Ok(None);
    }
    Ok(Some(parsed))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SummaryItemPayload {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "active_installs")]
    pub installs: Option<u64>,
    #[serde(default)]
    pub matches: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum SummaryList {
    Items(Vec<SummaryItemPayload>),
    Keyed(BTreeMap<String, SummaryItemPayload>),
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SummaryPayload {
    #[serde(default)]
    list: Option<SummaryList>,
}

impl SummaryPayload {
    /// Items in server order. A keyed list comes back ordered by slug, with
    /// each item's slug taken from its key when missing.
    pub(crate) fn into_items(self) -> Vec<SummaryItemPayload> {
        match self.list {
            None => Vec::new(),
            Some(SummaryList::Items(items)) => items,
            Some(SummaryList::Keyed(map)) => map
                .into_iter()
                .map(|(slug, mut item)| {
                    if item.slug.is_empty() {
                        item.slug = slug;
                    }
                    item
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MatchPayload {
    #[serde(default)]
    pub slug: String,
    pub file: String,
    pub line_num: u32,
    #[serde(default)]
    pub line_text: String,
    #[serde(default)]
    pub before: Vec<String>,
    #[serde(default)]
    pub after: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MatchesPayload {
    #[serde(default, alias = "list")]
    pub(crate) matches: Option<Vec<MatchPayload>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRequest {
    pub repo: String,
    pub slug: String,
    pub file: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FileContentPayload {
    #[serde(default)]
    pub(crate) code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecentJobPayload {
    pub id: String,
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub matches: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RecentJobsPayload {
    #[serde(default)]
    pub(crate) searches: Option<Vec<RecentJobPayload>>,
}
