// src/story.rs
//! Story records as read from the backing store, plus timestamp parsing.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::classify::contains_ai;
use crate::error::DashboardError;

/// A row exactly as the store hands it over. `created_at` stays textual
/// until the pipeline parses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStory {
    pub id: i64,
    pub story_id: Option<String>,
    pub title: Option<String>,
    pub created_at: String,
}

impl RawStory {
    pub fn new(id: i64, story_id: &str, title: Option<&str>, created_at: &str) -> Self {
        Self {
            id,
            story_id: Some(story_id.to_string()),
            title: title.map(str::to_string),
            created_at: created_at.to_string(),
        }
    }
}

/// One submission with its derived contains-AI flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoryRecord {
    pub id: i64,
    pub story_id: Option<String>,
    pub title: Option<String>,
    #[serde(serialize_with = "serialize_created_at")]
    pub created_at: NaiveDateTime,
    pub contains_ai: bool,
}

impl StoryRecord {
    /// Parse the raw timestamp and derive the flag. An unparseable
    /// timestamp fails the whole refresh.
    pub fn from_raw(raw: RawStory) -> Result<Self, DashboardError> {
        let created_at =
            parse_timestamp(&raw.created_at).ok_or_else(|| DashboardError::Timestamp {
                id: raw.id,
                raw: raw.created_at.clone(),
            })?;
        let contains_ai = contains_ai(raw.title.as_deref());
        Ok(Self {
            id: raw.id,
            story_id: raw.story_id,
            title: raw.title,
            created_at,
            contains_ai,
        })
    }

    pub fn day(&self) -> NaiveDate {
        self.created_at.date()
    }
}

fn serialize_created_at<S>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.serialize_str(&ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
}

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"];
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse a stored timestamp into wall-clock time.
///
/// Offsets are accepted but dropped; days are bucketed on the time as
/// written, not shifted to UTC.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.naive_local());
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
