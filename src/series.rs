//! # Series
//! Filter selector and the gap-filled daily count series that drives the chart.
//!
//! The series covers every calendar day from the earliest to the latest
//! retained story, with zero counts for days that had no submissions.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::DashboardError;
use crate::story::StoryRecord;

/// Dropdown filter. Wire values are `ALL` and `AI`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Selector {
    #[default]
    #[serde(rename = "ALL")]
    All,
    #[serde(rename = "AI")]
    Ai,
}

impl Selector {
    pub const ALL_OPTIONS: [Selector; 2] = [Selector::All, Selector::Ai];

    pub fn as_str(self) -> &'static str {
        match self {
            Selector::All => "ALL",
            Selector::Ai => "AI",
        }
    }

    /// Dropdown label shown in the UI.
    pub fn label(self) -> &'static str {
        match self {
            Selector::All => "Show All",
            Selector::Ai => "Show Only A.I Stories",
        }
    }

    pub fn retains(self, record: &StoryRecord) -> bool {
        match self {
            Selector::All => true,
            Selector::Ai => record.contains_ai,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Selector {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ALL" => Ok(Selector::All),
            "AI" => Ok(Selector::Ai),
            other => Err(DashboardError::InvalidSelector(other.to_string())),
        }
    }
}

/// Keep the records the selector admits, preserving store order.
pub fn filter_records(records: Vec<StoryRecord>, selector: Selector) -> Vec<StoryRecord> {
    match selector {
        Selector::All => records,
        Selector::Ai => records.into_iter().filter(|r| selector.retains(r)).collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: u64,
}

/// Count records per calendar day over `[min_day, max_day]`, zero-filling gaps.
pub fn daily_counts(records: &[StoryRecord]) -> Vec<DailyCount> {
    let mut per_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for r in records {
        *per_day.entry(r.day()).or_insert(0) += 1;
    }

    let (Some(&first), Some(&last)) = (per_day.keys().next(), per_day.keys().next_back()) else {
        return Vec::new();
    };

    first
        .iter_days()
        .take_while(|d| *d <= last)
        .map(|date| DailyCount {
            date,
            count: per_day.get(&date).copied().unwrap_or(0),
        })
        .collect()
}
