//! Canonical query model produced by the query normalizer.

use serde::{Deserialize, Serialize};

/// Sentinel query meaning "match every document".
pub const MATCH_ALL_QUERY: &str = "match_all:{}";

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Result ordering requested by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    New,
    Old,
}

impl SortBy {
    /// Case-insensitive match against `new` / `old`.
    pub fn from_param(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("new") {
            Some(Self::New)
        } else if value.eq_ignore_ascii_case("old") {
            Some(Self::Old)
        } else {
            None
        }
    }
}

/// Histogram bucket size for time-faceted results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "day")]
    Day,
    #[serde(rename = "1w")]
    Week,
    #[default]
    #[serde(rename = "month")]
    Month,
}

impl Interval {
    /// Parse a request value. Case-insensitive; `1w` is an alias for `week`.
    pub fn from_param(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("1w") || value.eq_ignore_ascii_case("week") {
            Some(Self::Week)
        } else if value.eq_ignore_ascii_case("day") {
            Some(Self::Day)
        } else if value.eq_ignore_ascii_case("month") {
            Some(Self::Month)
        } else {
            None
        }
    }

    /// Value handed to the search backend's date histogram.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "1w",
            Self::Month => "month",
        }
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse "published within" filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PastInterval {
    Week,
    Month,
    Quarter,
    Year,
}

impl PastInterval {
    pub fn from_param(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            "quarter" => Some(Self::Quarter),
            "year" => Some(Self::Year),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// QuerySettings
// ---------------------------------------------------------------------------

/// Optional filters narrowing a search request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filters {
    /// Pagination offset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<u32>,
    /// Page size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub author: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub project: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mail_list: Vec<String>,
    /// Lower date bound, verbatim from the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Upper date bound, verbatim from the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Verbatim `past` value; see [`Filters::past_interval`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub past: Option<String>,
}

impl Filters {
    /// Interpret the stored `past` value, if it names a known interval.
    pub fn past_interval(&self) -> Option<PastInterval> {
        self.past.as_deref().and_then(PastInterval::from_param)
    }
}

/// Which fields were filled by a soft fallback rather than by the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultedFields {
    pub interval: bool,
    pub count: bool,
}

/// Canonical representation of a search request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySettings {
    /// Restrict results to one content type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Query text. Always `Some` once sanitized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortBy>,
    #[serde(default)]
    pub interval: Interval,
    /// Legacy "return counts only" flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Filters>,
    #[serde(default)]
    pub defaults: DefaultedFields,
}

impl QuerySettings {
    /// Return the filters container, creating it on first use.
    pub fn filters_mut(&mut self) -> &mut Filters {
        self.filters.get_or_insert_with(Filters::default)
    }
}
