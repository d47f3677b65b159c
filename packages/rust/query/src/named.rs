//! Lenient parser for legacy form-style parameters (`filters[author][]` and friends).

use std::collections::HashMap;

use tracing::instrument;

use dcp_shared::{DcpError, Interval, QuerySettings, Result};

use crate::fallback::{parse_bool, parse_with_fallback};

/// Multi-valued parameter bag as delivered by a servlet-style request.
pub type NamedParameters = HashMap<String, Vec<String>>;

pub const COUNT_KEY: &str = "count";
pub const INTERVAL_KEY: &str = "filters[interval]";
pub const QUERY_KEY: &str = "query";
pub const AUTHOR_KEY: &str = "filters[author][]";
pub const PROJECT_KEY: &str = "filters[project][]";
pub const MAIL_LIST_KEY: &str = "filters[mailList][]";
pub const FROM_KEY: &str = "filters[from]";
pub const TO_KEY: &str = "filters[to]";
pub const PAST_KEY: &str = "filters[past]";

/// First value of a key; a key with no values counts as absent.
fn first<'a>(params: &'a NamedParameters, key: &str) -> Option<&'a str> {
    params.get(key).and_then(|v| v.first()).map(String::as_str)
}

/// All values of a key, if present and non-empty.
fn all(params: &NamedParameters, key: &str) -> Option<Vec<String>> {
    params.get(key).filter(|v| !v.is_empty()).cloned()
}

/// Parse a legacy parameter bag into query settings.
///
/// Only an absent bag is an error. Unparsable `count` and `filters[interval]`
/// values fall back to `false` and [`Interval::Month`] and are recorded in
/// [`QuerySettings::defaults`].
#[instrument(skip_all)]
pub fn parse_named_parameters(params: Option<&NamedParameters>) -> Result<QuerySettings> {
    let params = params.ok_or_else(|| DcpError::invalid_input("no parameters found!"))?;
    let mut settings = QuerySettings::default();

    if let Some(raw) = first(params, COUNT_KEY) {
        let (count, defaulted) =
            parse_with_fallback(COUNT_KEY, Some(raw), false, parse_bool).into_parts();
        settings.count = Some(count);
        settings.defaults.count = defaulted;
    }

    let (interval, defaulted) = parse_with_fallback(
        INTERVAL_KEY,
        first(params, INTERVAL_KEY),
        Interval::Month,
        |v| Interval::from_param(v).ok_or("unknown interval"),
    )
    .into_parts();
    settings.interval = interval;
    settings.defaults.interval = defaulted;

    settings.query = Some(first(params, QUERY_KEY).unwrap_or_default().to_string());

    if let Some(authors) = all(params, AUTHOR_KEY) {
        settings.filters_mut().author = authors;
    }
    if let Some(projects) = all(params, PROJECT_KEY) {
        settings.filters_mut().project = projects;
    }
    if let Some(lists) = all(params, MAIL_LIST_KEY) {
        settings.filters_mut().mail_list = lists;
    }
    if let Some(from) = first(params, FROM_KEY) {
        settings.filters_mut().from = Some(from.to_string());
    }
    if let Some(to) = first(params, TO_KEY) {
        settings.filters_mut().to = Some(to.to_string());
    }
    if let Some(past) = first(params, PAST_KEY) {
        settings.filters_mut().past = Some(past.to_string());
    }

    Ok(settings)
}
