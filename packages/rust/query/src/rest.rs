//! Strict parser for REST-style query parameters.

use std::collections::HashMap;

use tracing::instrument;

use dcp_shared::{DcpError, Filters, QuerySettings, Result, SortBy, trim_to_null};

/// Single-valued parameter bag from a REST request URI.
pub type QueryParameters = HashMap<String, String>;

pub const TYPE_KEY: &str = "type";
pub const START_KEY: &str = "start";
pub const COUNT_KEY: &str = "count";
pub const SORT_BY_KEY: &str = "sortBy";

/// Parse a non-negative integer parameter, naming it on failure.
fn parse_u32(params: &QueryParameters, key: &str) -> Result<Option<u32>> {
    params
        .get(key)
        .map(|raw| {
            raw.parse::<u32>()
                .map_err(|e| DcpError::bad_parameter_with(key, e.to_string()))
        })
        .transpose()
}

/// Parse REST parameters into query settings.
///
/// Unlike [`parse_named_parameters`](crate::parse_named_parameters), every
/// recognized key is validated and a bad value fails with
/// [`DcpError::BadParameter`]. The returned settings always carry a
/// [`Filters`] container. An absent bag yields default settings.
#[instrument(skip_all)]
pub fn parse_query_parameters(params: Option<&QueryParameters>) -> Result<QuerySettings> {
    let mut settings = QuerySettings::default();
    settings.defaults.interval = true;

    let Some(params) = params else {
        return Ok(settings);
    };

    settings.content_type = trim_to_null(params.get(TYPE_KEY).map(String::as_str)).map(str::to_string);

    let filters = Filters {
        start: parse_u32(params, START_KEY)?,
        count: parse_u32(params, COUNT_KEY)?,
        ..Filters::default()
    };

    if let Some(raw) = params.get(SORT_BY_KEY) {
        let sort_by = SortBy::from_param(raw)
            .ok_or_else(|| DcpError::bad_parameter_with(SORT_BY_KEY, "expected new or old"))?;
        settings.sort_by = Some(sort_by);
    }

    settings.filters = Some(filters);
    Ok(settings)
}
