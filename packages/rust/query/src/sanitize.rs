//! Query text sanitization.
//!
//! Each pass is a function `&str -> String` applied in sequence. Wildcard
//! adjacency is resolved before `?` runs are collapsed, so alternating
//! sequences such as `*?*?` reduce to a single `*`.

use std::sync::LazyLock;

use regex::Regex;

use dcp_shared::{DcpError, MATCH_ALL_QUERY, QuerySettings, Result};

/// Sanitize raw query text. Absent input becomes the match-all sentinel.
///
/// Idempotent: `sanitize_query(Some(&sanitize_query(q))) == sanitize_query(q)`.
pub fn sanitize_query(query: Option<&str>) -> String {
    let Some(query) = query else {
        return MATCH_ALL_QUERY.to_string();
    };

    let mut result = query.trim().to_string();
    result = collapse_wildcard_runs(&result);
    result = collapse_placeholder_runs(&result);
    result
}

/// Sanitize the query of a settings value, taking ownership and handing it back.
pub fn sanitize(settings: Option<QuerySettings>) -> Result<QuerySettings> {
    let mut settings =
        settings.ok_or_else(|| DcpError::invalid_input("No query settings provided!"))?;
    settings.query = Some(sanitize_query(settings.query.as_deref()));
    Ok(settings)
}

// ---------------------------------------------------------------------------
// Pass 1: Wildcard runs
// ---------------------------------------------------------------------------

/// Collapse any run of `*`/`?` that contains at least one `*` into a single `*`.
fn collapse_wildcard_runs(query: &str) -> String {
    static WILDCARD_RUN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[*?]*\*[*?]*").expect("valid regex"));

    WILDCARD_RUN_RE.replace_all(query, "*").to_string()
}

// ---------------------------------------------------------------------------
// Pass 2: Placeholder runs
// ---------------------------------------------------------------------------

/// Collapse runs of `?` into a single `?`.
fn collapse_placeholder_runs(query: &str) -> String {
    static PLACEHOLDER_RUN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\?+").expect("valid regex"));

    PLACEHOLDER_RUN_RE.replace_all(query, "?").to_string()
}
