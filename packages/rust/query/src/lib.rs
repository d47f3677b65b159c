//! Query normalization for the DCP search API.
//!
//! Turns raw request parameters into a canonical [`QuerySettings`] value.
//! Two parsers exist:
//! - [`parse_named_parameters`]: legacy form-style bag, lenient (soft fallbacks)
//! - [`parse_query_parameters`]: REST bag, strict ([`DcpError::BadParameter`])
//!
//! [`sanitize`] then canonicalizes the query text.
//!
//! [`QuerySettings`]: dcp_shared::QuerySettings
//! [`DcpError::BadParameter`]: dcp_shared::DcpError::BadParameter

mod fallback;
mod named;
mod rest;
mod sanitize;

pub use fallback::{Fallback, parse_with_fallback};
pub use named::{NamedParameters, parse_named_parameters};
pub use rest::{QueryParameters, parse_query_parameters};
pub use sanitize::{sanitize, sanitize_query};

/// Parameter names understood by the legacy parser.
pub mod named_keys {
    pub use crate::named::{
        AUTHOR_KEY, COUNT_KEY, FROM_KEY, INTERVAL_KEY, MAIL_LIST_KEY, PAST_KEY, PROJECT_KEY,
        QUERY_KEY, TO_KEY,
    };
}

/// Parameter names understood by the REST parser.
pub mod rest_keys {
    pub use crate::rest::{COUNT_KEY, SORT_BY_KEY, START_KEY, TYPE_KEY};
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcp_shared::Interval;

    #[test]
    fn legacy_bag_end_to_end() {
        let mut params = NamedParameters::new();
        params.insert(
            named_keys::AUTHOR_KEY.into(),
            vec!["alice".into(), "bob".into()],
        );
        params.insert(named_keys::QUERY_KEY.into(), vec!["foo??bar".into()]);

        let settings = parse_named_parameters(Some(&params)).expect("parse");
        let settings = sanitize(Some(settings)).expect("sanitize");

        assert_eq!(settings.query.as_deref(), Some("foo?bar"));
        assert_eq!(
            settings.filters.as_ref().map(|f| f.author.clone()),
            Some(vec!["alice".to_string(), "bob".to_string()])
        );
        assert_eq!(settings.interval, Interval::Month);
    }

    #[test]
    fn settings_render_as_json() {
        let mut params = NamedParameters::new();
        params.insert(named_keys::INTERVAL_KEY.into(), vec!["1w".into()]);
        let settings = sanitize(Some(parse_named_parameters(Some(&params)).expect("parse")))
            .expect("sanitize");
        let json = serde_json::to_value(&settings).expect("serialize");
        assert_eq!(json["interval"], "1w");
        assert_eq!(json["query"], "");
    }
}
