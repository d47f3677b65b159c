//! Lenient parsing for non-critical legacy parameters.

use std::fmt::Display;

use tracing::debug;

/// A parsed value together with whether it came from the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fallback<T> {
    pub value: T,
    pub defaulted: bool,
}

impl<T> Fallback<T> {
    /// Split into `(value, was_defaulted)`.
    pub fn into_parts(self) -> (T, bool) {
        (self.value, self.defaulted)
    }
}

/// Parse `raw` with `parse`, falling back to `default` when it is absent or invalid.
///
/// Invalid values are logged at debug level and never raised.
pub fn parse_with_fallback<T, E, F>(param: &str, raw: Option<&str>, default: T, parse: F) -> Fallback<T>
where
    E: Display,
    F: FnOnce(&str) -> std::result::Result<T, E>,
{
    let Some(raw) = raw else {
        return Fallback {
            value: default,
            defaulted: true,
        };
    };

    match parse(raw) {
        Ok(value) => Fallback {
            value,
            defaulted: false,
        },
        Err(e) => {
            debug!(param, value = raw, error = %e, "unparsable parameter, using default value");
            Fallback {
                value: default,
                defaulted: true,
            }
        }
    }
}

/// Case-insensitive `true` / `false`.
pub(crate) fn parse_bool(value: &str) -> std::result::Result<bool, String> {
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(format!("'{value}' is not a boolean"))
    }
}
