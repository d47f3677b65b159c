//! Small string helpers shared by the parsers and resolvers.

/// Trim a string and return `None` if nothing is left.
pub fn trim_to_null(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// `true` for `None`, empty, or whitespace-only strings.
pub fn is_blank(value: Option<&str>) -> bool {
    trim_to_null(value).is_none()
}
