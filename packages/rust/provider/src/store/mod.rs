//! Document store abstraction for provider configuration.
//!
//! The [`DocumentStore`] trait is the only thing the resolver needs from the
//! search backend: run a filter over "match all" and report the exact number
//! of matching documents together with their source trees.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use async_trait::async_trait;
use serde_json::Value;

use dcp_shared::Result;

// ---------------------------------------------------------------------------
// Query model
// ---------------------------------------------------------------------------

/// Path to a field inside a stored document, as a list of object keys.
///
/// Segments are kept apart so that keys containing dots (content type ids)
/// stay unambiguous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Walk `doc` along this path.
    pub fn resolve<'a>(&self, doc: &'a Value) -> Option<&'a Value> {
        self.0
            .iter()
            .try_fold(doc, |node, segment| node.as_object()?.get(segment))
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// Filter applied on top of an always-true match query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldFilter {
    /// Field equals the given string exactly.
    Match { path: FieldPath, value: String },
    /// Field is present and not `null`.
    Exists { path: FieldPath },
}

/// A search request against the document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentQuery {
    pub filter: FieldFilter,
}

impl DocumentQuery {
    /// Documents whose field at `path` equals `value`.
    pub fn match_field(path: FieldPath, value: impl Into<String>) -> Self {
        Self {
            filter: FieldFilter::Match {
                path,
                value: value.into(),
            },
        }
    }

    /// Documents that carry a non-null field at `path`.
    pub fn field_exists(path: FieldPath) -> Self {
        Self {
            filter: FieldFilter::Exists { path },
        }
    }

    /// Evaluate the filter against one document.
    pub fn matches(&self, doc: &Value) -> bool {
        match &self.filter {
            FieldFilter::Match { path, value } => {
                matches!(path.resolve(doc), Some(Value::String(s)) if s == value)
            }
            FieldFilter::Exists { path } => path.resolve(doc).is_some_and(|v| !v.is_null()),
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// One matching document.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    /// Store-assigned document id.
    pub id: String,
    /// The full stored document.
    pub source: Value,
}

/// Result set of a [`DocumentQuery`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchHits {
    /// Exact number of matching documents.
    pub total: u64,
    pub hits: Vec<Hit>,
}

impl SearchHits {
    pub fn from_hits(hits: Vec<Hit>) -> Self {
        Self {
            total: hits.len() as u64,
            hits,
        }
    }
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Abstract document store holding provider configuration documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Run `query` and return every matching document with the exact total.
    async fn search(&self, query: &DocumentQuery) -> Result<SearchHits>;
}
