//! In-memory [`DocumentStore`] implementation for tests and embedding.
//!
//! Documents live in a `Vec` behind `std::sync::RwLock`. Every search is a
//! linear scan.

use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use dcp_shared::{DcpError, Result};

use super::{DocumentQuery, DocumentStore, Hit, SearchHits};

/// In-memory document store.
pub struct MemoryDocumentStore {
    docs: RwLock<Vec<Hit>>,
    next_id: AtomicU64,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Build a store pre-loaded with `docs`.
    pub fn with_documents(docs: impl IntoIterator<Item = Value>) -> Self {
        let store = Self::new();
        for doc in docs {
            store.insert(doc);
        }
        store
    }

    /// Add a document and return its generated id.
    pub fn insert(&self, doc: Value) -> String {
        let id = format!("doc-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut docs = self.docs.write().unwrap_or_else(|e| e.into_inner());
        docs.push(Hit {
            id: id.clone(),
            source: doc,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.docs.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn search(&self, query: &DocumentQuery) -> Result<SearchHits> {
        let docs = self
            .docs
            .read()
            .map_err(|e| DcpError::Storage(format!("memory store lock poisoned: {e}")))?;

        let hits = docs
            .iter()
            .filter(|hit| query.matches(&hit.source))
            .cloned()
            .collect();

        Ok(SearchHits::from_hits(hits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FieldPath;
    use serde_json::json;

    #[tokio::test]
    async fn search_counts_exact_matches() {
        let store = MemoryDocumentStore::with_documents([
            json!({ "name": "a" }),
            json!({ "name": "b" }),
            json!({ "name": "a" }),
        ]);
        assert_eq!(store.len(), 3);

        let hits = store
            .search(&DocumentQuery::match_field(FieldPath::new(["name"]), "a"))
            .await
            .expect("search");
        assert_eq!(hits.total, 2);
        assert_eq!(hits.hits.len(), 2);

        let hits = store
            .search(&DocumentQuery::match_field(FieldPath::new(["name"]), "c"))
            .await
            .expect("search");
        assert_eq!(hits.total, 0);
    }

    #[test]
    fn len_survives_poisoned_lock() {
        let store = std::sync::Arc::new(MemoryDocumentStore::with_documents([json!({ "name": "a" })]));
        let writer = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = writer.docs.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();

        assert!(store.docs.is_poisoned());
        assert_eq!(store.len(), 1);
        store.insert(json!({ "name": "b" }));
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn ids_are_unique() {
        let store = MemoryDocumentStore::new();
        assert!(store.is_empty());
        let first = store.insert(json!({}));
        let second = store.insert(json!({}));
        assert_ne!(first, second);
    }
}
