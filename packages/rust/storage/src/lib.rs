//! libSQL storage for provider configuration documents.
//!
//! The [`Storage`] struct wraps a libSQL database holding provider documents
//! as JSON and implements [`DocumentStore`] on top of SQLite's JSON functions.
//!
//! **Access rules:**
//! - `dcp provider import`: read-write via [`Storage::open`]
//! - lookups from a serving process: read-only via [`Storage::open_readonly`]

mod migrations;

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database, params};
use serde_json::Value;
use uuid::Uuid;

use dcp_provider::{DocumentQuery, DocumentStore, FieldFilter, FieldPath, Hit, SearchHits};
use dcp_shared::{DcpError, ProviderDefinition, Result};

fn storage_err(e: impl std::fmt::Display) -> DcpError {
    DcpError::Storage(e.to_string())
}

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

/// Summary row returned by [`Storage::list_documents`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSummary {
    pub id: String,
    pub name: String,
    pub updated_at: String,
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DcpError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;

        let conn = db.connect().map_err(storage_err)?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open an existing database at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DcpError::Storage(format!(
                "database {} does not exist",
                path.display()
            )));
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;

        let conn = db.connect().map_err(storage_err)?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    DcpError::Storage(format!("migration v{} failed: {e}", migration.version))
                })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(DcpError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Document operations
    // -----------------------------------------------------------------------

    /// Validate and store a provider document. Returns the generated id.
    ///
    /// Names are not checked for uniqueness here; the resolver reports
    /// duplicates when they are looked up.
    pub async fn insert_document(&self, doc: &Value) -> Result<String> {
        self.check_writable()?;
        let def = ProviderDefinition::from_document(doc)?;

        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();
        let json = serde_json::to_string(doc).map_err(|e| DcpError::Serialization(e.to_string()))?;

        self.conn
            .execute(
                "INSERT INTO provider_documents (id, name, document, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id.as_str(), def.name.as_str(), json, now.as_str(), now.as_str()],
            )
            .await
            .map_err(storage_err)?;

        tracing::debug!(%id, name = %def.name, "stored provider document");
        Ok(id)
    }

    /// Get a stored document by id.
    pub async fn get_document(&self, id: &str) -> Result<Option<Value>> {
        let mut rows = self
            .conn
            .query(
                "SELECT document FROM provider_documents WHERE id = ?1",
                params![id],
            )
            .await
            .map_err(storage_err)?;

        match rows.next().await.map_err(storage_err)? {
            Some(row) => {
                let json: String = row.get(0).map_err(storage_err)?;
                parse_document(id, &json).map(Some)
            }
            None => Ok(None),
        }
    }

    /// List all stored documents, ordered by name.
    pub async fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, updated_at FROM provider_documents ORDER BY name, created_at",
                params![],
            )
            .await
            .map_err(storage_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            results.push(DocumentSummary {
                id: row.get::<String>(0).map_err(storage_err)?,
                name: row.get::<String>(1).map_err(storage_err)?,
                updated_at: row.get::<String>(2).map_err(storage_err)?,
            });
        }
        Ok(results)
    }

    /// Delete a document by id. Returns `true` if a row was removed.
    pub async fn delete_document(&self, id: &str) -> Result<bool> {
        self.check_writable()?;
        let affected = self
            .conn
            .execute("DELETE FROM provider_documents WHERE id = ?1", params![id])
            .await
            .map_err(storage_err)?;
        Ok(affected > 0)
    }

    /// Run a select returning `(id, document)` rows and collect them as hits.
    async fn collect_hits(&self, sql: &str, args: Vec<libsql::Value>) -> Result<SearchHits> {
        let mut rows = self.conn.query(sql, args).await.map_err(storage_err)?;

        let mut hits = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            let id: String = row.get(0).map_err(storage_err)?;
            let json: String = row.get(1).map_err(storage_err)?;
            let source = parse_document(&id, &json)?;
            hits.push(Hit { id, source });
        }
        Ok(SearchHits::from_hits(hits))
    }
}

fn parse_document(id: &str, json: &str) -> Result<Value> {
    serde_json::from_str(json)
        .map_err(|e| DcpError::Storage(format!("stored document {id} is not valid JSON: {e}")))
}

/// Convert a [`FieldPath`] to an SQLite JSON path with every key quoted.
///
/// Returns `None` when a segment contains `"`, which SQLite path labels
/// cannot express.
fn json_path(path: &FieldPath) -> Option<String> {
    let mut out = String::from("$");
    for segment in path.segments() {
        if segment.contains('"') {
            return None;
        }
        out.push_str(".\"");
        out.push_str(segment);
        out.push('"');
    }
    Some(out)
}

impl Storage {
    /// Evaluate `query` in Rust over every stored document.
    async fn scan(&self, query: &DocumentQuery) -> Result<SearchHits> {
        let all = self
            .collect_hits(
                "SELECT id, document FROM provider_documents ORDER BY created_at",
                Vec::new(),
            )
            .await?;
        let hits = all
            .hits
            .into_iter()
            .filter(|hit| query.matches(&hit.source))
            .collect();
        Ok(SearchHits::from_hits(hits))
    }
}

#[async_trait]
impl DocumentStore for Storage {
    async fn search(&self, query: &DocumentQuery) -> Result<SearchHits> {
        let hits = match &query.filter {
            FieldFilter::Match { path, value } => match json_path(path) {
                Some(path) => {
                    self.collect_hits(
                        "SELECT id, document FROM provider_documents
                         WHERE json_type(document, ?1) = 'text'
                           AND json_extract(document, ?1) = ?2
                         ORDER BY created_at",
                        vec![path.into(), value.clone().into()],
                    )
                    .await?
                }
                None => self.scan(query).await?,
            },
            FieldFilter::Exists { path } => match json_path(path) {
                Some(path) => {
                    self.collect_hits(
                        "SELECT id, document FROM provider_documents
                         WHERE json_type(document, ?1) IS NOT NULL
                           AND json_type(document, ?1) != 'null'
                         ORDER BY created_at",
                        vec![path.into()],
                    )
                    .await?
                }
                None => self.scan(query).await?,
            },
        };

        tracing::debug!(filter = ?query.filter, total = hits.total, "document search");
        Ok(hits)
    }
}
