//! SQLite-backed Document Storage
//!
//! One table per collection. Each row keeps the document as JSON text next to
//! its `_id` and an insertion sequence used for ordering. Equality filters on
//! scalar fields are pushed down with `json_extract`; every candidate row is
//! still re-checked in Rust so SQLite type affinity never widens a match.

use super::{
    apply_set, assign_id, upserted_document, Collection, DeleteResult, Document, DocumentStore,
    Filter, InsertOneResult, SortOrder, UpdateResult, ID_FIELD,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{params, params_from_iter, types::Value as SqlValue, Connection, OptionalExtension};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub struct SqliteDocumentStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDocumentStore {
    /// Open (or create) the database file and make sure every collection table exists.
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database at {}", db_path))?;
        Self::with_connection(conn)
    }

    /// Private, throwaway database.
    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory().context("open in-memory db")?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        conn.pragma_update(None, "synchronous", "NORMAL").ok();

        for collection in Collection::ALL {
            conn.execute(
                &format!(
                    "CREATE TABLE IF NOT EXISTS {} (
                        seq INTEGER PRIMARY KEY AUTOINCREMENT,
                        id TEXT UNIQUE NOT NULL,
                        doc TEXT NOT NULL
                    )",
                    collection.name()
                ),
                [],
            )
            .with_context(|| format!("Failed to create table {}", collection.name()))?;
        }

        info!("📚 Document store ready ({} collections)", Collection::ALL.len());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

fn parse_doc(raw: &str) -> Result<Document> {
    serde_json::from_str(raw).context("Corrupt document JSON")
}

/// SQL binding for a scalar JSON value as `json_extract` would return it.
fn sql_scalar(value: &Value) -> Option<SqlValue> {
    match value {
        Value::String(s) => Some(SqlValue::Text(s.clone())),
        Value::Bool(b) => Some(SqlValue::Integer(i64::from(*b))),
        Value::Number(n) => n
            .as_i64()
            .map(SqlValue::Integer)
            .or_else(|| n.as_f64().map(SqlValue::Real)),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn json_path(field: &str) -> String {
    format!("$.\"{}\"", field.replace('"', "\\\""))
}

/// WHERE clause plus bindings for the scalar part of `filter`.
fn where_clause(filter: &Filter) -> (String, Vec<SqlValue>) {
    let mut conditions = Vec::new();
    let mut bindings = Vec::new();

    for (field, value) in filter.fields() {
        if field == ID_FIELD {
            if let Value::String(id) = value {
                bindings.push(SqlValue::Text(id.clone()));
                conditions.push(format!("id = ?{}", bindings.len()));
            }
            continue;
        }
        if let Some(bound) = sql_scalar(value) {
            bindings.push(SqlValue::Text(json_path(field)));
            let path_idx = bindings.len();
            bindings.push(bound);
            conditions.push(format!("json_extract(doc, ?{}) = ?{}", path_idx, bindings.len()));
        }
    }

    if conditions.is_empty() {
        (String::new(), bindings)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), bindings)
    }
}

fn load_by_id(conn: &Connection, collection: Collection, id: &str) -> Result<Option<Document>> {
    let raw: Option<String> = conn
        .query_row(
            &format!("SELECT doc FROM {} WHERE id = ?1", collection.name()),
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    raw.as_deref().map(parse_doc).transpose()
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn find_all(&self, collection: Collection, order: SortOrder) -> Result<Vec<Document>> {
        let direction = match order {
            SortOrder::Oldest => "ASC",
            SortOrder::Newest => "DESC",
        };
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT doc FROM {} ORDER BY seq {}",
            collection.name(),
            direction
        ))?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        rows.iter().map(|raw| parse_doc(raw)).collect()
    }

    async fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>> {
        let (clause, bindings) = where_clause(filter);
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT doc FROM {}{} ORDER BY seq ASC",
            collection.name(),
            clause
        ))?;

        let mut rows = stmt.query(params_from_iter(bindings))?;
        while let Some(row) = rows.next()? {
            let raw: String = row.get(0)?;
            let doc = parse_doc(&raw)?;
            if filter.matches(&doc) {
                return Ok(Some(doc));
            }
        }
        Ok(None)
    }

    async fn insert_one(&self, collection: Collection, mut doc: Document) -> Result<InsertOneResult> {
        let id = assign_id(&mut doc);
        let raw = serde_json::to_string(&doc)?;

        let conn = self.conn.lock().await;
        conn.execute(
            &format!("INSERT INTO {} (id, doc) VALUES (?1, ?2)", collection.name()),
            params![id, raw],
        )
        .with_context(|| format!("Failed to insert into {}", collection.name()))?;

        debug!(collection = collection.name(), id = %id, "Inserted document");

        Ok(InsertOneResult {
            acknowledged: true,
            inserted_id: id,
        })
    }

    async fn update_by_id(
        &self,
        collection: Collection,
        id: &str,
        set: Document,
        upsert: bool,
    ) -> Result<UpdateResult> {
        let conn = self.conn.lock().await;

        if let Some(mut doc) = load_by_id(&conn, collection, id)? {
            let modified = apply_set(&mut doc, &set);
            if modified {
                conn.execute(
                    &format!("UPDATE {} SET doc = ?1 WHERE id = ?2", collection.name()),
                    params![serde_json::to_string(&doc)?, id],
                )?;
            }
            return Ok(UpdateResult {
                acknowledged: true,
                matched_count: 1,
                modified_count: u64::from(modified),
                upserted_id: None,
            });
        }

        if !upsert {
            return Ok(UpdateResult {
                acknowledged: true,
                matched_count: 0,
                modified_count: 0,
                upserted_id: None,
            });
        }

        let doc = upserted_document(id, &set);
        conn.execute(
            &format!("INSERT INTO {} (id, doc) VALUES (?1, ?2)", collection.name()),
            params![id, serde_json::to_string(&doc)?],
        )?;

        Ok(UpdateResult {
            acknowledged: true,
            matched_count: 0,
            modified_count: 0,
            upserted_id: Some(id.to_string()),
        })
    }

    async fn delete_by_id(&self, collection: Collection, id: &str) -> Result<DeleteResult> {
        let conn = self.conn.lock().await;
        let rows = conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", collection.name()),
            params![id],
        )?;
        Ok(DeleteResult::deleted(rows as u64))
    }

    async fn delete_many_by_ids(
        &self,
        collection: Collection,
        ids: &[String],
    ) -> Result<DeleteResult> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let mut deleted = 0u64;
        {
            let mut stmt =
                tx.prepare_cached(&format!("DELETE FROM {} WHERE id = ?1", collection.name()))?;
            for id in ids {
                deleted += stmt.execute(params![id])? as u64;
            }
        }
        tx.commit()?;
        Ok(DeleteResult::deleted(deleted))
    }

    async fn count(&self, collection: Collection) -> Result<u64> {
        let conn = self.conn.lock().await;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", collection.name()),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
