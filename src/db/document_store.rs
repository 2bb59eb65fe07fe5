use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::db::models::{from_millis, to_millis, DocumentRow};
use crate::db::{new_document_id, next_timestamp, Document, DocumentStore, Filter, StoredDocument};
use crate::error::{AppError, Result};

/// SQLite-backed document store. Bodies are JSON text in a single `documents` table.
#[derive(Clone)]
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database file and apply migrations.
    pub async fn open(db_path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Database ready at {db_path}");
        Ok(Self::new(pool))
    }

    /// Private in-memory database. Single connection so every query sees the same data.
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self::new(pool))
    }

}

async fn fetch_row(
    conn: &mut SqliteConnection,
    collection: &str,
    id: &str,
) -> Result<Option<StoredDocument>> {
    let row = sqlx::query_as::<_, DocumentRow>(
        "SELECT id, data, created_at, updated_at FROM documents WHERE collection = ? AND id = ?",
    )
    .bind(collection)
    .bind(id)
    .fetch_optional(conn)
    .await?;

    row.map(DocumentRow::into_stored).transpose()
}

async fn insert_row(
    conn: &mut SqliteConnection,
    collection: &str,
    id: &str,
    doc: &Document,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Result<()> {
    let body = serde_json::to_string(doc)?;
    sqlx::query(
        r#"
        INSERT INTO documents (collection, id, data, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(collection, id) DO UPDATE SET
            data = excluded.data,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(collection)
    .bind(id)
    .bind(body)
    .bind(to_millis(created_at))
    .bind(to_millis(updated_at))
    .execute(conn)
    .await?;
    Ok(())
}

/// Store timestamps at the precision the table keeps.
fn store_now(previous: Option<DateTime<Utc>>) -> Result<DateTime<Utc>> {
    from_millis(to_millis(next_timestamp(previous)))
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn create(&self, collection: &str, doc: Document) -> Result<StoredDocument> {
        let id = new_document_id();
        let now = store_now(None)?;
        let mut conn = self.pool.acquire().await?;
        insert_row(&mut conn, collection, &id, &doc, now, now).await?;
        debug!(collection, id = %id, "document created");
        Ok(StoredDocument { id, data: doc, created_at: now, updated_at: now })
    }

    async fn set(&self, collection: &str, id: &str, doc: Document) -> Result<StoredDocument> {
        // Read and upsert in one transaction so created_at and the
        // monotonic updated_at come from the row being replaced.
        let mut tx = self.pool.begin().await?;

        let existing = fetch_row(&mut tx, collection, id).await?;
        let created_at = match &existing {
            Some(d) => d.created_at,
            None => store_now(None)?,
        };
        let updated_at = match &existing {
            Some(d) => store_now(Some(d.updated_at))?,
            None => created_at,
        };
        insert_row(&mut tx, collection, id, &doc, created_at, updated_at).await?;

        tx.commit().await?;
        Ok(StoredDocument { id: id.to_string(), data: doc, created_at, updated_at })
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<StoredDocument>> {
        let mut conn = self.pool.acquire().await?;
        fetch_row(&mut conn, collection, id).await
    }

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<StoredDocument>> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            "SELECT id, data, created_at, updated_at FROM documents WHERE collection = ?",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        let mut docs = Vec::with_capacity(rows.len());
        for row in rows {
            let doc = row.into_stored()?;
            if filter.matches(&doc.data) {
                docs.push(doc);
            }
        }
        Ok(docs)
    }

    async fn update(&self, collection: &str, id: &str, patch: Document) -> Result<StoredDocument> {
        let mut tx = self.pool.begin().await?;

        let mut doc = fetch_row(&mut tx, collection, id)
            .await?
            .ok_or_else(|| AppError::NotFound { id: id.to_string() })?;
        for (key, value) in patch {
            doc.data.insert(key, value);
        }
        doc.updated_at = store_now(Some(doc.updated_at))?;

        sqlx::query("UPDATE documents SET data = ?, updated_at = ? WHERE collection = ? AND id = ?")
            .bind(serde_json::to_string(&doc.data)?)
            .bind(to_millis(doc.updated_at))
            .bind(collection)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(doc)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
