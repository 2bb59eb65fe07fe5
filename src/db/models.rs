/// Database row types matching the schema in migrations/.
/// Used by sqlx for typed queries.
use chrono::{DateTime, Utc};

use crate::db::{Document, StoredDocument};
use crate::error::{AppError, Result};

#[derive(Debug, sqlx::FromRow)]
pub struct DocumentRow {
    pub id: String,
    pub data: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl DocumentRow {
    pub fn into_stored(self) -> Result<StoredDocument> {
        let data: Document = serde_json::from_str(&self.data)?;
        Ok(StoredDocument {
            id: self.id,
            data,
            created_at: from_millis(self.created_at)?,
            updated_at: from_millis(self.updated_at)?,
        })
    }
}

pub fn to_millis(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

pub fn from_millis(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| AppError::Store(format!("timestamp out of range: {ms}")))
}
