use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::{connection::Database, helpers::parse_datetime, models::StoreEntry};

pub(crate) fn get_entry(conn: &Connection, key: &str) -> Result<Option<StoreEntry>> {
    let row = conn
        .query_row(
            "SELECT key, value, updated_at FROM kv_store WHERE key = ?1",
            params![key],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )
        .optional()
        .with_context(|| format!("failed to read key {key}"))?;

    match row {
        Some((key, value, updated_at)) => Ok(Some(StoreEntry {
            value: serde_json::from_str(&value)
                .with_context(|| format!("value under {key} is not valid JSON"))?,
            updated_at: parse_datetime(&updated_at, "updated_at")?,
            key,
        })),
        None => Ok(None),
    }
}

pub(crate) fn put_entry(
    conn: &Connection,
    key: &str,
    value: &serde_json::Value,
    updated_at: DateTime<Utc>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO kv_store (key, value, updated_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, serde_json::to_string(value)?, updated_at.to_rfc3339()],
    )
    .with_context(|| format!("failed to write key {key}"))?;
    Ok(())
}

impl Database {
    pub async fn get_entry(&self, key: &str) -> Result<Option<StoreEntry>> {
        let key = key.to_string();
        self.execute(move |conn| get_entry(conn, &key)).await
    }

    pub async fn set_entry(&self, key: &str, value: serde_json::Value) -> Result<()> {
        let key = key.to_string();
        self.execute(move |conn| put_entry(conn, &key, &value, Utc::now()))
            .await
    }
}
