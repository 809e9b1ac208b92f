use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::{connection::Database, helpers::parse_datetime};

/// Raw contents of a key-value slot.
#[derive(Debug, Clone)]
pub struct StoredSlot {
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

pub struct SlotRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SlotRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn read(&self, key: &str) -> Result<Option<StoredSlot>> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT value, updated_at FROM kv_slots WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .with_context(|| format!("failed to read slot {key}"))?;

        row.map(|(value, updated_at)| {
            Ok(StoredSlot {
                value,
                updated_at: parse_datetime(&updated_at, "updated_at")?,
            })
        })
        .transpose()
    }

    /// Replaces the whole value stored under `key`.
    pub fn write(&self, key: &str, value: &str, now: DateTime<Utc>) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO kv_slots (key, value, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                     value = excluded.value,
                     updated_at = excluded.updated_at",
                params![key, value, now.to_rfc3339()],
            )
            .with_context(|| format!("failed to write slot {key}"))?;
        Ok(())
    }
}

impl Database {
    pub async fn read_slot(&self, key: &str) -> Result<Option<StoredSlot>> {
        let key = key.to_string();
        self.execute(move |conn| SlotRepository::new(conn).read(&key))
            .await
    }

    pub async fn write_slot(&self, key: &str, value: String) -> Result<()> {
        let key = key.to_string();
        self.execute(move |conn| SlotRepository::new(conn).write(&key, &value, Utc::now()))
            .await
    }
}
