//! Generation registry operations.
//!
//! A generation is a named namespace of entries. Names are unique; opening
//! an existing name yields the same row.

use super::connection::CacheDb;
use crate::Error;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};

/// Handle to a named generation in the store.
///
/// Two handles are the same generation exactly when their ids match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Generation {
    pub id: i64,
    pub name: String,
}

impl CacheDb {
    /// Open the generation called `name`, creating it if needed.
    pub async fn ensure_generation(&self, name: &str) -> Result<Generation, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<Generation, Error> {
                conn.execute(
                    "INSERT INTO generations (name, created_at) VALUES (?1, ?2)
                     ON CONFLICT(name) DO NOTHING",
                    params![&name, chrono::Utc::now().to_rfc3339()],
                )?;
                let id: i64 = conn.query_row("SELECT id FROM generations WHERE name = ?1", params![&name], |row| {
                    row.get(0)
                })?;
                Ok(Generation { id, name })
            })
            .await
            .map_err(Error::from)
    }

    /// Look up a generation without creating it.
    pub async fn find_generation(&self, name: &str) -> Result<Option<Generation>, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<Option<Generation>, Error> {
                let id: Option<i64> = conn
                    .query_row("SELECT id FROM generations WHERE name = ?1", params![&name], |row| row.get(0))
                    .optional()?;
                Ok(id.map(|id| Generation { id, name }))
            })
            .await
            .map_err(Error::from)
    }

    /// All generations, oldest first.
    pub async fn list_generations(&self) -> Result<Vec<Generation>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<Generation>, Error> {
                let mut stmt = conn.prepare("SELECT id, name FROM generations ORDER BY id ASC")?;
                let rows = stmt
                    .query_map([], |row| Ok(Generation { id: row.get(0)?, name: row.get(1)? }))?
                    .collect::<Result<Vec<_>, rusqlite::Error>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a generation and every entry in it.
    ///
    /// Returns false if no generation had that name.
    pub async fn delete_generation(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM generations WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries held by the named generation.
    pub async fn entry_count(&self, name: &str) -> Result<u64, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let id: Option<i64> = conn
                    .query_row("SELECT id FROM generations WHERE name = ?1", params![&name], |row| row.get(0))
                    .optional()?;
                let Some(id) = id else {
                    return Err(Error::GenerationNotFound(name));
                };
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE generation_id = ?1", params![id], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every generation. Returns how many were removed.
    pub async fn clear_generations(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM entries", [])?;
                let deleted = tx.execute("DELETE FROM generations", [])?;
                tx.commit()?;
                Ok(deleted as u64)
            })
            .await
            .map_err(Error::from)
    }
}
