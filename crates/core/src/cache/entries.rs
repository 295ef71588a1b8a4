//! Entry operations within a generation.
//!
//! Entries are response snapshots keyed by request identity. Writes replace
//! any prior entry for the same identity.

use super::connection::CacheDb;
use super::generations::Generation;
use super::hash::request_key;
use crate::Error;
use crate::http::{Request, Response};
use bytes::Bytes;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::OptionalExtension;

impl CacheDb {
    /// Store `response` for `request` in `generation`, replacing any prior entry.
    pub async fn put_entry(&self, generation: &Generation, request: &Request, response: &Response) -> Result<(), Error> {
        let generation_id = generation.id;
        let key = request_key(&request.method, &request.url);
        let method = request.method.to_string();
        let url = request.url.to_string();
        let status = response.status;
        let status_text = response.status_text.clone();
        let headers_json = serde_json::to_string(&response.headers)
            .map_err(|e| Error::CorruptEntry(format!("failed to encode headers: {e}")))?;
        let body = response.body.to_vec();
        let cached_at = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO entries (
                        generation_id, key_hash, method, url, status, status_text,
                        headers_json, body, cached_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    ON CONFLICT(generation_id, key_hash) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        status = excluded.status,
                        status_text = excluded.status_text,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        cached_at = excluded.cached_at",
                    params![generation_id, key, method, url, status, status_text, headers_json, body, cached_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up the entry for `request` in `generation`.
    pub async fn match_entry(&self, generation: &Generation, request: &Request) -> Result<Option<Response>, Error> {
        let generation_id = generation.id;
        let key = request_key(&request.method, &request.url);

        let row = self
            .conn
            .call(move |conn| -> Result<Option<(u16, String, String, Vec<u8>)>, Error> {
                let row = conn
                    .query_row(
                        "SELECT status, status_text, headers_json, body
                         FROM entries WHERE generation_id = ?1 AND key_hash = ?2",
                        params![generation_id, key],
                        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                    )
                    .optional()?;
                Ok(row)
            })
            .await
            .map_err(Error::from)?;

        let Some((status, status_text, headers_json, body)) = row else {
            return Ok(None);
        };

        let headers: Vec<(String, String)> =
            serde_json::from_str(&headers_json).map_err(|e| Error::CorruptEntry(e.to_string()))?;

        Ok(Some(Response { status, status_text, headers, body: Bytes::from(body) }))
    }
}
