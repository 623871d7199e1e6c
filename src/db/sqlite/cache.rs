//! Widget reading cache table

use crate::cache::CachedReading;
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

pub fn load_reading(
    conn: &Connection,
    widget_id: &str,
) -> Result<Option<CachedReading<serde_json::Value>>> {
    let row: Option<(String, String)> = conn
        .query_row(
            "SELECT payload, fetched_at FROM widget_cache WHERE widget_id = ?",
            [widget_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    match row {
        None => Ok(None),
        Some((payload, fetched_at)) => {
            let payload = serde_json::from_str(&payload)?;
            let fetched_at = parse_timestamp(&fetched_at)?;
            Ok(Some(CachedReading {
                payload,
                fetched_at,
            }))
        }
    }
}

pub fn save_reading(
    conn: &Connection,
    widget_id: &str,
    reading: &CachedReading<serde_json::Value>,
) -> Result<()> {
    // fetched_at is monotonically non-decreasing per widget; a late write
    // from an already-stopped poller is dropped here.
    let existing: Option<String> = conn
        .query_row(
            "SELECT fetched_at FROM widget_cache WHERE widget_id = ?",
            [widget_id],
            |row| row.get(0),
        )
        .optional()?;

    if let Some(existing) = existing {
        if parse_timestamp(&existing)? > reading.fetched_at {
            debug!("Discarding out-of-date reading for widget '{}'", widget_id);
            return Ok(());
        }
    }

    conn.execute(
        "INSERT INTO widget_cache (widget_id, payload, fetched_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(widget_id) DO UPDATE SET
            payload = excluded.payload,
            fetched_at = excluded.fetched_at",
        params![
            widget_id,
            serde_json::to_string(&reading.payload)?,
            reading.fetched_at.to_rfc3339(),
        ],
    )?;

    Ok(())
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::Internal(format!("Invalid stored timestamp '{}': {}", raw, e)))
}
