//! Sealed OAuth token storage
//!
//! Access and refresh tokens are sealed under the app master key before they
//! touch disk; each stored value is an opaque nonce-framed ciphertext.

use crate::auth::OAuthTokenSet;
use crate::error::{AppError, Result};
use crate::security::SecurityManager;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

pub fn store_token_set(
    conn: &Connection,
    provider: &str,
    tokens: &OAuthTokenSet,
    security: &SecurityManager,
) -> Result<()> {
    let access_token = security.seal(&tokens.access_token)?;
    let refresh_token = tokens
        .refresh_token
        .as_deref()
        .map(|refresh| security.seal(refresh))
        .transpose()?;

    conn.execute(
        "INSERT INTO oauth_tokens (provider, access_token, refresh_token, expires_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, datetime('now'))
         ON CONFLICT(provider) DO UPDATE SET
            access_token = excluded.access_token,
            refresh_token = excluded.refresh_token,
            expires_at = excluded.expires_at,
            updated_at = excluded.updated_at",
        params![
            provider,
            access_token,
            refresh_token,
            tokens.expires_at.to_rfc3339(),
        ],
    )?;

    Ok(())
}

pub fn get_token_set(
    conn: &Connection,
    provider: &str,
    security: &SecurityManager,
) -> Result<Option<OAuthTokenSet>> {
    let row: Option<(String, Option<String>, String)> = conn
        .query_row(
            "SELECT access_token, refresh_token, expires_at
             FROM oauth_tokens WHERE provider = ?",
            [provider],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;

    let Some((access_token, refresh_token, expires_at)) = row else {
        return Ok(None);
    };

    let access_token = security.open(&access_token)?;
    let refresh_token = refresh_token
        .as_deref()
        .map(|sealed| security.open(sealed))
        .transpose()?;

    let expires_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&expires_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::Internal(format!("Invalid stored expiry '{}': {}", expires_at, e)))?;

    Ok(Some(OAuthTokenSet {
        access_token,
        refresh_token,
        expires_at,
    }))
}

pub fn delete_token_set(conn: &Connection, provider: &str) -> Result<()> {
    conn.execute("DELETE FROM oauth_tokens WHERE provider = ?", [provider])?;
    Ok(())
}
