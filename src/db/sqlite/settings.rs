//! Settings table (singleton row)

use crate::db::sqlite::models::Settings;
use crate::error::{AppError, Result};
use rusqlite::{params, Connection};

pub fn get_settings(conn: &Connection) -> Result<Settings> {
    let (timezone, port): (String, i64) = conn.query_row(
        "SELECT timezone, redirect_port FROM settings WHERE id = 1",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    let redirect_port = u16::try_from(port)
        .map_err(|_| AppError::Config(format!("Stored redirect port {} is out of range", port)))?;

    Ok(Settings {
        timezone,
        redirect_port,
    })
}

pub fn update_settings(
    conn: &Connection,
    timezone: Option<String>,
    redirect_port: Option<u16>,
) -> Result<Settings> {
    if let Some(timezone) = timezone {
        conn.execute(
            "UPDATE settings SET timezone = ?1 WHERE id = 1",
            params![timezone],
        )?;
    }

    if let Some(port) = redirect_port {
        conn.execute(
            "UPDATE settings SET redirect_port = ?1 WHERE id = 1",
            params![port as i64],
        )?;
    }

    get_settings(conn)
}
