//! Database migrations
//!
//! Manages database schema versioning and migrations.

use rusqlite::Connection;
use tracing::{debug, info};

use super::connection::DatabaseError;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    let current_version = get_schema_version(conn)?;

    if current_version < SCHEMA_VERSION {
        info!(
            from_version = current_version,
            to_version = SCHEMA_VERSION,
            "Running database migrations"
        );

        if current_version < 1 {
            migrate_v1(conn)?;
        }

        set_schema_version(conn, SCHEMA_VERSION)?;
        info!(version = SCHEMA_VERSION, "Database migrations complete");
    } else {
        debug!(version = current_version, "Database schema is up to date");
    }

    Ok(())
}

/// Get current schema version
fn get_schema_version(conn: &Connection) -> Result<i32, DatabaseError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        [],
    )?;

    let version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    Ok(version)
}

/// Set schema version
fn set_schema_version(conn: &Connection, version: i32) -> Result<(), DatabaseError> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [
        version,
    ])?;
    Ok(())
}

/// Migration to version 1: Initial schema
///
/// Wire encoding: `contacts` and `alerts` hold JSON arrays as text,
/// booleans are 0/1 integers, instants are RFC 3339 UTC strings with a
/// trailing `Z`.
fn migrate_v1(conn: &Connection) -> Result<(), DatabaseError> {
    debug!("Applying migration v1: Initial schema");

    conn.execute_batch(
        "
        -- Reminders table
        CREATE TABLE IF NOT EXISTS reminders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            date TEXT NOT NULL,
            location TEXT,
            contacts TEXT NOT NULL DEFAULT '[]',
            alerts TEXT NOT NULL DEFAULT '[]',
            is_recurring INTEGER NOT NULL DEFAULT 0,
            recurrence TEXT,
            start_date TEXT,
            end_date TEXT,
            last_alert_time TEXT,
            is_active INTEGER NOT NULL DEFAULT 1
        );

        -- Indexes
        CREATE INDEX IF NOT EXISTS idx_reminders_active ON reminders(is_active);
        CREATE INDEX IF NOT EXISTS idx_reminders_date ON reminders(date);
        ",
    )?;

    Ok(())
}
