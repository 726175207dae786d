//! Database schema migrations for cadence.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use indoc::indoc;
use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const SCHEMA_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            tracing::warn!(error = %e, "failed to read schema_version; assuming 0");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: rhythms, events and spoons, all namespaced per user.
///
/// `seq` preserves catalog (insertion) order. Events are keyed on every column so a repeated
/// insert is absorbed.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(indoc! {"
        CREATE TABLE IF NOT EXISTS rhythms (
            seq           INTEGER PRIMARY KEY AUTOINCREMENT,
            namespace     TEXT NOT NULL,
            id            TEXT NOT NULL,
            kind          TEXT NOT NULL,
            description   TEXT NOT NULL,
            param         INTEGER,
            slider_before INTEGER NOT NULL DEFAULT 0,
            slider_after  INTEGER NOT NULL DEFAULT 0,
            UNIQUE (namespace, id)
        );

        CREATE TABLE IF NOT EXISTS events (
            namespace TEXT NOT NULL,
            rhythm_id TEXT NOT NULL,
            kind      TEXT NOT NULL,
            date      TEXT NOT NULL,
            PRIMARY KEY (namespace, rhythm_id, date, kind)
        );

        CREATE TABLE IF NOT EXISTS spoons (
            namespace TEXT NOT NULL,
            date      TEXT NOT NULL,
            spoons    INTEGER NOT NULL,
            PRIMARY KEY (namespace, date)
        );
    "})?;
    set_schema_version(&tx, 1)?;
    tx.commit()?;
    Ok(())
}

/// Migration v2: index events by date for listings.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(indoc! {"
        CREATE INDEX IF NOT EXISTS idx_events_namespace_date ON events(namespace, date);
    "})?;
    set_schema_version(conn, 2)?;
    Ok(())
}
