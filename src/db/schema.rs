//! Settings schema, versioned through SQLite's `user_version` pragma.
//!
//! Step `n` of [`SCHEMA`] brings the database to version `n + 1`. Opening an
//! up-to-date database runs nothing.

use anyhow::{Context, Result};
use rusqlite::Connection;

const SCHEMA: &[&str] = &[include_str!("migrations/001_initial.sql")];

/// Current schema version of `conn`.
pub fn version(conn: &Connection) -> Result<usize> {
    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    Ok(version as usize)
}

pub fn upgrade(conn: &Connection) -> Result<()> {
    let current = version(conn)?;
    if current > SCHEMA.len() {
        anyhow::bail!(
            "Settings database is at version {}, newer than this build ({})",
            current,
            SCHEMA.len()
        );
    }

    for (step, ddl) in SCHEMA.iter().enumerate().skip(current) {
        let target = step + 1;
        // The version bump commits together with its DDL
        conn.execute_batch(&format!(
            "BEGIN; {} PRAGMA user_version = {}; COMMIT;",
            ddl, target
        ))
        .with_context(|| format!("Failed to upgrade settings schema to version {}", target))?;
        tracing::info!("Settings schema upgraded to version {}", target);
    }

    Ok(())
}
