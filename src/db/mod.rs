pub mod migrations;
pub mod queries;

use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::Context;
use rusqlite::Connection;

use migrations::Migration;

pub fn init_db(path: &str, migrations: &[Migration]) -> anyhow::Result<Connection> {
    let conn = Connection::open(path).context("failed to open database")?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .context("failed to set database pragmas")?;

    migrations::run_migrations(&conn, migrations)?;

    Ok(conn)
}

/// Locks the connection, recovering it from a poisoned mutex.
pub fn lock(db: &Mutex<Connection>) -> MutexGuard<'_, Connection> {
    db.lock().unwrap_or_else(PoisonError::into_inner)
}
