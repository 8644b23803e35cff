use anyhow::Context;
use rusqlite::Connection;

/// A named schema step; applied once per database, in slice order.
pub struct Migration {
    pub name: &'static str,
    pub sql: &'static str,
}

pub const ANALYTICS_MIGRATIONS: &[Migration] = &[
    Migration {
        name: "001_analytics.sql",
        sql: "CREATE TABLE IF NOT EXISTS analytics (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                intent TEXT NOT NULL,
                success INTEGER NOT NULL,
                error_kind TEXT,
                lead_id TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
    },
    Migration {
        name: "002_analytics_entities.sql",
        sql: "ALTER TABLE analytics ADD COLUMN entities TEXT NOT NULL DEFAULT '';",
    },
];

pub const CRM_MIGRATIONS: &[Migration] = &[
    Migration {
        name: "001_leads.sql",
        sql: "CREATE TABLE IF NOT EXISTS leads (
                lead_id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                phone TEXT NOT NULL,
                city TEXT,
                source TEXT,
                status TEXT NOT NULL DEFAULT 'NEW',
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            CREATE TABLE IF NOT EXISTS visits (
                visit_id TEXT PRIMARY KEY,
                lead_id TEXT NOT NULL REFERENCES leads(lead_id),
                visit_time TEXT NOT NULL,
                notes TEXT,
                status TEXT NOT NULL DEFAULT 'SCHEDULED',
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
    },
    Migration {
        name: "002_idempotency_keys.sql",
        sql: "CREATE TABLE IF NOT EXISTS idempotency_keys (
                key TEXT NOT NULL,
                endpoint TEXT NOT NULL,
                response TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (key, endpoint)
            );",
    },
];

pub fn run_migrations(conn: &Connection, migrations: &[Migration]) -> anyhow::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .context("failed to create migrations table")?;

    for migration in migrations {
        let name = migration.name;

        let already_applied: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM _migrations WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .context("failed to check migration status")?;

        if already_applied {
            continue;
        }

        conn.execute_batch(migration.sql)
            .with_context(|| format!("failed to apply migration: {name}"))?;

        conn.execute("INSERT INTO _migrations (name) VALUES (?1)", [name])
            .with_context(|| format!("failed to record migration: {name}"))?;

        tracing::info!("applied migration: {name}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn, CRM_MIGRATIONS).unwrap();
        run_migrations(&conn, CRM_MIGRATIONS).unwrap();

        let applied: i64 = conn
            .query_row("SELECT COUNT(*) FROM _migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(applied, CRM_MIGRATIONS.len() as i64);
    }
}
