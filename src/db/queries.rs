use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{AnalyticsRecord, LeadRecord, VisitRecord};

// ── Analytics ──

pub fn insert_analytics(
    conn: &Connection,
    intent: &str,
    entities: &[&str],
    success: bool,
    error_kind: Option<&str>,
    lead_id: Option<&str>,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO analytics (intent, entities, success, error_kind, lead_id)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![intent, entities.join(","), success as i32, error_kind, lead_id],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_recent_analytics(conn: &Connection, limit: i64) -> anyhow::Result<Vec<AnalyticsRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, intent, entities, success, error_kind, lead_id, created_at
         FROM analytics ORDER BY id DESC LIMIT ?1",
    )?;

    let rows = stmt.query_map(params![limit], |row| {
        Ok(AnalyticsRecord {
            id: row.get(0)?,
            intent: row.get(1)?,
            entities: row
                .get::<_, String>(2)?
                .split(',')
                .filter(|e| !e.is_empty())
                .map(str::to_string)
                .collect(),
            success: row.get::<_, i32>(3)? != 0,
            error_kind: row.get(4)?,
            lead_id: row.get(5)?,
            created_at: row.get(6)?,
        })
    })?;

    let mut records = vec![];
    for row in rows {
        records.push(row?);
    }
    Ok(records)
}

// ── Idempotency keys ──

/// Stored response for `key` on `endpoint`, if it was saved within `ttl`.
pub fn get_idempotent_response(
    conn: &Connection,
    key: &str,
    endpoint: &str,
    ttl: Duration,
) -> anyhow::Result<Option<String>> {
    let response = conn
        .query_row(
            "SELECT response FROM idempotency_keys
             WHERE key = ?1 AND endpoint = ?2 AND created_at >= datetime('now', ?3)",
            params![key, endpoint, format!("-{} seconds", ttl.as_secs())],
            |row| row.get(0),
        )
        .optional()?;
    Ok(response)
}

/// Overwrites an expired record for the same key.
pub fn save_idempotent_response(
    conn: &Connection,
    key: &str,
    endpoint: &str,
    response: &str,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO idempotency_keys (key, endpoint, response, created_at)
         VALUES (?1, ?2, ?3, datetime('now'))",
        params![key, endpoint, response],
    )?;
    Ok(())
}

/// Drops every record on `endpoint` except `keep`; a later write supersedes
/// the responses of earlier ones.
pub fn forget_idempotent_responses(
    conn: &Connection,
    endpoint: &str,
    keep: Option<&str>,
) -> anyhow::Result<usize> {
    let removed = conn.execute(
        "DELETE FROM idempotency_keys WHERE endpoint = ?1 AND key IS NOT ?2",
        params![endpoint, keep],
    )?;
    Ok(removed)
}

// ── Leads ──

pub fn create_lead(conn: &Connection, lead: &LeadRecord) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO leads (lead_id, name, phone, city, source, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            lead.lead_id,
            lead.name,
            lead.phone,
            lead.city,
            lead.source,
            lead.status,
            lead.created_at,
        ],
    )?;
    Ok(())
}

pub fn get_lead(conn: &Connection, lead_id: &str) -> anyhow::Result<Option<LeadRecord>> {
    let lead = conn
        .query_row(
            "SELECT lead_id, name, phone, city, source, status, created_at
             FROM leads WHERE lead_id = ?1",
            params![lead_id],
            parse_lead_row,
        )
        .optional()?;
    Ok(lead)
}

pub fn list_leads(conn: &Connection) -> anyhow::Result<Vec<LeadRecord>> {
    let mut stmt = conn.prepare(
        "SELECT lead_id, name, phone, city, source, status, created_at
         FROM leads ORDER BY created_at ASC, rowid ASC",
    )?;

    let rows = stmt.query_map([], parse_lead_row)?;

    let mut leads = vec![];
    for row in rows {
        leads.push(row?);
    }
    Ok(leads)
}

/// Returns false when the lead does not exist.
pub fn update_lead_status(conn: &Connection, lead_id: &str, status: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE leads SET status = ?1 WHERE lead_id = ?2",
        params![status, lead_id],
    )?;
    Ok(count > 0)
}

fn parse_lead_row(row: &rusqlite::Row) -> rusqlite::Result<LeadRecord> {
    Ok(LeadRecord {
        lead_id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        city: row.get(3)?,
        source: row.get(4)?,
        status: row.get(5)?,
        created_at: row.get(6)?,
    })
}

// ── Visits ──

pub fn create_visit(conn: &Connection, visit: &VisitRecord) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO visits (visit_id, lead_id, visit_time, notes, status)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            visit.visit_id,
            visit.lead_id,
            visit.visit_time,
            visit.notes,
            visit.status,
        ],
    )?;
    Ok(())
}

pub fn list_visits(conn: &Connection) -> anyhow::Result<Vec<VisitRecord>> {
    let mut stmt = conn.prepare(
        "SELECT visit_id, lead_id, visit_time, notes, status FROM visits ORDER BY rowid ASC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(VisitRecord {
            visit_id: row.get(0)?,
            lead_id: row.get(1)?,
            visit_time: row.get(2)?,
            notes: row.get(3)?,
            status: row.get(4)?,
        })
    })?;

    let mut visits = vec![];
    for row in rows {
        visits.push(row?);
    }
    Ok(visits)
}
