//! Processing ledger: one marker row per message the pipeline has seen.
//!
//! The marker records whether processing succeeded and a short note saying
//! why ("is_newsletter", "no_events_found", "body_too_large", ...). Presence
//! of a marker, successful or not, is what makes a message "already parsed".

use rusqlite::params;

use super::{Database, StoreError};

/// A raw ledger row.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub message_id: String,
    pub processed_ok: bool,
    pub note: String,
    pub processed_at: String,
}

/// Writes the marker for a message, replacing any earlier marker.
pub fn upsert(db: &Database, message_id: &str, ok: bool, note: &str) -> Result<(), StoreError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO processing_ledger (message_id, processed_ok, note, processed_at)
             VALUES (?1, ?2, ?3, datetime('now'))
             ON CONFLICT(message_id) DO UPDATE SET
                 processed_ok = excluded.processed_ok,
                 note = excluded.note,
                 processed_at = excluded.processed_at",
            params![message_id, ok, note],
        )?;
        Ok(())
    })
}

/// Whether any marker exists for this message.
pub fn already_parsed(db: &Database, message_id: &str) -> Result<bool, StoreError> {
    db.with_conn(|conn| {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM processing_ledger WHERE message_id = ?1)",
            params![message_id],
            |r| r.get(0),
        )?;
        Ok(exists)
    })
}

/// Loads the marker for a message, if one exists.
pub fn find(db: &Database, message_id: &str) -> Result<Option<LedgerEntry>, StoreError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT message_id, processed_ok, note, processed_at
             FROM processing_ledger WHERE message_id = ?1",
        )?;
        let mut rows = stmt.query_map(params![message_id], |row| {
            Ok(LedgerEntry {
                message_id: row.get(0)?,
                processed_ok: row.get(1)?,
                note: row.get(2)?,
                processed_at: row.get(3)?,
            })
        })?;
        match rows.next() {
            Some(Ok(entry)) => Ok(Some(entry)),
            Some(Err(e)) => Err(StoreError::Sqlite(e)),
            None => Ok(None),
        }
    })
}
