//! Message repository: operations for the `messages` table.

use chrono::{DateTime, Utc};
use rusqlite::params;

use super::{Database, StoreError};
use crate::message::{SourceKind, SourceMessage};

/// Inserts an ingested message. Re-ingesting the same Message-ID is a no-op.
pub fn insert(db: &Database, message: &SourceMessage) -> Result<(), StoreError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT OR IGNORE INTO messages \
             (message_id, sender, subject, body, sent_at, is_newsletter, source_kind)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                message.message_id,
                message.sender,
                message.subject,
                message.body,
                message.sent_at.to_rfc3339(),
                message.is_newsletter,
                message.source_kind.as_str(),
            ],
        )?;
        Ok(())
    })
}

/// Fetches up to `batch_size` messages without a ledger marker, oldest first.
pub fn fetch_unprocessed(db: &Database, batch_size: u32) -> Result<Vec<SourceMessage>, StoreError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT m.message_id, m.sender, m.subject, m.body, m.sent_at,
                    m.is_newsletter, m.source_kind
             FROM messages m
             LEFT JOIN processing_ledger l ON l.message_id = m.message_id
             WHERE l.message_id IS NULL
             ORDER BY m.sent_at ASC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![batch_size], |row| {
            let sent_at: String = row.get(4)?;
            let sent_at = DateTime::parse_from_rfc3339(&sent_at)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        4,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
            let source_kind: String = row.get(6)?;
            Ok(SourceMessage {
                message_id: row.get(0)?,
                sender: row.get(1)?,
                subject: row.get(2)?,
                body: row.get(3)?,
                sent_at,
                is_newsletter: row.get(5)?,
                source_kind: SourceKind::from(source_kind.as_str()),
            })
        })?;
        let messages: Vec<SourceMessage> = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(messages)
    })
}
