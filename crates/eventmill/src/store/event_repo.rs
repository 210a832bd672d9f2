//! Event repository: operations for the `events` table.
//!
//! A few columns are promoted for querying; the full record is stored as a
//! JSON payload so the schema does not chase every model field.

use rusqlite::params;

use super::{Database, StoreError};
use crate::model::Event;

/// Persists a batch of validated events.
pub fn save_all(db: &Database, events: &[Event]) -> Result<(), StoreError> {
    if events.is_empty() {
        return Ok(());
    }
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "INSERT INTO events \
             (email_message_id, title, start_date, location_type, from_aggregator,
              parsing_confidence_score, payload)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for event in events {
            let payload = serde_json::to_string(event)?;
            stmt.execute(params![
                event.email_message_id,
                event.title,
                event.start_date.to_string(),
                event.location_type.as_str(),
                event.from_aggregator,
                event.parsing_confidence_score,
                payload,
            ])?;
        }
        Ok(())
    })
}

/// Loads every event saved for a message, in insertion order.
pub fn find_by_message(db: &Database, message_id: &str) -> Result<Vec<Event>, StoreError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT payload FROM events WHERE email_message_id = ?1 ORDER BY id ASC",
        )?;
        let payloads = stmt.query_map(params![message_id], |row| row.get::<_, String>(0))?;
        let mut events = Vec::new();
        for payload in payloads {
            events.push(serde_json::from_str(&payload?)?);
        }
        Ok(events)
    })
}

/// Counts saved events for a message.
pub fn count_for_message(db: &Database, message_id: &str) -> Result<u64, StoreError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM events WHERE email_message_id = ?1",
            params![message_id],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}
