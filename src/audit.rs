//! Optional SQLite logging of every frequent (and, if requested, unfrequent)
//! itemset as the engine discovers it, mirroring the reference's
//! `_create_database`/`insert`. Grounded in the same connection-per-store
//! shape as a kornia-bubbaloop `Memory` store: refuse to reuse an existing
//! database file, create tables up front, one simple `INSERT` per call.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::Utc;
use rusqlite::Connection;

use crate::error::SinkError;
use crate::mem_tableau::MemTableau;

/// Which audit table a discovered itemset belongs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkTable {
    Frequent,
    Unfrequent,
}

impl SinkTable {
    fn table_name(self) -> &'static str {
        match self {
            SinkTable::Frequent => "frequent_itemsets",
            SinkTable::Unfrequent => "unfrequent_itemsets",
        }
    }
}

/// Destination for discovered itemsets. Implement this to plug in a
/// different store; [`SqliteAuditSink`] is the reference-shaped default.
pub trait AuditSink {
    fn record(&mut self, table: SinkTable, itemset: &MemTableau, support: f64) -> Result<(), SinkError>;
}

/// SQLite-backed [`AuditSink`].
///
/// Per §6, opening over an existing path is refused rather than silently
/// appended to or truncated — a fresh run gets a fresh database.
pub struct SqliteAuditSink {
    conn: Connection,
    save_unfrequent: bool,
}

impl SqliteAuditSink {
    /// Creates a new audit database at `path`. `save_unfrequent` controls
    /// whether [`SinkTable::Unfrequent`] rows are actually written, matching
    /// the reference's `save_all` flag.
    pub fn create(path: &Path, save_unfrequent: bool) -> Result<Self, SinkError> {
        if path.exists() {
            return Err(SinkError::AlreadyExists(path.display().to_string()));
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS frequent_itemsets (itemset TEXT, support REAL, timestamp TEXT);
             CREATE TABLE IF NOT EXISTS unfrequent_itemsets (itemset TEXT, support REAL, timestamp TEXT);",
        )?;
        Ok(SqliteAuditSink { conn, save_unfrequent })
    }

    /// Deterministic serialization: `{timeline: [(label, start, end), ...]}`
    /// over a `BTreeMap` so row order never depends on hash iteration.
    fn serialize_itemset(itemset: &MemTableau) -> String {
        let mut grouped: BTreeMap<u32, Vec<(String, i64, i64)>> = BTreeMap::new();
        for event in itemset.events_list() {
            grouped.entry(event.timeline()).or_default().push((event.label().to_string(), event.start(), event.end()));
        }
        for events in grouped.values_mut() {
            events.sort();
        }
        format!("{grouped:?}")
    }
}

impl AuditSink for SqliteAuditSink {
    fn record(&mut self, table: SinkTable, itemset: &MemTableau, support: f64) -> Result<(), SinkError> {
        if table == SinkTable::Unfrequent && !self.save_unfrequent {
            return Ok(());
        }
        let serialized = Self::serialize_itemset(itemset);
        let timestamp = Utc::now().to_rfc3339();
        self.conn.execute(
            &format!("INSERT INTO {}(itemset, support, timestamp) VALUES (?1, ?2, ?3)", table.table_name()),
            rusqlite::params![serialized, support, timestamp],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;

    #[test]
    fn create_refuses_to_reuse_an_existing_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.db");
        std::fs::write(&path, b"not a database").unwrap();
        assert!(matches!(SqliteAuditSink::create(&path, false), Err(SinkError::AlreadyExists(_))));
    }

    #[test]
    fn record_writes_frequent_and_skips_unfrequent_when_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.db");
        let mut sink = SqliteAuditSink::create(&path, false).unwrap();
        let event = Event::new(0, "a", 0, 1).unwrap();
        let itemset = MemTableau::from_event(&event, 1);

        sink.record(SinkTable::Frequent, &itemset, 1.0).unwrap();
        sink.record(SinkTable::Unfrequent, &itemset, 0.1).unwrap();

        let conn = Connection::open(&path).unwrap();
        let frequent_count: i64 = conn.query_row("SELECT COUNT(*) FROM frequent_itemsets", [], |r| r.get(0)).unwrap();
        let unfrequent_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM unfrequent_itemsets", [], |r| r.get(0)).unwrap();
        assert_eq!(frequent_count, 1);
        assert_eq!(unfrequent_count, 0);
    }
}
