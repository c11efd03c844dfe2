//! SQLite-backed record and allocator storage.

use std::path::Path;

use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};

use crate::{core::allocator::AllocatorState, message::LogRecord, types::RequestId};

use super::{LogSink, PersistError, PersistResult};

/// Version number for serialized record payloads.
pub const RECORD_FORMAT_VERSION: u16 = 1;

/// Versioned wrapper for stable on-disk payload decoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RecordEnvelope {
    format_version: u16,
    record: LogRecord,
}

impl RecordEnvelope {
    fn new(record: LogRecord) -> Self {
        Self {
            format_version: RECORD_FORMAT_VERSION,
            record,
        }
    }
}

/// SQLite implementation of [`crate::persist::LogSink`].
pub struct SqliteLogSink {
    conn: Connection,
}

impl SqliteLogSink {
    /// Opens or creates a SQLite-backed sink at `path`.
    ///
    /// Enables WAL mode and sets `synchronous=NORMAL`.
    pub fn open(path: impl AsRef<Path>) -> PersistResult<Self> {
        let conn = Connection::open(path)?;
        Self::init_connection(conn)
    }

    /// Opens an in-memory SQLite sink.
    pub fn open_in_memory() -> PersistResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn)
    }

    fn init_connection(conn: Connection) -> PersistResult<Self> {
        conn.execute_batch(include_str!("schema.sql"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(Self { conn })
    }
}

impl LogSink for SqliteLogSink {
    fn store_allocator(&mut self, state: &AllocatorState) -> PersistResult<()> {
        self.conn.execute(
            "INSERT INTO allocator(slot, next_id) VALUES (0, ?1)
             ON CONFLICT(slot) DO UPDATE SET next_id = excluded.next_id",
            params![state.next_id as i64],
        )?;
        Ok(())
    }

    fn load_allocator(&mut self) -> PersistResult<Option<AllocatorState>> {
        let mut stmt = self.conn.prepare("SELECT next_id FROM allocator")?;
        let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;

        let mut states = Vec::new();
        for row in rows {
            states.push(AllocatorState {
                next_id: row? as RequestId,
            });
        }

        match states.len() {
            0 => Ok(None),
            1 => Ok(Some(states[0])),
            n => Err(PersistError::Corruption(format!(
                "found {n} allocator instances, expected one"
            ))),
        }
    }

    fn append_record(&mut self, record: &LogRecord) -> PersistResult<()> {
        let payload = serde_json::to_vec(&RecordEnvelope::new(record.clone()))?;
        self.conn.execute(
            "INSERT INTO records(id, host, ts_ms, has_response, payload)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.id as i64,
                record.host.key(),
                record.ts_ms as i64,
                record.response.is_some(),
                payload,
            ],
        )?;
        Ok(())
    }

    fn update_record(&mut self, record: &LogRecord) -> PersistResult<()> {
        let payload = serde_json::to_vec(&RecordEnvelope::new(record.clone()))?;
        let changed = self.conn.execute(
            "UPDATE records SET has_response = ?2, payload = ?3 WHERE id = ?1",
            params![record.id as i64, record.response.is_some(), payload],
        )?;
        if changed == 0 {
            return Err(PersistError::Corruption(format!(
                "record {} present in memory but missing on disk",
                record.id
            )));
        }
        Ok(())
    }

    fn load_records(&mut self) -> PersistResult<Vec<LogRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, payload FROM records ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| {
            let id: i64 = row.get(0)?;
            let payload: Vec<u8> = row.get(1)?;
            Ok((id as RequestId, payload))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (row_id, payload) = row?;
            let envelope: RecordEnvelope = serde_json::from_slice(&payload)?;
            if envelope.format_version != RECORD_FORMAT_VERSION {
                return Err(PersistError::Message(format!(
                    "unsupported record format version: {}",
                    envelope.format_version
                )));
            }
            if envelope.record.id != row_id {
                return Err(PersistError::Corruption(format!(
                    "record row {row_id} holds payload for id {}",
                    envelope.record.id
                )));
            }
            out.push(envelope.record);
        }
        Ok(out)
    }

    fn flush(&mut self) -> PersistResult<()> {
        self.conn.execute_batch("PRAGMA wal_checkpoint(PASSIVE);")?;
        Ok(())
    }
}

impl SqliteLogSink {
    /// Highest record id currently on disk, 0 when empty.
    pub fn latest_record_id(&self) -> PersistResult<RequestId> {
        let id: Option<i64> = self
            .conn
            .query_row("SELECT MAX(id) FROM records", [], |row| row.get(0))?;
        Ok(id.unwrap_or(0) as RequestId)
    }
}
