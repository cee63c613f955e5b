use std::sync::Mutex;

use rusqlite::{params, Connection};
use tracing::warn;

use crate::error::{HistoryError, Result};
use crate::types::*;

/// Typed durable store for messages, actions, state-change blocks, and
/// memories (spec §4.2 / C2), unifying the source's in-memory and typed
/// persistent history recorders behind one interface (spec §9 open question).
pub struct HistoryRecorder {
    db: Mutex<Connection>,
}

impl HistoryRecorder {
    pub fn new(conn: Connection) -> Result<Self> {
        crate::db::init_db(&conn)?;
        Ok(Self { db: Mutex::new(conn) })
    }

    pub fn record_state_change(
        &self,
        change_type: &str,
        data: &serde_json::Value,
        channel_id: Option<&str>,
        platform: Option<&str>,
        metadata: Option<&serde_json::Value>,
        timestamp: f64,
    ) -> Result<i64> {
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO state_changes (timestamp, change_type, channel_id, platform, data, record_metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                timestamp,
                change_type,
                channel_id,
                platform,
                data.to_string(),
                metadata.map(|m| m.to_string()),
            ],
        )?;
        Ok(db.last_insert_rowid())
    }

    pub fn record_message(
        &self,
        message_id: &str,
        channel_id: &str,
        platform: &str,
        sender: &str,
        content: &str,
        timestamp: f64,
        parent_id: Option<&str>,
        metadata: Option<&serde_json::Value>,
    ) -> Result<i64> {
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT OR IGNORE INTO messages (message_id, channel_id, platform, sender, content, timestamp, parent_id, record_metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                message_id,
                channel_id,
                platform,
                sender,
                content,
                timestamp,
                parent_id,
                metadata.map(|m| m.to_string()),
            ],
        )?;
        Ok(db.last_insert_rowid())
    }

    pub fn record_action(
        &self,
        action_id: &str,
        action_type: &str,
        parameters: &serde_json::Value,
        result: Option<&serde_json::Value>,
        success: bool,
        channel_id: Option<&str>,
        platform: Option<&str>,
        duration_ms: Option<i64>,
        timestamp: f64,
    ) -> Result<i64> {
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT OR IGNORE INTO actions (action_id, action_type, timestamp, channel_id, platform, parameters, result, success, duration_ms)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                action_id,
                action_type,
                timestamp,
                channel_id,
                platform,
                parameters.to_string(),
                result.map(|r| r.to_string()),
                success,
                duration_ms,
            ],
        )?;
        Ok(db.last_insert_rowid())
    }

    pub fn store_memory(
        &self,
        user_id: &str,
        platform: &str,
        memory_type: &str,
        content: &str,
        importance: f64,
        source_context: Option<&str>,
        timestamp: f64,
    ) -> Result<i64> {
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO memories (user_id, platform, memory_type, content, importance, timestamp, source_context)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![user_id, platform, memory_type, content, importance, timestamp, source_context],
        )?;
        Ok(db.last_insert_rowid())
    }

    pub fn get_recent_messages(
        &self,
        channel_id: &str,
        platform: &str,
        limit: usize,
    ) -> Result<Vec<MessageRecord>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT id, message_id, channel_id, platform, sender, content, timestamp, parent_id, record_metadata
             FROM messages WHERE channel_id = ?1 AND platform = ?2
             ORDER BY timestamp DESC LIMIT ?3",
        )?;
        let rows = stmt.query_map(params![channel_id, platform, limit as i64], row_to_message)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(HistoryError::from)
    }

    pub fn get_recent_actions(
        &self,
        limit: usize,
        action_type: Option<&str>,
        channel_id: Option<&str>,
    ) -> Result<Vec<ActionRecordRow>> {
        let db = self.db.lock().unwrap();
        let mut sql = String::from(
            "SELECT id, action_id, action_type, timestamp, channel_id, platform, parameters, result, success, duration_ms FROM actions WHERE 1=1",
        );
        if action_type.is_some() {
            sql.push_str(" AND action_type = ?1");
        }
        if channel_id.is_some() {
            sql.push_str(if action_type.is_some() { " AND channel_id = ?2" } else { " AND channel_id = ?1" });
        }
        sql.push_str(" ORDER BY timestamp DESC LIMIT ?");
        let limit_idx = 1 + action_type.is_some() as usize + channel_id.is_some() as usize;
        sql = sql.replacen('?', &format!("?{}", limit_idx), 1);

        let mut stmt = db.prepare(&sql)?;
        let rows: Vec<ActionRecordRow> = match (action_type, channel_id) {
            (Some(a), Some(c)) => stmt
                .query_map(params![a, c, limit as i64], row_to_action)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
            (Some(a), None) => stmt
                .query_map(params![a, limit as i64], row_to_action)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
            (None, Some(c)) => stmt
                .query_map(params![c, limit as i64], row_to_action)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
            (None, None) => stmt
                .query_map(params![limit as i64], row_to_action)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
        };
        Ok(rows)
    }

    pub fn get_user_memories(
        &self,
        user_id: &str,
        platform: &str,
        memory_type: Option<&str>,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>> {
        let db = self.db.lock().unwrap();
        let rows = if let Some(kind) = memory_type {
            let mut stmt = db.prepare(
                "SELECT id, user_id, platform, memory_type, content, importance, timestamp, source_context, last_accessed
                 FROM memories WHERE user_id = ?1 AND platform = ?2 AND memory_type = ?3
                 ORDER BY importance DESC, timestamp DESC LIMIT ?4",
            )?;
            stmt.query_map(params![user_id, platform, kind, limit as i64], row_to_memory)?
                .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
            let mut stmt = db.prepare(
                "SELECT id, user_id, platform, memory_type, content, importance, timestamp, source_context, last_accessed
                 FROM memories WHERE user_id = ?1 AND platform = ?2
                 ORDER BY importance DESC, timestamp DESC LIMIT ?3",
            )?;
            stmt.query_map(params![user_id, platform, limit as i64], row_to_memory)?
                .collect::<rusqlite::Result<Vec<_>>>()?
        };

        let now = agentbridge_core::types::now_secs();
        for m in &rows {
            let _ = db.execute("UPDATE memories SET last_accessed = ?1 WHERE id = ?2", params![now, m.id]);
        }
        Ok(rows)
    }

    pub fn record_undecryptable_event(
        &self,
        event_id: &str,
        room_id: &str,
        sender: Option<&str>,
        max_retries: u32,
        timestamp: f64,
    ) -> Result<()> {
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO undecryptable_events (event_id, room_id, sender, retry_count, max_retries, last_retry_ts)
             VALUES (?1, ?2, ?3, 0, ?4, ?5)
             ON CONFLICT(event_id, room_id) DO UPDATE SET retry_count = retry_count + 1, last_retry_ts = ?5",
            params![event_id, room_id, sender, max_retries, timestamp],
        )?;
        Ok(())
    }

    /// Exports messages/actions/state_changes within `[start_ts, end_ts]` as a
    /// single JSON document (or JSONL of state_changes, one per line) to
    /// `output_file` (spec §4.2 / §6 training export).
    pub fn export_for_training(
        &self,
        start_ts: Option<f64>,
        end_ts: Option<f64>,
        output_file: Option<&str>,
        jsonl: bool,
    ) -> Result<TrainingExport> {
        let db = self.db.lock().unwrap();
        let lo = start_ts.unwrap_or(0.0);
        let hi = end_ts.unwrap_or(f64::MAX);

        let mut sc_stmt = db.prepare(
            "SELECT id, timestamp, change_type, channel_id, platform, data, record_metadata
             FROM state_changes WHERE timestamp BETWEEN ?1 AND ?2 ORDER BY timestamp",
        )?;
        let state_changes: Vec<StateChangeRecord> = sc_stmt
            .query_map(params![lo, hi], row_to_state_change)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut msg_stmt = db.prepare(
            "SELECT id, message_id, channel_id, platform, sender, content, timestamp, parent_id, record_metadata
             FROM messages WHERE timestamp BETWEEN ?1 AND ?2 ORDER BY timestamp",
        )?;
        let messages: Vec<MessageRecord> = msg_stmt
            .query_map(params![lo, hi], row_to_message)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut act_stmt = db.prepare(
            "SELECT id, action_id, action_type, timestamp, channel_id, platform, parameters, result, success, duration_ms
             FROM actions WHERE timestamp BETWEEN ?1 AND ?2 ORDER BY timestamp",
        )?;
        let actions: Vec<ActionRecordRow> = act_stmt
            .query_map(params![lo, hi], row_to_action)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let export = TrainingExport {
            state_changes: state_changes.clone(),
            messages,
            actions,
        };

        if let Some(path) = output_file {
            if jsonl {
                let mut out = String::new();
                for sc in &state_changes {
                    out.push_str(&serde_json::to_string(sc)?);
                    out.push('\n');
                }
                std::fs::write(path, out)?;
            } else {
                std::fs::write(path, serde_json::to_string_pretty(&export)?)?;
            }
        }

        Ok(export)
    }

    /// Deletes rows older than `days_to_keep` across all time-indexed tables.
    /// Failures here are logged, not propagated — persistence errors must
    /// never block the core cycle (spec §4.2 failure semantics).
    pub fn cleanup_old_records(&self, days_to_keep: u32) {
        let cutoff = agentbridge_core::types::now_secs() - (days_to_keep as f64 * 86_400.0);
        let db = self.db.lock().unwrap();
        for table in ["state_changes", "messages", "actions", "memories"] {
            let sql = format!("DELETE FROM {} WHERE timestamp < ?1", table);
            if let Err(e) = db.execute(&sql, params![cutoff]) {
                warn!(table, error = %e, "cleanup_old_records failed for table");
            }
        }
    }
}

fn row_to_state_change(row: &rusqlite::Row) -> rusqlite::Result<StateChangeRecord> {
    let data: String = row.get(5)?;
    let metadata: Option<String> = row.get(6)?;
    Ok(StateChangeRecord {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        change_type: row.get(2)?,
        channel_id: row.get(3)?,
        platform: row.get(4)?,
        data: serde_json::from_str(&data).unwrap_or(serde_json::Value::Null),
        metadata: metadata.and_then(|m| serde_json::from_str(&m).ok()),
    })
}

fn row_to_message(row: &rusqlite::Row) -> rusqlite::Result<MessageRecord> {
    let metadata: Option<String> = row.get(8)?;
    Ok(MessageRecord {
        id: row.get(0)?,
        message_id: row.get(1)?,
        channel_id: row.get(2)?,
        platform: row.get(3)?,
        sender: row.get(4)?,
        content: row.get(5)?,
        timestamp: row.get(6)?,
        parent_id: row.get(7)?,
        metadata: metadata.and_then(|m| serde_json::from_str(&m).ok()),
    })
}

fn row_to_action(row: &rusqlite::Row) -> rusqlite::Result<ActionRecordRow> {
    let parameters: String = row.get(6)?;
    let result: Option<String> = row.get(7)?;
    Ok(ActionRecordRow {
        id: row.get(0)?,
        action_id: row.get(1)?,
        action_type: row.get(2)?,
        timestamp: row.get(3)?,
        channel_id: row.get(4)?,
        platform: row.get(5)?,
        parameters: serde_json::from_str(&parameters).unwrap_or(serde_json::Value::Null),
        result: result.and_then(|r| serde_json::from_str(&r).ok()),
        success: row.get(8)?,
        duration_ms: row.get(9)?,
    })
}

fn row_to_memory(row: &rusqlite::Row) -> rusqlite::Result<MemoryRecord> {
    Ok(MemoryRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        platform: row.get(2)?,
        memory_type: row.get(3)?,
        content: row.get(4)?,
        importance: row.get(5)?,
        timestamp: row.get(6)?,
        source_context: row.get(7)?,
        last_accessed: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> HistoryRecorder {
        HistoryRecorder::new(Connection::open_in_memory().unwrap()).unwrap()
    }

    #[test]
    fn records_and_reads_back_a_message() {
        let r = recorder();
        r.record_message("m1", "c1", "federated_chat", "alice", "hi", 100.0, None, None)
            .unwrap();
        let msgs = r.get_recent_messages("c1", "federated_chat", 10).unwrap();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].content, "hi");
    }

    #[test]
    fn duplicate_message_id_is_ignored() {
        let r = recorder();
        r.record_message("m1", "c1", "federated_chat", "alice", "hi", 100.0, None, None)
            .unwrap();
        r.record_message("m1", "c1", "federated_chat", "alice", "hi again", 101.0, None, None)
            .unwrap();
        let msgs = r.get_recent_messages("c1", "federated_chat", 10).unwrap();
        assert_eq!(msgs.len(), 1);
    }

    #[test]
    fn export_for_training_collects_all_tables() {
        let r = recorder();
        r.record_message("m1", "c1", "federated_chat", "alice", "hi", 100.0, None, None)
            .unwrap();
        r.record_action("a1", "wait", &serde_json::json!({}), None, true, None, None, None, 101.0)
            .unwrap();
        r.record_state_change("tool_execution", &serde_json::json!({"k": "v"}), None, None, None, 102.0)
            .unwrap();
        let export = r.export_for_training(None, None, None, false).unwrap();
        assert_eq!(export.messages.len(), 1);
        assert_eq!(export.actions.len(), 1);
        assert_eq!(export.state_changes.len(), 1);
    }
}
