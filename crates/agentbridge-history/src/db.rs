use rusqlite::{Connection, Result};

pub const SCHEMA_VERSION: i64 = 1;

/// Initialise history tables. Safe to call on every startup (idempotent),
/// driven by a `config.schema_version` row (spec §4.2 schema migration).
pub fn init_db(conn: &Connection) -> Result<()> {
    create_config_table(conn)?;
    create_state_changes_table(conn)?;
    create_messages_table(conn)?;
    create_actions_table(conn)?;
    create_memories_table(conn)?;
    create_undecryptable_events_table(conn)?;
    migrate(conn)?;
    Ok(())
}

fn create_config_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS config (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            key         TEXT NOT NULL,
            category    TEXT NOT NULL,
            value       TEXT NOT NULL,
            UNIQUE(key, category)
        );",
    )
}

fn create_state_changes_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS state_changes (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp   REAL NOT NULL,
            change_type TEXT NOT NULL,
            channel_id  TEXT,
            platform    TEXT,
            data        TEXT NOT NULL,
            record_metadata TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_state_changes_ts ON state_changes(timestamp);
        CREATE INDEX IF NOT EXISTS idx_state_changes_channel ON state_changes(channel_id);",
    )
}

fn create_messages_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS messages (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            message_id  TEXT NOT NULL UNIQUE,
            channel_id  TEXT NOT NULL,
            platform    TEXT NOT NULL,
            sender      TEXT NOT NULL,
            content     TEXT NOT NULL,
            timestamp   REAL NOT NULL,
            parent_id   TEXT,
            record_metadata TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_messages_channel ON messages(channel_id, platform, timestamp);",
    )
}

fn create_actions_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS actions (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            action_id   TEXT NOT NULL UNIQUE,
            action_type TEXT NOT NULL,
            timestamp   REAL NOT NULL,
            channel_id  TEXT,
            platform    TEXT,
            parameters  TEXT NOT NULL,
            result      TEXT,
            success     INTEGER NOT NULL,
            duration_ms INTEGER
        );
        CREATE INDEX IF NOT EXISTS idx_actions_ts ON actions(timestamp);
        CREATE INDEX IF NOT EXISTS idx_actions_type ON actions(action_type);",
    )
}

fn create_memories_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS memories (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id     TEXT NOT NULL,
            platform    TEXT NOT NULL,
            memory_type TEXT NOT NULL,
            content     TEXT NOT NULL,
            importance  REAL NOT NULL DEFAULT 0.5,
            timestamp   REAL NOT NULL,
            source_context TEXT,
            last_accessed REAL
        );
        CREATE INDEX IF NOT EXISTS idx_memories_user ON memories(user_id, platform);",
    )
}

fn create_undecryptable_events_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS undecryptable_events (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id    TEXT NOT NULL,
            room_id     TEXT NOT NULL,
            sender      TEXT,
            retry_count INTEGER NOT NULL DEFAULT 0,
            max_retries INTEGER NOT NULL DEFAULT 5,
            error_type  TEXT NOT NULL DEFAULT 'megolm_session_missing',
            last_retry_ts REAL NOT NULL,
            UNIQUE(event_id, room_id)
        );",
    )
}

fn migrate(conn: &Connection) -> Result<()> {
    let current: Option<String> = conn
        .query_row(
            "SELECT value FROM config WHERE key = 'schema_version' AND category = 'system'",
            [],
            |row| row.get(0),
        )
        .ok();

    if current.is_none() {
        conn.execute(
            "INSERT INTO config (key, category, value) VALUES ('schema_version', 'system', ?1)",
            rusqlite::params![SCHEMA_VERSION.to_string()],
        )?;
    }
    Ok(())
}
