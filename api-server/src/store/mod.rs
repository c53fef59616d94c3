mod db;
mod rankings;
#[cfg(test)]
mod tests;

use std::{
    collections::BTreeMap,
    fs,
    path::Path,
    sync::{Mutex, MutexGuard},
};

use reflex_core::{DeviceType, GameOutcome, GameSession};
use rusqlite::{params, Connection, OptionalExtension};

use db::{RawSessionRow, SESSION_COLUMNS};

/// Outcome of the single finalize transition on a session row.
#[derive(Debug)]
pub(crate) enum FinalizeResult {
    Finalized(GameSession),
    NotFound,
    AlreadyCompleted,
}

/// Aggregates over the `sessions` table.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct SessionCounts {
    pub(crate) total: u64,
    pub(crate) completed: u64,
    pub(crate) valid: u64,
    pub(crate) average_time_seconds: Option<f64>,
    pub(crate) average_attempts: Option<f64>,
    pub(crate) valid_by_device: BTreeMap<DeviceType, u64>,
}

/// SQLite-backed store for game sessions and ranking entries.
///
/// Every public method takes the connection lock once, so a conditional
/// update or an upsert is never interleaved with another writer.
pub(crate) struct SessionStore {
    conn: Mutex<Connection>,
}

impl SessionStore {
    /// Open (or create) `{data_dir}/reflex.db` and make sure the schema exists.
    pub(crate) fn open(data_dir: &Path) -> Result<Self, String> {
        fs::create_dir_all(data_dir)
            .map_err(|e| format!("failed to create data dir {}: {e}", data_dir.display()))?;

        let db_path = data_dir.join("reflex.db");
        let conn = Connection::open(&db_path)
            .map_err(|e| format!("failed to open SQLite at {}: {e}", db_path.display()))?;

        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA busy_timeout=5000;
             PRAGMA synchronous=NORMAL;",
        )
        .map_err(|e| format!("failed to set pragmas: {e}"))?;

        Self::create_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn create_schema(conn: &Connection) -> Result<(), String> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                session_id      TEXT PRIMARY KEY,
                start_time      INTEGER NOT NULL,
                end_time        INTEGER,
                time_taken      REAL,
                attempts        INTEGER NOT NULL DEFAULT 0,
                max_level       INTEGER NOT NULL DEFAULT 1,
                device_type     TEXT NOT NULL,
                user_agent      TEXT,
                ip_address      TEXT,
                is_completed    INTEGER NOT NULL DEFAULT 0,
                is_valid        INTEGER NOT NULL DEFAULT 1,
                created_at      INTEGER NOT NULL
             );
             CREATE INDEX IF NOT EXISTS idx_sessions_created_at ON sessions(created_at);
             CREATE INDEX IF NOT EXISTS idx_sessions_time_taken ON sessions(time_taken);
             CREATE INDEX IF NOT EXISTS idx_sessions_state ON sessions(is_completed, is_valid);

             CREATE TABLE IF NOT EXISTS rankings (
                username        TEXT NOT NULL,
                device_type     TEXT NOT NULL,
                best_time       REAL NOT NULL,
                best_attempts   INTEGER NOT NULL,
                max_level       INTEGER NOT NULL,
                session_id      TEXT NOT NULL,
                total_games     INTEGER NOT NULL DEFAULT 1,
                is_valid        INTEGER NOT NULL DEFAULT 1,
                created_at      INTEGER NOT NULL,
                updated_at      INTEGER NOT NULL,
                PRIMARY KEY (username, device_type)
             );
             CREATE INDEX IF NOT EXISTS idx_rankings_best_time ON rankings(best_time);
             CREATE INDEX IF NOT EXISTS idx_rankings_device_best_time
                 ON rankings(device_type, best_time);
             CREATE INDEX IF NOT EXISTS idx_rankings_username ON rankings(username);",
        )
        .map_err(|e| format!("failed to create schema: {e}"))
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, String> {
        self.conn
            .lock()
            .map_err(|_| "session store lock poisoned".to_string())
    }

    pub(crate) fn insert_session(&self, session: &GameSession) -> Result<(), String> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO sessions (
                session_id, start_time, end_time, time_taken, attempts, max_level,
                device_type, user_agent, ip_address, is_completed, is_valid, created_at
            ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12)",
            params![
                session.session_id,
                session.start_time as i64,
                session.end_time.map(|v| v as i64),
                session.time_taken_seconds,
                session.attempts,
                session.max_level,
                session.device_type.as_str(),
                session.user_agent.as_deref(),
                session.ip_address.as_deref(),
                session.is_completed,
                session.is_valid,
                session.start_time as i64,
            ],
        )
        .map_err(|e| format!("insert session failed: {e}"))?;
        Ok(())
    }

    /// Complete an open session.
    ///
    /// The completion guard is part of the UPDATE itself, so two concurrent
    /// finalizations of one id cannot both succeed.
    pub(crate) fn finalize_session(
        &self,
        session_id: &str,
        outcome: &GameOutcome,
        end_time: u64,
        is_valid: bool,
    ) -> Result<FinalizeResult, String> {
        let conn = self.conn()?;
        let updated = conn
            .execute(
                "UPDATE sessions
                 SET end_time = ?1, time_taken = ?2, attempts = ?3, max_level = ?4,
                     is_completed = 1, is_valid = ?5
                 WHERE session_id = ?6 AND is_completed = 0",
                params![
                    end_time as i64,
                    outcome.time_taken_seconds,
                    outcome.attempts,
                    outcome.max_level,
                    is_valid,
                    session_id,
                ],
            )
            .map_err(|e| format!("finalize session failed: {e}"))?;

        if updated == 0 {
            let exists = conn
                .query_row(
                    "SELECT 1 FROM sessions WHERE session_id = ?1",
                    params![session_id],
                    |_| Ok(()),
                )
                .optional()
                .map_err(|e| format!("finalize existence check failed: {e}"))?;
            return Ok(match exists {
                Some(()) => FinalizeResult::AlreadyCompleted,
                None => FinalizeResult::NotFound,
            });
        }

        match Self::select_session(&conn, session_id)? {
            Some(session) => Ok(FinalizeResult::Finalized(session)),
            None => Err(format!("session {session_id} vanished during finalize")),
        }
    }

    pub(crate) fn get_session(&self, session_id: &str) -> Result<Option<GameSession>, String> {
        let conn = self.conn()?;
        Self::select_session(&conn, session_id)
    }

    fn select_session(conn: &Connection, session_id: &str) -> Result<Option<GameSession>, String> {
        let row = conn
            .query_row(
                &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE session_id = ?1"),
                params![session_id],
                RawSessionRow::from_row,
            )
            .optional()
            .map_err(|e| format!("get session failed: {e}"))?;

        row.map(RawSessionRow::into_session).transpose()
    }

    pub(crate) fn count_sessions(&self) -> Result<u64, String> {
        let conn = self.conn()?;
        conn.query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get::<_, i64>(0))
            .map(|count| count as u64)
            .map_err(|e| format!("count sessions failed: {e}"))
    }

    pub(crate) fn session_counts(&self) -> Result<SessionCounts, String> {
        let conn = self.conn()?;
        let mut counts = conn
            .query_row(
                "SELECT
                     COUNT(*),
                     COUNT(*) FILTER (WHERE is_completed = 1),
                     COUNT(*) FILTER (WHERE is_completed = 1 AND is_valid = 1),
                     AVG(time_taken) FILTER (WHERE is_completed = 1 AND is_valid = 1),
                     AVG(attempts) FILTER (WHERE is_completed = 1 AND is_valid = 1)
                 FROM sessions",
                [],
                |row| {
                    Ok(SessionCounts {
                        total: row.get::<_, i64>(0)? as u64,
                        completed: row.get::<_, i64>(1)? as u64,
                        valid: row.get::<_, i64>(2)? as u64,
                        average_time_seconds: row.get(3)?,
                        average_attempts: row.get(4)?,
                        valid_by_device: BTreeMap::new(),
                    })
                },
            )
            .map_err(|e| format!("session counts failed: {e}"))?;

        let mut stmt = conn
            .prepare(
                "SELECT device_type, COUNT(*) FROM sessions
                 WHERE is_completed = 1 AND is_valid = 1
                 GROUP BY device_type",
            )
            .map_err(|e| format!("device counts prepare failed: {e}"))?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
            .map_err(|e| format!("device counts query failed: {e}"))?;
        for row in rows {
            let (device, count) = row.map_err(|e| format!("device counts row failed: {e}"))?;
            counts
                .valid_by_device
                .insert(db::device_from_str(&device)?, count as u64);
        }

        Ok(counts)
    }
}
