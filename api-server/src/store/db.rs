use reflex_core::{DeviceType, GameSession, RankingEntry};
use rusqlite::Row;

pub(super) const SESSION_COLUMNS: &str = "session_id, start_time, end_time, time_taken, attempts,
     max_level, device_type, user_agent, ip_address, is_completed, is_valid";

pub(super) const RANKING_COLUMNS: &str = "username, device_type, best_time, best_attempts,
     max_level, session_id, total_games, is_valid, created_at, updated_at";

pub(super) struct RawSessionRow {
    session_id: String,
    start_time: i64,
    end_time: Option<i64>,
    time_taken: Option<f64>,
    attempts: i64,
    max_level: i64,
    device_type: String,
    user_agent: Option<String>,
    ip_address: Option<String>,
    is_completed: bool,
    is_valid: bool,
}

impl RawSessionRow {
    pub(super) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            session_id: row.get(0)?,
            start_time: row.get(1)?,
            end_time: row.get(2)?,
            time_taken: row.get(3)?,
            attempts: row.get(4)?,
            max_level: row.get(5)?,
            device_type: row.get(6)?,
            user_agent: row.get(7)?,
            ip_address: row.get(8)?,
            is_completed: row.get(9)?,
            is_valid: row.get(10)?,
        })
    }

    pub(super) fn into_session(self) -> Result<GameSession, String> {
        Ok(GameSession {
            device_type: device_from_str(&self.device_type)?,
            session_id: self.session_id,
            start_time: self.start_time as u64,
            end_time: self.end_time.map(|v| v as u64),
            time_taken_seconds: self.time_taken,
            attempts: self.attempts as u32,
            max_level: self.max_level as u32,
            user_agent: self.user_agent,
            ip_address: self.ip_address,
            is_completed: self.is_completed,
            is_valid: self.is_valid,
        })
    }
}

pub(super) struct RawRankingRow {
    username: String,
    device_type: String,
    best_time: f64,
    best_attempts: i64,
    max_level: i64,
    session_id: String,
    total_games: i64,
    is_valid: bool,
    created_at: i64,
    updated_at: i64,
}

impl RawRankingRow {
    pub(super) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            username: row.get(0)?,
            device_type: row.get(1)?,
            best_time: row.get(2)?,
            best_attempts: row.get(3)?,
            max_level: row.get(4)?,
            session_id: row.get(5)?,
            total_games: row.get(6)?,
            is_valid: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    pub(super) fn into_entry(self) -> Result<RankingEntry, String> {
        Ok(RankingEntry {
            device_type: device_from_str(&self.device_type)?,
            username: self.username,
            best_time_seconds: self.best_time,
            best_attempts: self.best_attempts as u32,
            max_level: self.max_level as u32,
            session_id: self.session_id,
            total_games: self.total_games as u32,
            is_valid: self.is_valid,
            created_at: self.created_at as u64,
            updated_at: self.updated_at as u64,
        })
    }
}

pub(super) fn device_from_str(s: &str) -> Result<DeviceType, String> {
    s.parse()
        .map_err(|e| format!("bad device_type in db: {e}"))
}
