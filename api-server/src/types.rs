use std::collections::BTreeMap;

use reflex_core::{DeviceType, GameSession, RankingEntry};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Default)]
pub(crate) struct StartSessionRequest {
    #[serde(default)]
    pub(crate) device_type: Option<String>,
    #[serde(default)]
    pub(crate) user_agent: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StartSessionResponse {
    pub(crate) success: bool,
    pub(crate) session_id: String,
    pub(crate) start_time: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct EndSessionRequest {
    #[serde(default)]
    pub(crate) session_id: Option<String>,
    #[serde(default)]
    pub(crate) time_taken: Option<f64>,
    #[serde(default)]
    pub(crate) attempts: Option<f64>,
    #[serde(default)]
    pub(crate) max_level: Option<f64>,
    #[serde(default)]
    pub(crate) username: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct EndSessionResponse {
    pub(crate) success: bool,
    pub(crate) session: GameSession,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) ranking_entry: Option<RankingEntry>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SessionResponse {
    pub(crate) success: bool,
    pub(crate) session: GameSession,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub(crate) struct LeaderboardQuery {
    #[serde(default)]
    pub(crate) limit: Option<String>,
    #[serde(default)]
    pub(crate) device_type: Option<String>,
}

/// Public leaderboard line. Session ids and bookkeeping stay server-side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct LeaderboardRow {
    pub(crate) username: String,
    pub(crate) device_type: DeviceType,
    pub(crate) best_time_seconds: f64,
    pub(crate) best_attempts: u32,
    pub(crate) max_level: u32,
    pub(crate) created_at: u64,
}

impl From<RankingEntry> for LeaderboardRow {
    fn from(entry: RankingEntry) -> Self {
        Self {
            username: entry.username,
            device_type: entry.device_type,
            best_time_seconds: entry.best_time_seconds,
            best_attempts: entry.best_attempts,
            max_level: entry.max_level,
            created_at: entry.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct LeaderboardResponse {
    pub(crate) success: bool,
    pub(crate) scores: Vec<LeaderboardRow>,
    pub(crate) count: usize,
    pub(crate) device_type: &'static str,
    pub(crate) limit: u32,
}

#[derive(Debug, Serialize)]
pub(crate) struct UserScoresResponse {
    pub(crate) success: bool,
    pub(crate) username: String,
    pub(crate) scores: Vec<RankingEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct GameStats {
    pub(crate) total_sessions: u64,
    pub(crate) completed_sessions: u64,
    pub(crate) valid_sessions: u64,
    /// Percent of all sessions that were completed, two decimals.
    pub(crate) completion_rate: f64,
    /// Percent of completed sessions that were valid, two decimals.
    pub(crate) valid_rate: f64,
    pub(crate) sessions_by_device: BTreeMap<DeviceType, u64>,
    pub(crate) average_time_seconds: Option<f64>,
    pub(crate) average_attempts: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct DeviceLeaderboardStats {
    pub(crate) count: u64,
    pub(crate) average_best_time: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct LeaderboardStats {
    pub(crate) total_entries: u64,
    pub(crate) by_device: BTreeMap<DeviceType, DeviceLeaderboardStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) best_overall_time: Option<RankingEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) most_attempts: Option<RankingEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) highest_level: Option<RankingEntry>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StatsResponse<T> {
    pub(crate) success: bool,
    pub(crate) stats: T,
}

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) status: &'static str,
    pub(crate) service: &'static str,
    pub(crate) stored_sessions: u64,
    pub(crate) min_game_time_seconds: f64,
    pub(crate) max_game_time_seconds: f64,
    pub(crate) flag_implausible_times: bool,
    pub(crate) reject_implausible_times: bool,
    pub(crate) rate_limited_clients: usize,
}
