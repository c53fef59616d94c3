use std::time::{SystemTime, UNIX_EPOCH};

use reflex_core::{
    normalize_username, DeviceFilter, DeviceType, GameOutcome, GameSession, PlausibilityPolicy,
    RankingEntry, ScoreSubmission,
};
use uuid::Uuid;

use crate::error::LedgerError;
use crate::store::{FinalizeResult, SessionStore};
use crate::types::{DeviceLeaderboardStats, GameStats, LeaderboardStats};

pub(crate) fn now_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis().min(u128::from(u64::MAX)) as u64)
        .unwrap_or(0)
}

/// Server-side authority over game sessions and the ranking table.
///
/// `end_session` is the only path that writes ranking entries.
pub(crate) struct SessionLedger {
    store: SessionStore,
    policy: PlausibilityPolicy,
}

impl SessionLedger {
    pub(crate) fn new(store: SessionStore, policy: PlausibilityPolicy) -> Self {
        Self { store, policy }
    }

    pub(crate) fn start_session(
        &self,
        device_type: DeviceType,
        user_agent: Option<String>,
        ip_address: Option<String>,
    ) -> Result<GameSession, LedgerError> {
        let session = GameSession::new(
            Uuid::new_v4().to_string(),
            now_unix_ms(),
            device_type,
            user_agent,
            ip_address,
        );
        self.store
            .insert_session(&session)
            .map_err(LedgerError::StoreFailure)?;

        tracing::info!(
            session_id = %session.session_id,
            device_type = %session.device_type,
            "game session started"
        );
        Ok(session)
    }

    /// Finalize a session and, for a named valid result, upsert its ranking.
    ///
    /// An implausible time still completes the session (with `is_valid =
    /// false`) unless the policy rejects such submissions outright, in which
    /// case nothing is written.
    pub(crate) fn end_session(
        &self,
        session_id: &str,
        outcome: GameOutcome,
        username: Option<&str>,
    ) -> Result<(GameSession, Option<RankingEntry>), LedgerError> {
        if self.policy.rejects(outcome.time_taken_seconds) {
            return Err(LedgerError::InvalidInput(format!(
                "time_taken must be between {} and {} seconds",
                self.policy.min_time_seconds, self.policy.max_time_seconds
            )));
        }

        let is_valid = self.policy.finalize_validity(outcome.time_taken_seconds);
        let now = now_unix_ms();
        let session = match self
            .store
            .finalize_session(session_id, &outcome, now, is_valid)
            .map_err(LedgerError::StoreFailure)?
        {
            FinalizeResult::Finalized(session) => session,
            FinalizeResult::NotFound => {
                return Err(LedgerError::NotFound(format!(
                    "game session not found: {session_id}"
                )))
            }
            FinalizeResult::AlreadyCompleted => {
                return Err(LedgerError::AlreadyCompleted(session_id.to_string()))
            }
        };

        tracing::info!(
            session_id = %session.session_id,
            device_type = %session.device_type,
            is_valid = session.is_valid,
            time_taken = outcome.time_taken_seconds,
            attempts = outcome.attempts,
            "game session completed"
        );

        let ranking_entry = match normalize_username(username) {
            Some(name) if session.is_valid => {
                let submission = ScoreSubmission {
                    username: name.to_string(),
                    device_type: session.device_type,
                    time_taken_seconds: outcome.time_taken_seconds,
                    attempts: outcome.attempts,
                    max_level: outcome.max_level,
                    session_id: session.session_id.clone(),
                    is_valid: session.is_valid,
                };
                Some(
                    self.store
                        .upsert_score(&submission, now)
                        .map_err(LedgerError::StoreFailure)?,
                )
            }
            _ => None,
        };

        Ok((session, ranking_entry))
    }

    pub(crate) fn get_session(&self, session_id: &str) -> Result<GameSession, LedgerError> {
        self.store
            .get_session(session_id)
            .map_err(LedgerError::StoreFailure)?
            .ok_or_else(|| LedgerError::NotFound(format!("game session not found: {session_id}")))
    }

    pub(crate) fn stored_sessions(&self) -> Result<u64, LedgerError> {
        self.store.count_sessions().map_err(LedgerError::StoreFailure)
    }

    pub(crate) fn game_stats(&self) -> Result<GameStats, LedgerError> {
        let counts = self
            .store
            .session_counts()
            .map_err(LedgerError::StoreFailure)?;
        Ok(GameStats {
            total_sessions: counts.total,
            completed_sessions: counts.completed,
            valid_sessions: counts.valid,
            completion_rate: percentage(counts.completed, counts.total),
            valid_rate: percentage(counts.valid, counts.completed),
            sessions_by_device: counts.valid_by_device,
            average_time_seconds: counts.average_time_seconds.map(round2),
            average_attempts: counts.average_attempts.map(round2),
        })
    }

    pub(crate) fn top_scores(
        &self,
        limit: u32,
        filter: DeviceFilter,
    ) -> Result<Vec<RankingEntry>, LedgerError> {
        self.store
            .top_scores(limit, filter)
            .map_err(LedgerError::StoreFailure)
    }

    pub(crate) fn user_scores(&self, username: &str) -> Result<Vec<RankingEntry>, LedgerError> {
        let scores = self
            .store
            .user_scores(username)
            .map_err(LedgerError::StoreFailure)?;
        if scores.is_empty() {
            return Err(LedgerError::NotFound(format!(
                "no scores found for user: {username}"
            )));
        }
        Ok(scores)
    }

    pub(crate) fn leaderboard_stats(&self) -> Result<LeaderboardStats, LedgerError> {
        let counts = self
            .store
            .ranking_counts()
            .map_err(LedgerError::StoreFailure)?;
        Ok(LeaderboardStats {
            total_entries: counts.total_entries,
            by_device: counts
                .by_device
                .into_iter()
                .map(|(device, (count, average))| {
                    (
                        device,
                        DeviceLeaderboardStats {
                            count,
                            average_best_time: average.map(round2),
                        },
                    )
                })
                .collect(),
            best_overall_time: counts.best_overall_time,
            most_attempts: counts.most_attempts,
            highest_level: counts.highest_level,
        })
    }
}

fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(part as f64 / total as f64 * 100.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
