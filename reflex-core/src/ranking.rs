use alloc::{string::String, vec::Vec};
use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::constants::MAX_USERNAME_LEN;
use crate::device::{DeviceFilter, DeviceType};

/// Latest recorded outcome for one `(username, device_type)` pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub username: String,
    pub device_type: DeviceType,
    pub best_time_seconds: f64,
    pub best_attempts: u32,
    pub max_level: u32,
    pub session_id: String,
    pub total_games: u32,
    pub is_valid: bool,
    pub created_at: u64,
    pub updated_at: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScoreSubmission {
    pub username: String,
    pub device_type: DeviceType,
    pub time_taken_seconds: f64,
    pub attempts: u32,
    pub max_level: u32,
    pub session_id: String,
    pub is_valid: bool,
}

/// Trimmed username, or `None` when nothing is left after trimming.
pub fn normalize_username(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|name| !name.is_empty())
}

pub fn username_fits(name: &str) -> bool {
    name.chars().count() <= MAX_USERNAME_LEN
}

/// Upsert rule for one submission.
///
/// An existing entry has its best fields replaced by the submission, not
/// compared against it, and `total_games` goes up by one.
pub fn apply_score(existing: Option<RankingEntry>, submission: ScoreSubmission, now: u64) -> RankingEntry {
    let ScoreSubmission {
        username,
        device_type,
        time_taken_seconds,
        attempts,
        max_level,
        session_id,
        is_valid,
    } = submission;

    match existing {
        Some(mut entry) => {
            entry.best_time_seconds = time_taken_seconds;
            entry.best_attempts = attempts;
            entry.max_level = max_level;
            entry.session_id = session_id;
            entry.is_valid = is_valid;
            entry.total_games = entry.total_games.saturating_add(1);
            entry.updated_at = now;
            entry
        }
        None => RankingEntry {
            username,
            device_type,
            best_time_seconds: time_taken_seconds,
            best_attempts: attempts,
            max_level,
            session_id,
            total_games: 1,
            is_valid,
            created_at: now,
            updated_at: now,
        },
    }
}

/// Faster time first, then fewer attempts.
pub fn ranking_order(a: &RankingEntry, b: &RankingEntry) -> Ordering {
    a.best_time_seconds
        .partial_cmp(&b.best_time_seconds)
        .unwrap_or(Ordering::Equal)
        .then(a.best_attempts.cmp(&b.best_attempts))
}

/// Valid entries matching `filter`, ranked, at most `limit` of them.
pub fn top_scores<'a, I>(entries: I, limit: usize, filter: DeviceFilter) -> Vec<RankingEntry>
where
    I: IntoIterator<Item = &'a RankingEntry>,
{
    let mut ranked: Vec<RankingEntry> = entries
        .into_iter()
        .filter(|entry| entry.is_valid && filter.matches(entry.device_type))
        .cloned()
        .collect();
    ranked.sort_by(ranking_order);
    ranked.truncate(limit);
    ranked
}
