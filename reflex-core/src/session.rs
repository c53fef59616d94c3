use alloc::string::String;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MAX_GAME_TIME_S, DEFAULT_MIN_GAME_TIME_S, STARTING_LEVEL};
use crate::device::DeviceType;

/// What the client reports when the target is finally caught.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameOutcome {
    pub time_taken_seconds: f64,
    pub attempts: u32,
    pub max_level: u32,
}

/// Server-side record of one play-through.
///
/// Created incomplete at game start, finalized exactly once, never touched
/// again. `ip_address` is kept for audits and never serialized.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    pub session_id: String,
    pub start_time: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_taken_seconds: Option<f64>,
    pub attempts: u32,
    pub max_level: u32,
    pub device_type: DeviceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing, default)]
    pub ip_address: Option<String>,
    pub is_completed: bool,
    pub is_valid: bool,
}

impl GameSession {
    pub fn new(
        session_id: String,
        start_time: u64,
        device_type: DeviceType,
        user_agent: Option<String>,
        ip_address: Option<String>,
    ) -> Self {
        Self {
            session_id,
            start_time,
            end_time: None,
            time_taken_seconds: None,
            attempts: 0,
            max_level: STARTING_LEVEL,
            device_type,
            user_agent,
            ip_address,
            is_completed: false,
            is_valid: true,
        }
    }
}

/// Bounds on client-reported elapsed time.
///
/// The client reports its own timer, so this only filters out obviously
/// broken or hand-crafted submissions. It is not proof of play.
///
/// The two toggles are independent: `flag_on_finalize` marks an implausible
/// session invalid but still completes it, `reject_on_submit` refuses the
/// submission before anything is written.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlausibilityPolicy {
    pub min_time_seconds: f64,
    pub max_time_seconds: f64,
    pub flag_on_finalize: bool,
    pub reject_on_submit: bool,
}

impl Default for PlausibilityPolicy {
    fn default() -> Self {
        Self {
            min_time_seconds: DEFAULT_MIN_GAME_TIME_S,
            max_time_seconds: DEFAULT_MAX_GAME_TIME_S,
            flag_on_finalize: true,
            reject_on_submit: false,
        }
    }
}

impl PlausibilityPolicy {
    pub fn is_plausible(&self, time_taken_seconds: f64) -> bool {
        time_taken_seconds >= self.min_time_seconds && time_taken_seconds <= self.max_time_seconds
    }

    /// `is_valid` to store when finalizing a session.
    pub fn finalize_validity(&self, time_taken_seconds: f64) -> bool {
        !self.flag_on_finalize || self.is_plausible(time_taken_seconds)
    }

    /// Whether a submission must be refused outright.
    pub fn rejects(&self, time_taken_seconds: f64) -> bool {
        self.reject_on_submit && !self.is_plausible(time_taken_seconds)
    }
}
