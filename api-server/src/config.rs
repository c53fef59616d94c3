use std::{env, path::PathBuf, sync::Arc};

use reflex_core::constants::{DEFAULT_MAX_GAME_TIME_S, DEFAULT_MIN_GAME_TIME_S};
use reflex_core::PlausibilityPolicy;

use crate::ledger::SessionLedger;
use crate::rate_limit::RateLimiter;

pub(crate) const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub(crate) const DEFAULT_DATA_DIR: &str = "./data";
pub(crate) const DEFAULT_JSON_LIMIT_BYTES: usize = 16 * 1024;
pub(crate) const DEFAULT_RATE_LIMIT_SWEEP_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub(crate) struct ServerConfig {
    pub(crate) bind_addr: String,
    pub(crate) data_dir: PathBuf,
    pub(crate) json_limit: usize,
    pub(crate) http_workers: Option<usize>,
    pub(crate) rate_limit_enabled: bool,
    pub(crate) rate_limit_sweep_secs: u64,
    pub(crate) policy: PlausibilityPolicy,
}

impl ServerConfig {
    pub(crate) fn from_env() -> Self {
        Self {
            bind_addr: env::var("API_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR)),
            json_limit: read_env_usize("JSON_LIMIT_BYTES", DEFAULT_JSON_LIMIT_BYTES),
            http_workers: read_env_optional_usize("HTTP_WORKERS"),
            rate_limit_enabled: read_env_bool("RATE_LIMIT_ENABLED", true),
            rate_limit_sweep_secs: read_env_u64(
                "RATE_LIMIT_SWEEP_SECS",
                DEFAULT_RATE_LIMIT_SWEEP_SECS,
            ),
            policy: plausibility_from_env(),
        }
    }
}

pub(crate) fn plausibility_from_env() -> PlausibilityPolicy {
    let min = read_env_f64("MIN_GAME_TIME", DEFAULT_MIN_GAME_TIME_S);
    let max = read_env_f64("MAX_GAME_TIME", DEFAULT_MAX_GAME_TIME_S);
    plausibility_policy(
        min,
        max,
        read_env_bool("FLAG_IMPLAUSIBLE_TIMES", true),
        read_env_bool("REJECT_IMPLAUSIBLE_TIMES", false),
    )
}

pub(crate) fn plausibility_policy(
    mut min_time_seconds: f64,
    mut max_time_seconds: f64,
    flag_on_finalize: bool,
    reject_on_submit: bool,
) -> PlausibilityPolicy {
    if min_time_seconds > max_time_seconds {
        tracing::warn!(
            "MIN_GAME_TIME ({}) > MAX_GAME_TIME ({}). Falling back to defaults.",
            min_time_seconds,
            max_time_seconds
        );
        min_time_seconds = DEFAULT_MIN_GAME_TIME_S;
        max_time_seconds = DEFAULT_MAX_GAME_TIME_S;
    }

    PlausibilityPolicy {
        min_time_seconds,
        max_time_seconds,
        flag_on_finalize,
        reject_on_submit,
    }
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) ledger: Arc<SessionLedger>,
    pub(crate) limiter: Arc<RateLimiter>,
    pub(crate) policy: PlausibilityPolicy,
}

pub(crate) fn read_env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

pub(crate) fn read_env_optional_usize(name: &str) -> Option<usize> {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
}

pub(crate) fn read_env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

pub(crate) fn read_env_f64(name: &str, default: f64) -> f64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|value| value.is_finite() && *value >= 0.0)
        .unwrap_or(default)
}

pub(crate) fn read_env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .map(|value| parse_bool(&value, default))
        .unwrap_or(default)
}

fn parse_bool(value: &str, default: bool) -> bool {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}
