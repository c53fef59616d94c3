use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
    time::{Duration, Instant},
};

use crate::error::LedgerError;

/// Endpoint groups that share one budget per client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum LimitClass {
    General,
    SessionStart,
    SessionEnd,
    LeaderboardRead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RateLimitRule {
    pub(crate) max_requests: usize,
    pub(crate) window: Duration,
    pub(crate) message: &'static str,
}

impl LimitClass {
    pub(crate) fn rule(self) -> RateLimitRule {
        match self {
            Self::General => RateLimitRule {
                max_requests: 100,
                window: Duration::from_secs(15 * 60),
                message: "too many requests, please try again later",
            },
            Self::SessionStart => RateLimitRule {
                max_requests: 10,
                window: Duration::from_secs(60),
                message: "too many game sessions started, please slow down",
            },
            Self::SessionEnd => RateLimitRule {
                max_requests: 20,
                window: Duration::from_secs(60),
                message: "too many game completions, please slow down",
            },
            Self::LeaderboardRead => RateLimitRule {
                max_requests: 50,
                window: Duration::from_secs(5 * 60),
                message: "too many leaderboard requests, please slow down",
            },
        }
    }
}

/// Sliding-window limiter keyed by `(class, client)`.
///
/// Each bucket keeps the instants of accepted requests still inside the
/// window. Rejected requests are not recorded.
pub(crate) struct RateLimiter {
    enabled: bool,
    buckets: Mutex<HashMap<(LimitClass, String), VecDeque<Instant>>>,
}

impl RateLimiter {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            enabled,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn check(&self, class: LimitClass, client: &str) -> Result<(), LedgerError> {
        self.check_at(class, client, Instant::now())
    }

    pub(crate) fn check_at(
        &self,
        class: LimitClass,
        client: &str,
        now: Instant,
    ) -> Result<(), LedgerError> {
        if !self.enabled {
            return Ok(());
        }
        let rule = class.rule();
        let mut buckets = self
            .buckets
            .lock()
            .map_err(|_| LedgerError::StoreFailure("rate limiter lock poisoned".to_string()))?;
        let hits = buckets.entry((class, client.to_string())).or_default();
        evict_expired(hits, now, rule.window);

        if hits.len() >= rule.max_requests {
            let retry_after = hits
                .front()
                .map(|oldest| rule.window.saturating_sub(now.saturating_duration_since(*oldest)))
                .unwrap_or(rule.window);
            return Err(LedgerError::Throttled {
                message: rule.message,
                retry_after_secs: ceil_secs(retry_after),
            });
        }

        hits.push_back(now);
        Ok(())
    }

    /// Drop buckets with no hits left in their window. Returns how many went.
    pub(crate) fn sweep(&self, now: Instant) -> usize {
        let Ok(mut buckets) = self.buckets.lock() else {
            return 0;
        };
        let before = buckets.len();
        buckets.retain(|(class, _), hits| {
            evict_expired(hits, now, class.rule().window);
            !hits.is_empty()
        });
        before - buckets.len()
    }

    pub(crate) fn tracked_clients(&self) -> usize {
        self.buckets.lock().map(|b| b.len()).unwrap_or(0)
    }
}

fn evict_expired(hits: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(oldest) = hits.front() {
        if now.saturating_duration_since(*oldest) >= window {
            hits.pop_front();
        } else {
            break;
        }
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs.max(1)
    }
}
