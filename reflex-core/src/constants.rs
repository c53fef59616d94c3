//! Game tunables shared by the client engine and the server ledger.

// Target control
pub const TARGET_WIDTH: f64 = 120.0;
pub const TARGET_HEIGHT: f64 = 60.0;

// Levels start at 1 and only go up.
pub const STARTING_LEVEL: u32 = 1;

// Difficulty curve (per level)
pub const BASE_ESCAPE_RADIUS: f64 = 150.0;
pub const ESCAPE_RADIUS_STEP: f64 = 10.0;
pub const MIN_ESCAPE_RADIUS: f64 = 50.0;
pub const BASE_ESCAPE_SPEED_MS: f64 = 300.0;
pub const ESCAPE_SPEED_STEP_MS: f64 = 20.0;
pub const MIN_ESCAPE_SPEED_MS: f64 = 150.0;
pub const BASE_ESCAPE_DISTANCE: f64 = 200.0;
pub const ESCAPE_DISTANCE_STEP: f64 = 30.0;
pub const MAX_ESCAPE_DISTANCE: f64 = 400.0;
pub const BASE_TAUNT_INTERVAL_MS: f64 = 5000.0;
pub const TAUNT_INTERVAL_STEP_MS: f64 = 500.0;
pub const MIN_TAUNT_INTERVAL_MS: f64 = 2000.0;

// Evasion
pub const SAMPLER_MAX_ATTEMPTS: u32 = 50;
pub const SETTLE_DELAY_MS: u64 = 300;
pub const NEAR_MISS_RATIO: f64 = 0.5;
pub const NEAR_MISSES_PER_LEVEL: u32 = 5;

// Plausibility bounds on client-reported elapsed time (seconds)
pub const DEFAULT_MIN_GAME_TIME_S: f64 = 3.0;
pub const DEFAULT_MAX_GAME_TIME_S: f64 = 300.0;

// Leaderboard
pub const MAX_USERNAME_LEN: usize = 50;
pub const LEADERBOARD_LIMIT_DEFAULT: u32 = 10;
pub const LEADERBOARD_LIMIT_MAX: u32 = 100;
