use serde::{Deserialize, Serialize};

use crate::constants::{
    BASE_ESCAPE_DISTANCE, BASE_ESCAPE_RADIUS, BASE_ESCAPE_SPEED_MS, BASE_TAUNT_INTERVAL_MS,
    ESCAPE_DISTANCE_STEP, ESCAPE_RADIUS_STEP, ESCAPE_SPEED_STEP_MS, MAX_ESCAPE_DISTANCE,
    MIN_ESCAPE_RADIUS, MIN_ESCAPE_SPEED_MS, MIN_TAUNT_INTERVAL_MS, STARTING_LEVEL,
    TAUNT_INTERVAL_STEP_MS,
};

/// Linear difficulty curve with a clamp on every tunable.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DifficultyConfig {
    pub base_escape_radius: f64,
    pub escape_radius_step: f64,
    pub min_escape_radius: f64,
    pub base_escape_speed_ms: f64,
    pub escape_speed_step_ms: f64,
    pub min_escape_speed_ms: f64,
    pub base_escape_distance: f64,
    pub escape_distance_step: f64,
    pub max_escape_distance: f64,
    pub base_taunt_interval_ms: f64,
    pub taunt_interval_step_ms: f64,
    pub min_taunt_interval_ms: f64,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            base_escape_radius: BASE_ESCAPE_RADIUS,
            escape_radius_step: ESCAPE_RADIUS_STEP,
            min_escape_radius: MIN_ESCAPE_RADIUS,
            base_escape_speed_ms: BASE_ESCAPE_SPEED_MS,
            escape_speed_step_ms: ESCAPE_SPEED_STEP_MS,
            min_escape_speed_ms: MIN_ESCAPE_SPEED_MS,
            base_escape_distance: BASE_ESCAPE_DISTANCE,
            escape_distance_step: ESCAPE_DISTANCE_STEP,
            max_escape_distance: MAX_ESCAPE_DISTANCE,
            base_taunt_interval_ms: BASE_TAUNT_INTERVAL_MS,
            taunt_interval_step_ms: TAUNT_INTERVAL_STEP_MS,
            min_taunt_interval_ms: MIN_TAUNT_INTERVAL_MS,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DifficultyState {
    pub level: u32,
    pub escape_radius: f64,
    /// Escape animation duration. Presentation only.
    pub escape_speed_ms: f64,
    pub escape_min_distance: f64,
    pub taunt_interval_ms: f64,
}

/// Tunables for `level`. Level 0 is treated as the starting level.
pub fn derive_difficulty(level: u32, config: &DifficultyConfig) -> DifficultyState {
    let level = level.max(STARTING_LEVEL);
    let steps = f64::from(level);

    DifficultyState {
        level,
        escape_radius: (config.base_escape_radius - config.escape_radius_step * steps)
            .max(config.min_escape_radius),
        escape_speed_ms: (config.base_escape_speed_ms - config.escape_speed_step_ms * steps)
            .max(config.min_escape_speed_ms),
        escape_min_distance: (config.base_escape_distance + config.escape_distance_step * steps)
            .min(config.max_escape_distance),
        taunt_interval_ms: (config.base_taunt_interval_ms - config.taunt_interval_step_ms * steps)
            .max(config.min_taunt_interval_ms),
    }
}
