//! Client-side evasion state machine.
//!
//! The engine owns the target. Input arrives as a normalized [`PointerEvent`]
//! with arena-relative coordinates; output is a queue of [`EngineEvent`]s the
//! UI drains after each call. Time is passed in by the caller as monotonic
//! milliseconds, so a round is fully reproducible from its seed and inputs.

use alloc::{string::String, vec::Vec};
use core::mem;

use serde::{Deserialize, Serialize};

use crate::constants::{
    NEAR_MISSES_PER_LEVEL, NEAR_MISS_RATIO, SETTLE_DELAY_MS, STARTING_LEVEL, TARGET_HEIGHT,
    TARGET_WIDTH,
};
use crate::device::{DeviceType, PointerSource};
use crate::difficulty::{derive_difficulty, DifficultyConfig, DifficultyState};
use crate::geometry::{within, Point, Size};
use crate::rng::SeededRng;
use crate::sampler::sample_position;
use crate::session::GameOutcome;
use crate::taunt::{pick_taunt, OPENING_TAUNT};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnginePhase {
    /// Arena not measured yet, or the round is over.
    Idle,
    Pursuing,
    /// A relocation is in flight; pointer input is ignored until it settles.
    Escaping,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub source: PointerSource,
    pub position: Point,
}

impl PointerEvent {
    pub fn mouse(x: f64, y: f64) -> Self {
        Self {
            source: PointerSource::Mouse,
            position: Point::new(x, y),
        }
    }

    pub fn touch(x: f64, y: f64) -> Self {
        Self {
            source: PointerSource::Touch,
            position: Point::new(x, y),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TargetState {
    /// Top-left corner inside the arena.
    pub position: Point,
    pub is_escaping: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    Miss { attempts: u32 },
    Relocated { from: Point, to: Point, duration_ms: f64 },
    NearMiss { near_misses: u32 },
    LevelUp { level: u32 },
    Settled,
    TauntChanged(String),
    Activated(GameOutcome),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineConfig {
    pub difficulty: DifficultyConfig,
    pub device_type: DeviceType,
    pub target: Size,
    pub settle_delay_ms: u64,
    pub near_miss_ratio: f64,
    pub near_misses_per_level: u32,
}

impl EngineConfig {
    pub fn for_device(device_type: DeviceType) -> Self {
        Self {
            difficulty: DifficultyConfig::default(),
            device_type,
            target: Size::new(TARGET_WIDTH, TARGET_HEIGHT),
            settle_delay_ms: SETTLE_DELAY_MS,
            near_miss_ratio: NEAR_MISS_RATIO,
            near_misses_per_level: NEAR_MISSES_PER_LEVEL,
        }
    }
}

pub struct EvasionEngine {
    config: EngineConfig,
    rng: SeededRng,
    phase: EnginePhase,
    finished: bool,
    arena: Option<Size>,
    target: TargetState,
    difficulty: DifficultyState,
    attempts: u32,
    near_misses: u32,
    started_at_ms: Option<u64>,
    escape_started_at_ms: u64,
    last_taunt_at_ms: u64,
    taunt: String,
    events: Vec<EngineEvent>,
}

impl EvasionEngine {
    pub fn new(config: EngineConfig, seed: u32) -> Self {
        Self {
            difficulty: derive_difficulty(STARTING_LEVEL, &config.difficulty),
            config,
            rng: SeededRng::new(seed),
            phase: EnginePhase::Idle,
            finished: false,
            arena: None,
            target: TargetState {
                position: Point::default(),
                is_escaping: false,
            },
            attempts: 0,
            near_misses: 0,
            started_at_ms: None,
            escape_started_at_ms: 0,
            last_taunt_at_ms: 0,
            taunt: String::from(OPENING_TAUNT),
            events: Vec::new(),
        }
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn target(&self) -> TargetState {
        self.target
    }

    pub fn target_center(&self) -> Point {
        self.target
            .position
            .offset(self.config.target.width / 2.0, self.config.target.height / 2.0)
    }

    pub fn difficulty(&self) -> DifficultyState {
        self.difficulty
    }

    pub fn level(&self) -> u32 {
        self.difficulty.level
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn near_misses(&self) -> u32 {
        self.near_misses
    }

    pub fn taunt(&self) -> &str {
        &self.taunt
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Whole seconds since the arena was first measured.
    pub fn elapsed_seconds(&self, now_ms: u64) -> u64 {
        self.started_at_ms
            .map_or(0, |started| now_ms.saturating_sub(started) / 1000)
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        mem::take(&mut self.events)
    }

    /// Report the arena size. A zero-sized arena keeps (or puts) the engine in
    /// `Idle`; the first usable size places the target and starts the clock.
    pub fn measure_arena(&mut self, width: f64, height: f64, now_ms: u64) {
        if self.finished {
            return;
        }

        let arena = Size::new(width, height);
        if arena.is_empty() {
            self.arena = None;
            self.phase = EnginePhase::Idle;
            self.target.is_escaping = false;
            return;
        }

        let was_idle = self.arena.is_none();
        self.arena = Some(arena);
        if was_idle {
            self.target.position =
                sample_position(&mut self.rng, arena.center(), 0.0, arena, self.config.target);
            self.target.is_escaping = false;
            self.phase = EnginePhase::Pursuing;
            if self.started_at_ms.is_none() {
                self.started_at_ms = Some(now_ms);
                self.last_taunt_at_ms = now_ms;
            }
        } else {
            self.clamp_target_into(arena);
        }
    }

    /// Feed one pointer sample. Returns `true` when the target relocated.
    pub fn on_pointer_moved(&mut self, event: PointerEvent, now_ms: u64) -> bool {
        self.settle(now_ms);

        if self.phase != EnginePhase::Pursuing || !self.config.device_type.accepts(event.source) {
            return false;
        }
        let Some(arena) = self.arena else {
            return false;
        };

        let center = self.target_center();
        let radius = self.difficulty.escape_radius;
        if !within(event.position, center, radius) {
            return false;
        }

        self.phase = EnginePhase::Escaping;
        self.target.is_escaping = true;
        self.escape_started_at_ms = now_ms;

        self.attempts = self.attempts.saturating_add(1);
        self.events.push(EngineEvent::Miss {
            attempts: self.attempts,
        });

        let from = self.target.position;
        let to = sample_position(
            &mut self.rng,
            center,
            self.difficulty.escape_min_distance,
            arena,
            self.config.target,
        );
        self.target.position = to;
        self.events.push(EngineEvent::Relocated {
            from,
            to,
            duration_ms: self.difficulty.escape_speed_ms,
        });

        if within(event.position, center, radius * self.config.near_miss_ratio) {
            self.near_misses = self.near_misses.saturating_add(1);
            self.events.push(EngineEvent::NearMiss {
                near_misses: self.near_misses,
            });
            if self.config.near_misses_per_level > 0
                && self.near_misses % self.config.near_misses_per_level == 0
            {
                self.level_up();
            }
        }

        true
    }

    /// Timer hook: releases an expired escape lock and rotates the taunt.
    pub fn tick(&mut self, now_ms: u64) {
        self.settle(now_ms);

        if self.phase == EnginePhase::Idle {
            return;
        }
        let since_taunt = now_ms.saturating_sub(self.last_taunt_at_ms);
        if since_taunt as f64 >= self.difficulty.taunt_interval_ms {
            self.last_taunt_at_ms = now_ms;
            self.taunt = pick_taunt(&mut self.rng, self.difficulty.level);
            self.events.push(EngineEvent::TauntChanged(self.taunt.clone()));
        }
    }

    /// The player caught the target. Ends the round and returns the outcome
    /// to submit; `None` if no round is running.
    pub fn on_target_activated(&mut self, now_ms: u64) -> Option<GameOutcome> {
        if self.phase == EnginePhase::Idle {
            return None;
        }

        let outcome = GameOutcome {
            time_taken_seconds: self.elapsed_seconds(now_ms) as f64,
            attempts: self.attempts,
            max_level: self.difficulty.level,
        };
        self.phase = EnginePhase::Idle;
        self.target.is_escaping = false;
        self.finished = true;
        self.events.push(EngineEvent::Activated(outcome));
        Some(outcome)
    }

    /// Start a fresh round in the same arena.
    pub fn restart(&mut self, now_ms: u64) {
        let arena = self.arena.take();
        self.finished = false;
        self.phase = EnginePhase::Idle;
        self.difficulty = derive_difficulty(STARTING_LEVEL, &self.config.difficulty);
        self.attempts = 0;
        self.near_misses = 0;
        self.started_at_ms = None;
        self.taunt = String::from(OPENING_TAUNT);
        self.events.clear();
        if let Some(arena) = arena {
            self.measure_arena(arena.width, arena.height, now_ms);
        }
    }

    fn settle(&mut self, now_ms: u64) {
        if self.phase != EnginePhase::Escaping {
            return;
        }
        if now_ms.saturating_sub(self.escape_started_at_ms) >= self.config.settle_delay_ms {
            self.phase = EnginePhase::Pursuing;
            self.target.is_escaping = false;
            self.events.push(EngineEvent::Settled);
        }
    }

    fn level_up(&mut self) {
        let level = self.difficulty.level.saturating_add(1);
        self.difficulty = derive_difficulty(level, &self.config.difficulty);
        self.events.push(EngineEvent::LevelUp { level });
    }

    fn clamp_target_into(&mut self, arena: Size) {
        let max_x = (arena.width - self.config.target.width).max(0.0);
        let max_y = (arena.height - self.config.target.height).max(0.0);
        self.target.position.x = self.target.position.x.clamp(0.0, max_x);
        self.target.position.y = self.target.position.y.clamp(0.0, max_y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desktop_engine() -> EvasionEngine {
        let mut engine = EvasionEngine::new(EngineConfig::for_device(DeviceType::Desktop), 0xC0FFEE);
        engine.measure_arena(1_200.0, 900.0, 0);
        engine
    }

    fn poke_center(engine: &mut EvasionEngine, now_ms: u64) -> bool {
        let center = engine.target_center();
        engine.on_pointer_moved(PointerEvent::mouse(center.x, center.y), now_ms)
    }

    #[test]
    fn zero_sized_arena_stays_idle() {
        let mut engine = EvasionEngine::new(EngineConfig::for_device(DeviceType::Desktop), 1);
        engine.measure_arena(0.0, 600.0, 0);
        assert_eq!(engine.phase(), EnginePhase::Idle);
        assert!(!engine.on_pointer_moved(PointerEvent::mouse(10.0, 10.0), 5));
        assert!(engine.drain_events().is_empty());
        assert_eq!(engine.attempts(), 0);
    }

    #[test]
    fn measuring_places_target_and_pursues() {
        let engine = desktop_engine();
        assert_eq!(engine.phase(), EnginePhase::Pursuing);
        let pos = engine.target().position;
        assert!(pos.x >= 0.0 && pos.x <= 1_200.0 - TARGET_WIDTH);
        assert!(pos.y >= 0.0 && pos.y <= 900.0 - TARGET_HEIGHT);
    }

    #[test]
    fn far_pointer_changes_nothing() {
        let mut engine = desktop_engine();
        let before = engine.target();
        let center = engine.target_center();
        let radius = engine.difficulty().escape_radius;

        assert!(!engine.on_pointer_moved(PointerEvent::mouse(center.x + radius + 1.0, center.y), 10));
        assert_eq!(engine.target(), before);
        assert_eq!(engine.attempts(), 0);
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn close_pointer_relocates_once_until_settled() {
        let mut engine = desktop_engine();
        let before = engine.target().position;

        assert!(poke_center(&mut engine, 1_000));
        assert_eq!(engine.phase(), EnginePhase::Escaping);
        assert_eq!(engine.attempts(), 1);
        assert_ne!(engine.target().position, before);

        let moved_to = engine.target().position;
        assert!(!poke_center(&mut engine, 1_000 + SETTLE_DELAY_MS - 1));
        assert_eq!(engine.attempts(), 1);
        assert_eq!(engine.target().position, moved_to);

        engine.tick(1_000 + SETTLE_DELAY_MS);
        assert_eq!(engine.phase(), EnginePhase::Pursuing);
        assert!(!engine.target().is_escaping);
    }

    #[test]
    fn miss_outside_half_radius_is_not_a_near_miss() {
        let mut engine = desktop_engine();
        let center = engine.target_center();
        let radius = engine.difficulty().escape_radius;

        assert!(engine.on_pointer_moved(PointerEvent::mouse(center.x + radius * 0.75, center.y), 0));
        assert_eq!(engine.attempts(), 1);
        assert_eq!(engine.near_misses(), 0);
    }

    #[test]
    fn touch_is_ignored_on_desktop() {
        let mut engine = desktop_engine();
        let center = engine.target_center();
        assert!(!engine.on_pointer_moved(PointerEvent::touch(center.x, center.y), 0));
        assert_eq!(engine.attempts(), 0);
    }

    #[test]
    fn event_order_for_a_level_up() {
        let mut engine = desktop_engine();
        for round in 0..5 {
            assert!(poke_center(&mut engine, round * SETTLE_DELAY_MS));
        }
        let events = engine.drain_events();
        let tail: Vec<&EngineEvent> = events.iter().rev().take(2).collect();
        assert_eq!(tail[0], &EngineEvent::LevelUp { level: 2 });
        assert_eq!(tail[1], &EngineEvent::NearMiss { near_misses: 5 });
        assert!(matches!(events[0], EngineEvent::Miss { attempts: 1 }));
    }

    #[test]
    fn taunt_rotates_on_interval() {
        let mut engine = desktop_engine();
        let interval = engine.difficulty().taunt_interval_ms as u64;
        engine.tick(interval - 1);
        assert!(engine.drain_events().is_empty());
        engine.tick(interval);
        assert!(matches!(engine.drain_events().as_slice(), [EngineEvent::TauntChanged(_)]));
    }

    #[test]
    fn activation_reports_floored_seconds_and_ends_round() {
        let mut engine = EvasionEngine::new(EngineConfig::for_device(DeviceType::Desktop), 9);
        engine.measure_arena(800.0, 600.0, 2_000);
        assert!(poke_center(&mut engine, 3_000));

        let outcome = engine.on_target_activated(17_999).expect("round is running");
        assert_eq!(outcome.time_taken_seconds, 15.0);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.max_level, 1);
        assert_eq!(engine.phase(), EnginePhase::Idle);
        assert!(engine.is_finished());

        assert!(engine.on_target_activated(18_000).is_none());
        assert!(!poke_center(&mut engine, 20_000));
        engine.measure_arena(800.0, 600.0, 21_000);
        assert_eq!(engine.phase(), EnginePhase::Idle);
    }

    #[test]
    fn restart_resets_counters() {
        let mut engine = desktop_engine();
        for round in 0..5 {
            poke_center(&mut engine, round * SETTLE_DELAY_MS);
        }
        engine.on_target_activated(10_000);
        engine.restart(20_000);

        assert_eq!(engine.phase(), EnginePhase::Pursuing);
        assert_eq!(engine.level(), 1);
        assert_eq!(engine.attempts(), 0);
        assert_eq!(engine.near_misses(), 0);
        assert_eq!(engine.elapsed_seconds(25_000), 5);
    }

    #[test]
    fn shrinking_arena_keeps_target_inside() {
        let mut engine = desktop_engine();
        engine.measure_arena(200.0, 100.0, 50);
        let pos = engine.target().position;
        assert!(pos.x <= 200.0 - TARGET_WIDTH);
        assert!(pos.y <= 100.0 - TARGET_HEIGHT);
        assert_eq!(engine.phase(), EnginePhase::Pursuing);
    }
}
